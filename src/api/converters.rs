//! Converters from domain models to API responses

use crate::data::{NotificationWithSender, PostWithAuthor, User};

use super::dto::{
    NotificationResponse, NotificationSender, PostAuthor, PostResponse, ProfileResponse,
    SuggestedUserResponse, UserResponse,
};

/// Convert a user to the signed-in user response
pub fn user_to_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id.clone(),
        username: user.username.clone(),
        full_name: user.full_name.clone(),
        email: user.email.clone(),
        bio: user.bio.clone(),
        link: user.link.clone(),
        profile_img: user.profile_img.clone(),
        cover_img: user.cover_img.clone(),
        followers: user.followers.clone(),
        following: user.following.clone(),
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

pub fn user_to_profile(user: &User) -> ProfileResponse {
    ProfileResponse {
        id: user.id.clone(),
        username: user.username.clone(),
        full_name: user.full_name.clone(),
        bio: user.bio.clone(),
        profile_img: user.profile_img.clone(),
        cover_img: user.cover_img.clone(),
        link: user.link.clone(),
    }
}

pub fn user_to_suggestion(user: &User) -> SuggestedUserResponse {
    SuggestedUserResponse {
        id: user.id.clone(),
        username: user.username.clone(),
        full_name: user.full_name.clone(),
        bio: user.bio.clone(),
        link: user.link.clone(),
        profile_img: user.profile_img.clone(),
        cover_img: user.cover_img.clone(),
        followers: user.followers.clone(),
        following: user.following.clone(),
    }
}

pub fn notification_to_response(notification: &NotificationWithSender) -> NotificationResponse {
    NotificationResponse {
        id: notification.id.clone(),
        notification_type: notification.notification_type.clone(),
        from: NotificationSender {
            id: notification.from_user_id.clone(),
            username: notification.from_username.clone(),
            profile_img: notification.from_profile_img.clone(),
        },
        to: notification.to_user_id.clone(),
        read: notification.read,
        created_at: notification.created_at,
    }
}

/// A post with its author summary
pub fn post_to_response(entry: &PostWithAuthor) -> PostResponse {
    let post = &entry.post;
    PostResponse {
        id: post.id.clone(),
        user: PostAuthor {
            id: post.user_id.clone(),
            username: entry.author_username.clone(),
            full_name: entry.author_full_name.clone(),
            profile_img: entry.author_profile_img.clone(),
        },
        text: post.text.clone(),
        img: post.img.clone(),
        likes: post.likes.clone(),
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Post;

    fn sample_user() -> User {
        let mut user = User::new(
            "alice".to_string(),
            "Alice".to_string(),
            "alice@example.com".to_string(),
            "$argon2id$secret".to_string(),
        );
        user.bio = Some("hi".to_string());
        user.following = vec!["01HBOB".to_string()];
        user
    }

    #[test]
    fn user_response_omits_password_hash() {
        let json = serde_json::to_value(user_to_response(&sample_user())).unwrap();
        assert_eq!(json["username"], "alice");
        assert_eq!(json["fullName"], "Alice");
        assert_eq!(json["following"][0], "01HBOB");
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password").is_none());
        assert!(!json.to_string().contains("$argon2id$secret"));
    }

    #[test]
    fn profile_projection_has_exactly_public_fields() {
        let json = serde_json::to_value(user_to_profile(&sample_user())).unwrap();
        let mut keys: Vec<&str> = json
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["bio", "coverImg", "fullName", "id", "link", "profileImg", "username"]
        );
    }

    #[test]
    fn suggestion_hides_email() {
        let json = serde_json::to_value(user_to_suggestion(&sample_user())).unwrap();
        assert!(json.get("email").is_none());
        assert_eq!(json["bio"], "hi");
    }

    #[test]
    fn post_response_carries_author_summary() {
        let user = sample_user();
        let mut post = Post::new(&user.id, Some("first!".to_string()), None);
        post.likes = vec!["01HBOB".to_string()];
        let entry = PostWithAuthor {
            post,
            author_username: Some(user.username.clone()),
            author_full_name: Some(user.full_name.clone()),
            author_profile_img: None,
        };

        let json = serde_json::to_value(post_to_response(&entry)).unwrap();
        assert_eq!(json["user"]["id"], user.id.as_str());
        assert_eq!(json["user"]["username"], "alice");
        assert_eq!(json["user"]["fullName"], "Alice");
        assert!(json["user"].get("email").is_none());
        assert_eq!(json["text"], "first!");
        assert!(json["img"].is_null());
        assert_eq!(json["likes"][0], "01HBOB");
        assert!(json["createdAt"].is_string());
    }
}
