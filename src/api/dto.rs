//! API request and response DTOs
//!
//! JSON field names are camelCase. Responses never carry the password hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::service::{NewAccount, NewPost, ProfilePatch};

/// Signed-in user as returned by auth and profile-update routes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub bio: Option<String>,
    pub link: Option<String>,
    pub profile_img: Option<String>,
    pub cover_img: Option<String>,
    pub followers: Vec<String>,
    pub following: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public profile projection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub profile_img: Option<String>,
    pub cover_img: Option<String>,
    pub link: Option<String>,
}

/// Suggested user, without email
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedUserResponse {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub link: Option<String>,
    pub profile_img: Option<String>,
    pub cover_img: Option<String>,
    pub followers: Vec<String>,
    pub following: Vec<String>,
}

/// Sender summary embedded in a notification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSender {
    pub id: String,
    pub username: Option<String>,
    pub profile_img: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub from: NotificationSender,
    pub to: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Author summary embedded in a post
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAuthor {
    pub id: String,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub profile_img: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub user: PostAuthor,
    pub text: Option<String>,
    pub img: Option<String>,
    pub likes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

/// POST /api/auth/signup body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: String,
    #[serde(alias = "fullname")]
    pub full_name: String,
    pub email: String,
    pub password: String,
}

impl From<SignupRequest> for NewAccount {
    fn from(request: SignupRequest) -> Self {
        Self {
            username: request.username,
            full_name: request.full_name,
            email: request.email,
            password: request.password,
        }
    }
}

/// POST /api/auth/login body
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /api/posts/create body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub text: Option<String>,
    /// Image as a `data:` URI
    #[serde(default)]
    pub img: Option<String>,
}

impl From<CreatePostRequest> for NewPost {
    fn from(request: CreatePostRequest) -> Self {
        Self {
            text: request.text,
            img: request.img,
        }
    }
}

/// POST /api/users/update body
///
/// Every field is optional; empty strings are treated as absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default, alias = "fullname")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub profile_img: Option<String>,
    #[serde(default)]
    pub cover_img: Option<String>,
    #[serde(default, alias = "currentpassword")]
    pub current_password: Option<String>,
    #[serde(default, alias = "newpassword")]
    pub new_password: Option<String>,
}

impl From<UpdateProfileRequest> for ProfilePatch {
    fn from(request: UpdateProfileRequest) -> Self {
        Self {
            full_name: request.full_name,
            email: request.email,
            username: request.username,
            bio: request.bio,
            link: request.link,
            profile_img: request.profile_img,
            cover_img: request.cover_img,
            current_password: request.current_password,
            new_password: request.new_password,
        }
    }
}
