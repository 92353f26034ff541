//! Data models
//!
//! Rust structs representing stored users, posts and notifications.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered user
///
/// `followers` and `following` live inside the record and are kept
/// as a symmetric pair by the follow service; neither is derived
/// from the other.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    /// Argon2 PHC string; never serialized to clients
    pub password_hash: String,
    pub bio: Option<String>,
    pub link: Option<String>,
    /// Secure URL of the profile image at the media host
    pub profile_img: Option<String>,
    /// Secure URL of the cover image at the media host
    pub cover_img: Option<String>,
    /// Ids of users following this user
    pub followers: Vec<String>,
    /// Ids of users this user follows
    pub following: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a freshly registered user with empty relationship lists.
    pub fn new(username: String, full_name: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new().0,
            username,
            full_name,
            email,
            password_hash,
            bio: None,
            link: None,
            profile_img: None,
            cover_img: None,
            followers: Vec::new(),
            following: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_following(&self, user_id: &str) -> bool {
        self.following.iter().any(|id| id == user_id)
    }
}

/// Row shape of the `users` table; relationship sets are JSON arrays.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct UserRow {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub bio: Option<String>,
    pub link: Option<String>,
    pub profile_img: Option<String>,
    pub cover_img: Option<String>,
    pub followers: Json<Vec<String>>,
    pub following: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            full_name: row.full_name,
            email: row.email,
            password_hash: row.password_hash,
            bio: row.bio,
            link: row.link,
            profile_img: row.profile_img,
            cover_img: row.cover_img,
            followers: row.followers.0,
            following: row.following.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Which relationship list of a user document to modify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationList {
    Followers,
    Following,
}

impl RelationList {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Followers => "followers",
            Self::Following => "following",
        }
    }
}

// =============================================================================
// Posts
// =============================================================================

/// A post with optional text and an optional image
///
/// At least one of `text` and `img` is set; the post service enforces it.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: String,
    /// Author
    pub user_id: String,
    pub text: Option<String>,
    /// Secure URL of the attached image at the media host
    pub img: Option<String>,
    /// Ids of users who like this post
    pub likes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(user_id: &str, text: Option<String>, img: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new().0,
            user_id: user_id.to_string(),
            text,
            img,
            likes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|id| id == user_id)
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct PostRow {
    pub id: String,
    pub user_id: String,
    pub text: Option<String>,
    pub img: Option<String>,
    pub likes: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            text: row.text,
            img: row.img,
            likes: row.likes.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Post joined with its author's public fields, as feeds return it
#[derive(Debug, Clone)]
pub struct PostWithAuthor {
    pub post: Post,
    pub author_username: Option<String>,
    pub author_full_name: Option<String>,
    pub author_profile_img: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct PostWithAuthorRow {
    #[sqlx(flatten)]
    pub post: PostRow,
    pub author_username: Option<String>,
    pub author_full_name: Option<String>,
    pub author_profile_img: Option<String>,
}

impl From<PostWithAuthorRow> for PostWithAuthor {
    fn from(row: PostWithAuthorRow) -> Self {
        Self {
            post: row.post.into(),
            author_username: row.author_username,
            author_full_name: row.author_full_name,
            author_profile_img: row.author_profile_img,
        }
    }
}

// =============================================================================
// Notifications
// =============================================================================

/// One-way event record addressed to a user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: String,
    /// Type: `follow` or `like`
    pub notification_type: String,
    /// User who caused the event
    pub from_user_id: String,
    /// User the event is addressed to
    pub to_user_id: String,
    /// Whether the recipient has seen this
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(notification_type: NotificationType, from_user_id: &str, to_user_id: &str) -> Self {
        Self {
            id: EntityId::new().0,
            notification_type: notification_type.as_str().to_string(),
            from_user_id: from_user_id.to_string(),
            to_user_id: to_user_id.to_string(),
            read: false,
            created_at: Utc::now(),
        }
    }
}

/// Notification types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationType {
    Follow,
    Like,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Follow => "follow",
            Self::Like => "like",
        }
    }
}

/// Notification joined with the sender's public fields
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationWithSender {
    pub id: String,
    pub notification_type: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub from_username: Option<String>,
    pub from_profile_img: Option<String>,
}
