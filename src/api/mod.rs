//! API layer
//!
//! HTTP handlers for:
//! - Users (profile, follow, suggestions, update)
//! - Authentication (signup, login, logout, me)
//! - Posts (feeds, publishing, likes)
//! - Notifications
//! - Media served back from the in-memory host
//! - Operations (health, Prometheus metrics)

mod auth;
mod converters;
mod dto;
mod media;
mod notifications;
pub mod ops;
mod posts;
mod users;

pub use converters::*;
pub use dto::*;

pub use auth::auth_router;
pub use media::media_router;
pub use notifications::notifications_router;
pub use ops::ops_router;
pub use posts::posts_router;
pub use users::users_router;

use axum::Router;

use crate::AppState;

/// Create the `/api` router
///
/// Notifications answer on both `/notifications` and the singular
/// `/notification` that older clients call.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/users", users_router())
        .nest("/auth", auth_router())
        .nest("/posts", posts_router())
        .nest("/notifications", notifications_router())
        .nest("/notification", notifications_router())
}
