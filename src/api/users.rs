//! User endpoints
//!
//! Profile lookup, follow toggle, suggestions and profile update.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::metrics::HTTP_REQUEST_DURATION_SECONDS;
use crate::service::{FollowService, ProfileService, SuggestionService};

use super::converters::{user_to_profile, user_to_response, user_to_suggestion};
use super::dto::{
    MessageResponse, ProfileResponse, SuggestedUserResponse, UpdateProfileRequest, UserResponse,
};

/// Create users router
///
/// Routes:
/// - GET /profile/:username - Public profile
/// - POST /follow/:id - Follow or unfollow
/// - GET /suggested - Who to follow
/// - POST /update - Update own profile
pub fn users_router() -> Router<AppState> {
    Router::new()
        .route("/profile/:username", get(get_profile))
        .route("/follow/:id", post(follow_unfollow))
        .route("/suggested", get(suggested_users))
        .route("/update", post(update_profile))
}

/// GET /api/users/profile/:username
async fn get_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ProfileResponse>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/api/users/profile/:username"])
        .start_timer();

    let user = ProfileService::new(state.db.clone(), state.media.clone())
        .get_profile(&username)
        .await?;
    Ok(Json(user_to_profile(&user)))
}

/// POST /api/users/follow/:id
///
/// Toggles: follows if not yet following, unfollows otherwise.
async fn follow_unfollow(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(target_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/api/users/follow/:id"])
        .start_timer();

    let outcome = FollowService::new(state.db.clone())
        .toggle_follow(&session.user_id, &target_id)
        .await?;
    Ok(Json(MessageResponse::new(outcome.message())))
}

/// GET /api/users/suggested
async fn suggested_users(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<Vec<SuggestedUserResponse>>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/api/users/suggested"])
        .start_timer();

    let users = SuggestionService::new(state.db.clone())
        .suggest_users(&session.user_id)
        .await?;
    Ok(Json(users.iter().map(user_to_suggestion).collect()))
}

/// POST /api/users/update
async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/api/users/update"])
        .start_timer();

    let user = ProfileService::new(state.db.clone(), state.media.clone())
        .update_profile(&session.user_id, request.into())
        .await?;
    Ok(Json(user_to_response(&user)))
}
