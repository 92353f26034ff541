//! Post endpoints
//!
//! Feeds, publishing, deletion and likes. Every route needs a session.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::metrics::HTTP_REQUEST_DURATION_SECONDS;
use crate::service::PostService;

use super::converters::post_to_response;
use super::dto::{CreatePostRequest, MessageResponse, PostResponse};

/// Create posts router
///
/// Routes:
/// - GET /all - Every post
/// - GET /following - Posts by followed users
/// - GET /user/:username - Posts by one user
/// - GET /likes/:id - Posts a user has liked
/// - POST /create - Publish
/// - POST /like/:id - Like or unlike
/// - DELETE /:id - Delete own post
pub fn posts_router() -> Router<AppState> {
    Router::new()
        .route("/all", get(all_posts))
        .route("/following", get(following_posts))
        .route("/user/:username", get(user_posts))
        .route("/likes/:id", get(liked_posts))
        .route("/create", post(create_post))
        .route("/like/:id", post(like_unlike_post))
        .route("/:id", delete(delete_post))
}

fn service(state: &AppState) -> PostService {
    PostService::new(state.db.clone(), state.media.clone())
}

/// GET /api/posts/all
async fn all_posts(
    State(state): State<AppState>,
    CurrentUser(_session): CurrentUser,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/api/posts/all"])
        .start_timer();

    let posts = service(&state).all_posts().await?;
    Ok(Json(posts.iter().map(post_to_response).collect()))
}

/// GET /api/posts/following
async fn following_posts(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/api/posts/following"])
        .start_timer();

    let posts = service(&state).following_posts(&session.user_id).await?;
    Ok(Json(posts.iter().map(post_to_response).collect()))
}

/// GET /api/posts/user/:username
async fn user_posts(
    State(state): State<AppState>,
    CurrentUser(_session): CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/api/posts/user/:username"])
        .start_timer();

    let posts = service(&state).user_posts(&username).await?;
    Ok(Json(posts.iter().map(post_to_response).collect()))
}

/// GET /api/posts/likes/:id
async fn liked_posts(
    State(state): State<AppState>,
    CurrentUser(_session): CurrentUser,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/api/posts/likes/:id"])
        .start_timer();

    let posts = service(&state).liked_posts(&user_id).await?;
    Ok(Json(posts.iter().map(post_to_response).collect()))
}

/// POST /api/posts/create
async fn create_post(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(request): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/api/posts/create"])
        .start_timer();

    let created = service(&state)
        .create_post(&session.user_id, request.into())
        .await?;
    Ok((StatusCode::CREATED, Json(post_to_response(&created))))
}

/// POST /api/posts/like/:id
///
/// Toggles and answers with the post's likes afterwards.
async fn like_unlike_post(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(post_id): Path<String>,
) -> Result<Json<Vec<String>>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/api/posts/like/:id"])
        .start_timer();

    let toggle = service(&state)
        .toggle_like(&session.user_id, &post_id)
        .await?;
    Ok(Json(toggle.likes))
}

/// DELETE /api/posts/:id
async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(post_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["DELETE", "/api/posts/:id"])
        .start_timer();

    service(&state)
        .delete_post(&session.user_id, &post_id)
        .await?;
    Ok(Json(MessageResponse::new("Post deleted successfully")))
}
