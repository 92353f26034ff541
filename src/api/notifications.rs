//! Notification endpoints

use axum::{Json, Router, extract::State, routing::get};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::metrics::HTTP_REQUEST_DURATION_SECONDS;
use crate::service::NotificationService;

use super::converters::notification_to_response;
use super::dto::{MessageResponse, NotificationResponse, UnreadCountResponse};

/// Create notifications router
pub fn notifications_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications).delete(delete_notifications))
        .route("/unread_count", get(unread_count))
}

/// GET /api/notifications
///
/// Returns the list as it was before this request marked everything read.
async fn list_notifications(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<Vec<NotificationResponse>>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/api/notifications"])
        .start_timer();

    let notifications = NotificationService::new(state.db.clone())
        .list_notifications(&session.user_id)
        .await?;
    Ok(Json(
        notifications.iter().map(notification_to_response).collect(),
    ))
}

/// DELETE /api/notifications
async fn delete_notifications(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<MessageResponse>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["DELETE", "/api/notifications"])
        .start_timer();

    NotificationService::new(state.db.clone())
        .delete_notifications(&session.user_id)
        .await?;
    Ok(Json(MessageResponse::new("Notifications deleted successfully")))
}

/// GET /api/notifications/unread_count
async fn unread_count(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<UnreadCountResponse>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/api/notifications/unread_count"])
        .start_timer();

    let count = NotificationService::new(state.db.clone())
        .unread_count(&session.user_id)
        .await?;
    Ok(Json(UnreadCountResponse { count }))
}
