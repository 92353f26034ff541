//! Locally hosted media
//!
//! Mounted at `/media` only when `storage.media.backend = "memory"`, so the
//! URLs that backend hands out resolve against this server. R2 assets are
//! served by the bucket's own public domain.

use axum::{
    Router,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::AppState;
use crate::error::AppError;
use crate::metrics::HTTP_REQUEST_DURATION_SECONDS;
use crate::storage::asset_id_from_url;

/// Create media router
///
/// Routes:
/// - GET /:file - Stored bytes, `file` being `{asset_id}.{ext}`
pub fn media_router() -> Router<AppState> {
    Router::new().route("/:file", get(serve_media))
}

/// GET /media/:file
async fn serve_media(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Response, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/media/:file"])
        .start_timer();

    let asset_id = asset_id_from_url(&file).ok_or(AppError::Missing("Media not found"))?;
    let stored = state
        .media
        .fetch(&asset_id)
        .await?
        .ok_or(AppError::Missing("Media not found"))?;

    Ok((
        [
            (header::CONTENT_TYPE, stored.content_type),
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000, immutable".to_string(),
            ),
        ],
        stored.bytes,
    )
        .into_response())
}
