//! Rookery - a small social network backend
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - /api/users, /api/auth, /api/notifications                │
//! │  - /api/posts, /media (in-memory backend only)              │
//! │  - /health, /metrics                                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Follow graph, profile update, suggestions                │
//! │  - Accounts, notifications, posts and likes                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx), users stored with JSON relation lists     │
//! │  - Media host (Cloudflare R2 or in-memory)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `service`: Business logic layer
//! - `data`: Database layer
//! - `storage`: Media host for profile and cover images
//! - `auth`: Password hashing and signed sessions
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus instruments

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod service;
pub mod storage;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// This struct is cloned for each request. Services are built per
/// request from these shared handles and hold nothing between calls.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Image upload/destroy backend
    pub media: Arc<dyn storage::MediaHost>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database (runs migrations)
    /// 2. Build the configured media host
    ///
    /// # Errors
    /// Returns error if the database cannot be opened or migrated
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let db = data::Database::connect(&config.database.path).await?;
        tracing::info!(path = %config.database.path.display(), "Database connected");

        let media: Arc<dyn storage::MediaHost> = match config.storage.media.backend {
            config::MediaBackend::R2 => Arc::new(storage::R2MediaHost::new(
                &config.storage.media,
                &config.cloudflare,
            )),
            config::MediaBackend::Memory => Arc::new(storage::MemoryMediaHost::new(
                &config.storage.media.public_url,
            )),
        };
        tracing::info!(backend = ?config.storage.media.backend, "Media host initialized");

        Ok(Self::from_parts(config, db, media))
    }

    /// Assemble state from already-built parts
    pub fn from_parts(
        config: config::AppConfig,
        db: data::Database,
        media: Arc<dyn storage::MediaHost>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            db: Arc::new(db),
            media,
        }
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{Router, extract::DefaultBodyLimit};
    use tower_http::{
        compression::CompressionLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
    };

    let cors_layer = build_cors_layer(&state.config.server);
    let body_limit = state.config.server.body_limit_bytes;

    let mut router = Router::new().nest("/api", api::api_router());
    if state.config.storage.media.backend == config::MediaBackend::Memory {
        router = router.nest("/media", api::media_router());
    }

    router
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
        .merge(api::ops_router())
}

fn build_cors_layer(server: &config::ServerConfig) -> tower_http::cors::CorsLayer {
    use axum::http::HeaderValue;
    use tower_http::cors::{Any, CorsLayer};

    if !server.protocol.eq_ignore_ascii_case("https") {
        return CorsLayer::permissive();
    }

    let allowed_origin = server.base_url();
    match HeaderValue::from_str(&allowed_origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin([origin])
            .allow_methods(Any)
            .allow_headers(Any),
        Err(error) => {
            tracing::error!(
                %error,
                origin = %allowed_origin,
                "Failed to parse CORS origin from server base URL; denying cross-origin requests"
            );
            CorsLayer::new().allow_methods(Any).allow_headers(Any)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use crate::storage::MediaHost;
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn test_router() -> (axum::Router, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = config::AppConfig::local(temp_dir.path().join("router.db"));
        let state = AppState::new(config).await.unwrap();
        (build_router(state), temp_dir)
    }

    #[tokio::test]
    async fn health_is_public() {
        let (router, _temp_dir) = test_router().await;
        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn mutating_routes_require_session() {
        let (router, _temp_dir) = test_router().await;
        for (method, uri) in [
            ("POST", "/api/users/follow/01HTARGET"),
            ("POST", "/api/users/update"),
            ("GET", "/api/users/suggested"),
            ("GET", "/api/notifications"),
            ("DELETE", "/api/notifications"),
            ("GET", "/api/auth/me"),
            ("GET", "/api/posts/all"),
            ("POST", "/api/posts/create"),
            ("POST", "/api/posts/like/01HPOST"),
            ("DELETE", "/api/posts/01HPOST"),
        ] {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap();
            let response = router.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn media_route_only_exists_for_memory_backend() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config::AppConfig::local(temp_dir.path().join("media.db"));
        let db = data::Database::connect(&config.database.path).await.unwrap();
        let media = Arc::new(storage::MemoryMediaHost::new(&config.storage.media.public_url));
        let uploaded = media
            .upload("data:image/png;base64,iVBORw0KGgo=")
            .await
            .unwrap();
        let path = format!("/media/{}.png", uploaded.asset_id);

        let router = build_router(AppState::from_parts(config.clone(), db, media.clone()));
        let response = router
            .oneshot(Request::get(path.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        config.storage.media.backend = config::MediaBackend::R2;
        let db = data::Database::connect(&config.database.path).await.unwrap();
        let router = build_router(AppState::from_parts(config, db, media));
        let response = router
            .oneshot(Request::get(path.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_profile_is_404_with_error_body() {
        let (router, _temp_dir) = test_router().await;
        let response = router
            .oneshot(
                Request::get("/api/users/profile/nobody")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "User not found");
    }
}
