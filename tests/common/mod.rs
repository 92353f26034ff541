//! Common test utilities for E2E tests

#![allow(dead_code)]

use std::sync::Arc;

use rookery::data::Database;
use rookery::storage::MemoryMediaHost;
use rookery::{AppState, config};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// 1x1-ish PNG payload accepted by the media host
pub const PNG_DATA_URI: &str = "data:image/png;base64,iVBORw0KGgo=";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub media: Arc<MemoryMediaHost>,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

/// A signed-up user and the token that authenticates as them
pub struct TestUser {
    pub id: String,
    pub username: String,
    pub token: String,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let config = config::AppConfig::local(temp_dir.path().join("test.db"));

        let db = Database::connect(&config.database.path).await.unwrap();
        let media = Arc::new(MemoryMediaHost::new(&config.storage.media.public_url));
        let state = AppState::from_parts(config, db, media.clone());

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = rookery::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: addr_str,
            state,
            media,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Sign up through the API and return the user with their session token
    pub async fn signup(&self, username: &str) -> TestUser {
        let response = self
            .client
            .post(self.url("/api/auth/signup"))
            .json(&json!({
                "username": username,
                "fullName": format!("{username} tester"),
                "email": format!("{username}@example.com"),
                "password": "password123",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201, "signup of {username} failed");

        let token = session_token(&response).expect("signup sets session cookie");
        let body: Value = response.json().await.unwrap();

        TestUser {
            id: body["id"].as_str().unwrap().to_string(),
            username: username.to_string(),
            token,
        }
    }

    /// Authenticated GET
    pub async fn get_as(&self, user: &TestUser, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(&user.token)
            .send()
            .await
            .unwrap()
    }

    /// Authenticated POST with a JSON body
    pub async fn post_as(&self, user: &TestUser, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(&user.token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    /// Current state of a user as seen by themselves
    pub async fn me(&self, user: &TestUser) -> Value {
        let response = self.get_as(user, "/api/auth/me").await;
        assert_eq!(response.status(), 200);
        response.json().await.unwrap()
    }
}

/// Pull the session token out of a `Set-Cookie` header
pub fn session_token(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookie| {
            cookie
                .split(';')
                .next()
                .and_then(|pair| pair.trim().strip_prefix("session="))
                .filter(|token| !token.is_empty())
                .map(ToOwned::to_owned)
        })
}

/// Ids contained in a JSON string array
pub fn ids(value: &Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|id| id.as_str().unwrap().to_string())
        .collect()
}
