//! E2E tests for health check and basic server functionality

mod common;

use common::TestServer;

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_metrics_endpoint_serves_prometheus_text() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/metrics"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_cors_headers() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/api/users/profile/anyone"))
        .header("Origin", "http://localhost:3000")
        .send()
        .await
        .unwrap();

    // Local http deployments allow any origin.
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_404_for_unknown_routes() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/unknown/route"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_latency_histogram_covers_session_routes() {
    use rookery::metrics::HTTP_REQUEST_DURATION_SECONDS;

    let server = TestServer::new().await;
    let alice = server.signup("alice").await;

    let routes = [
        ("GET", "/api/auth/me"),
        ("GET", "/api/notifications/unread_count"),
        ("DELETE", "/api/notifications"),
    ];
    let before: Vec<u64> = routes
        .iter()
        .map(|(method, route)| {
            HTTP_REQUEST_DURATION_SECONDS
                .with_label_values(&[*method, *route])
                .get_sample_count()
        })
        .collect();

    server.me(&alice).await;
    let response = server
        .get_as(&alice, "/api/notifications/unread_count")
        .await;
    assert_eq!(response.status(), 200);
    let response = server
        .client
        .delete(server.url("/api/notifications"))
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    for ((method, route), before) in routes.iter().zip(before) {
        let after = HTTP_REQUEST_DURATION_SECONDS
            .with_label_values(&[*method, *route])
            .get_sample_count();
        assert!(after > before, "{method} {route} was not timed");
    }
}
