mod common;

use common::TestApp;

#[tokio::test]
async fn health_check_returns_200() {
    // Arrange
    let app = TestApp::spawn().await;

    // Act
    let response = app.get("/health").await;

    // Assert
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "market-service");
}

#[tokio::test]
async fn readiness_check_returns_200() {
    let app = TestApp::spawn().await;

    let response = app.get("/ready").await;

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn responses_carry_request_id_and_security_headers() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/health"))
        .header("x-request-id", "req-health-1")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "req-health-1"
    );
    assert!(response.headers().contains_key("x-content-type-options"));
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = TestApp::spawn().await;

    let response = app.get("/api/does-not-exist").await;

    assert_eq!(response.status(), 404);
}
