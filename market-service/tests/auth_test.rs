mod common;

use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn register_returns_token_and_user() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/api/auth/register",
            &json!({
                "name": "Kamal Silva",
                "email": "Kamal@Example.com",
                "password": "secret123"
            }),
        )
        .await;

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["user"]["email"], "kamal@example.com");
    assert_eq!(body["user"]["role"], "customer");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let app = TestApp::spawn().await;
    app.register("First", "dup@example.com", "customer").await;

    let response = app
        .post_json(
            "/api/auth/register",
            &json!({ "name": "Second", "email": "DUP@example.com", "password": "secret123" }),
        )
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "User already exists");
}

#[tokio::test]
async fn short_password_fails_validation() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/api/auth/register",
            &json!({ "name": "Short", "email": "short@example.com", "password": "123" }),
        )
        .await;

    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn login_checks_password_and_role() {
    let app = TestApp::spawn().await;
    app.register("Driver", "driver@example.com", "transporter").await;

    let ok = app
        .post_json(
            "/api/auth/login",
            &json!({ "email": "driver@example.com", "password": "secret123", "role": "transporter" }),
        )
        .await;
    assert_eq!(ok.status(), 200);
    let body: Value = ok.json().await.unwrap();
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["role"], "transporter");

    let wrong_password = app
        .post_json(
            "/api/auth/login",
            &json!({ "email": "driver@example.com", "password": "nope-nope" }),
        )
        .await;
    assert_eq!(wrong_password.status(), 400);
    let body: Value = wrong_password.json().await.unwrap();
    assert_eq!(body["error"], "Invalid credentials");

    let wrong_role = app
        .post_json(
            "/api/auth/login",
            &json!({ "email": "driver@example.com", "password": "secret123", "role": "admin" }),
        )
        .await;
    assert_eq!(wrong_role.status(), 400);
    let body: Value = wrong_role.json().await.unwrap();
    assert_eq!(body["error"], "Invalid role for this account");
}

#[tokio::test]
async fn unknown_email_gets_generic_error() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/api/auth/login",
            &json!({ "email": "ghost@example.com", "password": "secret123" }),
        )
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn profile_requires_a_valid_token() {
    let app = TestApp::spawn().await;
    let user = app.register("Nimali", "nimali@example.com", "customer").await;

    let missing = app.get("/api/auth/profile").await;
    assert_eq!(missing.status(), 401);
    let body: Value = missing.json().await.unwrap();
    assert_eq!(body["error"], "Authentication required");

    let garbage = app
        .client
        .get(app.url("/api/auth/profile"))
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(garbage.status(), 401);

    let response = app
        .client
        .get(app.url("/api/auth/profile"))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["_id"], user.id.as_str());
    assert_eq!(body["email"], "nimali@example.com");
    assert!(body.get("passwordHash").is_none());
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn admin_stats_are_admin_only() {
    let app = TestApp::spawn().await;
    let customer = app.register("Buyer", "buyer@example.com", "customer").await;
    let admin = app.register("Boss", "boss@example.com", "admin").await;

    let forbidden = app
        .client
        .get(app.url("/api/admin/stats"))
        .bearer_auth(&customer.token)
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), 403);
    let body: Value = forbidden.json().await.unwrap();
    assert_eq!(body["error"], "Insufficient permissions");

    let response = app
        .client
        .get(app.url("/api/admin/stats"))
        .bearer_auth(&admin.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Admin stats accessed successfully");
    assert_eq!(body["stats"]["users"]["customer"], 1);
    assert_eq!(body["stats"]["users"]["admin"], 1);

    let selected = app
        .client
        .get(app.url("/api/admin/stats/ids"))
        .bearer_auth(&admin.token)
        .send()
        .await
        .unwrap();
    assert_eq!(selected.status(), 200);
    let body: Value = selected.json().await.unwrap();
    assert_eq!(body["message"], "selected admin stats accessed successfully");
}
