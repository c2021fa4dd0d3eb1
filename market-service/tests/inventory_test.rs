mod common;

use common::TestApp;
use serde_json::{json, Value};

async fn set(app: &TestApp, id: &str, body: Value) {
    let response = app
        .client
        .put(app.url(&format!("/api/fruits/{}", id)))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

fn names(body: &Value) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap().to_string())
        .collect()
}

/// Mango: plenty. Banana: low and expired. Papaya: sold out.
async fn seed(app: &TestApp) {
    app.add_fruit("Mango", "A", 200.0, 120).await;
    let banana = app.add_fruit("Banana", "B", 50.0, 20).await;
    let papaya = app.add_fruit("Papaya", "C", 90.0, 5).await;

    set(app, &banana, json!({ "expiryDate": "2021-03-01" })).await;
    set(app, &papaya, json!({ "quantity": 0 })).await;
}

#[tokio::test]
async fn inventory_filters_by_stock_level() {
    let app = TestApp::spawn().await;
    seed(&app).await;

    let low: Value = app.get("/api/fruits/inventory?stock=low").await.json().await.unwrap();
    assert_eq!(names(&low), vec!["Banana"]);

    let out: Value = app.get("/api/fruits/inventory?stock=out").await.json().await.unwrap();
    assert_eq!(names(&out), vec!["Papaya"]);

    let expired: Value = app
        .get("/api/fruits/inventory?stock=expired")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(names(&expired), vec!["Banana"]);

    let custom: Value = app
        .get("/api/fruits/inventory?stock=low&threshold=200")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(custom.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn inventory_searches_and_sorts() {
    let app = TestApp::spawn().await;
    seed(&app).await;

    let search: Value = app
        .get("/api/fruits/inventory?search=AN")
        .await
        .json()
        .await
        .unwrap();
    let mut found = names(&search);
    found.sort();
    assert_eq!(found, vec!["Banana", "Mango"]);

    let by_price: Value = app
        .get("/api/fruits/inventory?sort=price&order=asc")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(names(&by_price), vec!["Banana", "Papaya", "Mango"]);

    let by_expiry: Value = app
        .get("/api/fruits/inventory?sort=expiry&order=desc")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(names(&by_expiry)[0], "Banana");

    let by_grade: Value = app
        .get("/api/fruits/inventory?grade=C")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(names(&by_grade), vec!["Papaya"]);
}

#[tokio::test]
async fn inventory_rejects_unknown_query_values() {
    let app = TestApp::spawn().await;

    let response = app.get("/api/fruits/inventory?stock=plenty").await;
    assert_eq!(response.status(), 400);

    let response = app.get("/api/fruits/inventory?sort=colour").await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn inventory_stats_count_each_bucket() {
    let app = TestApp::spawn().await;
    seed(&app).await;

    let response = app.get("/api/fruits/inventory/stats").await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();

    assert_eq!(body["total"], 3);
    assert_eq!(body["lowStock"], 1);
    assert_eq!(body["outOfStock"], 1);
    assert_eq!(body["expired"], 1);
    assert_eq!(body["threshold"], 50);

    let body: Value = app
        .get("/api/fruits/inventory/stats?threshold=10")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["lowStock"], 0);
    assert_eq!(body["threshold"], 10);
}
