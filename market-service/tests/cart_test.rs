mod common;

use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn add_to_cart_snapshots_fruit() {
    let app = TestApp::spawn().await;
    let fruit_id = app.add_fruit("Mango", "A", 200.0, 10).await;

    let response = app
        .post_json(
            "/api/cart",
            &json!({ "userId": "user-1", "fruitId": fruit_id, "quantity": 3 }),
        )
        .await;

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "Mango");
    assert_eq!(body["grade"], "A");
    assert_eq!(body["price"], 200.0);
    assert_eq!(body["quantity"], 3);
}

#[tokio::test]
async fn adding_same_fruit_merges_lines_up_to_stock() {
    let app = TestApp::spawn().await;
    let fruit_id = app.add_fruit("Mango", "A", 200.0, 5).await;
    let line = json!({ "userId": "user-1", "fruitId": fruit_id, "quantity": 3 });

    let first: Value = app.post_json("/api/cart", &line).await.json().await.unwrap();
    let second = app
        .post_json(
            "/api/cart",
            &json!({ "userId": "user-1", "fruitId": fruit_id, "quantity": 2 }),
        )
        .await;
    assert_eq!(second.status(), 201);
    let second: Value = second.json().await.unwrap();
    assert_eq!(second["_id"], first["_id"]);
    assert_eq!(second["quantity"], 5);

    let over = app.post_json("/api/cart", &line).await;
    assert_eq!(over.status(), 400);
    let body: Value = over.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Adding this quantity would exceed available inventory"
    );
    assert_eq!(body["availableQuantity"], 5);
    assert_eq!(body["cartQuantity"], 5);
    assert_eq!(body["requestedQuantity"], 3);

    let cart: Value = app.get("/api/cart/user-1").await.json().await.unwrap();
    assert_eq!(cart.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn add_to_cart_validates_input() {
    let app = TestApp::spawn().await;
    let fruit_id = app.add_fruit("Mango", "A", 200.0, 2).await;

    let response = app
        .post_json("/api/cart", &json!({ "userId": "user-1", "quantity": 1 }))
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid request data");

    let response = app
        .post_json(
            "/api/cart",
            &json!({ "userId": "user-1", "fruitId": "missing", "quantity": 1 }),
        )
        .await;
    assert_eq!(response.status(), 404);

    let response = app
        .post_json(
            "/api/cart",
            &json!({ "userId": "user-1", "fruitId": fruit_id, "quantity": 3 }),
        )
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Fruit is not available or insufficient quantity"
    );
}

#[tokio::test]
async fn update_and_remove_cart_lines() {
    let app = TestApp::spawn().await;
    let fruit_id = app.add_fruit("Mango", "A", 200.0, 4).await;
    let line: Value = app
        .post_json(
            "/api/cart",
            &json!({ "userId": "user-1", "fruitId": fruit_id, "quantity": 1 }),
        )
        .await
        .json()
        .await
        .unwrap();
    let line_id = line["_id"].as_str().unwrap();

    let response = app
        .client
        .put(app.url(&format!("/api/cart/{}", line_id)))
        .json(&json!({ "quantity": 4 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["quantity"], 4);

    let response = app
        .client
        .put(app.url(&format!("/api/cart/{}", line_id)))
        .json(&json!({ "quantity": 9 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Requested quantity not available");

    let response = app
        .client
        .delete(app.url(&format!("/api/cart/{}", line_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Item removed from cart");

    let response = app
        .client
        .delete(app.url(&format!("/api/cart/{}", line_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn clear_cart_empties_only_that_user() {
    let app = TestApp::spawn().await;
    let fruit_id = app.add_fruit("Mango", "A", 200.0, 10).await;
    for user in ["user-1", "user-2"] {
        let response = app
            .post_json(
                "/api/cart",
                &json!({ "userId": user, "fruitId": fruit_id, "quantity": 1 }),
            )
            .await;
        assert_eq!(response.status(), 201);
    }

    let response = app
        .client
        .delete(app.url("/api/cart/user/user-1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Cart cleared successfully");

    let cart: Value = app.get("/api/cart/user-1").await.json().await.unwrap();
    assert!(cart.as_array().unwrap().is_empty());
    let other: Value = app.get("/api/cart/user-2").await.json().await.unwrap();
    assert_eq!(other.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn huge_quantity_on_existing_line_is_rejected_not_overflowed() {
    let app = TestApp::spawn().await;
    let fruit_id = app.add_fruit("Mango", "A", 200.0, 10).await;

    let restock = app
        .client
        .put(app.url(&format!("/api/fruits/{}", fruit_id)))
        .json(&json!({ "quantity": i64::MAX }))
        .send()
        .await
        .unwrap();
    assert_eq!(restock.status(), 200);

    let first = app
        .post_json(
            "/api/cart",
            &json!({ "userId": "user-1", "fruitId": fruit_id, "quantity": 1 }),
        )
        .await;
    assert_eq!(first.status(), 201);

    let response = app
        .post_json(
            "/api/cart",
            &json!({ "userId": "user-1", "fruitId": fruit_id, "quantity": i64::MAX }),
        )
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Adding this quantity would exceed available inventory"
    );
    assert_eq!(body["cartQuantity"], 1);

    let cart: Value = app.get("/api/cart/user-1").await.json().await.unwrap();
    assert_eq!(cart[0]["quantity"], 1);
}

#[tokio::test]
async fn malformed_json_reports_the_parse_error() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/cart"))
        .header("content-type", "application/json")
        .body("{\"userId\": ")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Json parse error"));
    assert!(body.get("message").is_none());
}
