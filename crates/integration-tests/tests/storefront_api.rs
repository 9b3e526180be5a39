//! Integration tests for the storefront HTTP API.
//!
//! Each test starts the storefront in-process on an ephemeral port and talks
//! to it with a cookie-keeping client.
//!
//! These tests require a `PostgreSQL` database in `TEST_DATABASE_URL`.
//!
//! Run with: cargo test -p bookstore-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use bookstore_integration_tests::{TestContext, browser, unique_email};

async fn json_body(resp: reqwest::Response) -> Value {
    resp.json::<Value>().await.expect("Response was not JSON")
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_health_endpoints() {
    let ctx = TestContext::new().await;
    let base = ctx.spawn_app().await;
    let client = browser();

    let resp = client.get(base.join("/health").unwrap()).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = client
        .get(base.join("/health/ready").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_anonymous_cart_flow() {
    let ctx = TestContext::new().await;
    let base = ctx.spawn_app().await;
    let client = browser();
    let book = ctx.product("Little Women", 899, 3).await;

    // A new visitor has an empty cart.
    let resp = client.get(base.join("/api/cart").unwrap()).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["lines"], json!([]));

    // Quantity defaults to one.
    let resp = client
        .post(base.join("/api/cart/items").unwrap())
        .json(&json!({ "product_id": book.as_i32() }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["quantity"], 1);

    // Asking for more than the stock stores the stock.
    let resp = client
        .put(base.join(&format!("/api/cart/items/{book}")).unwrap())
        .json(&json!({ "quantity": 10 }))
        .send()
        .await
        .unwrap();
    let body = json_body(resp).await;
    assert_eq!(body["requested"], 10);
    assert_eq!(body["quantity"], 3);
    assert_eq!(body["cart_count"], 3);

    let resp = client
        .get(base.join("/api/cart/count").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(json_body(resp).await["count"], 3);

    let resp = client
        .delete(base.join(&format!("/api/cart/items/{book}")).unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(json_body(resp).await["removed"], true);

    let resp = client
        .delete(base.join(&format!("/api/cart/items/{book}")).unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["removed"], false);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_cart_errors_map_to_status_codes() {
    let ctx = TestContext::new().await;
    let base = ctx.spawn_app().await;
    let client = browser();
    let sold_out = ctx.product("Silas Marner", 500, 0).await;

    let add = |body: Value| {
        client
            .post(base.join("/api/cart/items").unwrap())
            .json(&body)
            .send()
    };

    let resp = add(json!({ "product_id": sold_out.as_i32() })).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = add(json!({ "product_id": i32::MAX })).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = add(json!({ "product_id": sold_out.as_i32(), "quantity": 0 }))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(resp).await["error"].is_string());
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_register_merges_anonymous_cart_and_checks_out() {
    let ctx = TestContext::new().await;
    let base = ctx.spawn_app().await;
    let client = browser();
    let book = ctx.product("Great Expectations", 1000, 5).await;

    client
        .post(base.join("/api/cart/items").unwrap())
        .json(&json!({ "product_id": book.as_i32(), "quantity": 2 }))
        .send()
        .await
        .unwrap();

    // Checkout needs a signed-in user.
    let resp = client
        .post(base.join("/api/checkout").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .post(base.join("/api/auth/register").unwrap())
        .json(&json!({
            "email": unique_email(),
            "password": "a long enough password",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(json_body(resp).await["cart"]["merged_lines"], 1);

    let resp = client.get(base.join("/api/cart").unwrap()).send().await.unwrap();
    let cart = json_body(resp).await;
    assert_eq!(cart["lines"][0]["quantity"], 2);

    let resp = client
        .post(base.join("/api/checkout").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert!(json_body(resp).await["order_id"].is_number());
    assert_eq!(ctx.stock(book).await, 3);

    let resp = client.get(base.join("/api/orders").unwrap()).send().await.unwrap();
    let orders = json_body(resp).await;
    assert_eq!(orders.as_array().map(Vec::len), Some(1));

    let resp = client
        .post(base.join("/api/auth/logout").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client.get(base.join("/api/orders").unwrap()).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_login_checks_credentials() {
    let ctx = TestContext::new().await;
    let base = ctx.spawn_app().await;
    let client = browser();
    let (_, email, password) = ctx.user_with_credentials().await;

    let resp = client
        .post(base.join("/api/auth/login").unwrap())
        .json(&json!({ "email": email, "password": "not the password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .post(base.join("/api/auth/login").unwrap())
        .json(&json!({ "email": email.to_uppercase(), "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["user"]["email"], email);

    let resp = client
        .post(base.join("/api/auth/register").unwrap())
        .json(&json!({ "email": email, "password": "another password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_product_endpoints() {
    let ctx = TestContext::new().await;
    let base = ctx.spawn_app().await;
    let client = browser();
    let book = ctx.product("Treasure Island", 450, 7).await;

    let resp = client
        .get(base.join(&format!("/api/products/{book}")).unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["name"], "Treasure Island");
    assert_eq!(body["stock_quantity"], 7);

    let resp = client
        .get(base.join(&format!("/api/products/{}", i32::MAX)).unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client
        .get(base.join("/api/products").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
