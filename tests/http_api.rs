use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use eshop_orders::{http::router, OrderService};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(b) => builder.header("content-type", "application/json").body(Body::from(b.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    (status, value)
}

fn order_body(user: Uuid, items: Value) -> Value {
    json!({
        "orderItems": items,
        "shippingAddress1": "Flowers Street 45",
        "city": "Prague",
        "zip": "10000",
        "country": "Czech Republic",
        "phone": "+420702241333",
        "user": user,
    })
}

#[tokio::test]
async fn test_order_round_trip_over_http() {
    let app = router(OrderService::in_memory(), "/api/v1");
    let user = Uuid::now_v7();

    let (status, category) = send(&app, Method::POST, "/api/v1/categories", Some(json!({"name": "Kitchen"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, p1) = send(&app, Method::POST, "/api/v1/products", Some(json!({"name": "Kettle", "price": "10.00", "category": category["id"]}))).await;
    let (_, p2) = send(&app, Method::POST, "/api/v1/products", Some(json!({"name": "Cup", "price": 5}))).await;

    let items = json!([{"product": p1["id"], "quantity": 2}, {"product": p2["id"], "quantity": 1}]);
    let (status, order) = send(&app, Method::POST, "/api/v1/orders", Some(order_body(user, items))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["totalPrice"], "25.00");
    assert_eq!(order["status"], "Pending");
    assert_eq!(order["orderItems"].as_array().unwrap().len(), 2);
    let id = order["id"].as_str().unwrap().to_string();

    let (_, sales) = send(&app, Method::GET, "/api/v1/orders/get/totalsales", None).await;
    assert_eq!(sales["totalsales"], "25.00");
    let (_, count) = send(&app, Method::GET, "/api/v1/orders/get/count", None).await;
    assert_eq!(count["orderCount"], 1);

    let (status, details) = send(&app, Method::GET, &format!("/api/v1/orders/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["orderItems"][0]["product"]["name"], "Kettle");
    assert_eq!(details["orderItems"][0]["product"]["category"]["name"], "Kitchen");
    assert_eq!(details["user"]["id"], json!(user));

    let (_, mine) = send(&app, Method::GET, &format!("/api/v1/orders/get/userorders/{user}"), None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    let (_, theirs) = send(&app, Method::GET, &format!("/api/v1/orders/get/userorders/{}", Uuid::now_v7()), None).await;
    assert_eq!(theirs, json!([]));

    let (status, updated) = send(&app, Method::PUT, &format!("/api/v1/orders/{id}"), Some(json!({"status": "Shipped"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "Shipped");

    let (status, deleted) = send(&app, Method::DELETE, &format!("/api/v1/orders/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["success"], true);
    assert_eq!(deleted["undeletedLineItems"], json!([]));

    let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/orders/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::GET, &format!("/api/v1/orders/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, count) = send(&app, Method::GET, "/api/v1/orders/get/count", None).await;
    assert_eq!(count["orderCount"], 0);
}

#[tokio::test]
async fn test_rejected_orders_over_http() {
    let app = router(OrderService::in_memory(), "/api/v1");
    let user = Uuid::now_v7();

    let (status, _) = send(&app, Method::POST, "/api/v1/orders", Some(order_body(user, json!([])))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let unknown = json!([{"product": Uuid::now_v7(), "quantity": 1}]);
    let (status, _) = send(&app, Method::POST, "/api/v1/orders", Some(order_body(user, unknown))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, p) = send(&app, Method::POST, "/api/v1/products", Some(json!({"name": "Cup", "price": "5"}))).await;
    let zero = json!([{"product": p["id"], "quantity": 0}]);
    let (status, _) = send(&app, Method::POST, "/api/v1/orders", Some(order_body(user, zero))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, count) = send(&app, Method::GET, "/api/v1/orders/get/count", None).await;
    assert_eq!(count["orderCount"], 0);
    let (_, sales) = send(&app, Method::GET, "/api/v1/orders/get/totalsales", None).await;
    assert_eq!(sales["totalsales"], "0");
}

#[tokio::test]
async fn test_health_is_outside_api_prefix() {
    let app = router(OrderService::in_memory(), "/api/v1");
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}
