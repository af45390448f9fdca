//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use sized_cache::{api::create_router, AppState, ByteCache};
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app(capacity: u64) -> Router {
    create_router(AppState::new(ByteCache::new(capacity, None)))
}

async fn body_bytes(body: Body) -> Vec<u8> {
    axum::body::to_bytes(body, usize::MAX).await.unwrap().to_vec()
}

async fn body_to_json(body: Body) -> Value {
    serde_json::from_slice(&body_bytes(body).await).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Body) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn put_bytes(app: &Router, key: &str, size: usize) -> StatusCode {
    send(app, "PUT", &format!("/entries/{}", key), Body::from(vec![b'x'; size]))
        .await
        .status()
}

// == SET / GET ==

#[tokio::test]
async fn test_set_and_get_roundtrip() {
    let app = create_test_app(1024);

    let response = send(&app, "PUT", "/entries/greeting", Body::from("hello world")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["key"], "greeting");
    assert_eq!(json["size"], 11);

    let response = send(&app, "GET", "/entries/greeting", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/octet-stream"
    );
    assert_eq!(body_bytes(response.into_body()).await, b"hello world");
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let app = create_test_app(1024);

    let response = send(&app, "GET", "/entries/missing", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("missing"));
}

#[tokio::test]
async fn test_set_overwrites_value() {
    let app = create_test_app(1024);

    send(&app, "PUT", "/entries/k", Body::from("first")).await;
    send(&app, "PUT", "/entries/k", Body::from("second!")).await;

    let response = send(&app, "GET", "/entries/k", Body::empty()).await;
    assert_eq!(body_bytes(response.into_body()).await, b"second!");

    let stats = body_to_json(send(&app, "GET", "/stats", Body::empty()).await.into_body()).await;
    assert_eq!(stats["total_entries"], 1);
    assert_eq!(stats["usage"], 7);
}

#[tokio::test]
async fn test_set_entry_too_large() {
    let app = create_test_app(100);

    assert_eq!(put_bytes(&app, "huge", 101).await, StatusCode::PAYLOAD_TOO_LARGE);

    let response = send(&app, "GET", "/exists/huge", Body::empty()).await;
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["exists"], false);
}

#[tokio::test]
async fn test_set_body_above_default_limit() {
    let app = create_test_app(64 * 1024 * 1024);
    let size = 3 * 1024 * 1024;

    assert_eq!(put_bytes(&app, "big", size).await, StatusCode::OK);

    let response = send(&app, "GET", "/entries/big", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response.into_body()).await.len(), size);
}

#[tokio::test]
async fn test_set_too_large_returns_json_error() {
    let app = create_test_app(4 * 1024 * 1024);

    let response = send(
        &app,
        "PUT",
        "/entries/big",
        Body::from(vec![0u8; 5 * 1024 * 1024]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("big"));
}

// == Eviction ==

#[tokio::test]
async fn test_eviction_via_api() {
    let app = create_test_app(100);

    assert_eq!(put_bytes(&app, "A", 40).await, StatusCode::OK);
    assert_eq!(put_bytes(&app, "B", 40).await, StatusCode::OK);
    assert_eq!(put_bytes(&app, "C", 40).await, StatusCode::OK);

    let response = send(&app, "GET", "/entries/A", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Touch B so that C becomes the oldest
    let response = send(&app, "GET", "/entries/B", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(put_bytes(&app, "D", 50).await, StatusCode::OK);

    let stats = body_to_json(send(&app, "GET", "/stats", Body::empty()).await.into_body()).await;
    assert_eq!(stats["total_entries"], 1);
    assert_eq!(stats["usage"], 50);
    assert_eq!(stats["evictions"], 3);
}

#[tokio::test]
async fn test_capacity_shrink_evicts() {
    let app = create_test_app(100);

    for key in ["a", "b", "c", "d"] {
        put_bytes(&app, key, 20).await;
    }

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/capacity")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"capacity":50}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["capacity"], 50);
    assert_eq!(json["usage"], 40);
    assert_eq!(json["total_entries"], 2);
}

#[tokio::test]
async fn test_capacity_invalid_json() {
    let app = create_test_app(100);

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/capacity")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"capacity":"lots"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

// == DELETE ==

#[tokio::test]
async fn test_delete_endpoint_is_idempotent() {
    let app = create_test_app(1024);
    put_bytes(&app, "victim", 10).await;

    let response = send(&app, "DELETE", "/entries/victim", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["removed"], true);

    let response = send(&app, "DELETE", "/entries/victim", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["removed"], false);

    let response = send(&app, "GET", "/entries/victim", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clear_endpoint() {
    let app = create_test_app(1024);
    put_bytes(&app, "a", 10).await;
    put_bytes(&app, "b", 10).await;

    let response = send(&app, "DELETE", "/entries", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["removed"], 2);

    let stats = body_to_json(send(&app, "GET", "/stats", Body::empty()).await.into_body()).await;
    assert_eq!(stats["total_entries"], 0);
    assert_eq!(stats["usage"], 0);
}

// == STATS / HEALTH ==

#[tokio::test]
async fn test_stats_endpoint() {
    let app = create_test_app(1024);

    put_bytes(&app, "k", 8).await;
    send(&app, "GET", "/entries/k", Body::empty()).await; // hit
    send(&app, "GET", "/entries/nope", Body::empty()).await; // miss

    let response = send(&app, "GET", "/stats", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["capacity"], 1024);
    assert!((json["hit_rate"].as_f64().unwrap() - 0.5).abs() < 0.001);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(1024);

    let response = send(&app, "GET", "/health", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}
