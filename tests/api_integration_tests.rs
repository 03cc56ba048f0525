//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint, in-process through
//! `tower::ServiceExt::oneshot` and over TCP against a live server.

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tiered_cache::engine::EngineContext;
use tiered_cache::{
    create_router, AppState, CacheManager, Config, DiskEngine, EngineKind, EngineOptions,
    MemoryEngine,
};
use tower::ServiceExt;

// == Helper Functions ==

fn create_state(options: EngineOptions) -> AppState {
    let mut manager = CacheManager::default();
    for kind in [EngineKind::Memory, EngineKind::Session] {
        let engine =
            MemoryEngine::with_context(kind, options.clone(), &EngineContext::default()).unwrap();
        manager.register_engine(Box::new(engine));
    }
    AppState::new(manager)
}

fn create_test_app() -> Router {
    create_router(create_state(EngineOptions::default()))
}

fn put_set(body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri("/set")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// == SET Endpoint Tests ==

#[tokio::test]
async fn test_set_endpoint_success() {
    let app = create_test_app();

    let response = app
        .oneshot(put_set(json!({"key": "test_key", "value": "test_value"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert!(json["message"].as_str().unwrap().contains("test_key"));
    assert_eq!(json["engine"], "memory");
    assert!(!json["reason"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_set_endpoint_with_engine_override() {
    let app = create_test_app();

    let response = app
        .oneshot(put_set(
            json!({"key": "k", "value": "v", "ttl_ms": 60000, "engine": "session"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["engine"], "session");
    assert_eq!(json["reason"], "explicit engine override");
}

#[tokio::test]
async fn test_set_endpoint_capacity_exceeded() {
    let app = create_router(create_state(EngineOptions::default().with_max_size(16)));

    let response = app
        .oneshot(put_set(json!({"key": "big", "value": "x".repeat(64)})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INSUFFICIENT_STORAGE);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("Capacity exceeded"));
}

// == GET Endpoint Tests ==

#[tokio::test]
async fn test_get_endpoint_success() {
    let app = create_test_app();

    let set_response = app
        .clone()
        .oneshot(put_set(json!({"key": "get_key", "value": "get_value"})))
        .await
        .unwrap();
    assert_eq!(set_response.status(), StatusCode::OK);

    let get_response = app.oneshot(get("/get/get_key")).await.unwrap();

    assert_eq!(get_response.status(), StatusCode::OK);
    let json = body_to_json(get_response.into_body()).await;
    assert_eq!(json["key"].as_str().unwrap(), "get_key");
    assert_eq!(json["value"].as_str().unwrap(), "get_value");
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let app = create_test_app();

    let response = app.oneshot(get("/get/nonexistent_key")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == DELETE Endpoint Tests ==

#[tokio::test]
async fn test_delete_endpoint_success() {
    let app = create_test_app();

    let set_response = app
        .clone()
        .oneshot(put_set(json!({"key": "delete_key", "value": "delete_value"})))
        .await
        .unwrap();
    assert_eq!(set_response.status(), StatusCode::OK);

    let del_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/del/delete_key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(del_response.status(), StatusCode::OK);

    let get_response = app.oneshot(get("/get/delete_key")).await.unwrap();
    assert_eq!(get_response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_endpoint_not_found() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/del/nonexistent_key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == KEYS and CLEANUP Endpoint Tests ==

#[tokio::test]
async fn test_keys_endpoint_spans_engines() {
    let app = create_test_app();

    for body in [
        json!({"key": "b", "value": "1"}),
        json!({"key": "a", "value": "2", "engine": "session"}),
    ] {
        let response = app.clone().oneshot(put_set(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.oneshot(get("/keys")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["count"], 2);
    assert_eq!(json["keys"], json!(["a", "b"]));
}

#[tokio::test]
async fn test_cleanup_endpoint_removes_expired() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(put_set(json!({"key": "brief", "value": "v", "ttl_ms": 50})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(120)).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/cleanup")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response.into_body()).await["removed"], 1);

    let response = app.oneshot(get("/stats")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["expirations"], 1);
    assert_eq!(json["total_entries"], 0);
}

// == STATS Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint() {
    let app = create_test_app();

    let _ = app
        .clone()
        .oneshot(put_set(json!({"key": "stats_key", "value": "stats_value"})))
        .await
        .unwrap();

    // Hit
    let _ = app.clone().oneshot(get("/get/stats_key")).await.unwrap();
    // Miss
    let _ = app.clone().oneshot(get("/get/nonexistent")).await.unwrap();

    let response = app.oneshot(get("/stats")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;

    assert_eq!(json["hits"].as_u64().unwrap(), 1);
    assert_eq!(json["misses"].as_u64().unwrap(), 1);
    assert_eq!(json["writes"].as_u64().unwrap(), 1);
    assert_eq!(json["total_entries"].as_u64().unwrap(), 1);
    assert!(json.get("hit_rate").is_some());
    assert_eq!(json["selector"]["misses"], 1);
    assert_eq!(json["engines"].as_array().unwrap().len(), 2);
    assert_eq!(json["engines"][0]["strategy"]["strategy"], "lru");
}

// == HEALTH Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"].as_str().unwrap(), "healthy");
    assert!(json.get("timestamp").is_some());
}

// == Error Response Tests ==

#[tokio::test]
async fn test_invalid_json_request() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/set")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"invalid json"#))
                .unwrap(),
        )
        .await
        .unwrap();

    // Axum returns 422 for JSON parsing errors by default
    assert!(
        response.status() == StatusCode::BAD_REQUEST
            || response.status() == StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn test_empty_key_request() {
    let app = create_test_app();

    let response = app
        .oneshot(put_set(json!({"key": "", "value": "test"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_unregistered_engine_request() {
    let app = create_test_app();

    let response = app
        .oneshot(put_set(json!({"key": "k", "value": "v", "engine": "indexeddb"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// == TTL Expiration via API Tests ==

#[tokio::test]
async fn test_ttl_expiration_via_api() {
    let app = create_test_app();

    let set_response = app
        .clone()
        .oneshot(put_set(
            json!({"key": "ttl_test", "value": "expires_soon", "ttl_ms": 300}),
        ))
        .await
        .unwrap();
    assert_eq!(set_response.status(), StatusCode::OK);

    let get_response = app.clone().oneshot(get("/get/ttl_test")).await.unwrap();
    assert_eq!(get_response.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(400)).await;

    // Lazy expiry: no cleanup has run
    let get_response = app.oneshot(get("/get/ttl_test")).await.unwrap();
    assert_eq!(get_response.status(), StatusCode::NOT_FOUND);
}

// == Persistent Engine Tests ==

#[tokio::test]
async fn test_from_config_with_data_dir_persists() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        data_dir: Some(dir.path().to_path_buf()),
        ..Config::default()
    };

    let app = create_router(AppState::from_config(&config).await.unwrap());
    let response = app
        .oneshot(put_set(
            json!({"key": "doc", "value": "{\"n\":1}", "engine": "indexeddb"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A fresh state over the same directory sees the record
    let app = create_router(AppState::from_config(&config).await.unwrap());
    let response = app.oneshot(get("/get/doc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response.into_body()).await["value"], "{\"n\":1}");
    assert!(dir.path().join("indexeddb").is_dir());
}

// == Live Server Tests ==

#[tokio::test]
async fn test_live_server_round_trip() {
    let dir = TempDir::new().unwrap();
    let mut manager = CacheManager::default();
    manager.register_engine(Box::new(MemoryEngine::new(EngineOptions::default()).unwrap()));
    let disk = DiskEngine::open(
        EngineKind::IndexedDb,
        dir.path(),
        EngineOptions::default(),
        &EngineContext::default(),
    )
    .await
    .unwrap();
    manager.register_engine(Box::new(disk));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, create_router(AppState::new(manager)))
            .await
            .unwrap();
    });

    let client = reqwest::Client::new();
    let base = format!("http://{}", addr);

    // Large enough that only the persistent engine can take it
    let blob = "QUJD".repeat(300_000);
    let response = client
        .put(format!("{}/set", base))
        .json(&json!({"key": "blob", "value": blob}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["engine"], "indexeddb");

    let response = client
        .put(format!("{}/set", base))
        .json(&json!({"key": "flash", "value": "hi", "ttl_ms": 2000}))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["engine"], "memory");

    let body: Value = client
        .get(format!("{}/get/blob", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["value"].as_str().unwrap().len(), 1_200_000);

    let response = client
        .delete(format!("{}/del/blob", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let response = client
        .get(format!("{}/get/blob", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    let body: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "healthy");

    server.abort();
}
