// ============================================================================
// REST API Tests
// ============================================================================
//
// HTTP contract of the message endpoints and the health/metrics routes:
// - POST /api/v1/create - 201 with id, validation, create/produce failures
// - GET /api/v1/messages, GET /api/v1/messages/:id
// - GET /api/v1/messages/stats
// - PUT /api/v1/messages/:id/process
// - GET /health, GET /health/ready, GET /metrics
//
// ============================================================================

use std::sync::atomic::Ordering;

use reqwest::StatusCode;
use serde_json::{json, Value};
use serial_test::serial;
use uuid::Uuid;

use test_utils::spawn_app;

fn create_client() -> reqwest::Client {
    reqwest::Client::builder().build().unwrap()
}

async fn create(client: &reqwest::Client, app: &test_utils::TestApp, body: Value) -> reqwest::Response {
    client
        .post(app.url("/api/v1/create"))
        .json(&body)
        .send()
        .await
        .unwrap()
}

// ============================================================================
// POST /api/v1/create
// ============================================================================

#[tokio::test]
#[serial]
async fn test_create_returns_id_and_message_is_readable() {
    let app = spawn_app().await;
    let client = create_client();

    let response = create(&client, &app, json!({"message": "hello"})).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    let id = body["id"].as_str().unwrap().to_string();

    let response = client
        .get(app.url(&format!("/api/v1/messages/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let message: Value = response.json().await.unwrap();
    assert_eq!(message["id"], id);
    assert_eq!(message["message"], "hello");
    assert_eq!(message["processed"], false);
    assert!(message["processed_at"].is_null());
    assert!(message["created_at"].is_string());

    assert_eq!(app.publisher.published_count(), 1);
}

#[tokio::test]
#[serial]
async fn test_create_rejects_invalid_bodies() {
    let app = spawn_app().await;
    let client = create_client();

    for body in [json!({"message": ""}), json!({"message": "   "}), json!({}), json!({"message": 5})] {
        let response = create(&client, &app, body.clone()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);

        let error: Value = response.json().await.unwrap();
        assert_eq!(error["error_code"], "VALIDATION_ERROR");
    }

    let oversized = "x".repeat(courier_config::MAX_MESSAGE_SIZE + 1);
    let response = create(&client, &app, json!({ "message": oversized })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(app.url("/api/v1/create"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(app.publisher.published_count(), 0);
}

#[tokio::test]
#[serial]
async fn test_create_store_failure_is_500() {
    let app = spawn_app().await;
    let client = create_client();
    app.store.fail_create.store(true, Ordering::SeqCst);

    let response = create(&client, &app, json!({"message": "hello"})).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let error: Value = response.json().await.unwrap();
    assert_eq!(error["error_code"], "CANNOT_CREATE_MESSAGE");
    assert!(error.get("id").is_none());
    assert_eq!(app.publisher.published_count(), 0);
}

#[tokio::test]
#[serial]
async fn test_create_publish_failure_reports_stored_id() {
    let app = spawn_app().await;
    let client = create_client();
    app.publisher.set_failing(true);

    let response = create(&client, &app, json!({"message": "orphan"})).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let error: Value = response.json().await.unwrap();
    assert_eq!(error["error_code"], "CANNOT_PRODUCE_MESSAGE");
    let id = error["id"].as_str().unwrap();

    let message: Value = client
        .get(app.url(&format!("/api/v1/messages/{}", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(message["message"], "orphan");
    assert_eq!(message["processed"], false);
}

// ============================================================================
// GET /api/v1/messages
// ============================================================================

#[tokio::test]
#[serial]
async fn test_list_messages() {
    let app = spawn_app().await;
    let client = create_client();

    let empty: Vec<Value> = client
        .get(app.url("/api/v1/messages"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(empty.is_empty());

    for content in ["one", "two"] {
        create(&client, &app, json!({ "message": content })).await;
    }

    let messages: Vec<Value> = client
        .get(app.url("/api/v1/messages"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let contents: Vec<_> = messages.iter().map(|m| m["message"].as_str().unwrap()).collect();
    assert_eq!(contents, vec!["one", "two"]);
}

#[tokio::test]
#[serial]
async fn test_get_message_errors() {
    let app = spawn_app().await;
    let client = create_client();

    let response = client
        .get(app.url("/api/v1/messages/not-a-uuid"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .get(app.url(&format!("/api/v1/messages/{}", Uuid::new_v4())))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["error_code"], "MESSAGE_NOT_FOUND");
    assert_eq!(error["status"], 404);
}

// ============================================================================
// PUT /api/v1/messages/:id/process and GET /api/v1/messages/stats
// ============================================================================

#[tokio::test]
#[serial]
async fn test_mark_processed_and_stats() {
    let app = spawn_app().await;
    let client = create_client();

    let body: Value = create(&client, &app, json!({"message": "hello"}))
        .await
        .json()
        .await
        .unwrap();
    let id = body["id"].as_str().unwrap().to_string();
    create(&client, &app, json!({"message": "other"})).await;

    let response = client
        .put(app.url(&format!("/api/v1/messages/{}/process", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Message successfully marked as processed");
    assert_eq!(body["processed_now"], true);

    let message: Value = client
        .get(app.url(&format!("/api/v1/messages/{}", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(message["processed"], true);
    let processed_at = message["processed_at"].clone();
    assert!(processed_at.is_string());

    // Second mark is a successful no-op
    let body: Value = client
        .put(app.url(&format!("/api/v1/messages/{}/process", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["processed_now"], false);

    let message: Value = client
        .get(app.url(&format!("/api/v1/messages/{}", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(message["processed_at"], processed_at);

    let stats: Value = client
        .get(app.url("/api/v1/messages/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["processed_messages"], 1);
}

#[tokio::test]
#[serial]
async fn test_mark_unknown_message_is_404() {
    let app = spawn_app().await;
    let client = create_client();

    let response = client
        .put(app.url(&format!("/api/v1/messages/{}/process", Uuid::new_v4())))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .put(app.url("/api/v1/messages/42/process"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
async fn test_storage_failure_hides_details() {
    let app = spawn_app().await;
    let client = create_client();
    app.store.fail_reads.store(true, Ordering::SeqCst);

    let response = client
        .get(app.url("/api/v1/messages/stats"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let error: Value = response.json().await.unwrap();
    assert_eq!(error["error_code"], "CANNOT_GET_MESSAGE");
    assert!(!error["error"].as_str().unwrap().contains("pool"));
}

// ============================================================================
// Health and metrics
// ============================================================================

#[tokio::test]
#[serial]
async fn test_health_endpoints() {
    let app = spawn_app().await;
    let client = create_client();

    let response = client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "courier");

    let response = client.get(app.url("/health/ready")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    app.store.fail_reads.store(true, Ordering::SeqCst);
    let response = client.get(app.url("/health/ready")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
#[serial]
async fn test_metrics_endpoint_exposes_counters() {
    let app = spawn_app().await;
    let client = create_client();

    create(&client, &app, json!({"message": "counted"})).await;

    let response = client.get(app.url("/metrics")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = response.text().await.unwrap();
    assert!(text.contains("courier_messages_created_total"));
}
