use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

use chreg::api::models::{ConflictsResponse, HandlerList, HealthResponse, ValuesResponse};
use chreg::api::{router, state::AppState};
use chreg::config::Config;
use chreg::handlers::{HandlerRecord, Registry};

/// Memory-backed config, parsed the way a config file would be
fn create_test_config() -> Config {
    let config_toml = r#"
[server]
bind_addr = "127.0.0.1:0"

[store]
backend = "memory"
    "#;

    toml::from_str(config_toml).expect("Failed to parse test config")
}

fn build_test_app() -> Router {
    let registry = Arc::new(Registry::in_memory());
    router(AppState::new(create_test_config(), registry))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_handler(handler: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/handlers")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(handler.to_string()))
        .unwrap()
}

fn viewer() -> Value {
    json!({
        "id": "com.acme.viewer",
        "owner_storage_id": 7,
        "class_name": "com.acme.Viewer",
        "types": ["text/html", "text/plain"],
        "suffixes": [".html", ".txt"],
        "actions": ["open", "edit"],
        "action_names": [
            { "locale": "en", "names": ["Open", "Edit"] },
            { "locale": "fr", "names": ["Ouvrir", "Modifier"] }
        ],
        "accesses": ["com.acme"]
    })
}

#[tokio::test]
async fn test_health() {
    let app = build_test_app();
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);

    let health: HealthResponse = serde_json::from_value(body).unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.handlers, 0);
}

#[tokio::test]
async fn test_register_and_get() {
    let app = build_test_app();

    let (status, body) = send(&app, post_handler(viewer())).await;
    assert_eq!(status, StatusCode::CREATED);
    let registered: HandlerRecord = serde_json::from_value(body).unwrap();
    assert_eq!(registered.id, "com.acme.viewer");
    assert_eq!(registered.action_name("edit", "fr"), Some("Modifier"));

    let (status, body) = send(&app, get("/handlers/com.acme.viewer")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["class_name"], "com.acme.Viewer");

    let (status, _) = send(&app, get("/handlers/com.acme")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        get("/handlers/com.acme.viewer.html?caller=com.acme.app&mode=prefix"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "com.acme.viewer");

    let (status, _) = send(&app, get("/handlers/com.acme.viewer?mode=fuzzy")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_conflicting_registration_returns_409() {
    let app = build_test_app();
    send(&app, post_handler(viewer())).await;

    let mut nested = viewer();
    nested["id"] = json!("com.acme.viewer.pdf");
    let (status, body) = send(&app, post_handler(nested)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
    assert_eq!(body["conflicts"], json!(["com.acme.viewer"]));

    let (status, body) = send(&app, get("/conflicts/com.acme")).await;
    assert_eq!(status, StatusCode::OK);
    let conflicts: ConflictsResponse = serde_json::from_value(body).unwrap();
    assert_eq!(conflicts.conflicts.len(), 1);
}

#[tokio::test]
async fn test_invalid_registration_returns_400() {
    let app = build_test_app();

    let mut invalid = viewer();
    invalid["id"] = json!("");
    let (status, body) = send(&app, post_handler(invalid)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ARGUMENT");

    let mut mismatched = viewer();
    mismatched["action_names"] = json!([{ "locale": "en", "names": ["Open"] }]);
    let (status, _) = send(&app, post_handler(mismatched)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_respects_access_list() {
    let app = build_test_app();
    send(&app, post_handler(viewer())).await;

    let (status, body) = send(
        &app,
        get("/search?caller=com.acme.sub&field=types&value=text/plain"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let list: HandlerList = serde_json::from_value(body).unwrap();
    assert_eq!(list.handlers.len(), 1);

    let (_, body) = send(
        &app,
        get("/search?caller=com.other&field=1&value=text/plain"),
    )
    .await;
    let list: HandlerList = serde_json::from_value(body).unwrap();
    assert!(list.handlers.is_empty());

    let (status, _) = send(&app, get("/search?field=types&value=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/search?field=colour&value=red")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_values_and_array_fields() {
    let app = build_test_app();
    send(&app, post_handler(viewer())).await;

    let (status, body) = send(&app, get("/values/suffixes?caller=com.acme")).await;
    assert_eq!(status, StatusCode::OK);
    let values: ValuesResponse = serde_json::from_value(body).unwrap();
    assert_eq!(values.values, vec![".html", ".txt"]);

    let (_, body) = send(&app, get("/values/suffixes?caller=org.other")).await;
    let values: ValuesResponse = serde_json::from_value(body).unwrap();
    assert!(values.values.is_empty());

    let (status, body) = send(&app, get("/handlers/com.acme.viewer/fields/action_map")).await;
    assert_eq!(status, StatusCode::OK);
    let values: ValuesResponse = serde_json::from_value(body).unwrap();
    assert_eq!(values.values, vec!["Open", "Edit", "Ouvrir", "Modifier"]);

    let (status, _) = send(&app, get("/handlers/com.acme.viewer/fields/id")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_owner_routes() {
    let app = build_test_app();
    send(&app, post_handler(viewer())).await;
    let mut editor = viewer();
    editor["id"] = json!("com.acme.editor");
    editor["class_name"] = json!("com.acme.Editor");
    send(&app, post_handler(editor)).await;

    let (_, body) = send(&app, get("/owners/7/handlers")).await;
    let list: HandlerList = serde_json::from_value(body).unwrap();
    assert_eq!(list.handlers.len(), 2);

    let (_, body) = send(&app, get("/owners/7/handlers?class=com.acme.Editor")).await;
    let list: HandlerList = serde_json::from_value(body).unwrap();
    assert_eq!(list.handlers[0].id, "com.acme.editor");

    let (status, _) = send(&app, get("/owners/7/handlers?class=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, delete("/owners/7/handlers")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], 2);
}

#[tokio::test]
async fn test_resolve_by_url() {
    let app = build_test_app();
    send(&app, post_handler(viewer())).await;

    let (status, body) = send(
        &app,
        get("/resolve?caller=com.acme.app&url=https://example.com/index.HTML&action=open"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "com.acme.viewer");

    let (status, _) = send(
        &app,
        get("/resolve?caller=com.acme.app&url=https://example.com/logo.png"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unregister() {
    let app = build_test_app();
    send(&app, post_handler(viewer())).await;

    let (status, _) = send(&app, delete("/handlers/com.acme.viewer")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, delete("/handlers/com.acme.viewer")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, get("/metrics")).await;
    assert_eq!(body["registrations"], 1);
    assert_eq!(body["unregistrations"], 1);
}
