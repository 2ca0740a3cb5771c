use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use mod_catalog::error::StoreError;
use mod_catalog::observability::{metrics::Metrics, Logger};
use mod_catalog::protocol::{ModDocument, ModDraft, Page, UpsertOutcome};
use mod_catalog::router::{build_router, AppState};
use mod_catalog::store::{MemoryModStore, ModStore};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn app_with(store: Arc<dyn ModStore>, legacy_pagination: bool) -> Router {
    let state = AppState::new(
        store,
        Logger::new("catalog-test".to_string()),
        Arc::new(Metrics::new().unwrap()),
        legacy_pagination,
    );
    build_router(state)
}

fn app() -> (Router, Arc<MemoryModStore>) {
    let store = Arc::new(MemoryModStore::new());
    (app_with(store.clone(), false), store)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = match body {
        Some(v) => Body::from(v.to_string()),
        None => Body::empty(),
    };
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

async fn put_mod(app: &Router, body: Value) -> (StatusCode, Value) {
    send(app, Method::PUT, "/create", Some(body)).await
}

fn names(docs: &Value) -> Vec<String> {
    docs.as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn repeated_creates_converge_to_one_record() {
    let (app, store) = app();
    let payload = json!({"name": "skyboxes", "description": "HD skies"});

    let (status, first) = put_mod(&app, payload.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["created_at"], first["updated_at"]);

    for _ in 0..3 {
        tokio::time::sleep(Duration::from_millis(5)).await;
        let (status, body) = put_mod(&app, payload.clone()).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);
    }

    assert_eq!(store.len().await, 1);
    let (status, found) = send(&app, Method::GET, "/find/skyboxes", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["created_at"], first["created_at"]);
    assert_eq!(found["_id"], first["_id"]);
    assert_ne!(found["updated_at"], first["updated_at"]);
}

#[tokio::test]
async fn created_record_round_trips() {
    let (app, _) = app();
    let payload = json!({"name": "hud", "description": "minimal hud", "image": "https://cdn.example.org/hud.png"});

    let (status, _) = put_mod(&app, payload).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, found) = send(&app, Method::GET, "/find/hud", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["name"], "hud");
    assert_eq!(found["description"], "minimal hud");
    assert_eq!(found["image"], "https://cdn.example.org/hud.png");
}

#[tokio::test]
async fn pagination_windows_over_45_records() {
    let store = Arc::new(MemoryModStore::new());
    let app = app_with(store.clone(), false);
    for i in 0..45 {
        let (status, _) = put_mod(&app, json!({"name": format!("mod-{:02}", i)})).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, page1) = send(&app, Method::GET, "/mods?page=1", None).await;
    assert_eq!(status, StatusCode::OK);
    let expected: Vec<String> = (0..20).map(|i| format!("mod-{:02}", i)).collect();
    assert_eq!(names(&page1), expected);

    let (_, page2) = send(&app, Method::GET, "/mods?page=2", None).await;
    let expected: Vec<String> = (20..40).map(|i| format!("mod-{:02}", i)).collect();
    assert_eq!(names(&page2), expected);

    let (_, page3) = send(&app, Method::GET, "/mods?page=3", None).await;
    let expected: Vec<String> = (40..45).map(|i| format!("mod-{:02}", i)).collect();
    assert_eq!(names(&page3), expected);

    let (_, page4) = send(&app, Method::GET, "/mods?page=4", None).await;
    assert!(names(&page4).is_empty());

    let (_, all) = send(&app, Method::GET, "/mods", None).await;
    assert_eq!(names(&all).len(), 45);

    // Non-positive and non-numeric pages clamp to the first page.
    let (_, clamped) = send(&app, Method::GET, "/mods?page=0", None).await;
    assert_eq!(names(&clamped), names(&page1));
    let (_, clamped) = send(&app, Method::GET, "/mods?page=abc", None).await;
    assert_eq!(names(&clamped), names(&page1));

    // Legacy mode scans everything for the same inputs.
    let legacy = app_with(store, true);
    let (_, scanned) = send(&legacy, Method::GET, "/mods?page=0", None).await;
    assert_eq!(names(&scanned).len(), 45);
    let (_, scanned) = send(&legacy, Method::GET, "/mods?page=abc", None).await;
    assert_eq!(names(&scanned).len(), 45);
}

#[tokio::test]
async fn empty_collection_lists_as_empty_array() {
    let (app, _) = app();
    let (status, body) = send(&app, Method::GET, "/mods", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let (app, store) = app();
    put_mod(&app, json!({"name": "shaders"})).await;

    let (status, body) = send(&app, Method::DELETE, "/delete/shaders", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    assert!(store.is_empty().await);

    let (status, body) = send(&app, Method::GET, "/find/shaders", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn unknown_names_are_not_found() {
    let (app, _) = app();

    let (status, body) = send(&app, Method::GET, "/find/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "document not exists"}));

    let (status, body) = send(&app, Method::DELETE, "/delete/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "document not exists"}));
}

#[tokio::test]
async fn update_preserves_creation_time() {
    let (app, _) = app();
    put_mod(&app, json!({"name": "X", "description": "first", "image": "a.png"})).await;
    let (_, before) = send(&app, Method::GET, "/find/X", None).await;

    tokio::time::sleep(Duration::from_millis(10)).await;
    let (status, _) = put_mod(&app, json!({"name": "X", "description": "second"})).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, after) = send(&app, Method::GET, "/find/X", None).await;
    assert_eq!(after["created_at"], before["created_at"]);
    assert_eq!(after["description"], "second");
    // An omitted image replaces the stored one.
    assert!(after.get("image").is_none());

    let before_doc: ModDocument = serde_json::from_value(before).unwrap();
    let after_doc: ModDocument = serde_json::from_value(after).unwrap();
    assert!(after_doc.updated_at > before_doc.updated_at);
    assert!(after_doc.created_at <= after_doc.updated_at);
}

#[tokio::test]
async fn bad_input_is_rejected_before_mutation() {
    let (app, store) = app();

    let (status, body) = put_mod(&app, json!({"description": "no name"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("missing"));

    let (status, _) = put_mod(&app, json!({"name": "   "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = Request::builder()
        .method(Method::PUT)
        .uri("/create")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert!(store.is_empty().await);
}

#[tokio::test]
async fn malformed_list_query_is_read_as_unparseable_page() {
    let store = Arc::new(MemoryModStore::new());
    let app = app_with(store.clone(), false);
    for i in 0..25 {
        put_mod(&app, json!({"name": format!("mod-{:02}", i)})).await;
    }

    let (status, clamped) = send(&app, Method::GET, "/mods?page=1&page=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&clamped).len(), 20);
    assert_eq!(names(&clamped)[0], "mod-00");

    let legacy = app_with(store, true);
    let (status, scanned) = send(&legacy, Method::GET, "/mods?page=1&page=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&scanned).len(), 25);
}

#[tokio::test]
async fn invalid_path_names_use_error_envelope() {
    let (app, _) = app();

    let (status, body) = send(&app, Method::GET, "/find/%FF", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, Method::DELETE, "/delete/%FF", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn unknown_routes_use_error_envelope() {
    let (app, _) = app();
    let (status, body) = send(&app, Method::GET, "/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "route not found"}));
}

/// Store that fails every operation with a non-not-found error.
struct BrokenStore;

#[async_trait]
impl ModStore for BrokenStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::transient("connection refused"))
    }
    async fn list(&self, _page: Option<Page>) -> Result<Vec<ModDocument>, StoreError> {
        Err(StoreError::permanent("cannot decode row"))
    }
    async fn find_by_name(&self, _name: &str) -> Result<ModDocument, StoreError> {
        Err(StoreError::transient("connection reset"))
    }
    async fn upsert(&self, _draft: ModDraft) -> Result<UpsertOutcome, StoreError> {
        Err(StoreError::permanent("write conflict"))
    }
    async fn delete_by_name(&self, _name: &str) -> Result<ModDocument, StoreError> {
        Err(StoreError::permanent("write conflict"))
    }
    fn backend(&self) -> &'static str {
        "broken"
    }
}

#[tokio::test]
async fn store_failures_map_per_operation() {
    let app = app_with(Arc::new(BrokenStore), false);

    let (status, body) = send(&app, Method::GET, "/mods?page=1", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());

    let (status, body) = put_mod(&app, json!({"name": "any"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, Method::DELETE, "/delete/any", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/find/any", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
