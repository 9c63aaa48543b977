use std::num::NonZeroUsize;
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tablero::application::pagination::PageSizeBounds;
use tablero::application::resources::ResourceService;
use tablero::cache::{CacheConfig, MemoryStore};
use tablero::infra::catalog::InMemoryCatalog;
use tablero::infra::http::{ApiState, REQUEST_ID_HEADER, build_router};
use tablero::util::query;
use tower::ServiceExt;

fn tasks() -> Value {
    let records: Vec<Value> = (1..=30)
        .map(|id| {
            let status = match id % 3 {
                0 => "todo",
                1 => "in-progress",
                _ => "done",
            };
            json!({"id": id, "titulo": format!("Tarea {id}"), "status": status})
        })
        .collect();
    json!({
        "tasks": records,
        "users": [
            {"id": 1, "nombre": "Juan Pérez", "activo": true},
            {"id": 2, "nombre": "Ana Ruiz", "activo": false},
            {"id": 3, "nombre": "Juana Díaz", "activo": true}
        ]
    })
}

fn app_with(driver: &str, bounds: PageSizeBounds) -> Router {
    let catalog = InMemoryCatalog::from_seed(tasks()).expect("seed");
    let config = CacheConfig {
        driver: driver.to_string(),
        ..CacheConfig::default()
    };
    let store = Arc::new(MemoryStore::new(NonZeroUsize::new(64).expect("capacity")));
    let service = ResourceService::new(Arc::new(catalog), store, config, bounds);
    build_router(ApiState::new(service))
}

fn app() -> Router {
    app_with("memory", PageSizeBounds::default())
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).expect("request should build"))
        .await
        .expect("router should respond");

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should read");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

#[tokio::test]
async fn health_returns_no_content_with_request_id() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
}

#[tokio::test]
async fn listing_uses_default_page_size() {
    let (status, body) = get(&app(), "/api/tasks").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().expect("data").len(), 10);
    assert_eq!(body["meta"]["per_page"], 10);
    assert_eq!(body["meta"]["total"], 30);
    assert_eq!(body["meta"]["last_page"], 3);
    assert_eq!(body["meta"]["from"], 1);
}

#[tokio::test]
async fn page_size_is_clamped_never_rejected() {
    let app = app();

    let (status, body) = get(&app, "/api/tasks?per_page=500").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["per_page"], 100);

    let (_, body) = get(&app, "/api/tasks?per_page=0").await;
    assert_eq!(body["meta"]["per_page"], 1);

    let (_, body) = get(&app, "/api/tasks?per_page=abc&page=-3").await;
    assert_eq!(body["meta"]["per_page"], 10);
    assert_eq!(body["meta"]["current_page"], 1);
}

#[tokio::test]
async fn configured_bounds_apply() {
    let app = app_with(
        "memory",
        PageSizeBounds {
            min: 5,
            max: 20,
            default: 15,
        },
    );

    let (_, body) = get(&app, "/api/tasks").await;
    assert_eq!(body["meta"]["per_page"], 15);
    let (_, body) = get(&app, "/api/tasks?per_page=2").await;
    assert_eq!(body["meta"]["per_page"], 5);
}

#[tokio::test]
async fn filters_use_the_bracketed_query_format() {
    let filter = query::serialize(&json!({"filter": {"status": ["todo", "done"]}}));
    assert_eq!(filter, "filter%5Bstatus%5D=todo%2Cdone");

    let (status, body) = get(&app(), &format!("/api/tasks?{filter}&per_page=100")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 20);
    for record in body["data"].as_array().expect("data") {
        assert_ne!(record["status"], "in-progress");
    }
}

#[tokio::test]
async fn text_filters_and_sort_combine() {
    let (_, body) = get(&app(), "/api/users?filter[nombre]=juan&sort=-id").await;

    let ids: Vec<i64> = body["data"]
        .as_array()
        .expect("data")
        .iter()
        .map(|record| record["id"].as_i64().expect("id"))
        .collect();
    assert_eq!(ids, vec![3, 1]);
}

#[tokio::test]
async fn created_records_show_up_after_cached_listing() {
    let app = app();

    let (_, before) = get(&app, "/api/users").await;
    assert_eq!(before["meta"]["total"], 3);

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(json!({"nombre": "Luis", "activo": true})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 4);

    let (_, after) = get(&app, "/api/users").await;
    assert_eq!(after["meta"]["total"], 4);
}

#[tokio::test]
async fn clearing_reports_scope_for_the_driver() {
    let tagged = app_with("redis", PageSizeBounds::default());
    let (status, body) = send(&tagged, Method::DELETE, "/api/tasks/cache", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"resource": "tasks", "scope": "tags"}));

    let untagged = app_with("file", PageSizeBounds::default());
    let (_, body) = send(&untagged, Method::DELETE, "/api/tasks/cache", None).await;
    assert_eq!(body["scope"], "all");
}

#[tokio::test]
async fn unknown_resource_returns_json_error() {
    let (status, body) = get(&app(), "/api/ghosts").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
    assert_eq!(body["error"]["hint"], "ghosts");
}

#[tokio::test]
async fn invalid_resource_name_is_rejected() {
    let (status, body) = get(&app(), "/api/Tasks").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_input");
}

#[tokio::test]
async fn resource_index_lists_collections() {
    let (status, body) = get(&app(), "/api").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"data": ["tasks", "users"]}));
}

#[tokio::test]
async fn create_without_id_after_largest_id_is_rejected() {
    let app = app();

    let (status, _) = send(&app, Method::POST, "/api/users", Some(json!({"id": i64::MAX}))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::POST, "/api/users", Some(json!({"nombre": "Eva"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_input");
}
