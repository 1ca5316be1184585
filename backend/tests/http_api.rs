//! End-to-end tests of the REST API against an in-memory repository.

#![cfg(feature = "http-server")]

mod support;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use studio_analytics::db::LocalRepository;
use studio_analytics::http::{create_router, AppState};
use support::{session_rows, test_config};
use tower::ServiceExt;

fn app(strict: bool) -> Router {
    let state = AppState::new(Arc::new(LocalRepository::new()), test_config(strict));
    create_router(state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn upload_sessions(app: &Router) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/datasets",
        Some(json!({ "name": "January", "kind": "sessions", "rows": session_rows() })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = app(false);
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["cache"]["capacity"], 8);
}

#[tokio::test]
async fn test_upload_and_list() {
    let app = app(false);
    let id = upload_sessions(&app).await;
    assert_eq!(id, 1);

    let (status, body) = send(&app, Method::GET, "/v1/datasets", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["datasets"][0]["row_count"], 6);
    assert_eq!(body["datasets"][0]["kind"], "sessions");
}

#[tokio::test]
async fn test_view_endpoint() {
    let app = app(false);
    let id = upload_sessions(&app).await;

    let uri = format!(
        "/v1/datasets/{}/view?group_by=class&sort=fillRate&direction=desc&page_size=2&top=1&bottom=1",
        id
    );
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["groupBy"], "class");
    assert_eq!(body["groupCount"], 4);
    assert_eq!(body["rows"]["totalPages"], 2);
    assert_eq!(body["rows"]["items"][0]["label"], "Pilates");
    assert_eq!(body["rows"]["items"][0]["key"], json!(["Pilates"]));
    assert_eq!(body["extremes"]["top"][0]["label"], "Pilates");
    assert_eq!(body["extremes"]["bottom"][0]["label"], "Barre");
}

#[tokio::test]
async fn test_view_filters_by_trainer_list() {
    let app = app(false);
    let id = upload_sessions(&app).await;

    let uri = format!("/v1/datasets/{}/view?group_by=trainer&trainer=a,c", id);
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recordCount"], 4);
    assert_eq!(body["groupCount"], 2);
}

#[tokio::test]
async fn test_strict_view_rejects_unknown_sort() {
    let app = app(true);
    let id = upload_sessions(&app).await;

    let uri = format!("/v1/datasets/{}/view?sort=vibes", id);
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_VIEW");
}

#[tokio::test]
async fn test_unknown_dataset_is_404() {
    let app = app(false);
    let (status, body) = send(&app, Method::GET, "/v1/datasets/42/view", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_upload_rejects_unknown_kind() {
    let app = app(false);
    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/datasets",
        Some(json!({ "name": "x", "kind": "workouts", "rows": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_hierarchy_drilldown_and_record() {
    let app = app(false);
    let id = upload_sessions(&app).await;

    let uri = format!("/v1/datasets/{}/hierarchy?levels=class,classTrainer", id);
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["levels"], "class,classTrainer");
    assert_eq!(body["nodes"][0]["label"], "Pilates");
    assert_eq!(body["nodes"][0]["children"][0]["parent"], json!(["Pilates"]));

    let uri = format!("/v1/datasets/{}/drilldown?key=Yoga&group_by=class", id);
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["members"], json!([0, 1]));
    assert_eq!(body["records"][1]["Checked In"], 6);

    let uri = format!("/v1/datasets/{}/drilldown?key=Zumba&group_by=class", id);
    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!("/v1/datasets/{}/records/2", id);
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], "Pilates • B • 2024-01-16 • 18:00");
}

#[tokio::test]
async fn test_malformed_query_is_json_bad_request() {
    let app = app(false);
    let id = upload_sessions(&app).await;

    for uri in [
        format!("/v1/datasets/{}/hierarchy", id),
        format!("/v1/datasets/{}/drilldown?group_by=class", id),
        format!("/v1/datasets/{}/view?page=first", id),
    ] {
        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["code"], "BAD_REQUEST", "{}", uri);
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    }
}

#[tokio::test]
async fn test_malformed_upload_body_is_json_bad_request() {
    let app = app(false);
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/datasets",
        Some(json!({ "name": "x", "kind": "sessions" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_delete_dataset() {
    let app = app(false);
    let id = upload_sessions(&app).await;

    let uri = format!("/v1/datasets/{}", id);
    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "January");

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
