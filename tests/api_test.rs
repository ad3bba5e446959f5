//! Integration tests for the snapshot HTTP API

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use futures::StreamExt;
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;

use heartbeat_monitor::{
    api::AppState, collector::MembershipTable, config::Config, models::MembershipEvent,
};

fn setup_app() -> (axum::Router, MembershipTable) {
    let table = MembershipTable::new();
    let state = AppState::new(table.clone(), Config::default());

    (heartbeat_monitor::create_router(state), table)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup_app();

    let (status, body) = get(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_root_renders_html_listing() {
    let (app, table) = setup_app();
    table.upsert("10.0.0.1", "host-A", Utc::now()).await;
    table.upsert("10.0.0.2", "host-B", Utc::now()).await;

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/html; charset=utf-8"
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("host-A"));
    assert!(html.contains("10.0.0.2"));
}

#[tokio::test]
async fn test_members_json_snapshot() {
    let (app, table) = setup_app();
    table.upsert("10.0.0.2", "host-B", Utc::now()).await;
    table.upsert("10.0.0.1", "host-A", Utc::now()).await;

    let (status, body) = get(app, "/api/members").await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["count"], 2);
    let members = json["data"]["members"].as_array().unwrap();
    assert_eq!(members[0]["identity"], "host-A");
    assert_eq!(members[0]["source_address"], "10.0.0.1");
    assert_eq!(members[1]["identity"], "host-B");
}

#[tokio::test]
async fn test_get_member() {
    let (app, table) = setup_app();
    table.upsert("10.0.0.1", "host-A", Utc::now()).await;

    let (status, body) = get(app.clone(), "/api/members/10.0.0.1").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["data"]["identity"], "host-A");

    let (status, body) = get(app, "/api/members/10.9.9.9").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_status_reports_policy() {
    let (app, table) = setup_app();
    table.upsert("10.0.0.1", "host-A", Utc::now()).await;

    let (status, body) = get(app, "/api/status").await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["members"], 1);
    assert_eq!(json["beacon_interval_secs"], 600);
    assert_eq!(json["timeout_secs"], 1800);
}

#[tokio::test]
async fn test_metrics_without_recorder() {
    let (app, table) = setup_app();
    table.upsert("10.0.0.1", "host-A", Utc::now()).await;

    let (status, body) = get(app, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("heartbeat_members 1"));
}

#[tokio::test]
async fn test_unknown_route() {
    let (app, _) = setup_app();

    let (status, _) = get(app, "/api/unknown").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_events_stream_membership_changes() {
    let state = AppState::new(MembershipTable::new(), Config::default());
    let app = heartbeat_monitor::create_router(state.clone());

    let response = app
        .oneshot(Request::builder().uri("/api/events").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/event-stream");

    state
        .event_tx
        .send(MembershipEvent::Evicted {
            key: "10.0.0.1".to_string(),
            identity: "host-A".to_string(),
            last_seen: Utc::now(),
        })
        .unwrap();

    let mut body = response.into_body().into_data_stream();
    let chunk = tokio::time::timeout(Duration::from_secs(2), body.next())
        .await
        .expect("no event was streamed")
        .unwrap()
        .unwrap();
    let text = String::from_utf8(chunk.to_vec()).unwrap();

    assert!(text.contains("event: member:evicted"));
    assert!(text.contains("\"identity\":\"host-A\""));
}
