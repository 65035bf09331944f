// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use headline_mixer::headlines::HeadlineRecord;
use headline_mixer::snapshot::MemorySnapshot;
use headline_mixer::{api, AppState, MixerConfig, MixerService};

const BODY_LIMIT: usize = 1024 * 1024;

fn rec(t: &str, u: &str) -> HeadlineRecord {
    HeadlineRecord {
        text: t.into(),
        url: u.into(),
        score: 0,
    }
}

fn service_with(records: Vec<HeadlineRecord>) -> Arc<MixerService> {
    let (svc, _requests) = MixerService::new(
        &MixerConfig::default(),
        Arc::new(MemorySnapshot::with_initial(records)),
        vec![],
    );
    Arc::new(svc)
}

fn test_router(svc: Arc<MixerService>) -> Router {
    api::router(AppState { service: svc })
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, bytes)
}

async fn send_json(app: &Router, method: &str, uri: &str) -> (StatusCode, Json) {
    let (status, bytes) = send(app, method, uri).await;
    let v = serde_json::from_slice(&bytes).expect("json body");
    (status, v)
}

fn pool() -> Vec<HeadlineRecord> {
    vec![
        rec("Hvem vandt?", "http://a.dk/1"),
        rec("Katten er væk", "http://b.dk/2"),
        rec("Regn i morgen", "http://c.dk/3"),
    ]
}

#[tokio::test]
async fn health_returns_ok() {
    let app = test_router(service_with(vec![]));
    let (status, body) = send(&app, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(body).unwrap(), "ok");
}

#[tokio::test]
async fn api_returns_headline_urls_and_token() {
    let app = test_router(service_with(pool()));
    let (status, v) = send_json(&app, "GET", "/api").await;
    assert_eq!(status, StatusCode::OK);

    let urls = v["urls"].as_array().expect("urls array");
    assert_eq!(urls.len(), 2);
    assert_ne!(urls[0], urls[1]);
    assert_eq!(v["token"].as_str().unwrap().len(), 32);
    assert!(!v["headline"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn vote_flow_updates_leaderboard() {
    let svc = service_with(pool());
    let app = test_router(svc.clone());

    let (_, v) = send_json(&app, "GET", "/api").await;
    let token = v["token"].as_str().unwrap().to_string();

    let (status, v) = send_json(&app, "POST", &format!("/api/voteup?token={token}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["message"], "Headline voted up!");
    assert_eq!(v["token"], token.as_str());

    let (status, v) = send_json(&app, "GET", "/api/top5").await;
    assert_eq!(status, StatusCode::OK);
    let top = v["headlines"].as_array().unwrap();
    assert_eq!(top.len(), 3);
    assert_eq!(top[0]["score"], 1);
    assert_eq!(top[1]["score"], 1);
    assert_eq!(top[2]["score"], 0);

    let (status, v) = send_json(&app, "POST", &format!("/api/votedown?token={token}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["message"], "Headline voted down!");
    assert!(svc.top_headlines(5).iter().all(|r| r.score == 0));
}

#[tokio::test]
async fn vote_errors_map_to_status_codes() {
    let app = test_router(service_with(pool()));

    let (status, v) = send_json(&app, "POST", "/api/voteup").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(v["error"].is_string());

    let (status, _) = send_json(&app, "POST", "/api/votedown?token=ffff").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/api/voteup?token=ffff").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn insufficient_diversity_is_503() {
    let app = test_router(service_with(vec![
        rec("A: one", "http://same/1"),
        rec("B", "http://same/1"),
    ]));
    let (status, v) = send_json(&app, "GET", "/api").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(v["error"].as_str().unwrap().contains("cannot pair"));
}

#[tokio::test]
async fn front_page_renders_linked_headlines() {
    let app = test_router(service_with(pool()));
    let (status, body) = send(&app, "GET", "/").await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.starts_with("<!doctype html>"));
    assert!(html.contains("transform: rotate("));
    assert_eq!(html.matches("<a href=\"http://").count(), 2);
}
