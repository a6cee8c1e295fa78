#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, header},
};
use guide_relay::{broadcast::Broadcaster, cache::CacheStore, relay::Relay, state::AppState};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;

pub struct TestApp {
    // Keeps the database file alive for the test's duration
    pub dir: TempDir,
    pub state: Arc<AppState>,
    pub router: Router,
}

pub async fn test_app(default_upstream: &str) -> TestApp {
    test_app_with_timeout(default_upstream, Duration::from_secs(2)).await
}

pub async fn test_app_with_timeout(default_upstream: &str, timeout: Duration) -> TestApp {
    build_app(default_upstream, timeout, Duration::from_secs(60)).await
}

pub async fn test_app_with_keepalive(default_upstream: &str, keepalive: Duration) -> TestApp {
    build_app(default_upstream, Duration::from_secs(2), keepalive).await
}

async fn build_app(default_upstream: &str, timeout: Duration, keepalive: Duration) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("guides.db").display());
    let cache = CacheStore::open(&url, 4).await.unwrap();
    let relay = Relay::new(default_upstream, timeout).unwrap();

    let state = Arc::new(AppState {
        relay,
        cache,
        broadcaster: Arc::new(Broadcaster::new()),
        keepalive_interval: keepalive,
    });
    let router = guide_relay::handlers::router(Arc::clone(&state));

    TestApp { dir, state, router }
}

/// Serve `router` on an ephemeral local port and return its base url.
pub async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// An address nothing is listening on.
pub async fn closed_port() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ORIGIN, "http://dashboard.local")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::ORIGIN, "http://dashboard.local")
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
