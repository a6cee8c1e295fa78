mod common;

use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use common::{get, test_app, test_app_with_keepalive};

// Next SSE frame as text
async fn next_frame(body: &mut Body) -> String {
    let frame = tokio::time::timeout(Duration::from_secs(2), body.frame())
        .await
        .expect("event stream stalled")
        .expect("event stream ended")
        .unwrap();
    let data = frame.into_data().unwrap();
    String::from_utf8(data.to_vec()).unwrap()
}

fn data_of(frame: &str) -> Option<&str> {
    frame
        .lines()
        .find_map(|line| line.strip_prefix("data:"))
        .map(str::trim_start)
}

fn notify(message: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/notify")
        .body(Body::from(message.to_string()))
        .unwrap()
}

#[tokio::test]
async fn stream_opens_with_comment_then_delivers_notifications() {
    let app = test_app("localhost:11434").await;

    let response = app.router.clone().oneshot(get("/events")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let mut body = response.into_body();

    let opening = next_frame(&mut body).await;
    assert!(opening.starts_with(':'), "got {opening:?}");
    assert!(opening.contains("connected"));

    let response = app
        .router
        .clone()
        .oneshot(notify("tasks updated"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(data_of(&next_frame(&mut body).await), Some("tasks updated"));
}

#[tokio::test]
async fn empty_notify_defaults_to_reload() {
    let app = test_app("localhost:11434").await;

    let response = app.router.clone().oneshot(get("/events")).await.unwrap();
    let mut body = response.into_body();
    next_frame(&mut body).await;

    app.router.clone().oneshot(notify("")).await.unwrap();
    assert_eq!(data_of(&next_frame(&mut body).await), Some("reload"));
}

#[tokio::test]
async fn new_listener_triggers_reload_for_existing_ones() {
    let app = test_app("localhost:11434").await;

    let first = app.router.clone().oneshot(get("/events")).await.unwrap();
    let mut first = first.into_body();
    next_frame(&mut first).await;

    let second = app.router.clone().oneshot(get("/events")).await.unwrap();
    let mut second = second.into_body();

    assert_eq!(data_of(&next_frame(&mut first).await), Some("reload"));
    assert!(next_frame(&mut second).await.contains("connected"));
    assert_eq!(app.state.broadcaster.len(), 2);
}

#[tokio::test]
async fn closed_connection_is_deregistered() {
    let app = test_app("localhost:11434").await;

    let response = app.router.clone().oneshot(get("/events")).await.unwrap();
    assert_eq!(app.state.broadcaster.len(), 1);

    drop(response);
    assert!(app.state.broadcaster.is_empty());

    let response = app.router.clone().oneshot(notify("anyone?")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn notifications_keep_publish_order() {
    let app = test_app("localhost:11434").await;

    let response = app.router.clone().oneshot(get("/events")).await.unwrap();
    let mut body = response.into_body();
    next_frame(&mut body).await;

    for message in ["p1", "p2", "p3"] {
        app.router.clone().oneshot(notify(message)).await.unwrap();
    }

    for message in ["p1", "p2", "p3"] {
        assert_eq!(data_of(&next_frame(&mut body).await), Some(message));
    }
}

#[tokio::test]
async fn idle_stream_receives_keepalive_comments() {
    let app = test_app_with_keepalive("localhost:11434", Duration::from_millis(100)).await;

    let response = app.router.clone().oneshot(get("/events")).await.unwrap();
    let mut body = response.into_body();
    assert!(next_frame(&mut body).await.contains("connected"));

    for _ in 0..2 {
        assert_eq!(next_frame(&mut body).await, ": keepalive\n\n");
    }
}

#[tokio::test]
async fn carriage_returns_in_notifications_do_not_reach_the_frame() {
    let app = test_app("localhost:11434").await;

    let response = app.router.clone().oneshot(get("/events")).await.unwrap();
    let mut body = response.into_body();
    next_frame(&mut body).await;

    app.router
        .clone()
        .oneshot(notify("line one\r\nline two"))
        .await
        .unwrap();

    let frame = next_frame(&mut body).await;
    assert!(!frame.contains('\r'), "got {frame:?}");
    let data: Vec<&str> = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim_start)
        .collect();
    assert_eq!(data, ["line one", "line two"]);
}
