use async_stream::stream;
use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::info;
use crate::broadcast::RELOAD;
use crate::state::AppState;

// Long-lived event stream. The subscription is owned by the stream, so when the
// client goes away axum drops the stream and the subscriber is deregistered.
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut subscription = state.broadcaster.subscribe();

    let events = stream! {
        yield Ok(Event::default().comment("connected"));
        while let Some(message) = subscription.recv().await {
            yield Ok(Event::default().data(message));
        }
    };

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(state.keepalive_interval)
            .text("keepalive"),
    )
}

// axum splits data lines on \n only; a bare \r would reach clients as a line break
fn normalize_line_endings(body: &str) -> String {
    body.replace("\r\n", "\n").replace('\r', "\n")
}

// Manual trigger: raw text body, "reload" when empty
pub async fn notify_handler(State(state): State<Arc<AppState>>, body: String) -> StatusCode {
    let message = if body.is_empty() {
        RELOAD.to_string()
    } else {
        normalize_line_endings(&body)
    };
    let delivered = state.broadcaster.publish(&message);
    info!(delivered, "notification published");
    StatusCode::NO_CONTENT
}
