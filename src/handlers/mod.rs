mod cache;
mod events;
mod generate;
mod health;
mod metrics;

pub use cache::{cache_delete_handler, cache_get_handler, cache_save_handler, cache_stats_handler};
pub use events::{events_handler, notify_handler};
pub use generate::generate_handler;
pub use health::health_handler;
pub use metrics::metrics_handler;

use axum::{
    Router,
    http::{HeaderName, Method, header},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;
use crate::upstream::TARGET_HEADER;

// Preflight requests are answered here and never reach a handler
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(TARGET_HEADER),
        ])
}

pub fn router(state: Arc<AppState>) -> Router {
    crate::metrics::register();

    Router::new()
        .route("/api/generate", post(generate_handler))
        .route("/events", get(events_handler))
        .route("/notify", post(notify_handler))
        .route("/api/cache/get", post(cache_get_handler))
        .route("/api/cache/save", post(cache_save_handler))
        .route("/api/cache/delete", post(cache_delete_handler))
        .route("/api/cache/stats", get(cache_stats_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(cors_layer())
        .with_state(state)
}
