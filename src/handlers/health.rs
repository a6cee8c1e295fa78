use axum::{Json, extract::State};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::warn;
use crate::state::AppState;

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let cache = match state.cache.health_check().await {
        Ok(()) => "ok",
        Err(err) => {
            warn!(error = %err, "cache health check failed");
            "unavailable"
        }
    };

    let status = if cache == "ok" { "healthy" } else { "degraded" };

    Json(json!({
        "status": status,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "subscribers": state.broadcaster.len(),
        "cache": cache,
    }))
}
