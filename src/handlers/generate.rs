use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, header::CONTENT_TYPE},
    response::Response,
};
use std::sync::Arc;
use crate::error::AppError;
use crate::metrics::RELAY_REQUESTS;
use crate::models::GenerateRequest;
use crate::state::AppState;
use crate::upstream::TARGET_HEADER;

// Relays the raw body to the chosen backend and streams its answer back untouched
pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    RELAY_REQUESTS.inc();

    // Validate before any upstream I/O; the raw request bytes are what gets forwarded
    let request: GenerateRequest =
        serde_json::from_slice(&body).map_err(|err| AppError::malformed(err.to_string()))?;
    request.validate()?;

    let target_override = headers
        .get(TARGET_HEADER)
        .and_then(|value| value.to_str().ok());

    let relayed = state.relay.forward(body, target_override).await?;

    let mut response = Response::new(Body::from_stream(relayed.body));
    *response.status_mut() = relayed.status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, relayed.content_type);
    Ok(response)
}
