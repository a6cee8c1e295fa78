use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use std::sync::Arc;
use crate::error::AppError;
use crate::metrics::{CACHE_DELETES, CACHE_HITS, CACHE_MISSES, CACHE_WRITES};
use crate::models::{
    CacheKeyPayload, CacheLookupResponse, CacheSavePayload, CacheStatsResponse, SuccessResponse,
};
use crate::state::AppState;

fn parse<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|rejection| AppError::malformed(rejection.body_text()))
}

pub async fn cache_get_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CacheKeyPayload>, JsonRejection>,
) -> Result<Json<CacheLookupResponse>, AppError> {
    let key = parse(payload)?.into_key()?;
    let guide = state.cache.lookup(&key).await?;

    if guide.is_some() {
        CACHE_HITS.inc();
    } else {
        CACHE_MISSES.inc();
    }
    Ok(Json(guide.into()))
}

pub async fn cache_save_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CacheSavePayload>, JsonRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    let (key, content) = parse(payload)?.into_parts()?;
    state.cache.upsert(&key, &content).await?;
    CACHE_WRITES.inc();
    Ok(Json(SuccessResponse::ok()))
}

pub async fn cache_delete_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CacheKeyPayload>, JsonRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    let key = parse(payload)?.into_key()?;
    if state.cache.delete(&key).await? {
        CACHE_DELETES.inc();
    }
    Ok(Json(SuccessResponse::ok()))
}

pub async fn cache_stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CacheStatsResponse>, AppError> {
    let stats = state.cache.stats().await?;
    Ok(Json(stats.into()))
}
