//! # Handlers
//!
//! Request/response endpoints. Writes are handed to the hub so that every
//! stored thread gets its ID from the persistence worker.

use axum::{
    extract::{Path, State},
    Json,
};
use bytes::Bytes;
use tracing::{debug, info};
use wb_core::{Thread, Threads};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub async fn home() -> &'static str {
    "Hello!"
}

pub async fn list_threads(State(state): State<AppState>) -> ApiResult<Json<Threads>> {
    Ok(Json(state.hub.threads().await?))
}

/// Decodes, validates and persists a thread, answering with the stored copy.
///
/// Live viewers hear about it through the regular broadcast pipeline.
pub async fn create_thread(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Thread>> {
    let thread: Thread = serde_json::from_slice(&body).map_err(|e| {
        debug!(error = %e, "undecodable thread payload");
        ApiError::unreadable_payload()
    })?;
    thread.validate()?;

    let stored = state.hub.submit_thread(thread).await?;
    info!(thread_id = stored.id, user = %stored.user, "thread created over http");
    Ok(Json(stored))
}

pub async fn get_thread(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Thread>> {
    let id: u64 = raw_id.parse().map_err(|_| ApiError::invalid_id())?;

    state
        .hub
        .thread(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::thread_not_found(id))
}
