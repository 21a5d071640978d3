use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::error;

use quill_engine::ConsumptionTracker;
use quill_types::MessageId;
use quill_types::api::ConsumedRemotelyRequest;

use crate::state::AppState;

/// Runs a tracker call on the blocking pool and reports whether it changed anything.
async fn run<F>(state: &AppState, id: MessageId, f: F) -> Result<Json<serde_json::Value>, StatusCode>
where
    F: FnOnce(&ConsumptionTracker) -> anyhow::Result<bool> + Send + 'static,
{
    let tracker = state.consumption.clone();
    let updated = tokio::task::spawn_blocking(move || f(&tracker))
        .await
        .map_err(|e| { error!("spawn_blocking join error: {}", e); StatusCode::INTERNAL_SERVER_ERROR })?
        .map_err(|e| { error!("Consumption update for {} failed: {:#}", id, e); StatusCode::INTERNAL_SERVER_ERROR })?;

    Ok(Json(serde_json::json!({ "updated": updated })))
}

pub(crate) fn parse_message_id(raw: &str) -> Result<MessageId, StatusCode> {
    raw.parse().map_err(|_| StatusCode::BAD_REQUEST)
}

pub async fn consume(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let id = parse_message_id(&message_id)?;
    run(&state, id, move |tracker| tracker.mark_content_consumed(id)).await
}

pub async fn reactions_seen(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let id = parse_message_id(&message_id)?;
    run(&state, id, move |tracker| tracker.mark_reactions_seen(id)).await
}

/// Server-reported consumption, optionally backdated to `consume_date`.
pub async fn consumed_remotely(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    Json(req): Json<ConsumedRemotelyRequest>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let id = parse_message_id(&message_id)?;
    run(&state, id, move |tracker| tracker.mark_consumed_remotely(id, req.consume_date)).await
}
