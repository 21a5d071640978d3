use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;

use quill_types::api::{
    RateTranscriptionRequest, TranscribeResponse, TranscriptionUpdateRequest,
    TranscriptionUpdateResponse,
};

use crate::consumption::parse_message_id;
use crate::state::AppState;

pub async fn transcribe(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let id = parse_message_id(&message_id)?;

    let result = state
        .transcription
        .transcribe_audio(id)
        .await
        .map_err(|e| { error!("Transcription of {} failed: {:#}", id, e); StatusCode::INTERNAL_SERVER_ERROR })?;
    Ok(Json(TranscribeResponse { result }))
}

pub async fn rate(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    Json(req): Json<RateTranscriptionRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let id = parse_message_id(&message_id)?;

    let rated = state
        .transcription
        .rate_transcription(id, req.transcription_id, req.good)
        .await
        .map_err(|e| { error!("Rating transcription on {} failed: {:#}", id, e); StatusCode::INTERNAL_SERVER_ERROR })?;
    Ok(Json(serde_json::json!({ "rated": rated })))
}

/// Completion push for a transcription that was reported as pending.
pub async fn update(
    State(state): State<AppState>,
    Path(transcription_id): Path<i64>,
    Json(req): Json<TranscriptionUpdateRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let applied = state
        .transcription
        .apply_transcription_update(transcription_id, req.text, req.pending)
        .await
        .map_err(|e| { error!("Transcription update {} failed: {:#}", transcription_id, e); StatusCode::INTERNAL_SERVER_ERROR })?;
    Ok(Json(TranscriptionUpdateResponse { applied }))
}
