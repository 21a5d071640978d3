use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;

use quill_types::api::{
    TranslateMessagesRequest, TranslateStructuredRequest, TranslateStructuredResponse,
    TranslateTextRequest, TranslateTextResponse, TranslationHiddenRequest,
};
use quill_types::{MessageId, PeerId};

use crate::error::{ApiError, api_error, translation_error};
use crate::state::AppState;

/// Best-effort single text translation; `text` is null on any failure.
pub async fn translate_text(
    State(state): State<AppState>,
    Json(req): Json<TranslateTextRequest>,
) -> impl IntoResponse {
    let text = state
        .translation
        .translate(&req.text, req.from_lang.as_deref(), &req.to_lang)
        .await;
    Json(TranslateTextResponse { text })
}

pub async fn translate_structured(
    State(state): State<AppState>,
    Json(req): Json<TranslateStructuredRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let texts = state
        .translation
        .translate_structured(req.texts, &req.to_lang)
        .await
        .map_err(translation_error)?;
    Ok(Json(TranslateStructuredResponse { texts }))
}

pub async fn translate_messages(
    State(state): State<AppState>,
    Json(req): Json<TranslateMessagesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ids = req
        .message_ids
        .iter()
        .map(|raw| raw.parse::<MessageId>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    state
        .translation
        .translate_messages(&ids, &req.to_lang)
        .await
        .map_err(translation_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_translation_hidden(
    State(state): State<AppState>,
    Path(peer_id): Path<String>,
    Json(req): Json<TranslationHiddenRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let peer_id: PeerId = peer_id.parse().map_err(|_| StatusCode::BAD_REQUEST)?;

    state
        .translation
        .toggle_peer_translation_hidden(peer_id, req.hidden)
        .await
        .map_err(|e| { error!("Translation visibility for {} failed: {:#}", peer_id, e); StatusCode::INTERNAL_SERVER_ERROR })?;
    Ok(StatusCode::NO_CONTENT)
}
