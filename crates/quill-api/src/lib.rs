pub mod consumption;
pub mod error;
pub mod middleware;
pub mod state;
pub mod transcription;
pub mod translation;

use axum::{Router, middleware::from_fn_with_state, routing::post};

use crate::middleware::require_auth;
use crate::state::AppState;

/// All engine and RPC routes, behind bearer auth.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/messages/{message_id}/consume", post(consumption::consume))
        .route("/messages/{message_id}/reactions/seen", post(consumption::reactions_seen))
        .route("/messages/{message_id}/consumed-remotely", post(consumption::consumed_remotely))
        .route("/messages/translate", post(translation::translate_messages))
        .route("/translate", post(translation::translate_text))
        .route("/translate/structured", post(translation::translate_structured))
        .route("/peers/{peer_id}/translation-hidden", post(translation::set_translation_hidden))
        .route("/messages/{message_id}/transcribe", post(transcription::transcribe))
        .route("/messages/{message_id}/transcription/rate", post(transcription::rate))
        .route("/transcriptions/{transcription_id}", post(transcription::update))
        .layer(from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
}
