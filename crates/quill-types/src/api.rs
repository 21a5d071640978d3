use serde::{Deserialize, Serialize};

use crate::models::TextWithEntities;

// -- JWT Claims --

/// Bearer token claims checked by the quill-api middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account the session belongs to.
    pub sub: i64,
    pub exp: usize,
}

// -- Consumption --

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsumedRemotelyRequest {
    pub consume_date: Option<i32>,
}

// -- Translation --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranslateTextRequest {
    pub text: String,
    pub from_lang: Option<String>,
    pub to_lang: String,
}

#[derive(Debug, Serialize)]
pub struct TranslateTextResponse {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranslateStructuredRequest {
    pub texts: Vec<TextWithEntities>,
    pub to_lang: String,
}

#[derive(Debug, Serialize)]
pub struct TranslateStructuredResponse {
    pub texts: Vec<TextWithEntities>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranslateMessagesRequest {
    /// Message ids in `"{peerNamespace}:{peerId}:{namespace}:{id}"` form.
    pub message_ids: Vec<String>,
    pub to_lang: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranslationHiddenRequest {
    pub hidden: bool,
}

// -- Transcription --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptionOutcome {
    Success,
    Error,
}

#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub result: TranscriptionOutcome,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateTranscriptionRequest {
    pub transcription_id: i64,
    pub good: bool,
}

/// Pushed by the upstream when a pending transcription finishes or progresses.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranscriptionUpdateRequest {
    pub text: String,
    #[serde(default)]
    pub pending: bool,
}

#[derive(Debug, Serialize)]
pub struct TranscriptionUpdateResponse {
    pub applied: bool,
}
