use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use quill_types::{PeerId, TextWithEntities};

use crate::config::RpcConfig;
use crate::error::RpcError;

/// Calls issued to the upstream messaging service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum RpcCall {
    /// Either `peer` + `msg_ids` (server-side lookup) or `text` (inline batch).
    TranslateText {
        peer: Option<PeerId>,
        #[serde(default)]
        msg_ids: Vec<i32>,
        text: Option<Vec<TextWithEntities>>,
        from_lang: Option<String>,
        to_lang: String,
    },
    TranscribeAudio {
        peer: PeerId,
        msg_id: i32,
    },
    RateTranscribedAudio {
        peer: PeerId,
        msg_id: i32,
        transcription_id: i64,
        good: bool,
    },
    TogglePeerTranslations {
        peer: PeerId,
        disabled: bool,
    },
}

impl RpcCall {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TranslateText { .. } => "translate_text",
            Self::TranscribeAudio { .. } => "transcribe_audio",
            Self::RateTranscribedAudio { .. } => "rate_transcribed_audio",
            Self::TogglePeerTranslations { .. } => "toggle_peer_translations",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RpcResponse {
    /// One entry per requested text or message id, in request order.
    TranslatedText { texts: Vec<TextWithEntities> },
    TranslateNoResult,
    TranscribedAudio {
        pending: bool,
        transcription_id: i64,
        text: String,
    },
    Bool { value: bool },
}

/// Request/response channel to the upstream service.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, call: RpcCall) -> Result<RpcResponse, RpcError>;
}

/// JSON-over-HTTP transport: every call is a `POST {base_url}/rpc`.
///
/// Non-2xx responses carry an [`RpcError`] body; anything unparsable is
/// reported with the HTTP status as its code.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &RpcConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/rpc", config.base_url.trim_end_matches('/')),
            token: config.token.clone(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, call: RpcCall) -> Result<RpcResponse, RpcError> {
        debug!("RPC {} -> {}", call.name(), self.endpoint);

        let mut req = self.client.post(&self.endpoint).json(&call);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.map_err(RpcError::network)?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(serde_json::from_str::<RpcError>(&body).unwrap_or_else(|_| {
                RpcError::new(i32::from(status.as_u16()), format!("HTTP_{}", status.as_u16()))
            }));
        }

        resp.json::<RpcResponse>().await.map_err(RpcError::network)
    }
}
