use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by the upstream RPC endpoint or by the transport itself.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("rpc error {code}: {description}")]
pub struct RpcError {
    pub code: i32,
    /// Upper-case error tag such as `FLOOD_WAIT_30` or `MSG_ID_INVALID`.
    pub description: String,
}

impl RpcError {
    pub fn new(code: i32, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }

    /// Connection-level failure that never reached the endpoint.
    pub fn network(err: impl std::fmt::Display) -> Self {
        Self::new(-1, format!("NETWORK_ERROR: {}", err))
    }

    /// The endpoint answered with a response the caller did not ask for.
    pub fn unexpected_response() -> Self {
        Self::new(-2, "UNEXPECTED_RESPONSE")
    }
}

/// Closed failure set surfaced by the typed translation operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TranslationError {
    #[error("translation failed")]
    Generic,
    #[error("invalid message id")]
    InvalidMessageId,
    #[error("text is empty")]
    TextIsEmpty,
    #[error("text is too long")]
    TextTooLong,
    #[error("invalid target language")]
    InvalidLanguage,
    #[error("translation limit exceeded")]
    LimitExceeded,
}

impl TranslationError {
    pub fn from_rpc(err: &RpcError) -> Self {
        let description = err.description.as_str();
        if description.starts_with("FLOOD_WAIT") {
            return Self::LimitExceeded;
        }
        match description {
            "MSG_ID_INVALID" => Self::InvalidMessageId,
            "INPUT_TEXT_EMPTY" => Self::TextIsEmpty,
            "INPUT_TEXT_TOO_LONG" => Self::TextTooLong,
            "TO_LANG_INVALID" => Self::InvalidLanguage,
            _ => Self::Generic,
        }
    }
}

impl From<RpcError> for TranslationError {
    fn from(err: RpcError) -> Self {
        Self::from_rpc(&err)
    }
}
