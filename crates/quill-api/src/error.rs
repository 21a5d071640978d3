use axum::{Json, http::StatusCode};

use quill_rpc::TranslationError;
use quill_types::api::ErrorResponse;

/// Status plus a JSON body naming the failure.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: message.into() }))
}

pub fn translation_status(err: TranslationError) -> StatusCode {
    match err {
        TranslationError::LimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        TranslationError::InvalidMessageId => StatusCode::NOT_FOUND,
        TranslationError::TextIsEmpty
        | TranslationError::TextTooLong
        | TranslationError::InvalidLanguage => StatusCode::BAD_REQUEST,
        TranslationError::Generic => StatusCode::BAD_GATEWAY,
    }
}

pub fn translation_error(err: TranslationError) -> ApiError {
    api_error(translation_status(err), err.to_string())
}
