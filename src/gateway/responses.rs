// Error to HTTP response mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use crate::downloader::{BlockingReason, ExtractionError, RequestError, StreamError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Resolution(#[from] ExtractionError),

    #[error(transparent)]
    StreamPrecondition(#[from] StreamError),
}

/// 500 body for a failed `/video-info`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionErrorBody {
    pub error: String,
    pub details: String,
    pub cookies_status: &'static str,
    pub hint: String,
    pub reason: BlockingReason,
}

impl From<&ExtractionError> for ResolutionErrorBody {
    fn from(err: &ExtractionError) -> Self {
        Self {
            error: err.failure.to_string(),
            details: err.details.clone(),
            cookies_status: cookies_status(err.cookies_valid),
            hint: err.hint.clone(),
            reason: err.reason,
        }
    }
}

pub fn cookies_status(valid: bool) -> &'static str {
    if valid {
        "valid"
    } else {
        "missing"
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Request(err) => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
            ApiError::Resolution(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ResolutionErrorBody::from(&err)),
            )
                .into_response(),
            // Nothing useful can be said to a client expecting media bytes
            ApiError::StreamPrecondition(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}
