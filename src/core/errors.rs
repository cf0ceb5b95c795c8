use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to HTTP callers.
///
/// Only the mandatory stages of a chat turn (input validation, image
/// decoding, final generation) produce these. Optional enrichment stages
/// degrade silently instead.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Image processing failed: {0}")]
    ImageProcessing(String),
    #[error("Generation failed: {0}")]
    Generation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }

    pub fn image<E: std::fmt::Display>(err: E) -> Self {
        ApiError::ImageProcessing(err.to_string())
    }

    pub fn generation<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Generation(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ImageProcessing(_) | ApiError::Generation(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match &self {
            ApiError::Validation(msg) | ApiError::NotFound(msg) | ApiError::Internal(msg) => {
                msg.clone()
            }
            ApiError::ImageProcessing(_) | ApiError::Generation(_) => self.to_string(),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

/// Failure of a call to an external provider (model, embeddings, vector
/// store, web search).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} is not configured: {reason}")]
    NotConfigured {
        provider: &'static str,
        reason: String,
    },
    #[error("{provider} timed out after {secs}s")]
    Timeout { provider: &'static str, secs: u64 },
    #[error("{provider} request failed: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} returned {status}: {body}")]
    Status {
        provider: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("{provider} response could not be decoded: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },
    #[error("{provider} returned an empty response")]
    Empty { provider: &'static str },
}

impl ProviderError {
    pub fn not_configured(provider: &'static str, reason: impl Into<String>) -> Self {
        Self::NotConfigured {
            provider,
            reason: reason.into(),
        }
    }

    pub fn http(provider: &'static str, source: reqwest::Error) -> Self {
        Self::Http { provider, source }
    }

    pub fn decode(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            provider,
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Http { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}
