use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProxyError>;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upstream returned status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Upstream GraphQL error: {0}")]
    GraphQl(String),

    #[error("Upstream still throttled after {attempts} attempts")]
    Throttled { attempts: u32 },

    #[error("Failed to decode upstream response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::InvalidRequest(_) | ProxyError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ProxyError::Throttled { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for ProxyError {
    fn from(err: validator::ValidationErrors) -> Self {
        ProxyError::ValidationError(err.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: &str) -> Self {
        Self {
            error: error.to_string(),
            message: None,
        }
    }

    pub fn with_message(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: Some(message.to_string()),
        }
    }

    /// Upstream failure details stay in the logs; callers only see a generic message.
    pub fn from_proxy_error(err: &ProxyError) -> Self {
        match err {
            ProxyError::InvalidRequest(msg) | ProxyError::ValidationError(msg) => {
                Self::with_message("Bad request", msg)
            }
            ProxyError::Throttled { .. } => Self::with_message(
                "Upstream rate limit exceeded",
                "The product API is throttling requests, try again later",
            ),
            _ => Self::with_message(
                "Internal server error",
                "Failed to fetch data from the product API",
            ),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Rejected request");
        }

        (status, Json(ErrorResponse::from_proxy_error(&self))).into_response()
    }
}
