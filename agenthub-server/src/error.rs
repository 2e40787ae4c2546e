//! Error types for the hub server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Errors that can occur when building a router.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The API prefix must be an absolute path.
    #[error("API prefix must start with '/': {0}")]
    InvalidPrefix(String),
}

/// Errors returned by request handlers.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// No bearer token could be obtained for the agent.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Unknown agent or resource.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request from client.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The requested feature is not configured.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// An upstream AWS or identity call failed.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<agenthub_core::Error> for ServerError {
    fn from(err: agenthub_core::Error) -> Self {
        use agenthub_core::Error;
        match err {
            Error::Auth(msg) => ServerError::Unauthorized(msg),
            Error::NotFound(msg) => ServerError::NotFound(msg),
            Error::InvalidRequest(msg) => ServerError::InvalidRequest(msg),
            Error::Unavailable(msg) => ServerError::Unavailable(msg),
            Error::Network(msg) | Error::Upstream(msg) => ServerError::Upstream(msg),
            Error::Config(msg) => ServerError::Internal(msg),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        let body = Json(serde_json::json!({
            "error": self.to_string(),
            "code": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

/// Result type alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
