//! Error types for signed AWS calls.

use thiserror::Error;

/// Errors returned by [`AwsClient`](super::AwsClient) and the service wrappers built on it.
#[derive(Debug, Error)]
pub enum AwsError {
    /// No credentials could be resolved, or the provider failed.
    #[error("AWS credentials error: {0}")]
    Credentials(String),

    /// Request could not be built or signed.
    #[error("failed to build request: {0}")]
    Request(String),

    /// Transport-level failure (connect, timeout, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("{service}.{operation} failed (HTTP {status}): {code} - {message}")]
    Service {
        service: String,
        operation: String,
        status: u16,
        code: String,
        message: String,
    },

    /// The service answered 2xx but the body was not what we expected.
    #[error("invalid response from {0}")]
    InvalidResponse(String),
}

impl AwsError {
    /// AWS error code (`ParameterNotFound`, `AccessDeniedException`, ...) if this is a service error.
    pub fn code(&self) -> Option<&str> {
        match self {
            AwsError::Service { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }

    /// Returns true if the service reported that the addressed resource does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            AwsError::Service { code, status, .. } => {
                *status == 404 || code.ends_with("NotFound") || code.ends_with("NotFoundException")
            }
            _ => false,
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AwsError::Network(format!("request timed out: {}", err))
        } else if err.is_connect() {
            AwsError::Network(format!("connection failed: {}", err))
        } else {
            AwsError::Network(err.to_string())
        }
    }
}

/// Parse an AWS error body into a [`AwsError::Service`].
///
/// JSON protocols put the code in `__type` (sometimes prefixed with a namespace
/// and `#`); REST protocols use `Error.Code` or a `x-amzn-errortype` header.
pub(crate) fn parse_service_error(
    service: &str,
    operation: &str,
    status: u16,
    error_type_header: Option<&str>,
    body: &str,
) -> AwsError {
    let (code, message) = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => {
            let code = json
                .get("__type")
                .or_else(|| json.get("code"))
                .or_else(|| json.get("Error").and_then(|e| e.get("Code")))
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .or_else(|| error_type_header.map(str::to_string))
                .unwrap_or_else(|| "Unknown".to_string());
            let message = json
                .get("message")
                .or_else(|| json.get("Message"))
                .or_else(|| json.get("Error").and_then(|e| e.get("Message")))
                .and_then(|v| v.as_str())
                .unwrap_or(body)
                .to_string();
            (code, message)
        }
        Err(_) => (
            error_type_header.unwrap_or("Unknown").to_string(),
            body.to_string(),
        ),
    };

    AwsError::Service {
        service: service.to_string(),
        operation: operation.to_string(),
        status,
        code: strip_error_namespace(&code).to_string(),
        message,
    }
}

// "com.amazonaws.ssm#ParameterNotFound" -> "ParameterNotFound"
// "ResourceNotFoundException:http://internal.amazon.com/..." -> "ResourceNotFoundException"
fn strip_error_namespace(code: &str) -> &str {
    let code = code.rsplit('#').next().unwrap_or(code);
    code.split(':').next().unwrap_or(code)
}
