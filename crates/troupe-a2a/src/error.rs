//! A2A error types.

use thiserror::Error;

/// Result type for A2A operations
pub type A2aResult<T> = Result<T, A2aError>;

/// Errors that can occur in A2A operations.
///
/// `Unavailable` and `Protocol` are the two delegation-failure classes a
/// parent composite sees: transport-level failure to reach the remote
/// agent, and a reachable agent answering with something this runtime
/// cannot interpret. Neither is retried automatically at this layer.
#[derive(Debug, Error)]
pub enum A2aError {
    /// The remote agent could not be reached
    #[error("Remote agent unavailable: {message}")]
    Unavailable { message: String },

    /// The remote agent answered with a malformed or unexpected response
    #[error("A2A protocol error: {message}")]
    Protocol { message: String },

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl A2aError {
    /// Create an unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create a protocol error
    pub fn protocol_error(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether retrying the operation could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, A2aError::Unavailable { .. })
    }
}

/// Failure reported by an invocation handler on the server side.
#[derive(Debug, Error)]
pub enum InvocationError {
    /// The request was malformed or referenced unusable context
    #[error("Bad request: {reason}")]
    BadRequest { reason: String },

    /// The local agent run failed
    #[error("Agent execution failed: {message}")]
    Failed { message: String },
}

impl InvocationError {
    /// Create a bad-request error
    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::BadRequest {
            reason: reason.into(),
        }
    }

    /// Create an execution-failure error
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Wire shape of an error response.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// HTTP-style error code
    pub code: u16,

    /// Error message
    pub message: String,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<&A2aError> for ErrorResponse {
    fn from(err: &A2aError) -> Self {
        let code = match err {
            A2aError::Unavailable { .. } => 502,
            A2aError::Protocol { .. } => 400,
            A2aError::Url(_) => 400,
            A2aError::Serialization(_) => 400,
            A2aError::Internal { .. } => 500,
        };
        ErrorResponse::new(code, err.to_string())
    }
}

impl From<&InvocationError> for ErrorResponse {
    fn from(err: &InvocationError) -> Self {
        let code = match err {
            InvocationError::BadRequest { .. } => 400,
            InvocationError::Failed { .. } => 500,
        };
        ErrorResponse::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_is_retryable_protocol_is_not() {
        assert!(A2aError::unavailable("connection refused").is_retryable());
        assert!(!A2aError::protocol_error("bad body").is_retryable());
    }

    #[test]
    fn error_response_codes_map_by_class() {
        let unavailable: ErrorResponse = (&A2aError::unavailable("x")).into();
        assert_eq!(unavailable.code, 502);

        let protocol: ErrorResponse = (&A2aError::protocol_error("x")).into();
        assert_eq!(protocol.code, 400);

        let failed: ErrorResponse = (&InvocationError::failed("boom")).into();
        assert_eq!(failed.code, 500);
    }
}
