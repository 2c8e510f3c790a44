//! Error types for instance API operations.

use thiserror::Error;

/// Errors that can occur when talking to the instance API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Failed to build the HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// The request never produced a response (connect failure, timeout).
    #[error("Request to {path} failed: {message}")]
    Transport {
        /// Endpoint path relative to the API root.
        path: String,
        /// Underlying transport error message.
        message: String,
    },

    /// The instance answered with a non-success status.
    #[error("Instance returned {status} for {path}: {body}")]
    Status {
        /// Endpoint path relative to the API root.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Response body, truncated for logging.
        body: String,
    },

    /// The response body could not be decoded into the expected shape.
    #[error("Failed to decode response from {path}: {message}")]
    Decode {
        /// Endpoint path relative to the API root.
        path: String,
        /// Decode error message.
        message: String,
    },

    /// The instance reported no workspace to reconcile against.
    #[error("Instance has no default workspace")]
    NoWorkspace,
}

impl ApiError {
    /// Returns true if the error is transient and the request may be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport { .. } => true,
            ApiError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_are_retryable() {
        let err = ApiError::Transport {
            path: "/sources/list".to_string(),
            message: "connection refused".to_string(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_server_errors_are_retryable() {
        let err = ApiError::Status {
            path: "/sources/list".to_string(),
            status: 503,
            body: "unavailable".to_string(),
        };
        assert!(err.is_retryable());

        let err = ApiError::Status {
            path: "/sources/list".to_string(),
            status: 429,
            body: "too many requests".to_string(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        let err = ApiError::Status {
            path: "/sources/get".to_string(),
            status: 404,
            body: "not found".to_string(),
        };
        assert!(!err.is_retryable());

        let err = ApiError::Decode {
            path: "/sources/get".to_string(),
            message: "missing field".to_string(),
        };
        assert!(!err.is_retryable());
    }
}
