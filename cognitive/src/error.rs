//! Error types for the Cognitive Services clients.

use thiserror::Error;

/// Result type alias for Cognitive Services operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Cognitive Services operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Error payload returned by the service.
    #[error("cognitive: {message} (code={code}, http_status={http_status})")]
    Api {
        code: String,
        message: String,
        http_status: u16,
    },

    /// HTTP request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket error.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A long-running operation finished in the failed state.
    #[error("operation failed: {0}")]
    TaskFailed(String),

    /// A long-running operation did not finish in time.
    #[error("operation timed out after {0} polls")]
    Timeout(u32),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates a new API error.
    pub fn api(code: impl Into<String>, message: impl Into<String>, http_status: u16) -> Self {
        Error::Api {
            code: code.into(),
            message: message.into(),
            http_status,
        }
    }

    /// Returns true if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Api { http_status, .. } if *http_status == 401 || *http_status == 403)
    }

    /// Returns true if this is a rate limit error.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Error::Api { http_status: 429, .. })
    }

    /// Returns true if the referenced resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api { http_status: 404, .. })
    }

    /// Returns true if this is a server-side error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Api { http_status, .. } if *http_status >= 500)
    }

    /// Returns true if the request can be retried.
    pub fn is_retryable(&self) -> bool {
        self.is_rate_limit() || self.is_server_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(Error::api("RateLimit", "slow down", 429).is_retryable());
        assert!(Error::api("InternalServerError", "boom", 503).is_retryable());
        assert!(!Error::api("BadRequest", "bad", 400).is_retryable());
        assert!(Error::api("Unauthorized", "key", 401).is_auth_error());
        assert!(Error::api("NotFound", "gone", 404).is_not_found());
        assert!(!Error::Other("x".into()).is_retryable());
    }

    #[test]
    fn test_display() {
        let err = Error::api("BadRequest", "Invalid Audio Format", 400);
        let s = err.to_string();
        assert!(s.contains("Invalid Audio Format"));
        assert!(s.contains("400"));
        assert_eq!(Error::Timeout(10).to_string(), "operation timed out after 10 polls");
    }
}
