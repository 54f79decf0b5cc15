//! Error types for simulator and directory client operations

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, SimClientError>;

/// Errors that can occur while talking to the simulator backend or the directory
#[derive(Error, Debug)]
pub enum SimClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Server returned an error response
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Timeout
    #[error("Request timed out")]
    Timeout,
}

impl SimClientError {
    /// Create a server error from status code and message
    pub fn server_error(status: u16, message: impl Into<String>) -> Self {
        Self::ServerError {
            status,
            message: message.into(),
        }
    }

    /// Server-supplied detail, if the failure carried one.
    ///
    /// Transport-level failures (connection refused, bad URL, …) have no
    /// detail of their own.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::ServerError { message, .. } | Self::NotFound(message) => {
                Some(message.as_str()).filter(|m| !m.is_empty())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_from_server_error() {
        let err = SimClientError::server_error(400, "No devices found for simulation");
        assert_eq!(err.detail(), Some("No devices found for simulation"));
        assert_eq!(
            err.to_string(),
            "Server error 400: No devices found for simulation"
        );
    }

    #[test]
    fn test_detail_absent() {
        assert_eq!(SimClientError::Timeout.detail(), None);
        assert_eq!(SimClientError::server_error(500, "").detail(), None);
    }
}
