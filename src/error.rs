//! Error types for relaychat
//!
//! This module defines the error types used throughout the relay and the
//! chat client, using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for relaychat operations
///
/// This enum covers configuration loading, provider interactions, stream
/// decoding, chat input and prompt storage.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider-related errors (API calls, non-success status, bad payloads)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider answered with a non-success HTTP status
    #[error("Provider returned status {status}: {body}")]
    ProviderStatus {
        /// HTTP status code returned by the provider
        status: u16,
        /// Response body returned by the provider, as text
        body: String,
    },

    /// Streamed response could not be decoded, or the relay reported an error part
    #[error("Stream error: {0}")]
    Stream(String),

    /// Chat input was empty or whitespace only
    #[error("Please enter a message.")]
    EmptyInput,

    /// A request is already in flight for this session
    #[error("A response is still streaming")]
    Busy,

    /// Universal prompt storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for relaychat operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = RelayError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_provider_error_display() {
        let error = RelayError::Provider("connection reset".to_string());
        assert_eq!(error.to_string(), "Provider error: connection reset");
    }

    #[test]
    fn test_provider_status_error_display() {
        let error = RelayError::ProviderStatus {
            status: 429,
            body: "quota exceeded".to_string(),
        };
        assert!(error.to_string().contains("429"));
        assert!(error.to_string().contains("quota exceeded"));
    }

    #[test]
    fn test_empty_input_error_display() {
        assert_eq!(RelayError::EmptyInput.to_string(), "Please enter a message.");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: RelayError = io_error.into();
        assert!(matches!(error, RelayError::Io(_)));
    }

    #[test]
    fn test_serde_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let error: RelayError = json_error.into();
        assert!(matches!(error, RelayError::Serialization(_)));
    }

    #[test]
    fn test_error_downcast_from_anyhow() {
        let err: anyhow::Error = RelayError::Busy.into();
        assert!(matches!(
            err.downcast_ref::<RelayError>(),
            Some(RelayError::Busy)
        ));
    }
}
