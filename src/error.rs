//! Error types for the AI-readiness engine.
//!
//! This module provides structured error handling with:
//! - `ScanError`: Domain-specific errors for engine operations
//! - `Result<T>`: Type alias for Results using ScanError
//!
//! Expected "not found" conditions are never errors; scanners report them as
//! failed indicators. These variants cover misconfiguration and crashes.

use thiserror::Error;

// ============================================================================
// DOMAIN ERROR TYPE
// ============================================================================

/// Domain-specific errors for engine operations.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Invalid or malformed URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Network request failed
    #[error("Network error: {0}")]
    Network(String),

    /// A scanner with the same name is already registered
    #[error("Scanner already registered: {name}")]
    DuplicateScanner { name: String },

    /// A scanner crashed while running
    #[error("Scanner {name} failed: {message}")]
    ScannerFailed { name: String, message: String },

    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl ScanError {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<url::ParseError> for ScanError {
    fn from(error: url::ParseError) -> Self {
        Self::InvalidUrl(error.to_string())
    }
}

/// Result type alias using ScanError.
pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_scanner_message_names_the_scanner() {
        let err = ScanError::DuplicateScanner {
            name: "llms_txt".into(),
        };
        assert_eq!(err.to_string(), "Scanner already registered: llms_txt");
    }

    #[test]
    fn network_errors_keep_their_cause() {
        let err = ScanError::network("connection refused");
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn url_parse_errors_map_to_invalid_url() {
        let err: ScanError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, ScanError::InvalidUrl(_)));
    }
}
