//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout Fireflow.
//! All errors are structured and map to stable error codes for JSON output.
//!
//! # Error Categories
//! - `NoCredentials`: Credential resolution produced nothing
//! - `UnknownParameter`: A named placeholder was not declared
//! - `UnsupportedOperation`: Unknown operation kind on the job surface
//! - `ConnectionFailed`: Database connection errors
//! - `QueryFailed`: Query execution errors (driver errors surfaced opaquely)
//! - `InvalidInput`: Malformed input or missing required parameters
//! - `ConfigError`: Connection registry / config file errors

use thiserror::Error;

/// Main error type for Fireflow operations
#[derive(Error, Debug)]
pub enum FireflowError {
    /// Credential resolution produced nothing
    #[error("No credentials available: {0}")]
    NoCredentials(String),

    /// A named placeholder used in a query template was not declared
    #[error("Query parameter '{0}' is not declared")]
    UnknownParameter(String),

    /// Operation kind not supported by this runner
    #[error("Operation '{0}' is not supported")]
    UnsupportedOperation(String),

    /// Database connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    /// Invalid input or missing required parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error (file not found, invalid JSON, etc.)
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl FireflowError {
    /// Convert error to error code string for JSON output
    ///
    /// Error codes are stable and suitable for programmatic handling by hosts.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NoCredentials(_) => "NO_CREDENTIALS",
            Self::UnknownParameter(_) => "UNKNOWN_PARAMETER",
            Self::UnsupportedOperation(_) => "UNSUPPORTED_OPERATION",
            Self::ConnectionFailed(_) => "CONNECTION_FAILED",
            Self::QueryFailed(_) => "QUERY_FAILED",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::ConfigError(_) => "CONFIG_ERROR",
        }
    }

    /// Get human-readable error message (host-appropriate, no sensitive data)
    ///
    /// This message is safe to include in JSON output.
    /// It does not contain credentials or other sensitive information.
    #[must_use]
    pub fn message(&self) -> String {
        // Use Display implementation from thiserror
        self.to_string()
    }

    /// Create a no-credentials error
    pub fn no_credentials(message: impl Into<String>) -> Self {
        Self::NoCredentials(message.into())
    }

    /// Create an unknown-parameter error naming the offending identifier
    pub fn unknown_parameter(name: impl Into<String>) -> Self {
        Self::UnknownParameter(name.into())
    }

    /// Create an unsupported-operation error
    pub fn unsupported_operation(kind: impl Into<String>) -> Self {
        Self::UnsupportedOperation(kind.into())
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed(message.into())
    }

    /// Create a query failed error
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::QueryFailed(message.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }
}

/// Result type alias for Fireflow operations
pub type Result<T> = std::result::Result<T, FireflowError>;
