//! JSON Output Types
//!
//! This module defines the output records produced by operations and the
//! envelope format the CLI prints around them.
//!
//! # Output Contract
//! - Success: `{"ok": true, "operation": "...", "data": [...], "meta": {...}}`
//! - Error: `{"ok": false, "operation": "...", "error": {"code": "...", "message": "..."}}`
//!
//! Output is stable and suitable for programmatic parsing by hosts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FireflowError;

/// One output record: a flat column/value mapping
pub type OutputRecord = Map<String, Value>;

/// Build the `{"error": message}` record used when a continue-on-failure
/// policy captures an operation failure
#[must_use]
pub fn error_record(message: &str) -> OutputRecord {
    let mut record = OutputRecord::new();
    record.insert("error".to_string(), Value::String(message.to_string()));
    record
}

/// Success envelope for operation results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessEnvelope<T> {
    /// Always true for success envelopes
    pub ok: bool,

    /// Operation that was executed (executeQuery, insert, update)
    pub operation: String,

    /// Operation output records
    pub data: T,

    /// Execution metadata
    pub meta: Metadata,
}

impl<T> SuccessEnvelope<T> {
    /// Create a new success envelope
    pub fn new(operation: impl Into<String>, data: T, meta: Metadata) -> Self {
        Self { ok: true, operation: operation.into(), data, meta }
    }
}

/// Error envelope for operation failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always false for error envelopes
    pub ok: bool,

    /// Operation that was attempted (empty string when it never resolved)
    pub operation: String,

    /// Error information
    pub error: ErrorInfo,
}

impl ErrorEnvelope {
    /// Create a new error envelope
    pub fn new(operation: impl Into<String>, error: ErrorInfo) -> Self {
        Self { ok: false, operation: operation.into(), error }
    }

    /// Create error envelope from a `FireflowError`
    pub fn from_error(operation: impl Into<String>, err: &FireflowError) -> Self {
        Self::new(
            operation,
            ErrorInfo { code: err.error_code().to_string(), message: err.message() },
        )
    }
}

/// Error information structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable error code (e.g., "UNKNOWN_PARAMETER", "NO_CREDENTIALS")
    pub code: String,

    /// Human-readable error message (host-appropriate, no sensitive data)
    pub message: String,
}

impl ErrorInfo {
    /// Create a new error info
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into() }
    }
}

/// Execution metadata included in all success responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Execution time in milliseconds
    pub execution_ms: u64,

    /// Number of output records produced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_returned: Option<usize>,
}

impl Metadata {
    /// Create new metadata with just execution time
    #[must_use]
    pub fn new(execution_ms: u64) -> Self {
        Self { execution_ms, rows_returned: None }
    }

    /// Create new metadata with execution time and record count
    #[must_use]
    pub fn with_rows(execution_ms: u64, rows_returned: usize) -> Self {
        Self { execution_ms, rows_returned: Some(rows_returned) }
    }
}
