//! # Error Types
//!
//! Structured error types for quote_core. The quote calculator itself never
//! fails (see [`crate::calculator::compute`]); these errors cover the layers
//! around it: workbook file I/O, serialization, and document rendering.
//!
//! ## Example
//!
//! ```rust
//! use quote_core::errors::{QuoteError, QuoteResult};
//!
//! fn require_positive(power_mw: f64) -> QuoteResult<()> {
//!     if power_mw <= 0.0 {
//!         return Err(QuoteError::InvalidInput {
//!             field: "power_mw".to_string(),
//!             value: power_mw.to_string(),
//!             reason: "Rated power must be positive".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for quote_core operations
pub type QuoteResult<T> = Result<T, QuoteError>;

/// Structured error type for quoting operations.
///
/// Each variant carries enough context for a front-end to present a useful
/// message and for callers to branch on the failure programmatically.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum QuoteError {
    /// An input value is invalid (out of range, non-finite, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// A workbook record (vendor, product, quote) was not found
    #[error("{record_type} record not found: {id}")]
    RecordNotFound { record_type: String, id: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Quote document rendering failed
    #[error("Render error: {reason}")]
    RenderError { reason: String },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl QuoteError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        QuoteError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        QuoteError::MissingField {
            field: field.into(),
        }
    }

    /// Create a RecordNotFound error
    pub fn record_not_found(record_type: impl Into<String>, id: impl Into<String>) -> Self {
        QuoteError::RecordNotFound {
            record_type: record_type.into(),
            id: id.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        QuoteError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        QuoteError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Create a RenderError
    pub fn render_error(reason: impl Into<String>) -> Self {
        QuoteError::RenderError {
            reason: reason.into(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, QuoteError::FileLocked { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            QuoteError::InvalidInput { .. } => "INVALID_INPUT",
            QuoteError::MissingField { .. } => "MISSING_FIELD",
            QuoteError::RecordNotFound { .. } => "RECORD_NOT_FOUND",
            QuoteError::FileError { .. } => "FILE_ERROR",
            QuoteError::FileLocked { .. } => "FILE_LOCKED",
            QuoteError::SerializationError { .. } => "SERIALIZATION_ERROR",
            QuoteError::VersionMismatch { .. } => "VERSION_MISMATCH",
            QuoteError::RenderError { .. } => "RENDER_ERROR",
            QuoteError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = QuoteError::invalid_input("power_mw", "-5.0", "Rated power must be positive");
        let json = serde_json::to_string(&error).unwrap();
        let roundtrip: QuoteError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(QuoteError::missing_field("test").error_code(), "MISSING_FIELD");
        assert_eq!(
            QuoteError::record_not_found("Vendor", "abc").error_code(),
            "RECORD_NOT_FOUND"
        );
    }

    #[test]
    fn test_recoverable() {
        let locked = QuoteError::file_locked("quotes.vqf", "alice (DESK-01)", "2026-01-01T00:00:00Z");
        assert!(locked.is_recoverable());
        assert!(!QuoteError::missing_field("client").is_recoverable());
    }
}
