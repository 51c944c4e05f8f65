//! # Error Types
//!
//! Structured error types for estimator_core. The calculators themselves are
//! total over valid inputs and never fail; these errors come from input
//! validation, the project store, and report rendering.
//!
//! ## Example
//!
//! ```rust
//! use estimator_core::errors::{EstimateError, EstimateResult};
//!
//! fn validate_length(length_m: f64) -> EstimateResult<()> {
//!     if length_m < 0.0 {
//!         return Err(EstimateError::invalid_input(
//!             "length_m",
//!             length_m.to_string(),
//!             "Length cannot be negative",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for estimator_core operations
pub type EstimateResult<T> = Result<T, EstimateError>;

/// Structured error type for estimation and persistence operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum EstimateError {
    /// An input value is invalid (negative, non-finite, out of range)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// No project with this id exists in the store
    #[error("Project not found: {id}")]
    ProjectNotFound { id: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// Data directory is locked by another process
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

    /// Report compilation or rendering failed
    #[error("Report failed: {reason}")]
    ReportFailed { reason: String },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl EstimateError {
    /// Create an InvalidInput error
    pub fn invalid_input(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        EstimateError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        EstimateError::MissingField {
            field: field.into(),
        }
    }

    /// Create a ProjectNotFound error
    pub fn project_not_found(id: impl ToString) -> Self {
        EstimateError::ProjectNotFound { id: id.to_string() }
    }

    /// Create a FileError
    pub fn file_error(
        operation: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        EstimateError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(
        path: impl Into<String>,
        locked_by: impl Into<String>,
        locked_at: impl Into<String>,
    ) -> Self {
        EstimateError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Create a SerializationError from any displayable error
    pub fn serialization(reason: impl ToString) -> Self {
        EstimateError::SerializationError {
            reason: reason.to_string(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EstimateError::FileLocked { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            EstimateError::InvalidInput { .. } => "INVALID_INPUT",
            EstimateError::MissingField { .. } => "MISSING_FIELD",
            EstimateError::ProjectNotFound { .. } => "PROJECT_NOT_FOUND",
            EstimateError::FileError { .. } => "FILE_ERROR",
            EstimateError::FileLocked { .. } => "FILE_LOCKED",
            EstimateError::SerializationError { .. } => "SERIALIZATION_ERROR",
            EstimateError::VersionMismatch { .. } => "VERSION_MISMATCH",
            EstimateError::ReportFailed { .. } => "REPORT_FAILED",
            EstimateError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for EstimateError {
    fn from(e: serde_json::Error) -> Self {
        EstimateError::serialization(e)
    }
}

/// Reject negative or non-finite values for a named field.
pub(crate) fn ensure_non_negative(field: &str, value: f64) -> EstimateResult<()> {
    if !value.is_finite() {
        return Err(EstimateError::invalid_input(
            field,
            value.to_string(),
            "Value must be a finite number",
        ));
    }
    if value < 0.0 {
        return Err(EstimateError::invalid_input(
            field,
            value.to_string(),
            "Value cannot be negative",
        ));
    }
    Ok(())
}
