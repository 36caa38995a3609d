//! Error types and error code constants for estrim.
//!
//! This module provides a unified error type (`TreeError`) shared by the tree
//! model, the traversal engine and the passes built on top of it, plus the
//! stable numeric codes the CLI reports.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid input (bad identifier, unsupported native value, bad config)
//! - `3`: Malformed tree (input JSON is not an ESTree node)
//! - `4`: Transform errors (structural edit without a position to act on)
//! - `10`: Internal errors (I/O, serialization)
//!
//! ## Design
//!
//! - **Unified type**: `TreeError` is the single error type every pass returns
//! - **No partial success**: a pass either returns a transformed tree or an error
//! - **Code mapping**: `ErrorCode` provides stable integer codes for JSON output

use std::fmt;

use thiserror::Error;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output and CLI exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorCode {
    /// Invalid input from the caller (bad identifier, unsupported value, bad config).
    InvalidInput = 2,
    /// The input is not an ESTree node.
    MalformedTree = 3,
    /// A structural edit could not be applied.
    TransformError = 4,
    /// Internal errors (I/O, serialization).
    InternalError = 10,
}

impl ErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for tree construction, traversal and passes.
///
/// All variants are synchronous contract violations. Nothing here is
/// retryable: the same input always produces the same error.
#[derive(Debug, Error)]
pub enum TreeError {
    /// A native value has no tree encoding.
    #[error("cannot convert {kind} to a tree node")]
    Construction { kind: String },

    /// A requested declaration name is not a valid, non-reserved binding name.
    #[error("invalid identifier '{name}': {reason}")]
    InvalidIdentifier { name: String, reason: String },

    /// An edit verb was invoked without a position it can act on.
    #[error("structural error: {message}")]
    Structural { message: String },

    /// The input is not an ESTree node.
    #[error("malformed tree: {message}")]
    MalformedTree { message: String },

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// I/O failure while reading input or writing output.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TreeError {
    /// Create a structural error.
    pub fn structural(message: impl Into<String>) -> Self {
        TreeError::Structural {
            message: message.into(),
        }
    }

    /// Create a malformed-tree error.
    pub fn malformed(message: impl Into<String>) -> Self {
        TreeError::MalformedTree {
            message: message.into(),
        }
    }

    /// Create a construction error for a value of the given kind.
    pub fn construction(kind: impl Into<String>) -> Self {
        TreeError::Construction { kind: kind.into() }
    }

    /// Create an invalid-identifier error.
    pub fn invalid_identifier(name: impl Into<String>, reason: impl Into<String>) -> Self {
        TreeError::InvalidIdentifier {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        TreeError::Config {
            message: message.into(),
        }
    }
}

/// Result type alias used across estrim.
pub type TreeResult<T> = Result<T, TreeError>;

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&TreeError> for ErrorCode {
    fn from(err: &TreeError) -> Self {
        match err {
            TreeError::Construction { .. } => ErrorCode::InvalidInput,
            TreeError::InvalidIdentifier { .. } => ErrorCode::InvalidInput,
            TreeError::Config { .. } => ErrorCode::InvalidInput,
            TreeError::MalformedTree { .. } => ErrorCode::MalformedTree,
            TreeError::Structural { .. } => ErrorCode::TransformError,
            TreeError::Io { .. } => ErrorCode::InternalError,
            TreeError::Json(_) => ErrorCode::InternalError,
        }
    }
}
