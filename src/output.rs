//! JSON output for the CLI.
//!
//! Successful runs write the transformed ESTree document. Failures write an
//! error envelope instead:
//!
//! ```json
//! {
//!   "status": "error",
//!   "schema_version": "1",
//!   "error": { "code": 3, "message": "malformed tree: ..." }
//! }
//! ```
//!
//! Output is always JSON and deterministic: the same input produces the same
//! bytes.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use estrim_core::{ErrorCode, TreeError};

/// Current schema version for error envelopes.
pub const SCHEMA_VERSION: &str = "1";

/// Error information for error responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code, also the process exit code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    /// Create from a TreeError.
    pub fn from_error(err: &TreeError) -> Self {
        let code = ErrorCode::from(err).code();
        let message = err.to_string();
        let details = match err {
            TreeError::InvalidIdentifier { name, reason } => {
                Some(serde_json::json!({ "name": name, "reason": reason }))
            }
            TreeError::Io { path, .. } => Some(serde_json::json!({ "path": path })),
            TreeError::Construction { kind } => Some(serde_json::json!({ "kind": kind })),
            _ => None,
        };
        ErrorInfo {
            code,
            message,
            details,
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Error information.
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Create an error response from a TreeError.
    pub fn from_error(err: &TreeError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize + ?Sized>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

/// Emit a response as compact JSON (single line) to a writer.
pub fn emit_response_compact<T: Serialize + ?Sized>(
    response: &T,
    writer: &mut impl Write,
) -> io::Result<()> {
    let json = serde_json::to_string(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}
