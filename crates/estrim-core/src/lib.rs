//! Core infrastructure for estrim.
//!
//! This crate provides the pieces shared by the tree model and the passes:
//! - Error types and error codes
//! - Lexical rules for binding names (reserved words, identifier validity)

pub mod error;
pub mod lexical;

pub use error::{ErrorCode, TreeError, TreeResult};
