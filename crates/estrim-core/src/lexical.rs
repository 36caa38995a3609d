//! Lexical rules for binding names.
//!
//! Two tables live here:
//! - [`RESERVED_WORDS`]: names that can never be used as a binding name
//!   (keywords, strict-mode reserved words, literal keywords, `arguments`, `eval`).
//! - [`RESERVED_GLOBALS`]: global names a generated name must never shadow.
//!
//! Both are immutable for the lifetime of the process.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{TreeError, TreeResult};

/// Names that are never valid binding names.
pub const RESERVED_WORDS: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "import", "in", "instanceof", "let", "new", "null", "return", "static", "super",
    "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
    "implements", "interface", "package", "private", "protected", "public", "arguments", "eval",
];

/// Global names that generated names must not shadow.
pub const RESERVED_GLOBALS: &[&str] = &["undefined", "NaN", "Infinity", "globalThis"];

static RESERVED_SET: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    RESERVED_WORDS
        .iter()
        .chain(RESERVED_GLOBALS.iter())
        .copied()
        .collect()
});

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[$_\p{ID_Start}][$\x{200C}\x{200D}\p{ID_Continue}]*$")
        .expect("identifier pattern is valid")
});

/// Returns true if `name` is a reserved word or a protected global.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_SET.contains(name)
}

/// Returns true if `name` has the lexical shape of an identifier.
///
/// Does not check reserved words; see [`is_binding_name`].
pub fn is_identifier_name(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Returns true if `name` can be declared as a binding.
pub fn is_binding_name(name: &str) -> bool {
    is_identifier_name(name) && !RESERVED_WORDS.contains(&name)
}

/// Validate a requested declaration name.
///
/// # Errors
///
/// Returns `TreeError::InvalidIdentifier` if the name is empty, is not an
/// identifier, or is a reserved word.
pub fn check_binding_name(name: &str) -> TreeResult<()> {
    if name.is_empty() {
        return Err(TreeError::invalid_identifier(name, "name is empty"));
    }
    if !is_identifier_name(name) {
        return Err(TreeError::invalid_identifier(
            name,
            "not a syntactically valid identifier",
        ));
    }
    if RESERVED_WORDS.contains(&name) {
        return Err(TreeError::invalid_identifier(name, "reserved word"));
    }
    Ok(())
}
