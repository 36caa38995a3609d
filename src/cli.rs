//! CLI front door helpers.
//!
//! The binary parses arguments and sets up logging; everything it does with a
//! tree goes through this module:
//! - [`read_tree`] / [`write_tree`] - ESTree JSON in and out (file or stdio)
//! - [`run_mangle`], [`run_optimize`], [`run_minify`] - the passes, applied
//!   to an owned tree
//!
//! ## Error Handling
//!
//! All functions return `TreeResult<T>`. Input that is not JSON, or JSON that
//! is not an ESTree node, is reported as `TreeError::MalformedTree`.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use tracing::info;

use estrim_core::{TreeError, TreeResult};
use estrim_tree::Node;

use crate::config::EstrimConfig;
use crate::mangle::{mangle_in_place, ManglePlan};
use crate::optimize::optimize_in_place;
use crate::output::{emit_response, emit_response_compact};

/// Parse ESTree JSON text.
pub fn parse_tree(text: &str, origin: &str) -> TreeResult<Node> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| TreeError::malformed(format!("{}: {}", origin, e)))?;
    Node::from_json(value)
}

/// Read a tree from `input`, or from stdin when `input` is `None`.
pub fn read_tree(input: Option<&Path>) -> TreeResult<Node> {
    let (text, origin) = match input {
        Some(path) => {
            let origin = path.display().to_string();
            let text = fs::read_to_string(path).map_err(|source| TreeError::Io {
                path: origin.clone(),
                source,
            })?;
            (text, origin)
        }
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .map_err(|source| TreeError::Io {
                    path: "<stdin>".to_string(),
                    source,
                })?;
            (text, "<stdin>".to_string())
        }
    };
    parse_tree(&text, &origin)
}

/// Serialize `tree` into `writer`.
pub fn emit_tree(tree: &Node, compact: bool, writer: &mut impl Write) -> TreeResult<()> {
    let result = if compact {
        emit_response_compact(tree, writer)
    } else {
        emit_response(tree, writer)
    };
    result.map_err(|source| TreeError::Io {
        path: "<output>".to_string(),
        source,
    })
}

/// Write `tree` to `output`, or to stdout when `output` is `None`.
pub fn write_tree(tree: &Node, output: Option<&Path>, compact: bool) -> TreeResult<()> {
    match output {
        Some(path) => {
            let mut buffer = Vec::new();
            emit_tree(tree, compact, &mut buffer)?;
            fs::write(path, buffer).map_err(|source| TreeError::Io {
                path: path.display().to_string(),
                source,
            })
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            emit_tree(tree, compact, &mut handle)?;
            let _ = handle.flush();
            Ok(())
        }
    }
}

/// Mangle `tree` with the configured options.
pub fn run_mangle(tree: &mut Node, config: &EstrimConfig) -> TreeResult<ManglePlan> {
    let plan = mangle_in_place(tree, &config.mangle)?;
    info!(
        bindings = plan.assignments.len(),
        declarations = plan.declarations_renamed,
        references = plan.references_renamed,
        "mangled"
    );
    Ok(plan)
}

/// Optimize `tree`.
pub fn run_optimize(tree: &mut Node) -> TreeResult<()> {
    optimize_in_place(tree)?;
    info!("optimized");
    Ok(())
}

/// Optimize, then mangle.
pub fn run_minify(tree: &mut Node, config: &EstrimConfig) -> TreeResult<ManglePlan> {
    run_optimize(tree)?;
    run_mangle(tree, config)
}
