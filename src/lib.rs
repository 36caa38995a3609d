//! estrim: passes over ESTree trees.
//!
//! The tree model and traversal engine live in `estrim-tree`; this crate
//! builds the passes and the command-line surface on top of them:
//! - [`mangle`]: scope-aware renaming of bindings to short names
//! - [`optimize`]: constant folding and dead-statement pruning
//! - [`config`], [`output`], [`cli`]: configuration, JSON output and the CLI
//!   helpers used by the `estrim` binary

pub mod cli;
pub mod config;
pub mod mangle;
pub mod optimize;
pub mod output;

pub use estrim_core::{ErrorCode, TreeError, TreeResult};
pub use estrim_tree::{
    from_serialize, to_tree, traverse, traverse_in_place, watch, JsValue, Node, NodeKind,
    NodeRef, Traverse, Watch,
};

pub use config::EstrimConfig;
pub use mangle::{mangle, mangle_in_place, MangleOptions, ManglePlan};
pub use optimize::{optimize, optimize_in_place};
