// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! ESTree trees and the mutation-safe traversal engine.
//!
//! - [`nodes`]: the node model and the visitable registry
//! - [`visitor`]: `watch`, `traverse` and the [`NodeRef`] cursor
//! - [`builder`]: native values to expression nodes
//! - [`value`]: the native value model with the language's coercion rules

pub mod builder;
pub mod nodes;
pub mod value;
pub mod visitor;

pub use builder::{from_serialize, to_tree};
pub use nodes::{Field, Node, NodeId, NodeKind};
pub use value::JsValue;
pub use visitor::{
    traverse, traverse_in_place, watch, watch_with_ancestors, Ancestor, Callbacks, NodeRef, Step,
    Traverse, Watch, WatchCallbacks,
};
