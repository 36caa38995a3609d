// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Traversal engine for ESTree trees.
//!
//! # Traversal Order
//!
//! - **Depth-first, pre-order** for entry callbacks
//! - Fields in the order given by [`NodeKind::visitable_fields`](crate::NodeKind::visitable_fields)
//! - List elements left to right
//! - **Post-order** for leave-hooks
//!
//! # Watch Pattern
//!
//! [`watch`] is read-only and sees each node exactly once:
//!
//! ```
//! use estrim_tree::{watch, Node, Watch};
//! use serde_json::json;
//!
//! struct Counter(usize);
//!
//! impl Watch for Counter {
//!     fn visit(&mut self, _node: &Node) {
//!         self.0 += 1;
//!     }
//! }
//!
//! let tree = Node::from_json(json!({ "type": "Program", "body": [] })).unwrap();
//! let mut counter = Counter(0);
//! watch(&tree, &mut counter);
//! assert_eq!(counter.0, 1);
//! ```
//!
//! # Traverse Pattern
//!
//! [`traverse`] hands each position a [`NodeRef`] cursor with edit verbs:
//!
//! ```
//! use estrim_tree::{traverse, Callbacks, Node, NodeKind};
//! use serde_json::json;
//!
//! let tree = Node::from_json(json!({
//!     "type": "Program",
//!     "body": [
//!         { "type": "DebuggerStatement" },
//!         { "type": "EmptyStatement" }
//!     ]
//! })).unwrap();
//!
//! let out = traverse(
//!     &tree,
//!     &mut Callbacks::new().on(NodeKind::DebuggerStatement, |node| node.remove()),
//! ).unwrap();
//! assert_eq!(out.list("body").unwrap().len(), 1);
//! assert_eq!(tree.list("body").unwrap().len(), 2);
//! ```
//!
//! # Settled Positions
//!
//! A position that was replaced, removed or spliced is settled: the walker
//! does not descend into it, and nodes introduced by a verb are not visited
//! during the same pass. A single replacement still receives its leave-hook.

mod cursor;
mod dispatch;
mod traits;

pub use cursor::{Ancestor, LeaveHook, NodeRef, Step};
pub use dispatch::{traverse, traverse_in_place, watch, watch_with_ancestors};
pub use traits::{Callbacks, Traverse, Watch, WatchCallbacks};
