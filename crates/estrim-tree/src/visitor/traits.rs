// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Visitor trait definitions and closure tables.

use std::collections::HashMap;

use estrim_core::TreeResult;

use crate::nodes::{Node, NodeKind};

use super::cursor::NodeRef;

/// Read-only visitor, driven by [`watch`](super::watch).
pub trait Watch {
    /// Called for every node, pre-order.
    fn visit(&mut self, node: &Node);
}

/// Mutating visitor, driven by [`traverse`](super::traverse).
pub trait Traverse {
    /// Called for every position, pre-order, before its children.
    ///
    /// Use the cursor's verbs to edit the tree and
    /// [`NodeRef::on_leave`] to run code after the children.
    fn enter(&mut self, node: &mut NodeRef<'_>) -> TreeResult<()>;
}

type WatchFn<'c> = Box<dyn FnMut(&Node) + 'c>;
type TraverseFn<'c> = Box<dyn FnMut(&mut NodeRef<'_>) -> TreeResult<()> + 'c>;

/// A [`Watch`] built from per-kind closures and an optional catch-all.
///
/// For each node the per-kind closure runs first, then the catch-all.
///
/// # Usage
///
/// ```
/// use estrim_tree::{watch, Node, NodeKind, WatchCallbacks};
/// use serde_json::json;
///
/// let tree = Node::from_json(json!({
///     "type": "Program",
///     "body": [{ "type": "ExpressionStatement",
///                "expression": { "type": "Identifier", "name": "a" } }]
/// })).unwrap();
///
/// let mut names = Vec::new();
/// let mut total = 0;
/// watch(
///     &tree,
///     &mut WatchCallbacks::new()
///         .on(NodeKind::Identifier, |node| names.push(node.name().unwrap_or_default().to_string()))
///         .all(|_| total += 1),
/// );
/// assert_eq!(names, ["a"]);
/// assert_eq!(total, 3);
/// ```
#[derive(Default)]
pub struct WatchCallbacks<'c> {
    by_kind: HashMap<NodeKind, WatchFn<'c>>,
    all: Option<WatchFn<'c>>,
}

impl<'c> WatchCallbacks<'c> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the closure for `kind`, replacing any earlier one.
    pub fn on<F>(mut self, kind: NodeKind, callback: F) -> Self
    where
        F: FnMut(&Node) + 'c,
    {
        self.by_kind.insert(kind, Box::new(callback));
        self
    }

    /// Register the catch-all closure.
    pub fn all<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&Node) + 'c,
    {
        self.all = Some(Box::new(callback));
        self
    }
}

impl Watch for WatchCallbacks<'_> {
    fn visit(&mut self, node: &Node) {
        if let Some(callback) = self.by_kind.get_mut(node.kind()) {
            callback(node);
        }
        if let Some(all) = self.all.as_mut() {
            all(node);
        }
    }
}

/// A [`Traverse`] built from per-kind closures and an optional catch-all.
///
/// For each position the per-kind closure runs first, then the catch-all,
/// both with the same cursor. An error from either aborts the traversal.
#[derive(Default)]
pub struct Callbacks<'c> {
    by_kind: HashMap<NodeKind, TraverseFn<'c>>,
    all: Option<TraverseFn<'c>>,
}

impl<'c> Callbacks<'c> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the closure for `kind`, replacing any earlier one.
    pub fn on<F>(mut self, kind: NodeKind, callback: F) -> Self
    where
        F: FnMut(&mut NodeRef<'_>) -> TreeResult<()> + 'c,
    {
        self.by_kind.insert(kind, Box::new(callback));
        self
    }

    /// Register the catch-all closure.
    pub fn all<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&mut NodeRef<'_>) -> TreeResult<()> + 'c,
    {
        self.all = Some(Box::new(callback));
        self
    }
}

impl Traverse for Callbacks<'_> {
    fn enter(&mut self, node: &mut NodeRef<'_>) -> TreeResult<()> {
        let kind = node.kind().clone();
        if let Some(callback) = self.by_kind.get_mut(&kind) {
            callback(node)?;
        }
        if let Some(all) = self.all.as_mut() {
            all(node)?;
        }
        Ok(())
    }
}
