// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The node reference handed to mutating visitors.
//!
//! A [`NodeRef`] is a cursor on one position of the tree. It owns mutable
//! access to the node at that position and shared access to everything
//! above it, addressed by the [`Step`] path from the root.
//!
//! While a callback runs, the walker detaches the current node from its slot,
//! so the slot seen through [`NodeRef::parent`] or [`NodeRef::ancestors`] is
//! empty for the duration of the call. Everything else in the tree is intact.
//!
//! Structural verbs ([`NodeRef::replace`], [`NodeRef::replace_with_many`],
//! [`NodeRef::remove`]) record an outcome that the walker commits when the
//! callback returns. The last verb called wins.

use serde_json::{Map, Value};

use estrim_core::{TreeError, TreeResult};

use crate::nodes::{Field, Node, NodeKind};

/// A callback run after a position's children have been visited.
pub type LeaveHook = Box<dyn FnOnce(&mut NodeRef<'_>) -> TreeResult<()>>;

/// One edge of a path: the field left through and, for list fields, the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub field: &'static str,
    pub index: Option<usize>,
}

impl Step {
    pub(crate) fn child<'n>(&self, node: &'n Node) -> Option<&'n Node> {
        match self.index {
            None => node.child(self.field),
            Some(index) => node.list(self.field)?.get(index)?.as_ref(),
        }
    }

    pub(crate) fn child_mut<'n>(&self, node: &'n mut Node) -> Option<&'n mut Node> {
        match self.index {
            None => node.child_mut(self.field),
            Some(index) => node.list_mut(self.field)?.get_mut(index)?.as_mut(),
        }
    }
}

/// An ancestor of the current position, with the edge leading back down.
#[derive(Debug, Clone, Copy)]
pub struct Ancestor<'t> {
    pub node: &'t Node,
    pub field: &'static str,
    pub index: Option<usize>,
}

impl Ancestor<'_> {
    /// The ancestor's kind.
    pub fn kind(&self) -> &NodeKind {
        self.node.kind()
    }
}

/// What the callback decided for its position.
#[derive(Debug)]
pub(crate) enum Outcome {
    Kept,
    Replaced,
    Removed,
    Spliced(Vec<Node>),
}

/// Cursor on the position being visited.
pub struct NodeRef<'t> {
    root: &'t Node,
    path: &'t [Step],
    node: &'t mut Node,
    outcome: Outcome,
    leave: Option<LeaveHook>,
}

impl<'t> NodeRef<'t> {
    pub(crate) fn new(root: &'t Node, path: &'t [Step], node: &'t mut Node) -> Self {
        NodeRef {
            root,
            path,
            node,
            outcome: Outcome::Kept,
            leave: None,
        }
    }

    pub(crate) fn finish(self) -> (Outcome, Option<LeaveHook>) {
        (self.outcome, self.leave)
    }

    // ------------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------------

    /// The node at this position (the replacement, after `replace`).
    pub fn node(&self) -> &Node {
        &*self.node
    }

    /// The node at this position, mutably.
    pub fn node_mut(&mut self) -> &mut Node {
        &mut *self.node
    }

    /// Shorthand for `node().kind()`.
    pub fn kind(&self) -> &NodeKind {
        self.node.kind()
    }

    /// Path from the root to this position.
    pub fn path(&self) -> &[Step] {
        self.path
    }

    /// Number of edges between the root and this position.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// True at the root, which has no parent slot.
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// The field of the parent holding this position.
    pub fn field(&self) -> Option<&'static str> {
        self.path.last().map(|step| step.field)
    }

    /// The list index of this position, when it sits in a list field.
    pub fn index(&self) -> Option<usize> {
        self.path.last().and_then(|step| step.index)
    }

    /// The nearest ancestor.
    pub fn parent(&self) -> Option<&'t Node> {
        self.ancestors().next().map(|ancestor| ancestor.node)
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = Ancestor<'t>> {
        let mut chain = Vec::with_capacity(self.path.len());
        let mut node = self.root;
        for step in self.path {
            chain.push(Ancestor {
                node,
                field: step.field,
                index: step.index,
            });
            match step.child(node) {
                Some(child) => node = child,
                None => break,
            }
        }
        chain.into_iter().rev()
    }

    /// True once `remove` has been called and not overridden.
    pub fn is_removed(&self) -> bool {
        matches!(self.outcome, Outcome::Removed)
    }

    // ------------------------------------------------------------------------
    // Edit verbs
    // ------------------------------------------------------------------------

    /// Swap this position for `node`. The replacement is not visited.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::Structural` at the root.
    pub fn replace(&mut self, node: Node) -> TreeResult<()> {
        if self.is_root() {
            return Err(TreeError::structural("cannot replace the root: it has no parent slot"));
        }
        *self.node = node;
        self.outcome = Outcome::Replaced;
        Ok(())
    }

    /// Splice `nodes` into the enclosing list in place of this position.
    ///
    /// An empty vector behaves like [`NodeRef::remove`].
    ///
    /// # Errors
    ///
    /// Returns `TreeError::Structural` when this position is not a list element.
    pub fn replace_with_many(&mut self, nodes: Vec<Node>) -> TreeResult<()> {
        if self.index().is_none() {
            return Err(TreeError::structural(format!(
                "cannot splice {} nodes: position is not a list element",
                nodes.len()
            )));
        }
        self.outcome = Outcome::Spliced(nodes);
        Ok(())
    }

    /// Delete this position: compacted out of a list, or the field dropped.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::Structural` at the root.
    pub fn remove(&mut self) -> TreeResult<()> {
        if self.is_root() {
            return Err(TreeError::structural("cannot remove the root: it has no parent slot"));
        }
        self.outcome = Outcome::Removed;
        Ok(())
    }

    /// Merge a JSON object into the current node.
    ///
    /// With `shallow`, each key overwrites the field of the same name. Otherwise
    /// the merge recurses wherever both the patch and the node have an object
    /// (or list) at the same key, and overwrites everywhere else. A `type` key
    /// changes the node's kind.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::Structural` if `patch` is not an object or a `type`
    /// is not a string, and `TreeError::MalformedTree` if a list patch holds a
    /// non-node element.
    pub fn modify(&mut self, patch: Value, shallow: bool) -> TreeResult<()> {
        let Value::Object(patch) = patch else {
            return Err(TreeError::structural("modify expects an object patch"));
        };
        merge_node(&mut *self.node, patch, shallow)
    }

    /// A structural copy of the current node with fresh ids.
    pub fn clone_node(&self) -> Node {
        self.node.clone()
    }

    /// Run `hook` once this position's children have been visited.
    ///
    /// Replaces any hook registered earlier for this position.
    pub fn on_leave<F>(&mut self, hook: F)
    where
        F: FnOnce(&mut NodeRef<'_>) -> TreeResult<()> + 'static,
    {
        self.leave = Some(Box::new(hook));
    }
}

// ============================================================================
// Merge
// ============================================================================

fn merge_node(node: &mut Node, patch: Map<String, Value>, shallow: bool) -> TreeResult<()> {
    for (key, value) in patch {
        if key == "type" {
            let Value::String(kind) = value else {
                return Err(TreeError::structural("`type` in a patch must be a string"));
            };
            node.set_kind(NodeKind::from_type(&kind));
            continue;
        }
        match node.get_mut(&key) {
            Some(field) if !shallow => merge_field(field, value)?,
            _ => node.set(&key, Field::from_json(value)?),
        }
    }
    Ok(())
}

fn merge_field(field: &mut Field, value: Value) -> TreeResult<()> {
    match (field, value) {
        (Field::Node(node), Value::Object(patch)) => merge_node(node, patch, false),
        (Field::List(items), Value::Array(patches)) => {
            for (index, patch) in patches.into_iter().enumerate() {
                match (items.get_mut(index), patch) {
                    (Some(Some(node)), Value::Object(patch)) => merge_node(node, patch, false)?,
                    (Some(slot), patch) => *slot = slot_from_json(patch)?,
                    (None, patch) => items.push(slot_from_json(patch)?),
                }
            }
            Ok(())
        }
        (Field::Value(Value::Object(existing)), Value::Object(patch)) => {
            merge_json(existing, patch);
            Ok(())
        }
        (field, value) => {
            *field = Field::from_json(value)?;
            Ok(())
        }
    }
}

fn slot_from_json(value: Value) -> TreeResult<Option<Node>> {
    match value {
        Value::Null => Ok(None),
        other => Node::from_json(other).map(Some),
    }
}

fn merge_json(existing: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        match (existing.get_mut(&key), value) {
            (Some(Value::Object(inner)), Value::Object(patch)) => merge_json(inner, patch),
            (_, value) => {
                existing.insert(key, value);
            }
        }
    }
}

// ============================================================================
// Path resolution
// ============================================================================

pub(crate) fn node_at<'n>(mut node: &'n Node, path: &[Step]) -> Option<&'n Node> {
    for step in path {
        node = step.child(node)?;
    }
    Some(node)
}

pub(crate) fn node_at_mut<'n>(mut node: &'n mut Node, path: &[Step]) -> Option<&'n mut Node> {
    for step in path {
        node = step.child_mut(node)?;
    }
    Some(node)
}

pub(crate) fn lost_position() -> TreeError {
    TreeError::structural("traversal position no longer exists")
}

/// Take the node at `path` out of the tree, leaving its slot empty.
pub(crate) fn detach(root: &mut Node, path: &[Step]) -> TreeResult<Node> {
    let Some((last, parent_path)) = path.split_last() else {
        return Ok(std::mem::replace(root, Node::new(NodeKind::Other(String::new()))));
    };
    let parent = node_at_mut(root, parent_path).ok_or_else(lost_position)?;
    let taken = match last.index {
        None => parent.get_mut(last.field).and_then(|field| {
            match std::mem::replace(field, Field::Value(Value::Null)) {
                Field::Node(node) => Some(*node),
                other => {
                    *field = other;
                    None
                }
            }
        }),
        Some(index) => parent
            .list_mut(last.field)
            .and_then(|items| items.get_mut(index))
            .and_then(Option::take),
    };
    taken.ok_or_else(lost_position)
}

/// Put `node` back into the slot at `path`.
pub(crate) fn attach(root: &mut Node, path: &[Step], node: Node) -> TreeResult<()> {
    let Some((last, parent_path)) = path.split_last() else {
        *root = node;
        return Ok(());
    };
    let parent = node_at_mut(root, parent_path).ok_or_else(lost_position)?;
    match last.index {
        None => {
            parent.set(last.field, node);
            Ok(())
        }
        Some(index) => {
            let slot = parent
                .list_mut(last.field)
                .and_then(|items| items.get_mut(index))
                .ok_or_else(lost_position)?;
            *slot = Some(node);
            Ok(())
        }
    }
}
