// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Walk functions for tree traversal.
//!
//! [`watch`] recurses over shared references. [`traverse_in_place`] drives a
//! [`Walker`] that addresses positions by path, so a callback can read every
//! ancestor while it edits its own node.
//!
//! # List passes
//!
//! Within one list field, each element's outcome is buffered and the list is
//! rebuilt once after the last element has been visited. Indices seen by the
//! callbacks are therefore the original indices, and removals never shift a
//! sibling that has not been visited yet.

use tracing::trace;

use estrim_core::{TreeError, TreeResult};

use crate::nodes::{Field, Node};

use super::cursor::{
    attach, detach, lost_position, node_at, node_at_mut, Ancestor, LeaveHook, NodeRef, Outcome,
    Step,
};
use super::traits::{Traverse, Watch};

/// Visit every node read-only, pre-order.
pub fn watch<W: Watch + ?Sized>(tree: &Node, visitor: &mut W) {
    visitor.visit(tree);
    let Some(fields) = tree.kind().visitable_fields() else {
        return;
    };
    for &field in fields {
        match tree.get(field) {
            Some(Field::Node(child)) => watch(child, visitor),
            Some(Field::List(items)) => {
                for child in items.iter().flatten() {
                    watch(child, visitor);
                }
            }
            _ => {}
        }
    }
}

/// Visit every node read-only, pre-order, with its ancestors nearest first.
///
/// Unlike a cursor, the ancestor slots still hold the visited node.
pub fn watch_with_ancestors<'t, F>(tree: &'t Node, visit: &mut F)
where
    F: FnMut(&'t Node, &[Ancestor<'t>]),
{
    let mut chain = Vec::new();
    watch_below(tree, &mut chain, visit);
}

fn watch_below<'t, F>(node: &'t Node, chain: &mut Vec<Ancestor<'t>>, visit: &mut F)
where
    F: FnMut(&'t Node, &[Ancestor<'t>]),
{
    visit(node, chain);
    let Some(fields) = node.kind().visitable_fields() else {
        return;
    };
    for &field in fields {
        match node.get(field) {
            Some(Field::Node(child)) => {
                chain.insert(0, Ancestor { node, field, index: None });
                watch_below(child, chain, visit);
                chain.remove(0);
            }
            Some(Field::List(items)) => {
                for (index, child) in items.iter().enumerate() {
                    let Some(child) = child else {
                        continue;
                    };
                    chain.insert(0, Ancestor { node, field, index: Some(index) });
                    watch_below(child, chain, visit);
                    chain.remove(0);
                }
            }
            _ => {}
        }
    }
}

/// Traverse a copy of `tree` and return the edited copy.
///
/// The copy has fresh node ids; `tree` itself is never touched.
///
/// # Errors
///
/// Propagates the first error returned by the visitor or by an edit verb.
pub fn traverse<V: Traverse + ?Sized>(tree: &Node, visitor: &mut V) -> TreeResult<Node> {
    let mut copy = tree.clone();
    traverse_in_place(&mut copy, visitor)?;
    Ok(copy)
}

/// Traverse and edit `tree` itself.
///
/// # Errors
///
/// Propagates the first error returned by the visitor or by an edit verb.
/// Edits committed before the error remain in `tree`.
pub fn traverse_in_place<V: Traverse + ?Sized>(tree: &mut Node, visitor: &mut V) -> TreeResult<()> {
    let mut walker = Walker {
        root: tree,
        path: Vec::new(),
        visitor,
    };
    walker.walk().map(|_| ())
}

/// How a visited position settled, as seen from its parent.
enum Settled {
    Keep,
    Remove,
    Flatten(Vec<Node>),
}

impl Settled {
    fn from_outcome(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Kept | Outcome::Replaced => Settled::Keep,
            Outcome::Removed => Settled::Remove,
            Outcome::Spliced(nodes) => Settled::Flatten(nodes),
        }
    }
}

struct Walker<'a, V: ?Sized> {
    root: &'a mut Node,
    path: Vec<Step>,
    visitor: &'a mut V,
}

impl<V: Traverse + ?Sized> Walker<'_, V> {
    /// Visit the position at `self.path` and everything below it.
    fn walk(&mut self) -> TreeResult<Settled> {
        let (outcome, hook) = self.with_cursor(|visitor, cursor| visitor.enter(cursor))?;
        match outcome {
            Outcome::Kept => self.walk_children()?,
            // A replacement is settled: its subtree is not visited this pass.
            Outcome::Replaced => {}
            Outcome::Removed | Outcome::Spliced(_) => return Ok(Settled::from_outcome(outcome)),
        }
        match hook {
            Some(hook) => {
                let (outcome, _) = self.with_cursor(|_, cursor| hook(cursor))?;
                Ok(Settled::from_outcome(outcome))
            }
            None => Ok(Settled::Keep),
        }
    }

    /// Detach the current node, run `run` with a cursor on it, reattach.
    fn with_cursor<F>(&mut self, run: F) -> TreeResult<(Outcome, Option<LeaveHook>)>
    where
        F: FnOnce(&mut V, &mut NodeRef<'_>) -> TreeResult<()>,
    {
        let mut node = detach(self.root, &self.path)?;
        let mut cursor = NodeRef::new(&*self.root, &self.path, &mut node);
        let result = run(&mut *self.visitor, &mut cursor);
        let settled = cursor.finish();
        attach(self.root, &self.path, node)?;
        result.map(|()| settled)
    }

    fn walk_children(&mut self) -> TreeResult<()> {
        let node = node_at(self.root, &self.path).ok_or_else(lost_position)?;
        let Some(fields) = node.kind().visitable_fields() else {
            return Ok(());
        };
        for &field in fields {
            let node = node_at(self.root, &self.path).ok_or_else(lost_position)?;
            match node.get(field) {
                Some(Field::Node(_)) => self.walk_single(field)?,
                Some(Field::List(items)) => {
                    let occupied: Vec<bool> = items.iter().map(Option::is_some).collect();
                    self.walk_list(field, &occupied)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn walk_single(&mut self, field: &'static str) -> TreeResult<()> {
        self.path.push(Step { field, index: None });
        let settled = self.walk()?;
        self.path.pop();
        match settled {
            Settled::Keep => Ok(()),
            Settled::Remove => {
                let node = node_at_mut(self.root, &self.path).ok_or_else(lost_position)?;
                node.remove(field);
                trace!(field, "removed field");
                Ok(())
            }
            Settled::Flatten(_) => Err(TreeError::structural(format!(
                "cannot splice into `{field}`: it is not a list"
            ))),
        }
    }

    fn walk_list(&mut self, field: &'static str, occupied: &[bool]) -> TreeResult<()> {
        let mut settled = Vec::with_capacity(occupied.len());
        for (index, &present) in occupied.iter().enumerate() {
            if !present {
                settled.push(Settled::Keep);
                continue;
            }
            self.path.push(Step {
                field,
                index: Some(index),
            });
            settled.push(self.walk()?);
            self.path.pop();
        }
        if settled.iter().all(|s| matches!(s, Settled::Keep)) {
            return Ok(());
        }

        let node = node_at_mut(self.root, &self.path).ok_or_else(lost_position)?;
        let items = node.list_mut(field).ok_or_else(lost_position)?;
        let before = items.len();
        *items = compact(std::mem::take(items), settled);
        trace!(field, before, after = items.len(), "compacted list");
        Ok(())
    }
}

/// Apply buffered outcomes to a list, preserving relative order.
fn compact(slots: Vec<Option<Node>>, settled: Vec<Settled>) -> Vec<Option<Node>> {
    let mut out = Vec::with_capacity(slots.len());
    for (slot, settled) in slots.into_iter().zip(settled) {
        match settled {
            Settled::Keep => out.push(slot),
            Settled::Remove => {}
            Settled::Flatten(nodes) => out.extend(nodes.into_iter().map(Some)),
        }
    }
    out
}
