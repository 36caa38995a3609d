// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Scope-aware identifier mangling.
//!
//! Renames declared bindings to short generated names in four phases over one
//! working tree:
//!
//! 1. **Discovery**: census of every identifier name, then collection of the
//!    candidate bindings, one per (name, owning scope).
//! 2. **Assignment**: each candidate not on the exclusion list draws the next
//!    free symbol from the [`NameGenerator`].
//! 3. **Declaration sites**: declarator, class and function ids and pattern
//!    bindings are renamed and recorded in [`DeclarationSites`].
//! 4. **Use sites**: direct parameters are renamed, then every other
//!    identifier in a reference position is resolved through a
//!    [`ScopeResolver`] and takes the generated name of the declaration it
//!    resolves to.
//!
//! Identifiers that resolve to nothing, or to a binding that was not renamed,
//! keep their names.
//!
//! # Usage
//!
//! ```
//! use estrim::mangle::{mangle, MangleOptions};
//! use estrim_tree::Node;
//! use serde_json::json;
//!
//! let tree = Node::from_json(json!({
//!     "type": "Program",
//!     "body": [{
//!         "type": "VariableDeclaration", "kind": "var",
//!         "declarations": [{
//!             "type": "VariableDeclarator",
//!             "id": { "type": "Identifier", "name": "longName" },
//!             "init": null
//!         }]
//!     }]
//! })).unwrap();
//!
//! let mangled = mangle(&tree, &MangleOptions::default()).unwrap();
//! let id = &mangled.to_json()["body"][0]["declarations"][0]["id"]["name"];
//! assert_eq!(id.as_str().map(str::len), Some(1));
//! ```

mod names;
mod scope;

pub use names::NameGenerator;
pub use scope::{
    binding_identifiers, classify_binding, is_renamable, owner_scope, AncestorScan, BindingSite,
    DeclarationSite, DeclarationSites, Resolution, ScopeResolver,
};

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use estrim_core::TreeResult;
use estrim_tree::{
    traverse_in_place, watch, watch_with_ancestors, Ancestor, Callbacks, Node, NodeId, NodeKind,
    NodeRef, Traverse, WatchCallbacks,
};

// ============================================================================
// Options and results
// ============================================================================

/// Options for a mangling run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MangleOptions {
    /// Binding names that keep their names. Generated names avoid them too.
    pub reserved: Vec<String>,
    /// Seed for the generator's alphabet permutation.
    pub seed: u64,
}

impl MangleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reserved<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// One binding and the name it was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub original: String,
    pub generated: String,
    /// The node owning the binding: a function, program or block.
    pub scope: NodeId,
}

/// What a mangling run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManglePlan {
    /// Assignments in discovery order.
    pub assignments: Vec<Assignment>,
    /// Declaration sites renamed, direct parameters included.
    pub declarations_renamed: usize,
    /// Use sites renamed.
    pub references_renamed: usize,
}

impl ManglePlan {
    /// The generated names given to bindings originally named `original`.
    pub fn generated_for<'p>(&'p self, original: &'p str) -> impl Iterator<Item = &'p str> + 'p {
        self.assignments
            .iter()
            .filter(move |assignment| assignment.original == original)
            .map(|assignment| assignment.generated.as_str())
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Mangle a copy of `tree`; `tree` itself is never touched.
///
/// # Errors
///
/// Propagates traversal errors; none are expected for a well-formed tree.
pub fn mangle(tree: &Node, options: &MangleOptions) -> TreeResult<Node> {
    let mut copy = tree.clone();
    mangle_in_place(&mut copy, options)?;
    Ok(copy)
}

/// Mangle `tree` itself with the [`AncestorScan`] resolver.
///
/// # Errors
///
/// Propagates traversal errors; none are expected for a well-formed tree.
pub fn mangle_in_place(tree: &mut Node, options: &MangleOptions) -> TreeResult<ManglePlan> {
    mangle_with(tree, options, &AncestorScan)
}

/// Mangle `tree` itself, resolving use sites with `resolver`.
///
/// # Errors
///
/// Propagates traversal errors; none are expected for a well-formed tree.
pub fn mangle_with<R>(tree: &mut Node, options: &MangleOptions, resolver: &R) -> TreeResult<ManglePlan>
where
    R: ScopeResolver + ?Sized,
{
    let occupied = census(tree);
    let mut discovery = discover(tree);
    debug!(
        names = occupied.len(),
        candidates = discovery.candidates.len(),
        sites = discovery.sites.len(),
        "discovery"
    );

    let assignments = assign(&mut discovery, options, &occupied);
    debug!(assigned = assignments.len(), "assignment");

    let mut sites = DeclarationSites::new();
    rename_declarations(tree, &discovery, &mut sites)?;
    let declared = sites.len();
    debug!(renamed = declared, "declaration sites");

    let references_renamed = {
        let mut use_sites = UseSites {
            discovery: &discovery,
            assigned: assignments.iter().map(|a| a.original.clone()).collect(),
            sites: &mut sites,
            resolver,
            renamed: 0,
        };
        traverse_in_place(tree, &mut use_sites)?;
        use_sites.renamed
    };
    debug!(
        params = sites.len() - declared,
        references = references_renamed,
        "use sites"
    );

    Ok(ManglePlan {
        assignments,
        declarations_renamed: sites.len(),
        references_renamed,
    })
}

// ============================================================================
// Phase 1: discovery
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    name: String,
    scope: NodeId,
    generated: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Site {
    candidate: usize,
    direct_param: bool,
}

/// Candidate bindings and the identifiers that declare them.
#[derive(Debug, Default, PartialEq, Eq)]
struct Discovery {
    candidates: Vec<Candidate>,
    by_key: HashMap<(String, NodeId), usize>,
    sites: HashMap<NodeId, Site>,
}

impl Discovery {
    fn record(&mut self, name: &str, scope: NodeId, identifier: NodeId, binding: BindingSite) {
        let candidates = &mut self.candidates;
        let candidate = *self
            .by_key
            .entry((name.to_string(), scope))
            .or_insert_with(|| {
                candidates.push(Candidate {
                    name: name.to_string(),
                    scope,
                    generated: None,
                });
                candidates.len() - 1
            });
        self.sites.insert(
            identifier,
            Site {
                candidate,
                direct_param: binding == BindingSite::Param { direct: true },
            },
        );
    }

    /// The candidate declared at `site`, if it was given a name.
    fn generated(&self, site: &Site) -> Option<&Candidate> {
        self.candidates
            .get(site.candidate)
            .filter(|candidate| candidate.generated.is_some())
    }
}

/// Every identifier name in the tree, JSX names included.
fn census(tree: &Node) -> HashSet<String> {
    let mut names = HashSet::new();
    watch(
        tree,
        &mut WatchCallbacks::new().all(|node| {
            if matches!(node.kind(), NodeKind::Identifier | NodeKind::JSXIdentifier) {
                if let Some(name) = node.name() {
                    names.insert(name.to_string());
                }
            }
        }),
    );
    names
}

/// Collect candidate bindings.
fn discover(tree: &Node) -> Discovery {
    let mut discovery = Discovery::default();
    watch_with_ancestors(tree, &mut |node, ancestors| {
        if node.kind() != &NodeKind::Identifier {
            return;
        }
        if let (Some((binding, scope)), Some(name)) = (classify_binding(ancestors), node.name()) {
            discovery.record(name, scope, node.id(), binding);
        }
    });
    discovery
}

// ============================================================================
// Phase 2: assignment
// ============================================================================

fn assign(
    discovery: &mut Discovery,
    options: &MangleOptions,
    occupied: &HashSet<String>,
) -> Vec<Assignment> {
    let excluded: HashSet<&str> = options.reserved.iter().map(String::as_str).collect();
    let originals: HashSet<String> = discovery
        .candidates
        .iter()
        .map(|candidate| candidate.name.clone())
        .collect();
    let mut generator = NameGenerator::new(options.seed);
    let mut used = HashSet::new();
    let mut assignments = Vec::new();

    for candidate in &mut discovery.candidates {
        if excluded.contains(candidate.name.as_str()) {
            continue;
        }
        let generated = generator.next_available(|symbol| {
            excluded.contains(symbol)
                || occupied.contains(symbol)
                || originals.contains(symbol)
                || used.contains(symbol)
        });
        used.insert(generated.clone());
        assignments.push(Assignment {
            original: candidate.name.clone(),
            generated: generated.clone(),
            scope: candidate.scope,
        });
        candidate.generated = Some(generated);
    }
    assignments
}

// ============================================================================
// Phase 3: declaration sites
// ============================================================================

fn rename_declarations(
    tree: &mut Node,
    discovery: &Discovery,
    sites: &mut DeclarationSites,
) -> TreeResult<()> {
    traverse_in_place(
        tree,
        &mut Callbacks::new().on(NodeKind::Identifier, |cursor| {
            let id = cursor.node().id();
            let Some(site) = discovery.sites.get(&id) else {
                return Ok(());
            };
            if site.direct_param {
                return Ok(());
            }
            if let Some(candidate) = discovery.generated(site) {
                rename(cursor, candidate, sites);
            }
            Ok(())
        }),
    )
}

fn rename(cursor: &mut NodeRef<'_>, candidate: &Candidate, sites: &mut DeclarationSites) {
    let Some(generated) = candidate.generated.as_deref() else {
        return;
    };
    trace!(original = %candidate.name, generated, "declaration");
    sites.mark(cursor.node().id(), candidate.name.as_str());
    cursor.node_mut().set_name(generated);
}

// ============================================================================
// Phase 4: use sites
// ============================================================================

struct UseSites<'a, R: ?Sized> {
    discovery: &'a Discovery,
    /// Original names with at least one generated name.
    assigned: HashSet<String>,
    sites: &'a mut DeclarationSites,
    resolver: &'a R,
    renamed: usize,
}

impl<R: ScopeResolver + ?Sized> UseSites<'_, R> {
    /// Expand `{ x }` to `{ x: x }` when `x` may be renamed.
    fn expand_shorthand(&self, cursor: &mut NodeRef<'_>) {
        let node = cursor.node();
        if !node.bool_field("shorthand") {
            return;
        }
        let Some(value) = node.child("value") else {
            return;
        };
        let binding = match value.kind() {
            NodeKind::AssignmentPattern => value.child("left"),
            _ => Some(value),
        };
        let Some(binding) = binding else {
            return;
        };
        let renamed = self.sites.contains(binding.id())
            || self.discovery.sites.contains_key(&binding.id())
            || binding.name().is_some_and(|name| self.assigned.contains(name));
        if renamed {
            cursor.node_mut().set("shorthand", false);
        }
    }

    fn rewrite(&mut self, cursor: &mut NodeRef<'_>) {
        let id = cursor.node().id();
        if let Some(site) = self.discovery.sites.get(&id) {
            if site.direct_param {
                if let Some(candidate) = self.discovery.generated(site) {
                    rename(cursor, candidate, self.sites);
                }
            }
            return;
        }
        if self.sites.contains(id) {
            return;
        }
        let Some(name) = cursor.node().name().map(str::to_string) else {
            return;
        };
        if !self.assigned.contains(&name) {
            return;
        }
        let ancestors: Vec<Ancestor<'_>> = cursor.ancestors().collect();
        if !is_renamable(cursor.kind(), &name, &ancestors) {
            return;
        }
        if let Resolution::Binding(generated) = self.resolver.resolve(&ancestors, &name, self.sites) {
            trace!(original = %name, %generated, "reference");
            cursor.node_mut().set_name(generated);
            self.renamed += 1;
        }
    }
}

impl<R: ScopeResolver + ?Sized> Traverse for UseSites<'_, R> {
    fn enter(&mut self, cursor: &mut NodeRef<'_>) -> TreeResult<()> {
        match cursor.kind() {
            NodeKind::Property => self.expand_shorthand(cursor),
            NodeKind::Identifier | NodeKind::JSXIdentifier => self.rewrite(cursor),
            _ => {}
        }
        Ok(())
    }
}
