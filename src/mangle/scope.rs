// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Scope knowledge for the mangler.
//!
//! Everything here reads ancestor chains as produced by
//! [`NodeRef::ancestors`](estrim_tree::NodeRef::ancestors): nearest first,
//! each entry carrying the field that leads back down toward the identifier.
//!
//! - [`classify_binding`] decides whether an identifier declares a binding,
//!   and which scope owns it
//! - [`is_renamable`] applies the position rules for use sites
//! - [`ScopeResolver`] maps a use site to the declaration it refers to;
//!   [`AncestorScan`] is the shipped implementation

use std::collections::HashMap;

use estrim_tree::{Ancestor, Node, NodeId, NodeKind};

// ============================================================================
// Declaration side table
// ============================================================================

/// A renamed declaration site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationSite {
    /// The name the site had before renaming.
    pub original: String,
}

/// Renamed declaration sites, keyed by node identity.
#[derive(Debug, Default)]
pub struct DeclarationSites {
    sites: HashMap<NodeId, DeclarationSite>,
}

impl DeclarationSites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id` as a declaration site that was named `original`.
    pub fn mark(&mut self, id: NodeId, original: impl Into<String>) {
        self.sites.insert(
            id,
            DeclarationSite {
                original: original.into(),
            },
        );
    }

    pub fn get(&self, id: NodeId) -> Option<&DeclarationSite> {
        self.sites.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.sites.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

// ============================================================================
// Binding classification
// ============================================================================

/// How an identifier declares a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingSite {
    /// A parameter; `direct` when it is the whole parameter, not part of a
    /// pattern or a default.
    Param { direct: bool },
    /// Bound by a variable declarator, possibly through a pattern.
    Declarator,
    /// The id of a function or class declaration.
    Declaration,
}

/// Classify the identifier whose ancestors are `ancestors`.
///
/// Returns the kind of binding and the id of the owning scope, or `None` for
/// identifiers that do not declare a candidate binding. Catch parameters,
/// imports and expression names are not candidates.
pub fn classify_binding(ancestors: &[Ancestor<'_>]) -> Option<(BindingSite, NodeId)> {
    let at = pattern_depth(ancestors);
    let in_pattern = at > 0;
    let binder = ancestors.get(at)?;
    let rest = &ancestors[at + 1..];
    let fallback = || ancestors.last().map(|root| root.node.id());
    match (binder.kind(), binder.field) {
        (kind, "params") if kind.is_function_like() => Some((
            BindingSite::Param { direct: !in_pattern },
            binder.node.id(),
        )),
        (NodeKind::VariableDeclarator, "id") => {
            let declaration = rest.first()?;
            let lexical = declaration.node.str_field("kind") != Some("var");
            let owner = owner_scope(&rest[1..], lexical).or_else(fallback)?;
            Some((BindingSite::Declarator, owner))
        }
        (NodeKind::FunctionDeclaration | NodeKind::ClassDeclaration, "id") if !in_pattern => {
            let owner = owner_scope(rest, true).or_else(fallback)?;
            Some((BindingSite::Declaration, owner))
        }
        _ => None,
    }
}

/// Number of leading pattern edges: the index of the first ancestor that is
/// not part of a destructuring pattern.
fn pattern_depth(ancestors: &[Ancestor<'_>]) -> usize {
    let mut at = 0;
    while let Some(ancestor) = ancestors.get(at) {
        let pattern_edge = match (ancestor.kind(), ancestor.field) {
            (NodeKind::ObjectPattern, "properties")
            | (NodeKind::ArrayPattern, "elements")
            | (NodeKind::AssignmentPattern, "left")
            | (NodeKind::RestElement, "argument") => true,
            (NodeKind::Property, "value") => ancestors
                .get(at + 1)
                .is_some_and(|parent| parent.kind() == &NodeKind::ObjectPattern),
            _ => false,
        };
        if !pattern_edge {
            break;
        }
        at += 1;
    }
    at
}

/// True for binding positions that are never candidates: catch parameters,
/// import locals and the names of function and class expressions.
fn is_other_binding(ancestors: &[Ancestor<'_>]) -> bool {
    let Some(binder) = ancestors.get(pattern_depth(ancestors)) else {
        return false;
    };
    matches!(
        (binder.kind(), binder.field),
        (NodeKind::CatchClause, "param")
            | (NodeKind::FunctionExpression | NodeKind::ClassExpression, "id")
            | (
                NodeKind::ImportSpecifier
                    | NodeKind::ImportDefaultSpecifier
                    | NodeKind::ImportNamespaceSpecifier,
                "local"
            )
    )
}

/// The scope that owns a binding declared below `ancestors`.
///
/// `var` bindings belong to the nearest function or program. Lexical bindings
/// belong to the nearest block-like container; a function's body block counts
/// as the function itself.
pub fn owner_scope(ancestors: &[Ancestor<'_>], lexical: bool) -> Option<NodeId> {
    for (at, ancestor) in ancestors.iter().enumerate() {
        let kind = ancestor.kind();
        if kind.is_function_like() || kind == &NodeKind::Program {
            return Some(ancestor.node.id());
        }
        if !lexical {
            continue;
        }
        match kind {
            NodeKind::BlockStatement => {
                let function_body = ancestors
                    .get(at + 1)
                    .is_some_and(|parent| parent.kind().is_function_like() && parent.field == "body");
                if !function_body {
                    return Some(ancestor.node.id());
                }
            }
            NodeKind::StaticBlock
            | NodeKind::SwitchStatement
            | NodeKind::ForStatement
            | NodeKind::ForInStatement
            | NodeKind::ForOfStatement => return Some(ancestor.node.id()),
            _ => {}
        }
    }
    None
}

// ============================================================================
// Use-site positions
// ============================================================================

/// True if an identifier named `name` at this position names a binding.
///
/// Member properties, non-computed keys, labels, meta-property parts and the
/// external side of import/export specifiers are names but not references.
/// Bindings that are never renamed are not references either. JSX names are
/// references only when they name a component.
pub fn is_renamable(kind: &NodeKind, name: &str, ancestors: &[Ancestor<'_>]) -> bool {
    let Some(parent) = ancestors.first() else {
        return false;
    };
    if is_other_binding(ancestors) {
        return false;
    }
    let computed = parent.node.bool_field("computed");
    if kind == &NodeKind::JSXIdentifier {
        return match (parent.kind(), parent.field) {
            (NodeKind::JSXOpeningElement | NodeKind::JSXClosingElement, "name") => {
                !name.starts_with(|c: char| c.is_ascii_lowercase())
            }
            (NodeKind::JSXMemberExpression, "object") => true,
            _ => false,
        };
    }
    match (parent.kind(), parent.field) {
        (NodeKind::MemberExpression, "property") => computed,
        (
            NodeKind::Property
            | NodeKind::PropertyDefinition
            | NodeKind::MethodDefinition
            | NodeKind::AccessorProperty,
            "key",
        ) => computed,
        (
            NodeKind::LabeledStatement | NodeKind::BreakStatement | NodeKind::ContinueStatement,
            "label",
        ) => false,
        (NodeKind::MetaProperty, _) => false,
        (NodeKind::ImportSpecifier, "imported") => false,
        (NodeKind::ExportSpecifier, "exported") | (NodeKind::ExportAllDeclaration, "exported") => {
            false
        }
        // `export { x } from "m"` names the other module's binding.
        (NodeKind::ExportSpecifier, "local") => ancestors
            .get(1)
            .is_none_or(|export| export.node.child("source").is_none()),
        _ => true,
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// What a use site refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A renamed declaration; the payload is its current (generated) name.
    Binding(String),
    /// An unrenamed binding of the same name is nearer.
    Shadowed,
    /// Nothing in scope declares the name.
    Unresolved,
}

/// Maps a use site to the declaration it refers to.
pub trait ScopeResolver {
    /// Resolve `name` used below `ancestors` (nearest first).
    fn resolve(&self, ancestors: &[Ancestor<'_>], name: &str, sites: &DeclarationSites) -> Resolution;
}

/// Heuristic resolver that scans each ancestor's scope-relevant fields.
///
/// Statement lists expose the bindings declared by their direct statements.
/// Functions expose their parameters, then every `var` hoisted out of their
/// body, then their own name. Loops expose their head declaration, classes
/// their id and catch clauses their parameter. The first ancestor that binds
/// the name decides.
#[derive(Debug, Clone, Copy, Default)]
pub struct AncestorScan;

impl ScopeResolver for AncestorScan {
    fn resolve(&self, ancestors: &[Ancestor<'_>], name: &str, sites: &DeclarationSites) -> Resolution {
        let lookup = Lookup { name, sites };
        for ancestor in ancestors {
            let node = ancestor.node;
            let kind = node.kind();
            // A function's own name sits outside its parameters and body:
            // in the enclosing scope for a declaration, in a scope of its own
            // for an expression. Either way it is shadowed by both.
            let found = if kind.is_function_like() {
                node.children("params")
                    .find_map(|param| lookup.check_pattern(param))
                    .or_else(|| node.child("body").and_then(|body| lookup.check_hoisted(body)))
                    .or_else(|| node.child("id").and_then(|id| lookup.check(id)))
            } else if kind.is_class_like() {
                node.child("id").and_then(|id| lookup.check(id))
            } else {
                match kind {
                    NodeKind::Program => lookup
                        .check_statements(node.children("body"))
                        .or_else(|| lookup.check_hoisted(node)),
                    NodeKind::BlockStatement | NodeKind::StaticBlock => {
                        lookup.check_statements(node.children("body"))
                    }
                    NodeKind::SwitchStatement => node
                        .children("cases")
                        .find_map(|case| lookup.check_statements(case.children("consequent"))),
                    NodeKind::ForStatement => {
                        node.child("init").and_then(|init| lookup.check_statement(init))
                    }
                    NodeKind::ForInStatement | NodeKind::ForOfStatement => {
                        node.child("left").and_then(|left| lookup.check_statement(left))
                    }
                    NodeKind::CatchClause => {
                        node.child("param").and_then(|param| lookup.check_pattern(param))
                    }
                    _ => None,
                }
            };
            if let Some(resolution) = found {
                return resolution;
            }
        }
        Resolution::Unresolved
    }
}

struct Lookup<'a> {
    name: &'a str,
    sites: &'a DeclarationSites,
}

impl Lookup<'_> {
    /// Match one binding identifier.
    fn check(&self, binding: &Node) -> Option<Resolution> {
        match self.sites.get(binding.id()) {
            Some(site) if site.original == self.name => {
                binding.name().map(|name| Resolution::Binding(name.to_string()))
            }
            Some(_) => None,
            None if binding.is_identifier_named(self.name) => Some(Resolution::Shadowed),
            None => None,
        }
    }

    fn check_pattern(&self, pattern: &Node) -> Option<Resolution> {
        let mut bound = Vec::new();
        binding_identifiers(pattern, &mut bound);
        bound.into_iter().find_map(|binding| self.check(binding))
    }

    fn check_statements<'n>(
        &self,
        mut statements: impl Iterator<Item = &'n Node>,
    ) -> Option<Resolution> {
        statements.find_map(|statement| self.check_statement(statement))
    }

    /// Bindings a statement declares at its own level.
    fn check_statement(&self, statement: &Node) -> Option<Resolution> {
        match statement.kind() {
            NodeKind::VariableDeclaration => statement
                .children("declarations")
                .filter_map(|declarator| declarator.child("id"))
                .find_map(|id| self.check_pattern(id)),
            NodeKind::FunctionDeclaration | NodeKind::ClassDeclaration => {
                statement.child("id").and_then(|id| self.check(id))
            }
            NodeKind::ExportNamedDeclaration | NodeKind::ExportDefaultDeclaration => statement
                .child("declaration")
                .and_then(|declaration| self.check_statement(declaration)),
            NodeKind::ImportDeclaration => statement
                .children("specifiers")
                .filter_map(|specifier| specifier.child("local"))
                .find_map(|local| self.check(local)),
            _ => None,
        }
    }

    /// `var` bindings anywhere below `node`, without entering nested
    /// functions, classes or static blocks.
    fn check_hoisted(&self, node: &Node) -> Option<Resolution> {
        let mut bound = Vec::new();
        hoisted_identifiers(node, &mut bound);
        bound.into_iter().find_map(|binding| self.check(binding))
    }
}

/// Identifiers bound by a binding pattern.
pub fn binding_identifiers<'n>(pattern: &'n Node, out: &mut Vec<&'n Node>) {
    match pattern.kind() {
        NodeKind::Identifier => out.push(pattern),
        NodeKind::ObjectPattern => {
            for property in pattern.children("properties") {
                match property.kind() {
                    NodeKind::Property => {
                        if let Some(value) = property.child("value") {
                            binding_identifiers(value, out);
                        }
                    }
                    _ => binding_identifiers(property, out),
                }
            }
        }
        NodeKind::ArrayPattern => {
            for element in pattern.children("elements") {
                binding_identifiers(element, out);
            }
        }
        NodeKind::AssignmentPattern => {
            if let Some(left) = pattern.child("left") {
                binding_identifiers(left, out);
            }
        }
        NodeKind::RestElement => {
            if let Some(argument) = pattern.child("argument") {
                binding_identifiers(argument, out);
            }
        }
        _ => {}
    }
}

fn hoisted_identifiers<'n>(node: &'n Node, out: &mut Vec<&'n Node>) {
    if node.kind() == &NodeKind::VariableDeclaration && node.str_field("kind") == Some("var") {
        for id in node
            .children("declarations")
            .filter_map(|declarator| declarator.child("id"))
        {
            binding_identifiers(id, out);
        }
    }
    let Some(fields) = node.kind().visitable_fields() else {
        return;
    };
    for &field in fields {
        let children: Vec<&Node> = match node.child(field) {
            Some(child) => vec![child],
            None => node.children(field).collect(),
        };
        for child in children {
            let kind = child.kind();
            if kind.is_function_like() || kind.is_class_like() || kind == &NodeKind::StaticBlock {
                continue;
            }
            hoisted_identifiers(child, out);
        }
    }
}
