// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Node kinds and the visitable registry.
//!
//! Every ESTree discriminant the upstream parser or the tree constructor can
//! produce is a [`NodeKind`] variant. Unknown discriminants are kept as
//! [`NodeKind::Other`] and behave as opaque leaves.
//!
//! The registry ([`NodeKind::visitable_fields`]) lists, for each kind, the
//! ordered field names that hold children. Fields are visited in exactly this
//! order by the walkers.

use std::fmt;

/// Expand a registry field list; an empty list marks a leaf.
macro_rules! fields_of {
    () => {
        None
    };
    ($($field:literal),+) => {
        Some(&[$($field),+] as &[&str])
    };
}

/// Generate the [`NodeKind`] enum together with its string mapping and the
/// visitable registry.
///
/// Each entry is `Kind => [fields...]`. An empty field list marks a leaf.
macro_rules! node_kinds {
    (
        $(
            $kind:ident => [ $( $field:literal ),* $(,)? ]
        ),* $(,)?
    ) => {
        /// The discriminant of an ESTree node.
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum NodeKind {
            $(
                #[doc = concat!("`", stringify!($kind), "`")]
                $kind,
            )*
            /// A discriminant this crate does not know. Traversal treats it as a leaf.
            Other(String),
        }

        impl NodeKind {
            /// Map a `type` string to its kind.
            pub fn from_type(name: &str) -> Self {
                match name {
                    $( stringify!($kind) => NodeKind::$kind, )*
                    other => NodeKind::Other(other.to_string()),
                }
            }

            /// The `type` string of this kind.
            pub fn as_str(&self) -> &str {
                match self {
                    $( NodeKind::$kind => stringify!($kind), )*
                    NodeKind::Other(name) => name,
                }
            }

            /// Ordered child-bearing fields of this kind, or `None` for leaves.
            pub fn visitable_fields(&self) -> Option<&'static [&'static str]> {
                match self {
                    $( NodeKind::$kind => fields_of!($( $field ),*), )*
                    NodeKind::Other(_) => None,
                }
            }
        }
    };
}

node_kinds! {
    // Program and statements
    Program => ["body"],
    ExpressionStatement => ["expression"],
    BlockStatement => ["body"],
    StaticBlock => ["body"],
    EmptyStatement => [],
    DebuggerStatement => [],
    WithStatement => ["object", "body"],
    ReturnStatement => ["argument"],
    LabeledStatement => ["label", "body"],
    BreakStatement => ["label"],
    ContinueStatement => ["label"],
    IfStatement => ["test", "consequent", "alternate"],
    SwitchStatement => ["discriminant", "cases"],
    SwitchCase => ["test", "consequent"],
    ThrowStatement => ["argument"],
    TryStatement => ["block", "handler", "finalizer"],
    CatchClause => ["param", "body"],
    WhileStatement => ["test", "body"],
    DoWhileStatement => ["body", "test"],
    ForStatement => ["init", "test", "update", "body"],
    ForInStatement => ["left", "right", "body"],
    ForOfStatement => ["left", "right", "body"],

    // Declarations
    FunctionDeclaration => ["id", "params", "body"],
    VariableDeclaration => ["declarations"],
    VariableDeclarator => ["id", "init"],
    ClassDeclaration => ["id", "superClass", "body"],

    // Expressions
    Identifier => [],
    PrivateIdentifier => [],
    Literal => [],
    ThisExpression => [],
    Super => [],
    ArrayExpression => ["elements"],
    ObjectExpression => ["properties"],
    Property => ["key", "value"],
    FunctionExpression => ["id", "params", "body"],
    ArrowFunctionExpression => ["params", "body"],
    UnaryExpression => ["argument"],
    UpdateExpression => ["argument"],
    BinaryExpression => ["left", "right"],
    AssignmentExpression => ["left", "right"],
    LogicalExpression => ["left", "right"],
    MemberExpression => ["object", "property"],
    ChainExpression => ["expression"],
    ConditionalExpression => ["test", "consequent", "alternate"],
    CallExpression => ["callee", "arguments"],
    NewExpression => ["callee", "arguments"],
    SequenceExpression => ["expressions"],
    ParenthesizedExpression => ["expression"],
    YieldExpression => ["argument"],
    AwaitExpression => ["argument"],
    ImportExpression => ["source", "options"],
    MetaProperty => ["meta", "property"],
    SpreadElement => ["argument"],
    TemplateLiteral => ["quasis", "expressions"],
    TemplateElement => [],
    TaggedTemplateExpression => ["tag", "quasi"],

    // Legacy comprehension forms
    ComprehensionBlock => ["left", "right"],
    ComprehensionExpression => ["blocks", "filter", "body"],
    GeneratorExpression => ["blocks", "filter", "body"],

    // Patterns
    ObjectPattern => ["properties"],
    ArrayPattern => ["elements"],
    RestElement => ["argument"],
    AssignmentPattern => ["left", "right"],

    // Classes
    ClassExpression => ["id", "superClass", "body"],
    ClassBody => ["body"],
    MethodDefinition => ["key", "value"],
    PropertyDefinition => ["key", "value"],
    AccessorProperty => ["key", "value"],

    // Modules
    ImportDeclaration => ["specifiers", "source", "attributes"],
    ImportSpecifier => ["imported", "local"],
    ImportDefaultSpecifier => ["local"],
    ImportNamespaceSpecifier => ["local"],
    ImportAttribute => ["key", "value"],
    ExportNamedDeclaration => ["declaration", "specifiers", "source", "attributes"],
    ExportSpecifier => ["local", "exported"],
    ExportDefaultDeclaration => ["declaration"],
    ExportAllDeclaration => ["exported", "source", "attributes"],

    // JSX
    JSXElement => ["openingElement", "children", "closingElement"],
    JSXOpeningElement => ["name", "attributes"],
    JSXClosingElement => ["name"],
    JSXAttribute => ["name", "value"],
    JSXSpreadAttribute => ["argument"],
    JSXFragment => ["openingFragment", "children", "closingFragment"],
    JSXOpeningFragment => [],
    JSXClosingFragment => [],
    JSXExpressionContainer => ["expression"],
    JSXSpreadChild => ["expression"],
    JSXEmptyExpression => [],
    JSXIdentifier => [],
    JSXMemberExpression => ["object", "property"],
    JSXNamespacedName => ["namespace", "name"],
    JSXText => [],
}

impl NodeKind {
    /// True for functions, function expressions and arrows.
    pub fn is_function_like(&self) -> bool {
        matches!(
            self,
            NodeKind::FunctionDeclaration
                | NodeKind::FunctionExpression
                | NodeKind::ArrowFunctionExpression
        )
    }

    /// True for classes in declaration or expression position.
    pub fn is_class_like(&self) -> bool {
        matches!(self, NodeKind::ClassDeclaration | NodeKind::ClassExpression)
    }

    /// True for kinds that hold a statement list visible to its siblings.
    pub fn is_statement_list(&self) -> bool {
        matches!(
            self,
            NodeKind::Program | NodeKind::BlockStatement | NodeKind::StaticBlock
        )
    }

    /// True for kinds with no child-bearing fields (including unknown kinds).
    pub fn is_leaf(&self) -> bool {
        self.visitable_fields().is_none()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for NodeKind {
    fn from(name: &str) -> Self {
        NodeKind::from_type(name)
    }
}
