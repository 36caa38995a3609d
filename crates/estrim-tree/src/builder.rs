// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Tree constructor: native values to expression nodes.
//!
//! - [`to_tree`] encodes a [`JsValue`] as the expression that evaluates to it
//! - [`from_serialize`] does the same for any `serde` value
//! - [`create_variable`] / [`create_variables`] build a `VariableDeclaration`
//!
//! # Usage
//!
//! ```
//! use estrim_tree::builder::{create_variable, VariableKind};
//! use estrim_tree::JsValue;
//!
//! let decl = create_variable(VariableKind::Const, "answer", &JsValue::Number(42.0)).unwrap();
//! assert_eq!(decl.type_name(), "VariableDeclaration");
//! ```

use serde::Serialize;
use serde_json::{Number, Value};

use estrim_core::lexical::{check_binding_name, is_binding_name};
use estrim_core::{TreeError, TreeResult};

use crate::nodes::{Node, NodeKind};
use crate::value::{format_number, JsValue};

/// Largest integer an f64 holds exactly; integral numbers up to here are
/// written as JSON integers.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// The keyword of a variable declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Var,
    Let,
    Const,
}

impl VariableKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VariableKind::Var => "var",
            VariableKind::Let => "let",
            VariableKind::Const => "const",
        }
    }
}

/// An `Identifier` node.
pub fn identifier(name: &str) -> Node {
    Node::new(NodeKind::Identifier).with("name", name)
}

/// A `Literal` node for a primitive value, with its `raw` source text.
///
/// Non-finite and negative numbers have no literal form; use [`to_tree`] for
/// those.
pub fn literal(value: &JsValue) -> Node {
    let (value, raw) = match value {
        JsValue::Null => (Value::Null, "null".to_string()),
        JsValue::Bool(b) => (Value::Bool(*b), b.to_string()),
        JsValue::Number(n) => (number_value(*n), format_number(*n)),
        JsValue::String(s) => (Value::String(s.clone()), quote(s)),
        other => (Value::Null, other.to_js_string()),
    };
    Node::new(NodeKind::Literal)
        .with("value", value)
        .with("raw", raw)
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER && !(n == 0.0 && n.is_sign_negative()) {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

/// Single-quoted string source text.
fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// A property key: an identifier when `name` is a valid binding name,
/// otherwise a string literal.
pub fn property_key(name: &str) -> Node {
    if is_binding_name(name) {
        identifier(name)
    } else {
        literal(&JsValue::from(name))
    }
}

/// Encode a native value as the expression that produces it.
pub fn to_tree(value: &JsValue) -> Node {
    match value {
        JsValue::Undefined => identifier("undefined"),
        JsValue::Number(n) if n.is_nan() => identifier("NaN"),
        JsValue::Number(n) if n.is_sign_negative() => {
            Node::new(NodeKind::UnaryExpression)
                .with("operator", "-")
                .with("prefix", true)
                .with("argument", to_tree(&JsValue::Number(-n)))
        }
        JsValue::Number(n) if n.is_infinite() => identifier("Infinity"),
        JsValue::Array(items) => Node::new(NodeKind::ArrayExpression)
            .with("elements", items.iter().map(to_tree).collect::<Vec<_>>()),
        JsValue::Object(entries) => Node::new(NodeKind::ObjectExpression).with(
            "properties",
            entries
                .iter()
                .map(|(key, value)| {
                    Node::new(NodeKind::Property)
                        .with("key", property_key(key))
                        .with("value", to_tree(value))
                        .with("kind", "init")
                        .with("method", false)
                        .with("shorthand", false)
                        .with("computed", false)
                })
                .collect::<Vec<_>>(),
        ),
        primitive => literal(primitive),
    }
}

/// Encode any serializable value.
///
/// # Errors
///
/// Returns `TreeError::Construction` if the value cannot be represented as
/// JSON (for example a map with non-string keys).
pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> TreeResult<Node> {
    let json = serde_json::to_value(value).map_err(|err| TreeError::construction(err.to_string()))?;
    Ok(to_tree(&JsValue::from(json)))
}

/// Build a single-declarator `VariableDeclaration`.
///
/// # Errors
///
/// Returns `TreeError::InvalidIdentifier` if `name` is not a valid,
/// non-reserved binding name.
pub fn create_variable(kind: VariableKind, name: &str, value: &JsValue) -> TreeResult<Node> {
    create_variables(kind, [(name, value.clone())])
}

/// Build a `VariableDeclaration` with one declarator per `(name, value)`.
///
/// # Errors
///
/// Returns `TreeError::InvalidIdentifier` for the first invalid name.
pub fn create_variables<I, S>(kind: VariableKind, items: I) -> TreeResult<Node>
where
    I: IntoIterator<Item = (S, JsValue)>,
    S: AsRef<str>,
{
    let declarations = items
        .into_iter()
        .map(|(name, value)| {
            let name = name.as_ref();
            check_binding_name(name)?;
            Ok(Node::new(NodeKind::VariableDeclarator)
                .with("id", identifier(name))
                .with("init", to_tree(&value)))
        })
        .collect::<TreeResult<Vec<_>>>()?;
    Ok(Node::new(NodeKind::VariableDeclaration)
        .with("declarations", declarations)
        .with("kind", kind.as_str()))
}
