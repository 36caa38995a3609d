// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The ESTree node model.
//!
//! A [`Node`] is a discriminant ([`NodeKind`]) plus an ordered list of named
//! fields. A field holds one of:
//!
//! - [`Field::Node`]: a single child node
//! - [`Field::List`]: an ordered list of child slots (`None` is a hole, as in `[1,,2]`)
//! - [`Field::Value`]: any other JSON value, kept opaque (`name`, `operator`,
//!   `loc`, `regex`, `null`, ...)
//!
//! # Identity
//!
//! Every node carries a [`NodeId`] that is unique within the process. Ids are
//! assigned when a node is created, deserialized or cloned, so a clone is a
//! structurally equal tree with fresh ids. Equality ignores ids. Passes use
//! ids to keep bookkeeping in side tables instead of writing it onto nodes.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use estrim_core::{TreeError, TreeResult};

use super::kind::NodeKind;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw id value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// The content of a node field.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// A single child node.
    Node(Box<Node>),
    /// An ordered list of child slots; `None` is a hole.
    List(Vec<Option<Node>>),
    /// An opaque JSON value.
    Value(Value),
}

impl Field {
    /// The child node, if this field holds one.
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Field::Node(node) => Some(node),
            _ => None,
        }
    }

    /// The child node, mutably.
    pub fn as_node_mut(&mut self) -> Option<&mut Node> {
        match self {
            Field::Node(node) => Some(node),
            _ => None,
        }
    }

    /// The child slots, if this field holds a list.
    pub fn as_list(&self) -> Option<&[Option<Node>]> {
        match self {
            Field::List(items) => Some(items),
            _ => None,
        }
    }

    /// The child slots, mutably.
    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Option<Node>>> {
        match self {
            Field::List(items) => Some(items),
            _ => None,
        }
    }

    /// The opaque value, if this field holds one.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Field::Value(value) => Some(value),
            _ => None,
        }
    }

    /// True for a JSON `null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Field::Value(Value::Null))
    }

    /// Classify a JSON value.
    ///
    /// Objects with a string `type` become nodes, arrays made only of such
    /// objects and `null` become lists, anything else stays opaque.
    pub fn from_json(value: Value) -> TreeResult<Field> {
        match value {
            Value::Object(map) if has_type(&map) => Ok(Field::Node(Box::new(Node::from_map(map)?))),
            Value::Array(items) if items.iter().all(is_slot) => {
                let slots = items
                    .into_iter()
                    .map(|item| match item {
                        Value::Null => Ok(None),
                        other => Node::from_json(other).map(Some),
                    })
                    .collect::<TreeResult<Vec<_>>>()?;
                Ok(Field::List(slots))
            }
            other => Ok(Field::Value(other)),
        }
    }

    /// Convert back to JSON.
    pub fn to_json(&self) -> Value {
        match self {
            Field::Node(node) => node.to_json(),
            Field::List(items) => Value::Array(
                items
                    .iter()
                    .map(|slot| slot.as_ref().map_or(Value::Null, Node::to_json))
                    .collect(),
            ),
            Field::Value(value) => value.clone(),
        }
    }
}

impl From<Node> for Field {
    fn from(node: Node) -> Self {
        Field::Node(Box::new(node))
    }
}

impl From<Vec<Node>> for Field {
    fn from(nodes: Vec<Node>) -> Self {
        Field::List(nodes.into_iter().map(Some).collect())
    }
}

impl From<Vec<Option<Node>>> for Field {
    fn from(slots: Vec<Option<Node>>) -> Self {
        Field::List(slots)
    }
}

impl From<Option<Node>> for Field {
    fn from(node: Option<Node>) -> Self {
        node.map_or(Field::Value(Value::Null), Field::from)
    }
}

impl From<Value> for Field {
    fn from(value: Value) -> Self {
        Field::Value(value)
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Field::Value(Value::String(value.to_string()))
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Field::Value(Value::String(value))
    }
}

impl From<bool> for Field {
    fn from(value: bool) -> Self {
        Field::Value(Value::Bool(value))
    }
}

fn has_type(map: &Map<String, Value>) -> bool {
    matches!(map.get("type"), Some(Value::String(_)))
}

fn is_slot(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => has_type(map),
        _ => false,
    }
}

/// An ESTree node.
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    fields: Vec<(String, Field)>,
}

impl Node {
    /// Create a node of the given kind with no fields.
    pub fn new(kind: impl Into<NodeKind>) -> Self {
        Node {
            id: NodeId::fresh(),
            kind: kind.into(),
            fields: Vec::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with(mut self, name: &str, field: impl Into<Field>) -> Self {
        self.set(name, field);
        self
    }

    /// This node's identity.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// This node's kind.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Change this node's kind, keeping its fields.
    pub fn set_kind(&mut self, kind: impl Into<NodeKind>) {
        self.kind = kind.into();
    }

    /// True if this node is of the given kind.
    pub fn is(&self, kind: &NodeKind) -> bool {
        &self.kind == kind
    }

    /// The `type` string.
    pub fn type_name(&self) -> &str {
        self.kind.as_str()
    }

    /// Iterate over fields in order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Look up a field.
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, field)| field)
    }

    /// Look up a field mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields
            .iter_mut()
            .find(|(key, _)| key == name)
            .map(|(_, field)| field)
    }

    /// True if the field is present (even if `null`).
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set a field, keeping its position if it already exists.
    pub fn set(&mut self, name: &str, field: impl Into<Field>) {
        let field = field.into();
        match self.get_mut(name) {
            Some(slot) => *slot = field,
            None => self.fields.push((name.to_string(), field)),
        }
    }

    /// Delete a field, returning its content.
    pub fn remove(&mut self, name: &str) -> Option<Field> {
        let position = self.fields.iter().position(|(key, _)| key == name)?;
        Some(self.fields.remove(position).1)
    }

    /// The single child in `name`.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.get(name).and_then(Field::as_node)
    }

    /// The single child in `name`, mutably.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.get_mut(name).and_then(Field::as_node_mut)
    }

    /// The child slots in `name`.
    pub fn list(&self, name: &str) -> Option<&[Option<Node>]> {
        self.get(name).and_then(Field::as_list)
    }

    /// The child slots in `name`, mutably.
    pub fn list_mut(&mut self, name: &str) -> Option<&mut Vec<Option<Node>>> {
        self.get_mut(name).and_then(Field::as_list_mut)
    }

    /// The non-hole children in `name`.
    pub fn children<'n>(&'n self, name: &str) -> impl Iterator<Item = &'n Node> {
        self.list(name).into_iter().flatten().flatten()
    }

    /// The opaque JSON value in `name`.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(Field::as_value)
    }

    /// The string value in `name`.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(Value::as_str)
    }

    /// The boolean value in `name`; absent or non-boolean reads as `false`.
    pub fn bool_field(&self, name: &str) -> bool {
        self.value(name).and_then(Value::as_bool).unwrap_or(false)
    }

    /// The `name` of an identifier-like node.
    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    /// Overwrite the `name` field.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.set("name", Field::Value(Value::String(name.into())));
    }

    /// True for an `Identifier` with the given name.
    pub fn is_identifier_named(&self, name: &str) -> bool {
        self.kind == NodeKind::Identifier && self.name() == Some(name)
    }

    // ------------------------------------------------------------------------
    // JSON conversion
    // ------------------------------------------------------------------------

    /// Build a node from an ESTree JSON value.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::MalformedTree` if the value is not an object with a
    /// string `type`.
    pub fn from_json(value: Value) -> TreeResult<Node> {
        match value {
            Value::Object(map) if has_type(&map) => Node::from_map(map),
            Value::Object(_) => Err(TreeError::malformed(
                "object has no string `type` discriminant",
            )),
            other => Err(TreeError::malformed(format!(
                "expected a node object, found {}",
                json_kind(&other)
            ))),
        }
    }

    fn from_map(map: Map<String, Value>) -> TreeResult<Node> {
        let mut kind = None;
        let mut fields = Vec::with_capacity(map.len().saturating_sub(1));
        for (key, value) in map {
            if key == "type" {
                if let Value::String(name) = value {
                    kind = Some(NodeKind::from_type(&name));
                }
                continue;
            }
            fields.push((key, Field::from_json(value)?));
        }
        let kind = kind.ok_or_else(|| TreeError::malformed("node has no `type`"))?;
        Ok(Node {
            id: NodeId::fresh(),
            kind,
            fields,
        })
    }

    /// Convert to an ESTree JSON value. `type` is emitted first.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String(self.type_name().to_string()));
        for (name, field) in &self.fields {
            map.insert(name.clone(), field.to_json());
        }
        Value::Object(map)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl Clone for Node {
    /// Deep structural copy with fresh ids.
    fn clone(&self) -> Self {
        Node {
            id: NodeId::fresh(),
            kind: self.kind.clone(),
            fields: self.fields.clone(),
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.fields == other.fields
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry("type", self.type_name())?;
        for (name, field) in &self.fields {
            map.serialize_entry(name, field)?;
        }
        map.end()
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Node(node) => node.serialize(serializer),
            Field::List(items) => items.serialize(serializer),
            Field::Value(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Node::from_json(value).map_err(serde::de::Error::custom)
    }
}
