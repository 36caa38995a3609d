// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Integration tests for the traversal engine.
//!
//! These cover the ordering guarantees, list compaction, settled positions,
//! leave-hooks and the failure semantics of the cursor verbs.

use std::cell::RefCell;
use std::rc::Rc;

use estrim_core::{TreeError, TreeResult};
use estrim_tree::builder::{identifier, literal};
use estrim_tree::{
    traverse, traverse_in_place, watch, watch_with_ancestors, Callbacks, JsValue, Node, NodeKind,
    NodeRef, Traverse, WatchCallbacks,
};
use serde_json::{json, Value};

// =============================================================================
// Fixtures
// =============================================================================

fn parse(value: Value) -> Node {
    Node::from_json(value).expect("fixture is a node")
}

fn expr_stmt(expression: Value) -> Value {
    json!({ "type": "ExpressionStatement", "expression": expression })
}

fn ident(name: &str) -> Value {
    json!({ "type": "Identifier", "name": name })
}

fn num(n: i64) -> Value {
    json!({ "type": "Literal", "value": n, "raw": n.to_string() })
}

fn call(name: &str) -> Value {
    expr_stmt(json!({ "type": "CallExpression", "callee": ident(name), "arguments": [] }))
}

/// `a; b; c; d;` as identifier statements.
fn statements(names: &[&str]) -> Node {
    parse(json!({
        "type": "Program",
        "body": names.iter().map(|n| expr_stmt(ident(n))).collect::<Vec<_>>()
    }))
}

fn body_names(program: &Node) -> Vec<String> {
    program
        .children("body")
        .map(|stmt| {
            stmt.child("expression")
                .and_then(Node::name)
                .unwrap_or("?")
                .to_string()
        })
        .collect()
}

fn identifier_names(tree: &Node) -> Vec<String> {
    let mut names = Vec::new();
    watch(
        tree,
        &mut WatchCallbacks::new().on(NodeKind::Identifier, |node| {
            names.push(node.name().unwrap_or_default().to_string())
        }),
    );
    names
}

// =============================================================================
// Ordering
// =============================================================================

#[test]
fn test_watch_is_pre_order_in_registry_order() {
    // for (i = 0; i < n; i++) body();
    let tree = parse(json!({
        "type": "Program",
        "body": [{
            "type": "ForStatement",
            "init": { "type": "AssignmentExpression", "operator": "=", "left": ident("i"), "right": num(0) },
            "test": { "type": "BinaryExpression", "operator": "<", "left": ident("j"), "right": ident("n") },
            "update": { "type": "UpdateExpression", "operator": "++", "prefix": false, "argument": ident("k") },
            "body": call("body")
        }]
    }));
    assert_eq!(identifier_names(&tree), ["i", "j", "n", "k", "body"]);
}

#[test]
fn test_watch_with_ancestors_reports_nearest_first() {
    // a; [b, , c];
    let tree = parse(json!({
        "type": "Program",
        "body": [
            expr_stmt(ident("a")),
            expr_stmt(json!({ "type": "ArrayExpression", "elements": [ident("b"), null, ident("c")] }))
        ]
    }));
    let mut seen = Vec::new();
    watch_with_ancestors(&tree, &mut |node, ancestors| {
        if let Some(name) = node.name() {
            let edges: Vec<(String, &str, Option<usize>)> = ancestors
                .iter()
                .map(|a| (a.kind().to_string(), a.field, a.index))
                .collect();
            seen.push((name.to_string(), edges));
        }
    });

    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].0, "a");
    assert_eq!(
        seen[0].1,
        [
            ("ExpressionStatement".to_string(), "expression", None),
            ("Program".to_string(), "body", Some(0)),
        ]
    );
    assert_eq!(seen[2].0, "c");
    assert_eq!(seen[2].1[0], ("ArrayExpression".to_string(), "elements", Some(2)));
    assert_eq!(seen[2].1.len(), 3);
}

#[test]
fn test_watch_with_ancestors_sees_intact_slots() {
    let tree = statements(&["a", "b"]);
    let mut intact = true;
    watch_with_ancestors(&tree, &mut |node, ancestors| {
        if let Some(parent) = ancestors.first() {
            let slot = match parent.index {
                Some(index) => parent.node.list(parent.field).and_then(|l| l[index].as_ref()),
                None => parent.node.child(parent.field),
            };
            intact &= slot.is_some_and(|slot| slot.id() == node.id());
        }
    });
    assert!(intact);
}

#[test]
fn test_entry_pre_order_and_leave_post_order() {
    let tree = parse(json!({
        "type": "Program",
        "body": [expr_stmt(json!({
            "type": "BinaryExpression", "operator": "+", "left": ident("a"), "right": ident("b")
        }))]
    }));
    let log = Rc::new(RefCell::new(Vec::new()));
    let entry_log = Rc::clone(&log);
    traverse(
        &tree,
        &mut Callbacks::new().all(move |node: &mut NodeRef<'_>| {
            let label = node.kind().to_string();
            entry_log.borrow_mut().push(format!("enter {label}"));
            let leave_log = Rc::clone(&entry_log);
            node.on_leave(move |_| {
                leave_log.borrow_mut().push(format!("leave {label}"));
                Ok(())
            });
            Ok(())
        }),
    )
    .unwrap();

    assert_eq!(
        *log.borrow(),
        [
            "enter Program",
            "enter ExpressionStatement",
            "enter BinaryExpression",
            "enter Identifier",
            "leave Identifier",
            "enter Identifier",
            "leave Identifier",
            "leave BinaryExpression",
            "leave ExpressionStatement",
            "leave Program",
        ]
    );
}

#[test]
fn test_per_kind_callback_runs_before_catch_all() {
    let tree = statements(&["a"]);
    let log = RefCell::new(Vec::new());
    watch(
        &tree,
        &mut WatchCallbacks::new()
            .on(NodeKind::Identifier, |_| log.borrow_mut().push("kind"))
            .all(|node| {
                if node.kind() == &NodeKind::Identifier {
                    log.borrow_mut().push("all")
                }
            }),
    );
    assert_eq!(*log.borrow(), ["kind", "all"]);
}

#[test]
fn test_opaque_values_and_unknown_kinds_are_not_visited() {
    let tree = parse(json!({
        "type": "Program",
        "body": [
            {
                "type": "TSTypeAliasDeclaration",
                "id": ident("hidden")
            },
            {
                "type": "ExpressionStatement",
                "expression": ident("seen"),
                "extra": { "type": "Identifier", "name": "not-a-child" }
            }
        ]
    }));
    assert_eq!(identifier_names(&tree), ["seen"]);
}

// =============================================================================
// Compaction
// =============================================================================

#[test]
fn test_remove_compacts_preserving_order() {
    let tree = statements(&["a", "b", "c", "d", "e"]);
    let out = traverse(
        &tree,
        &mut Callbacks::new().on(NodeKind::ExpressionStatement, |node| {
            let name = node.node().child("expression").and_then(Node::name);
            if matches!(name, Some("b" | "d")) {
                node.remove()?;
            }
            Ok(())
        }),
    )
    .unwrap();
    assert_eq!(body_names(&out), ["a", "c", "e"]);
    assert!(out.list("body").unwrap().iter().all(Option::is_some));
}

#[test]
fn test_indices_are_stable_during_a_list_pass() {
    let tree = statements(&["a", "b", "c", "d"]);
    let seen = RefCell::new(Vec::new());
    traverse(
        &tree,
        &mut Callbacks::new().on(NodeKind::ExpressionStatement, |node| {
            seen.borrow_mut().push(node.index());
            if node.index() == Some(0) || node.index() == Some(1) {
                node.remove()?;
            }
            Ok(())
        }),
    )
    .unwrap();
    assert_eq!(*seen.borrow(), [Some(0), Some(1), Some(2), Some(3)]);
}

#[test]
fn test_splice_flattens_in_place() {
    let tree = statements(&["a", "b", "c"]);
    let out = traverse(
        &tree,
        &mut Callbacks::new().on(NodeKind::ExpressionStatement, |node| {
            if node.node().child("expression").and_then(Node::name) == Some("b") {
                let copy = node.clone_node();
                node.replace_with_many(vec![copy.clone(), copy])?;
            }
            Ok(())
        }),
    )
    .unwrap();
    assert_eq!(body_names(&out), ["a", "b", "b", "c"]);
}

#[test]
fn test_empty_splice_removes() {
    let tree = statements(&["a", "b"]);
    let out = traverse(
        &tree,
        &mut Callbacks::new().on(NodeKind::ExpressionStatement, |node| {
            if node.index() == Some(0) {
                node.replace_with_many(Vec::new())?;
            }
            Ok(())
        }),
    )
    .unwrap();
    assert_eq!(body_names(&out), ["b"]);
}

#[test]
fn test_source_holes_are_preserved() {
    // [1, , 2, 3]
    let tree = parse(json!({
        "type": "ArrayExpression",
        "elements": [num(1), null, num(2), num(3)]
    }));
    let out = traverse(
        &tree,
        &mut Callbacks::new().on(NodeKind::Literal, |node| {
            if node.node().value("value") == Some(&json!(2)) {
                node.remove()?;
            }
            Ok(())
        }),
    )
    .unwrap();
    assert_eq!(
        out.to_json()["elements"],
        json!([num(1), null, num(3)])
    );
}

#[test]
fn test_remove_outside_list_drops_field() {
    // return x;
    let tree = parse(json!({
        "type": "Program",
        "body": [{ "type": "ReturnStatement", "argument": ident("x") }]
    }));
    let out = traverse(
        &tree,
        &mut Callbacks::new().on(NodeKind::Identifier, |node| node.remove()),
    )
    .unwrap();
    let ret = out.children("body").next().unwrap();
    assert!(!ret.has("argument"));
}

// =============================================================================
// Settled positions
// =============================================================================

#[test]
fn test_replacement_is_not_visited() {
    let tree = statements(&["a"]);
    let visited = RefCell::new(Vec::new());
    let out = traverse(
        &tree,
        &mut Callbacks::new()
            .on(NodeKind::ExpressionStatement, |node| {
                // The replacement holds an identifier that must not be seen.
                node.replace(Node::new(NodeKind::ExpressionStatement).with("expression", identifier("fresh")))
            })
            .on(NodeKind::Identifier, |node| {
                visited.borrow_mut().push(node.node().name().unwrap_or_default().to_string());
                Ok(())
            }),
    )
    .unwrap();
    assert!(visited.borrow().is_empty());
    assert_eq!(body_names(&out), ["fresh"]);
}

#[test]
fn test_replacement_keeps_its_leave_hook() {
    let tree = statements(&["a"]);
    let out = traverse(
        &tree,
        &mut Callbacks::new().on(NodeKind::Identifier, |node| {
            node.replace(identifier("b"))?;
            node.on_leave(|node| {
                node.node_mut().set_name("c");
                Ok(())
            });
            Ok(())
        }),
    )
    .unwrap();
    assert_eq!(body_names(&out), ["c"]);
}

#[test]
fn test_removed_position_drops_leave_hook_and_children() {
    let tree = parse(json!({
        "type": "Program",
        "body": [call("f"), call("g")]
    }));
    let fired = Rc::new(RefCell::new(0));
    let hook_count = Rc::clone(&fired);
    let callees = RefCell::new(Vec::new());
    let out = traverse(
        &tree,
        &mut Callbacks::new()
            .on(NodeKind::ExpressionStatement, move |node| {
                if node.index() == Some(0) {
                    let count = Rc::clone(&hook_count);
                    node.on_leave(move |_| {
                        *count.borrow_mut() += 1;
                        Ok(())
                    });
                    node.remove()?;
                }
                Ok(())
            })
            .on(NodeKind::Identifier, |node| {
                callees.borrow_mut().push(node.node().name().unwrap_or_default().to_string());
                Ok(())
            }),
    )
    .unwrap();
    assert_eq!(*fired.borrow(), 0);
    assert_eq!(*callees.borrow(), ["g"]);
    assert_eq!(out.list("body").unwrap().len(), 1);
}

#[test]
fn test_leave_hook_can_edit_children() {
    // { a; b; } -> { b; }
    let tree = parse(json!({
        "type": "BlockStatement",
        "body": [expr_stmt(ident("a")), expr_stmt(ident("b"))]
    }));
    let out = traverse(
        &tree,
        &mut Callbacks::new().on(NodeKind::BlockStatement, |node| {
            node.on_leave(|node| {
                if let Some(body) = node.node_mut().list_mut("body") {
                    body.remove(0);
                }
                Ok(())
            });
            Ok(())
        }),
    )
    .unwrap();
    assert_eq!(out.list("body").unwrap().len(), 1);
}

#[test]
fn test_leave_hook_can_remove_its_position() {
    let tree = statements(&["a", "b"]);
    let out = traverse(
        &tree,
        &mut Callbacks::new().on(NodeKind::ExpressionStatement, |node| {
            if node.index() == Some(1) {
                node.on_leave(|node| node.remove());
            }
            Ok(())
        }),
    )
    .unwrap();
    assert_eq!(body_names(&out), ["a"]);
}

// =============================================================================
// Cursor context
// =============================================================================

#[test]
fn test_ancestors_report_fields() {
    // function f(p) { return p; }
    let tree = parse(json!({
        "type": "Program",
        "body": [{
            "type": "FunctionDeclaration",
            "id": ident("f"),
            "params": [ident("p")],
            "body": { "type": "BlockStatement", "body": [{ "type": "ReturnStatement", "argument": ident("p") }] }
        }]
    }));
    let chains = RefCell::new(Vec::new());
    traverse(
        &tree,
        &mut Callbacks::new().on(NodeKind::Identifier, |node| {
            let chain: Vec<String> = node
                .ancestors()
                .map(|a| match a.index {
                    Some(i) => format!("{}.{}[{}]", a.kind(), a.field, i),
                    None => format!("{}.{}", a.kind(), a.field),
                })
                .collect();
            chains.borrow_mut().push(chain.join(" < "));
            Ok(())
        }),
    )
    .unwrap();
    assert_eq!(
        *chains.borrow(),
        [
            "FunctionDeclaration.id < Program.body[0]",
            "FunctionDeclaration.params[0] < Program.body[0]",
            "ReturnStatement.argument < BlockStatement.body[0] < FunctionDeclaration.body < Program.body[0]",
        ]
    );
}

#[test]
fn test_modify_through_traversal() {
    // void x; -> !x;
    let tree = parse(json!({
        "type": "Program",
        "body": [expr_stmt(json!({ "type": "UnaryExpression", "operator": "void", "prefix": true, "argument": ident("x") }))]
    }));
    let out = traverse(
        &tree,
        &mut Callbacks::new().on(NodeKind::ExpressionStatement, |node| {
            node.modify(json!({ "expression": { "operator": "!" } }), false)
        }),
    )
    .unwrap();
    let expression = out.children("body").next().unwrap().child("expression").unwrap();
    assert_eq!(expression.str_field("operator"), Some("!"));
    assert!(expression.child("argument").unwrap().is_identifier_named("x"));
}

// =============================================================================
// Isolation and errors
// =============================================================================

#[test]
fn test_traverse_leaves_original_untouched() {
    let tree = statements(&["a", "b"]);
    let snapshot = tree.to_json();
    let out = traverse(
        &tree,
        &mut Callbacks::new().on(NodeKind::Identifier, |node| {
            node.replace(literal(&JsValue::Number(1.0)))
        }),
    )
    .unwrap();
    assert_eq!(tree.to_json(), snapshot);
    assert_ne!(out.to_json(), snapshot);
    assert_ne!(out.id(), tree.id());
}

#[test]
fn test_traverse_in_place_edits_callers_tree() {
    let mut tree = statements(&["a", "b"]);
    traverse_in_place(
        &mut tree,
        &mut Callbacks::new().on(NodeKind::ExpressionStatement, |node| {
            if node.index() == Some(0) {
                node.remove()?;
            }
            Ok(())
        }),
    )
    .unwrap();
    assert_eq!(body_names(&tree), ["b"]);
}

#[test]
fn test_root_verbs_are_structural_errors() {
    let tree = statements(&["a"]);
    let err = traverse(&tree, &mut Callbacks::new().on(NodeKind::Program, |node| node.remove()))
        .unwrap_err();
    assert!(matches!(err, TreeError::Structural { .. }));

    let err = traverse(
        &tree,
        &mut Callbacks::new().on(NodeKind::Program, |node| node.replace(identifier("x"))),
    )
    .unwrap_err();
    assert!(matches!(err, TreeError::Structural { .. }));
}

#[test]
fn test_splice_outside_list_is_structural_error() {
    let tree = statements(&["a"]);
    let err = traverse(
        &tree,
        &mut Callbacks::new().on(NodeKind::Identifier, |node| {
            node.replace_with_many(vec![identifier("x"), identifier("y")])
        }),
    )
    .unwrap_err();
    assert!(matches!(err, TreeError::Structural { .. }));
}

#[test]
fn test_callback_error_aborts_and_restores_position() {
    let mut tree = statements(&["a", "b"]);
    let err = traverse_in_place(
        &mut tree,
        &mut Callbacks::new().on(NodeKind::Identifier, |_| Err(TreeError::structural("stop"))),
    )
    .unwrap_err();
    assert!(err.to_string().contains("stop"));
    assert_eq!(body_names(&tree), ["a", "b"]);
}

/// Uppercases every identifier.
struct Uppercase {
    renamed: usize,
}

impl Traverse for Uppercase {
    fn enter(&mut self, node: &mut NodeRef<'_>) -> TreeResult<()> {
        if node.kind() == &NodeKind::Identifier {
            let upper = node.node().name().unwrap_or_default().to_uppercase();
            node.node_mut().set_name(upper);
            self.renamed += 1;
        }
        Ok(())
    }
}

#[test]
fn test_trait_visitor() {
    let tree = statements(&["a", "b"]);
    let mut visitor = Uppercase { renamed: 0 };
    let out = traverse(&tree, &mut visitor).unwrap();
    assert_eq!(body_names(&out), ["A", "B"]);
    assert_eq!(visitor.renamed, 2);
}
