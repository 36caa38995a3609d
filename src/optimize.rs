// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Peephole optimizer built on the traversal engine.
//!
//! - Constant folding of unary, binary and logical expressions whose operands
//!   are literals (or `undefined`, `NaN`, `Infinity`)
//! - `if` statements with a constant test collapse to the taken branch
//! - Statements after a `return` in a block are dropped
//! - A `"use strict"` directive in a directive prologue is dropped
//! - `void expr;` as a statement becomes `!expr;`
//!
//! Free identifiers never fold, so `x + 2` is left alone. Neither do
//! `undefined`, `NaN` or `Infinity` where a local binding shadows them.

use serde_json::{json, Value};
use tracing::{debug, trace};

use estrim_core::TreeResult;
use estrim_tree::{
    to_tree, traverse_in_place, watch, Ancestor, Field, JsValue, Node, NodeKind, NodeRef,
    Traverse, WatchCallbacks,
};

use crate::mangle::{AncestorScan, DeclarationSites, Resolution, ScopeResolver};

/// Optimize a copy of `tree`; `tree` itself is never touched.
///
/// # Errors
///
/// Propagates traversal errors; none are expected for a well-formed tree.
pub fn optimize(tree: &Node) -> TreeResult<Node> {
    let mut copy = tree.clone();
    optimize_in_place(&mut copy)?;
    Ok(copy)
}

/// Optimize `tree` itself.
///
/// # Errors
///
/// Propagates traversal errors; none are expected for a well-formed tree.
pub fn optimize_in_place(tree: &mut Node) -> TreeResult<()> {
    let before = count_nodes(tree);
    traverse_in_place(tree, &mut Optimizer)?;
    debug!(before, after = count_nodes(tree), "optimized");
    Ok(())
}

fn count_nodes(tree: &Node) -> usize {
    let mut count = 0;
    watch(tree, &mut WatchCallbacks::new().all(|_| count += 1));
    count
}

struct Optimizer;

impl Traverse for Optimizer {
    fn enter(&mut self, cursor: &mut NodeRef<'_>) -> TreeResult<()> {
        match cursor.kind() {
            NodeKind::BinaryExpression | NodeKind::LogicalExpression | NodeKind::UnaryExpression => {
                fold_expression(cursor)
            }
            NodeKind::ExpressionStatement => simplify_statement(cursor),
            // Both run after the children, once nested folds have settled.
            NodeKind::IfStatement => {
                cursor.on_leave(fold_if);
                Ok(())
            }
            NodeKind::BlockStatement => {
                cursor.on_leave(prune_after_return);
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Constant folding
// ============================================================================

/// The value an expression reduces to without any environment.
pub fn evaluate(node: &Node) -> Option<JsValue> {
    evaluate_in(node, None)
}

/// Bindings visible at a cursor, used to tell the global `undefined`, `NaN`
/// and `Infinity` apart from local bindings of the same name.
struct Scope<'t> {
    ancestors: Vec<Ancestor<'t>>,
    sites: DeclarationSites,
}

impl<'t> Scope<'t> {
    fn at(cursor: &NodeRef<'t>) -> Self {
        Scope {
            ancestors: cursor.ancestors().collect(),
            sites: DeclarationSites::new(),
        }
    }

    fn binds(&self, name: &str) -> bool {
        AncestorScan.resolve(&self.ancestors, name, &self.sites) != Resolution::Unresolved
    }
}

fn evaluate_in(node: &Node, scope: Option<&Scope<'_>>) -> Option<JsValue> {
    match node.kind() {
        NodeKind::Literal => literal_value(node),
        NodeKind::Identifier => {
            let name = node.name()?;
            let value = match name {
                "undefined" => JsValue::Undefined,
                "NaN" => JsValue::Number(f64::NAN),
                "Infinity" => JsValue::Number(f64::INFINITY),
                _ => return None,
            };
            if scope.is_some_and(|scope| scope.binds(name)) {
                return None;
            }
            Some(value)
        }
        NodeKind::ParenthesizedExpression => evaluate_in(node.child("expression")?, scope),
        NodeKind::TemplateLiteral => {
            if node.children("expressions").next().is_some() {
                return None;
            }
            let quasi = node.children("quasis").next()?;
            let cooked = quasi.value("value")?.get("cooked")?.as_str()?;
            Some(JsValue::from(cooked))
        }
        NodeKind::UnaryExpression => {
            let operand = evaluate_in(node.child("argument")?, scope)?;
            JsValue::unary(node.str_field("operator")?, &operand)
        }
        NodeKind::BinaryExpression => {
            let left = evaluate_in(node.child("left")?, scope)?;
            let right = evaluate_in(node.child("right")?, scope)?;
            JsValue::binary(node.str_field("operator")?, &left, &right)
        }
        NodeKind::LogicalExpression => {
            let operator = node.str_field("operator")?;
            let left = evaluate_in(node.child("left")?, scope)?;
            let short_circuits = match operator {
                "&&" => !left.truthy(),
                "||" => left.truthy(),
                "??" => !matches!(left, JsValue::Undefined | JsValue::Null),
                _ => return None,
            };
            if short_circuits {
                return Some(left);
            }
            let right = evaluate_in(node.child("right")?, scope)?;
            JsValue::logical(operator, &left, &right)
        }
        _ => None,
    }
}

fn literal_value(node: &Node) -> Option<JsValue> {
    // Regex and bigint literals carry no portable `value`.
    if node.has("regex") || node.has("bigint") {
        return None;
    }
    match node.value("value")? {
        value @ (Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)) => {
            Some(JsValue::from(value.clone()))
        }
        _ => None,
    }
}

fn fold_expression(cursor: &mut NodeRef<'_>) -> TreeResult<()> {
    let scope = Scope::at(cursor);
    let node = cursor.node();
    // `void 0` is already the shortest spelling of undefined.
    if node.str_field("operator") == Some("void") {
        return Ok(());
    }
    let Some(value) = evaluate_in(node, Some(&scope)) else {
        return Ok(());
    };
    let folded = to_tree(&value);
    if &folded == node {
        return Ok(());
    }
    trace!(kind = %node.kind(), value = %value.to_js_string(), "folded");
    cursor.replace(folded)
}

// ============================================================================
// Statements
// ============================================================================

fn simplify_statement(cursor: &mut NodeRef<'_>) -> TreeResult<()> {
    if is_use_strict(cursor.node()) && in_directive_prologue(cursor) {
        trace!("removed use strict");
        return cursor.remove();
    }
    let is_void = cursor
        .node()
        .child("expression")
        .is_some_and(|expression| {
            expression.is(&NodeKind::UnaryExpression)
                && expression.str_field("operator") == Some("void")
        });
    if is_void {
        // The value is discarded, so any unary that keeps the operand's
        // evaluation will do.
        cursor.modify(json!({ "expression": { "operator": "!" } }), false)?;
    }
    Ok(())
}

fn is_directive(statement: &Node) -> bool {
    statement.is(&NodeKind::ExpressionStatement)
        && statement
            .child("expression")
            .is_some_and(|expression| {
                expression.is(&NodeKind::Literal)
                    && matches!(expression.value("value"), Some(Value::String(_)))
            })
}

fn is_use_strict(statement: &Node) -> bool {
    is_directive(statement)
        && statement
            .child("expression")
            .and_then(|expression| expression.value("value"))
            .and_then(Value::as_str)
            == Some("use strict")
}

/// True when every earlier statement of a program or function body is a
/// directive.
fn in_directive_prologue(cursor: &NodeRef<'_>) -> bool {
    let Some(index) = cursor.index() else {
        return false;
    };
    let mut ancestors = cursor.ancestors();
    let Some(parent) = ancestors.next() else {
        return false;
    };
    let body_owner = match parent.kind() {
        NodeKind::Program => true,
        NodeKind::BlockStatement => ancestors
            .next()
            .is_some_and(|grandparent| {
                grandparent.kind().is_function_like() && grandparent.field == "body"
            }),
        _ => false,
    };
    body_owner
        && parent.node.list("body").is_some_and(|body| {
            body[..index]
                .iter()
                .all(|slot| slot.as_ref().is_some_and(is_directive))
        })
}

/// Collapse an `if` whose test is constant. Runs as a leave hook.
fn fold_if(cursor: &mut NodeRef<'_>) -> TreeResult<()> {
    let scope = Scope::at(cursor);
    let node = cursor.node();
    let Some(test) = node
        .child("test")
        .and_then(|test| evaluate_in(test, Some(&scope)))
    else {
        return Ok(());
    };
    let (taken, untaken) = if test.truthy() {
        (node.child("consequent"), node.child("alternate"))
    } else {
        (node.child("alternate"), node.child("consequent"))
    };
    if untaken.is_some_and(declares_var) {
        return Ok(());
    }
    let in_list = cursor.index().is_some();
    trace!(test = test.truthy(), "folded if");
    match taken.cloned() {
        None if in_list => cursor.remove(),
        None => cursor.replace(Node::new(NodeKind::EmptyStatement)),
        Some(block) if block.is(&NodeKind::BlockStatement) && in_list && !has_lexical(&block) => {
            cursor.replace_with_many(block.children("body").cloned().collect())
        }
        Some(statement) => cursor.replace(statement),
    }
}

/// True if `block` declares a binding scoped to the block itself.
fn has_lexical(block: &Node) -> bool {
    block.children("body").any(|statement| match statement.kind() {
        NodeKind::VariableDeclaration => statement.str_field("kind") != Some("var"),
        NodeKind::ClassDeclaration | NodeKind::FunctionDeclaration => true,
        _ => false,
    })
}

/// True if a `var` declaration appears below `node` outside nested functions.
fn declares_var(node: &Node) -> bool {
    if node.is(&NodeKind::VariableDeclaration) && node.str_field("kind") == Some("var") {
        return true;
    }
    if node.kind().is_function_like() {
        return false;
    }
    node.fields().any(|(_, field)| match field {
        Field::Node(child) => declares_var(child),
        Field::List(items) => items.iter().flatten().any(declares_var),
        Field::Value(_) => false,
    })
}

/// Drop statements after the first `return` of a block. Runs as a leave hook.
///
/// Function declarations are hoisted and stay. `var` declarations stay for
/// their binding but lose initializers that can never run.
fn prune_after_return(cursor: &mut NodeRef<'_>) -> TreeResult<()> {
    let Some(body) = cursor.node_mut().list_mut("body") else {
        return Ok(());
    };
    let Some(first_return) = body
        .iter()
        .position(|slot| slot.as_ref().is_some_and(|s| s.is(&NodeKind::ReturnStatement)))
    else {
        return Ok(());
    };
    let before = body.len();
    let unreachable = body.split_off(first_return + 1);
    body.extend(
        unreachable
            .into_iter()
            .flatten()
            .filter_map(hoisted_remainder)
            .map(Some),
    );
    if body.len() != before {
        trace!(removed = before - body.len(), "pruned after return");
    }
    Ok(())
}

/// What survives of an unreachable statement.
fn hoisted_remainder(mut statement: Node) -> Option<Node> {
    match statement.kind() {
        NodeKind::FunctionDeclaration => Some(statement),
        NodeKind::VariableDeclaration if statement.str_field("kind") == Some("var") => {
            let declarators = statement.list_mut("declarations")?;
            // A pattern needs its initializer to stay well-formed.
            let plain = declarators.iter().flatten().all(|declarator| {
                declarator
                    .child("id")
                    .is_some_and(|id| id.is(&NodeKind::Identifier))
            });
            if plain {
                for declarator in declarators.iter_mut().flatten() {
                    declarator.set("init", Value::Null);
                }
            }
            Some(statement)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: i64) -> Value {
        json!({ "type": "Literal", "value": n, "raw": n.to_string() })
    }

    fn ident(name: &str) -> Value {
        json!({ "type": "Identifier", "name": name })
    }

    fn binary(operator: &str, left: Value, right: Value) -> Value {
        json!({ "type": "BinaryExpression", "operator": operator, "left": left, "right": right })
    }

    fn stmt(expression: Value) -> Value {
        json!({ "type": "ExpressionStatement", "expression": expression })
    }

    fn call(name: &str) -> Value {
        stmt(json!({ "type": "CallExpression", "callee": ident(name), "arguments": [], "optional": false }))
    }

    fn ret(argument: Value) -> Value {
        json!({ "type": "ReturnStatement", "argument": argument })
    }

    fn program(body: Vec<Value>) -> Node {
        Node::from_json(json!({ "type": "Program", "sourceType": "script", "body": body })).unwrap()
    }

    fn optimized(body: Vec<Value>) -> Value {
        optimize(&program(body)).unwrap().to_json()
    }

    #[test]
    fn test_folds_arithmetic() {
        let json = optimized(vec![stmt(binary("+", num(1), num(2)))]);
        assert_eq!(json["body"][0]["expression"], json!({ "type": "Literal", "value": 3, "raw": "3" }));
    }

    #[test]
    fn test_operand_order_is_preserved() {
        let json = optimized(vec![
            stmt(binary("-", num(10), num(4))),
            stmt(binary("<", num(1), num(2))),
            stmt(binary("/", num(1), num(4))),
        ]);
        assert_eq!(json["body"][0]["expression"]["value"], 6);
        assert_eq!(json["body"][1]["expression"]["value"], true);
        assert_eq!(json["body"][2]["expression"]["value"], 0.25);
    }

    #[test]
    fn test_folds_nested_and_string_concatenation() {
        let json = optimized(vec![stmt(binary(
            "+",
            json!({ "type": "Literal", "value": "n=", "raw": "\"n=\"" }),
            binary("*", num(2), num(3)),
        ))]);
        assert_eq!(json["body"][0]["expression"]["value"], "n=6");
        assert_eq!(json["body"][0]["expression"]["raw"], "'n=6'");
    }

    #[test]
    fn test_folds_logical() {
        let json = optimized(vec![
            stmt(json!({ "type": "LogicalExpression", "operator": "&&",
                         "left": { "type": "Literal", "value": true, "raw": "true" },
                         "right": { "type": "Literal", "value": false, "raw": "false" } })),
            // The right side is never evaluated.
            stmt(json!({ "type": "LogicalExpression", "operator": "||",
                         "left": num(1), "right": ident("unknown") })),
        ]);
        assert_eq!(json["body"][0]["expression"]["value"], false);
        assert_eq!(json["body"][1]["expression"]["value"], 1);
    }

    #[test]
    fn test_free_identifiers_do_not_fold() {
        let source = vec![stmt(binary("+", ident("x"), num(2)))];
        let json = optimized(source.clone());
        assert_eq!(json, program(source).to_json());
    }

    #[test]
    fn test_shadowed_constants_do_not_fold() {
        // function f(undefined) { return undefined + 1; }
        // function g() { var NaN = 2; return NaN * 2; }
        // undefined + 1;
        let function = |name: &str, params: Vec<Value>, body: Vec<Value>| {
            json!({
                "type": "FunctionDeclaration", "id": ident(name), "params": params,
                "body": { "type": "BlockStatement", "body": body },
                "generator": false, "async": false
            })
        };
        let json = optimized(vec![
            function("f", vec![ident("undefined")], vec![ret(binary("+", ident("undefined"), num(1)))]),
            function(
                "g",
                vec![],
                vec![
                    json!({ "type": "VariableDeclaration", "kind": "var", "declarations": [{
                        "type": "VariableDeclarator", "id": ident("NaN"), "init": num(2) }] }),
                    ret(binary("*", ident("NaN"), num(2))),
                ],
            ),
            stmt(binary("+", ident("undefined"), num(1))),
        ]);

        let in_f = &json["body"][0]["body"]["body"][0]["argument"];
        assert_eq!(in_f["type"], "BinaryExpression");
        assert_eq!(in_f["left"]["name"], "undefined");
        let in_g = &json["body"][1]["body"]["body"][1]["argument"];
        assert_eq!(in_g["type"], "BinaryExpression");
        // At the top level `undefined` is the global, so the sum folds.
        assert_eq!(json["body"][2]["expression"]["type"], "Identifier");
        assert_eq!(json["body"][2]["expression"]["name"], "NaN");
    }

    #[test]
    fn test_shadowed_constant_test_keeps_if() {
        // function f(Infinity) { if (Infinity) { a(); } }
        let json = optimized(vec![json!({
            "type": "FunctionDeclaration", "id": ident("f"), "params": [ident("Infinity")],
            "body": { "type": "BlockStatement", "body": [{
                "type": "IfStatement", "test": ident("Infinity"), "alternate": null,
                "consequent": { "type": "BlockStatement", "body": [call("a")] }
            }]},
            "generator": false, "async": false
        })]);
        assert_eq!(json["body"][0]["body"]["body"][0]["type"], "IfStatement");
    }

    #[test]
    fn test_partial_folding_inside_unfoldable() {
        // x + (2 * 3)
        let json = optimized(vec![stmt(binary("+", ident("x"), binary("*", num(2), num(3))))]);
        let expression = &json["body"][0]["expression"];
        assert_eq!(expression["left"]["name"], "x");
        assert_eq!(expression["right"]["value"], 6);
    }

    #[test]
    fn test_negative_and_special_results() {
        let json = optimized(vec![
            stmt(binary("-", num(1), num(3))),
            stmt(binary("/", num(0), num(0))),
            stmt(json!({ "type": "UnaryExpression", "operator": "typeof", "prefix": true,
                         "argument": num(1) })),
        ]);
        assert_eq!(json["body"][0]["expression"]["operator"], "-");
        assert_eq!(json["body"][0]["expression"]["argument"]["value"], 2);
        assert_eq!(json["body"][1]["expression"], ident("NaN"));
        assert_eq!(json["body"][2]["expression"]["value"], "number");
    }

    #[test]
    fn test_regex_literals_do_not_fold() {
        let regex = json!({ "type": "Literal", "value": null, "raw": "/a/",
                            "regex": { "pattern": "a", "flags": "" } });
        let json = optimized(vec![stmt(binary("===", regex.clone(), json!({ "type": "Literal", "value": null, "raw": "null" })))]);
        assert_eq!(json["body"][0]["expression"]["type"], "BinaryExpression");
    }

    #[test]
    fn test_prunes_after_return() {
        // function f() { return 1; sideEffect(); function g() {} var v = 2; }
        let json = optimized(vec![json!({
            "type": "FunctionDeclaration", "id": ident("f"), "params": [],
            "body": { "type": "BlockStatement", "body": [
                ret(num(1)),
                call("sideEffect"),
                { "type": "FunctionDeclaration", "id": ident("g"), "params": [],
                  "body": { "type": "BlockStatement", "body": [] } },
                { "type": "VariableDeclaration", "kind": "var", "declarations": [
                    { "type": "VariableDeclarator", "id": ident("v"), "init": num(2) }] }
            ]}
        })]);
        let body = json["body"][0]["body"]["body"].as_array().unwrap();
        let kinds: Vec<_> = body.iter().map(|s| s["type"].as_str().unwrap()).collect();
        assert_eq!(kinds, ["ReturnStatement", "FunctionDeclaration", "VariableDeclaration"]);
        assert_eq!(body[2]["declarations"][0]["init"], Value::Null);
    }

    #[test]
    fn test_prune_plain_block() {
        let json = optimized(vec![json!({
            "type": "BlockStatement",
            "body": [ret(num(1)), call("sideEffect")]
        })]);
        assert_eq!(json["body"][0]["body"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_if_true_splices_consequent() {
        let json = optimized(vec![json!({
            "type": "IfStatement",
            "test": binary("<", num(1), num(2)),
            "consequent": { "type": "BlockStatement", "body": [call("a"), call("b")] },
            "alternate": { "type": "BlockStatement", "body": [call("c")] }
        })]);
        let body = json["body"].as_array().unwrap();
        assert_eq!(body.len(), 2);
        assert_eq!(body[0]["expression"]["callee"]["name"], "a");
        assert_eq!(body[1]["expression"]["callee"]["name"], "b");
    }

    #[test]
    fn test_if_false_without_else_is_removed() {
        let json = optimized(vec![
            json!({
                "type": "IfStatement",
                "test": { "type": "Literal", "value": false, "raw": "false" },
                "consequent": call("never"),
                "alternate": null
            }),
            call("after"),
        ]);
        let body = json["body"].as_array().unwrap();
        assert_eq!(body.len(), 1);
        assert_eq!(body[0]["expression"]["callee"]["name"], "after");
    }

    #[test]
    fn test_if_keeps_lexical_block() {
        let json = optimized(vec![json!({
            "type": "IfStatement",
            "test": num(1),
            "consequent": { "type": "BlockStatement", "body": [
                { "type": "VariableDeclaration", "kind": "let", "declarations": [
                    { "type": "VariableDeclarator", "id": ident("scoped"), "init": null }] }
            ]},
            "alternate": null
        })]);
        assert_eq!(json["body"][0]["type"], "BlockStatement");
    }

    #[test]
    fn test_if_outside_list_becomes_statement() {
        // while (c) if (0) a();
        let json = optimized(vec![json!({
            "type": "WhileStatement",
            "test": ident("c"),
            "body": { "type": "IfStatement", "test": num(0), "consequent": call("a"), "alternate": null }
        })]);
        assert_eq!(json["body"][0]["body"], json!({ "type": "EmptyStatement" }));
    }

    #[test]
    fn test_if_with_unfoldable_test_is_kept() {
        let source = vec![json!({
            "type": "IfStatement", "test": ident("flag"),
            "consequent": call("a"), "alternate": null
        })];
        assert_eq!(optimized(source.clone()), program(source).to_json());
    }

    #[test]
    fn test_spliced_return_prunes_rest() {
        // function f() { if (true) { return 1; } tail(); }
        let json = optimized(vec![json!({
            "type": "FunctionDeclaration", "id": ident("f"), "params": [],
            "body": { "type": "BlockStatement", "body": [
                { "type": "IfStatement",
                  "test": { "type": "Literal", "value": true, "raw": "true" },
                  "consequent": { "type": "BlockStatement", "body": [ret(num(1))] },
                  "alternate": null },
                call("tail")
            ]}
        })]);
        let body = json["body"][0]["body"]["body"].as_array().unwrap();
        assert_eq!(body.len(), 1);
        assert_eq!(body[0]["type"], "ReturnStatement");
    }

    #[test]
    fn test_removes_use_strict_prologue_only() {
        let strict = stmt(json!({ "type": "Literal", "value": "use strict", "raw": "'use strict'" }));
        let json = optimized(vec![strict.clone(), call("a"), strict]);
        let body = json["body"].as_array().unwrap();
        assert_eq!(body.len(), 2);
        assert_eq!(body[0]["expression"]["callee"]["name"], "a");
        assert_eq!(body[1]["expression"]["value"], "use strict");
    }

    #[test]
    fn test_void_statement_becomes_not() {
        let json = optimized(vec![stmt(json!({
            "type": "UnaryExpression", "operator": "void", "prefix": true,
            "argument": json!({ "type": "CallExpression", "callee": ident("f"), "arguments": [], "optional": false })
        }))]);
        let expression = &json["body"][0]["expression"];
        assert_eq!(expression["operator"], "!");
        assert_eq!(expression["argument"]["callee"]["name"], "f");
    }

    #[test]
    fn test_void_expression_is_kept() {
        let source = vec![stmt(json!({
            "type": "AssignmentExpression", "operator": "=", "left": ident("x"),
            "right": { "type": "UnaryExpression", "operator": "void", "prefix": true, "argument": num(0) }
        }))];
        assert_eq!(optimized(source.clone()), program(source).to_json());
    }

    #[test]
    fn test_clone_isolation() {
        let tree = program(vec![stmt(binary("+", num(1), num(2)))]);
        let before = tree.to_json();
        let _ = optimize(&tree).unwrap();
        assert_eq!(tree.to_json(), before);
    }
}
