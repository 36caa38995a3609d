// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Native values with ECMAScript semantics.
//!
//! [`JsValue`] is the value model shared by the tree constructor (native value
//! to literal nodes) and the constant folder. The operator helpers implement
//! the language's own coercion rules so a folded expression produces exactly
//! what the engine would have produced at run time.
//!
//! # Usage
//!
//! ```
//! use estrim_tree::JsValue;
//!
//! let sum = JsValue::binary("+", &JsValue::from("a"), &JsValue::Number(1.0));
//! assert_eq!(sum, Some(JsValue::from("a1")));
//! ```

use std::cmp::Ordering;

use serde_json::Value;

/// A native value.
#[derive(Debug, Clone, PartialEq)]
pub enum JsValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<JsValue>),
    /// Ordered key/value entries.
    Object(Vec<(String, JsValue)>),
}

impl JsValue {
    /// True for `undefined`, `null`, booleans, numbers and strings.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, JsValue::Array(_) | JsValue::Object(_))
    }

    /// `ToBoolean`.
    pub fn truthy(&self) -> bool {
        match self {
            JsValue::Undefined | JsValue::Null => false,
            JsValue::Bool(b) => *b,
            JsValue::Number(n) => *n != 0.0 && !n.is_nan(),
            JsValue::String(s) => !s.is_empty(),
            JsValue::Array(_) | JsValue::Object(_) => true,
        }
    }

    /// `ToNumber`.
    pub fn to_number(&self) -> f64 {
        match self {
            JsValue::Undefined => f64::NAN,
            JsValue::Null => 0.0,
            JsValue::Bool(b) => f64::from(u8::from(*b)),
            JsValue::Number(n) => *n,
            JsValue::String(s) => string_to_number(s),
            JsValue::Array(items) => match items.as_slice() {
                [] => 0.0,
                [only] => string_to_number(&only.to_js_string()),
                _ => f64::NAN,
            },
            JsValue::Object(_) => f64::NAN,
        }
    }

    /// `ToString`.
    pub fn to_js_string(&self) -> String {
        match self {
            JsValue::Undefined => "undefined".to_string(),
            JsValue::Null => "null".to_string(),
            JsValue::Bool(b) => b.to_string(),
            JsValue::Number(n) => format_number(*n),
            JsValue::String(s) => s.clone(),
            JsValue::Array(items) => items
                .iter()
                .map(|item| match item {
                    JsValue::Undefined | JsValue::Null => String::new(),
                    other => other.to_js_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            JsValue::Object(_) => "[object Object]".to_string(),
        }
    }

    /// The result of `typeof`.
    pub fn type_of(&self) -> &'static str {
        match self {
            JsValue::Undefined => "undefined",
            JsValue::Null | JsValue::Array(_) | JsValue::Object(_) => "object",
            JsValue::Bool(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::String(_) => "string",
        }
    }

    /// `===`.
    pub fn strict_equals(&self, other: &JsValue) -> bool {
        match (self, other) {
            (JsValue::Undefined, JsValue::Undefined) | (JsValue::Null, JsValue::Null) => true,
            (JsValue::Bool(a), JsValue::Bool(b)) => a == b,
            (JsValue::Number(a), JsValue::Number(b)) => a == b,
            (JsValue::String(a), JsValue::String(b)) => a == b,
            // Distinct composite values are never identical.
            _ => false,
        }
    }

    /// `==` between primitives. Composite operands yield `None`.
    pub fn loose_equals(&self, other: &JsValue) -> Option<bool> {
        if !self.is_primitive() || !other.is_primitive() {
            return None;
        }
        let equal = match (self, other) {
            (JsValue::Undefined | JsValue::Null, JsValue::Undefined | JsValue::Null) => true,
            (JsValue::Undefined | JsValue::Null, _) | (_, JsValue::Undefined | JsValue::Null) => {
                false
            }
            (JsValue::String(a), JsValue::String(b)) => a == b,
            (JsValue::Bool(a), JsValue::Bool(b)) => a == b,
            _ => self.to_number() == other.to_number(),
        };
        Some(equal)
    }

    /// Evaluate a unary operator over a primitive operand.
    ///
    /// Returns `None` for operators with side effects (`delete`) and for
    /// composite operands.
    pub fn unary(operator: &str, operand: &JsValue) -> Option<JsValue> {
        if !operand.is_primitive() {
            return None;
        }
        let value = match operator {
            "-" => JsValue::Number(-operand.to_number()),
            "+" => JsValue::Number(operand.to_number()),
            "!" => JsValue::Bool(!operand.truthy()),
            "~" => JsValue::Number(f64::from(!to_int32(operand.to_number()))),
            "void" => JsValue::Undefined,
            "typeof" => JsValue::from(operand.type_of()),
            _ => return None,
        };
        Some(value)
    }

    /// Evaluate a binary operator over primitive operands, left then right.
    ///
    /// Returns `None` for operators that need an object model (`in`,
    /// `instanceof`) and for composite operands.
    pub fn binary(operator: &str, left: &JsValue, right: &JsValue) -> Option<JsValue> {
        if !left.is_primitive() || !right.is_primitive() {
            return None;
        }
        let number = |n: f64| Some(JsValue::Number(n));
        let boolean = |b: bool| Some(JsValue::Bool(b));
        match operator {
            "+" => {
                if matches!(left, JsValue::String(_)) || matches!(right, JsValue::String(_)) {
                    let mut joined = left.to_js_string();
                    joined.push_str(&right.to_js_string());
                    Some(JsValue::String(joined))
                } else {
                    number(left.to_number() + right.to_number())
                }
            }
            "-" => number(left.to_number() - right.to_number()),
            "*" => number(left.to_number() * right.to_number()),
            "/" => number(left.to_number() / right.to_number()),
            "%" => number(left.to_number() % right.to_number()),
            "**" => number(js_pow(left.to_number(), right.to_number())),
            "|" => number(f64::from(to_int32(left.to_number()) | to_int32(right.to_number()))),
            "&" => number(f64::from(to_int32(left.to_number()) & to_int32(right.to_number()))),
            "^" => number(f64::from(to_int32(left.to_number()) ^ to_int32(right.to_number()))),
            "<<" => number(f64::from(
                to_int32(left.to_number()).wrapping_shl(to_uint32(right.to_number()) & 31),
            )),
            ">>" => number(f64::from(
                to_int32(left.to_number()).wrapping_shr(to_uint32(right.to_number()) & 31),
            )),
            ">>>" => number(f64::from(
                to_uint32(left.to_number()).wrapping_shr(to_uint32(right.to_number()) & 31),
            )),
            "==" => left.loose_equals(right).map(JsValue::Bool),
            "!=" => left.loose_equals(right).map(|eq| JsValue::Bool(!eq)),
            "===" => boolean(left.strict_equals(right)),
            "!==" => boolean(!left.strict_equals(right)),
            "<" => boolean(compare(left, right) == Some(Ordering::Less)),
            ">" => boolean(compare(left, right) == Some(Ordering::Greater)),
            "<=" => boolean(matches!(
                compare(left, right),
                Some(Ordering::Less | Ordering::Equal)
            )),
            ">=" => boolean(matches!(
                compare(left, right),
                Some(Ordering::Greater | Ordering::Equal)
            )),
            _ => None,
        }
    }

    /// Evaluate a short-circuit operator. The result is one of the operands.
    pub fn logical(operator: &str, left: &JsValue, right: &JsValue) -> Option<JsValue> {
        match operator {
            "&&" => Some(if left.truthy() { right } else { left }.clone()),
            "||" => Some(if left.truthy() { left } else { right }.clone()),
            "??" => Some(
                if matches!(left, JsValue::Undefined | JsValue::Null) {
                    right
                } else {
                    left
                }
                .clone(),
            ),
            _ => None,
        }
    }
}

impl From<bool> for JsValue {
    fn from(value: bool) -> Self {
        JsValue::Bool(value)
    }
}

impl From<f64> for JsValue {
    fn from(value: f64) -> Self {
        JsValue::Number(value)
    }
}

impl From<i32> for JsValue {
    fn from(value: i32) -> Self {
        JsValue::Number(f64::from(value))
    }
}

impl From<&str> for JsValue {
    fn from(value: &str) -> Self {
        JsValue::String(value.to_string())
    }
}

impl From<String> for JsValue {
    fn from(value: String) -> Self {
        JsValue::String(value)
    }
}

impl<T: Into<JsValue>> From<Option<T>> for JsValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(JsValue::Undefined, Into::into)
    }
}

impl<T: Into<JsValue>> From<Vec<T>> for JsValue {
    fn from(items: Vec<T>) -> Self {
        JsValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<Value> for JsValue {
    /// JSON has no `undefined`; `null` maps to `null`.
    fn from(value: Value) -> Self {
        match value {
            Value::Null => JsValue::Null,
            Value::Bool(b) => JsValue::Bool(b),
            Value::Number(n) => JsValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => JsValue::String(s),
            Value::Array(items) => JsValue::Array(items.into_iter().map(JsValue::from).collect()),
            Value::Object(map) => {
                JsValue::Object(map.into_iter().map(|(k, v)| (k, JsValue::from(v))).collect())
            }
        }
    }
}

// ============================================================================
// Coercions
// ============================================================================

/// `StringToNumber`: whitespace-trimmed decimal, hex, octal or binary literal.
fn string_to_number(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }
    let prefixed = |prefix: [&str; 2], radix: u32| {
        prefix
            .iter()
            .find_map(|p| text.strip_prefix(p))
            .map(|digits| match u64::from_str_radix(digits, radix) {
                Ok(n) if !digits.is_empty() => n as f64,
                _ => f64::NAN,
            })
    };
    if let Some(n) = prefixed(["0x", "0X"], 16)
        .or_else(|| prefixed(["0o", "0O"], 8))
        .or_else(|| prefixed(["0b", "0B"], 2))
    {
        return n;
    }
    let unsigned = text.trim_start_matches(['+', '-']);
    if unsigned == "Infinity" && text.len() - unsigned.len() <= 1 {
        return if text.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }
    // Rust's float grammar also accepts "inf" and "nan"; the language does not.
    if !text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return f64::NAN;
    }
    text.parse::<f64>().unwrap_or(f64::NAN)
}

/// `ToInt32`.
pub(crate) fn to_int32(n: f64) -> i32 {
    to_uint32(n) as i32
}

/// `ToUint32`.
pub(crate) fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4_294_967_296.0) as u32
}

fn js_pow(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return f64::NAN;
    }
    base.powf(exponent)
}

/// Abstract relational comparison. `None` means undefined (a NaN operand).
fn compare(left: &JsValue, right: &JsValue) -> Option<Ordering> {
    if let (JsValue::String(a), JsValue::String(b)) = (left, right) {
        return Some(a.encode_utf16().cmp(b.encode_utf16()));
    }
    left.to_number().partial_cmp(&right.to_number())
}

/// `Number::toString` for radix 10.
///
/// Uses the shortest round-trip digits and switches to exponent form outside
/// `1e-7 < |n| < 1e21`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let sign = if n < 0.0 { "-" } else { "" };

    // `{:e}` yields the shortest round-trip mantissa, e.g. "1.2345e-7".
    let exp_form = format!("{:e}", n.abs());
    let (mantissa, exponent) = exp_form.split_once('e').unwrap_or((exp_form.as_str(), "0"));
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let k = digits.len() as i32;
    let point = exponent + 1;

    let body = if k <= point && point <= 21 {
        format!("{digits}{}", "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{int}.{frac}")
    } else if -6 < point && point <= 0 {
        format!("0.{}{digits}", "0".repeat((-point) as usize))
    } else {
        let exp_sign = if point - 1 >= 0 { "+" } else { "-" };
        let (first, rest) = digits.split_at(1);
        let rest = if rest.is_empty() {
            String::new()
        } else {
            format!(".{rest}")
        };
        format!("{first}{rest}e{exp_sign}{}", (point - 1).abs())
    };
    format!("{sign}{body}")
}
