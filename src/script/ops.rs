//! Operator semantics
//!
//! Conversions and operators follow the loose typing rules of the script
//! language: numeric strings take part in arithmetic, anything can be
//! compared with anything, and integer overflow falls back to floats.
//! Recoverable oddities are reported as warnings and evaluation continues.

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;

use super::ast::BinaryOp;
use super::EvalResult;
use crate::repl::backend_trait::{EvalError, FatalError, E_ERROR};
use crate::repl::handlers::{self, Severity};
use crate::runtime::value::{format_float, Array, Value};

/// Leading numeric prefix of a string, with surrounding whitespace
static NUMERIC_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?)(\s*)").expect("numeric pattern is valid")
});

/// Largest string a script may build, in bytes
pub const MEMORY_LIMIT: usize = 128 * 1024 * 1024;

pub(super) fn warn(message: &str) {
    handlers::report_error(Severity::Warning, message);
}

/// Check the size of a string about to be built; `None` means the size
/// computation overflowed
pub(super) fn reserve(size: Option<usize>) -> EvalResult<usize> {
    match size {
        Some(size) if size <= MEMORY_LIMIT => Ok(size),
        Some(size) => Err(out_of_memory(&size.to_string())),
        None => Err(out_of_memory("more than usize::MAX")),
    }
}

fn out_of_memory(tried: &str) -> EvalError {
    FatalError::new(
        E_ERROR,
        format!(
            "Allowed memory size of {} bytes exhausted (tried to allocate {} bytes)",
            MEMORY_LIMIT, tried
        ),
    )
    .into()
}

fn parse_number(text: &str) -> Value {
    let is_float = text.contains(['.', 'e', 'E']);
    if !is_float {
        if let Ok(i) = text.parse::<i64>() {
            return Value::Int(i);
        }
    }
    Value::Float(text.parse::<f64>().unwrap_or(0.0))
}

/// Value of a fully numeric string such as `" 12"` or `"1e3"`
pub fn numeric_string(text: &str) -> Option<Value> {
    let captures = NUMERIC_PREFIX.captures(text)?;
    let whole = captures.get(0)?;
    if whole.end() != text.len() {
        return None;
    }
    Some(parse_number(captures.get(1)?.as_str()))
}

/// Number for a string, warning when it is not entirely numeric
fn string_to_number(text: &str) -> Value {
    match NUMERIC_PREFIX.captures(text) {
        Some(captures) => {
            let number = captures
                .get(1)
                .map(|m| parse_number(m.as_str()))
                .unwrap_or(Value::Int(0));
            if captures.get(0).map(|m| m.end()) != Some(text.len()) {
                warn("A non-numeric value encountered");
            }
            number
        }
        None => {
            warn("A non-numeric value encountered");
            Value::Int(0)
        }
    }
}

/// Integer or float view of a scalar
pub fn to_number(value: &Value) -> Value {
    match value {
        Value::Null => Value::Int(0),
        Value::Bool(b) => Value::Int(*b as i64),
        Value::Int(_) | Value::Float(_) => value.clone(),
        Value::Str(s) => string_to_number(s),
        Value::Array(array) => Value::Int(!array.is_empty() as i64),
        Value::Object(_) => Value::Int(1),
        Value::Resource(resource) => Value::Int(resource.id as i64),
    }
}

fn float_to_int(f: f64) -> i64 {
    if f.is_finite() {
        f as i64
    } else {
        0
    }
}

pub fn to_int(value: &Value) -> i64 {
    match to_number(value) {
        Value::Int(i) => i,
        Value::Float(f) => float_to_int(f),
        _ => 0,
    }
}

pub fn to_float(value: &Value) -> f64 {
    match to_number(value) {
        Value::Int(i) => i as f64,
        Value::Float(f) => f,
        _ => 0.0,
    }
}

/// String conversion used by `echo`, `.` and interpolation
pub fn to_text(value: &Value) -> EvalResult<String> {
    Ok(match value {
        Value::Null => String::new(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => String::new(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format_float(*f),
        Value::Str(s) => s.clone(),
        Value::Array(_) => {
            warn("Array to string conversion");
            "Array".to_string()
        }
        Value::Object(object) => object.to_text().ok_or_else(|| {
            EvalError::transient(format!(
                "Object of class {} could not be converted to string",
                object.type_name()
            ))
        })?,
        Value::Resource(resource) => format!("Resource id #{}", resource.id),
    })
}

fn unsupported(
    op: BinaryOp,
    left: &Value,
    right: &Value,
) -> EvalError {
    EvalError::transient(format!(
        "Unsupported operand types: {} {} {}",
        left.type_label(),
        op.symbol(),
        right.type_label()
    ))
}

/// Evaluate a binary operator
pub fn binary(
    op: BinaryOp,
    left: &Value,
    right: &Value,
) -> EvalResult<Value> {
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            arithmetic(op, left, right)
        }
        BinaryOp::Concat => {
            let (left, right) = (to_text(left)?, to_text(right)?);
            reserve(left.len().checked_add(right.len()))?;
            Ok(Value::Str(left + &right))
        }
        BinaryOp::Eq => Ok(Value::Bool(loose_equals(left, right))),
        BinaryOp::NotEq => Ok(Value::Bool(!loose_equals(left, right))),
        BinaryOp::Identical => Ok(Value::Bool(strict_equals(left, right))),
        BinaryOp::NotIdentical => Ok(Value::Bool(!strict_equals(left, right))),
        BinaryOp::Lt => Ok(Value::Bool(compare(left, right) == Some(Ordering::Less))),
        BinaryOp::LtEq => Ok(Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        ))),
        BinaryOp::Gt => Ok(Value::Bool(compare(left, right) == Some(Ordering::Greater))),
        BinaryOp::GtEq => Ok(Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        ))),
    }
}

fn arithmetic(
    op: BinaryOp,
    left: &Value,
    right: &Value,
) -> EvalResult<Value> {
    match (left, right) {
        (Value::Array(l), Value::Array(r)) if op == BinaryOp::Add => return Ok(Value::Array(union(l, r))),
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => {
            return Err(unsupported(op, left, right))
        }
        _ => {}
    }

    let l = to_number(left);
    let r = to_number(right);

    if op == BinaryOp::Mod {
        let divisor = to_int(&r);
        if divisor == 0 {
            return Err(EvalError::transient("Modulo by zero"));
        }
        return Ok(Value::Int(to_int(&l).checked_rem(divisor).unwrap_or(0)));
    }

    if let (Value::Int(a), Value::Int(b)) = (&l, &r) {
        let (a, b) = (*a, *b);
        let exact = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::Div => {
                if b == 0 {
                    return Err(EvalError::transient("Division by zero"));
                }
                match a.checked_rem(b) {
                    Some(0) => a.checked_div(b),
                    _ => None,
                }
            }
            _ => None,
        };
        if let Some(result) = exact {
            return Ok(Value::Int(result));
        }
    }

    let (a, b) = (to_float(&l), to_float(&r));
    Ok(Value::Float(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        _ => {
            if b == 0.0 {
                return Err(EvalError::transient("Division by zero"));
            }
            a / b
        }
    }))
}

/// `$a + $b` on arrays: keys of `left` win
fn union(
    left: &Array,
    right: &Array,
) -> Array {
    let mut result = left.clone();
    for (key, value) in right.iter() {
        if !result.contains_key(key) {
            result.insert(key.clone(), value.clone());
        }
    }
    result
}

/// `==`
pub fn loose_equals(
    left: &Value,
    right: &Value,
) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(_), _) | (_, Value::Bool(_)) => left.is_truthy() == right.is_truthy(),
        (Value::Null, Value::Str(s)) | (Value::Str(s), Value::Null) => s.is_empty(),
        (Value::Null, _) | (_, Value::Null) => !left.is_truthy() && !right.is_truthy(),
        (Value::Str(a), Value::Str(b)) => match (numeric_string(a), numeric_string(b)) {
            (Some(x), Some(y)) => compare_numbers(&x, &y) == Some(Ordering::Equal),
            _ => a == b,
        },
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            compare_numbers(left, right) == Some(Ordering::Equal)
        }
        (Value::Int(_) | Value::Float(_), Value::Str(s)) | (Value::Str(s), Value::Int(_) | Value::Float(_)) => {
            let number = if matches!(left, Value::Str(_)) { right } else { left };
            match numeric_string(s) {
                Some(parsed) => compare_numbers(number, &parsed) == Some(Ordering::Equal),
                None => to_text(number).map(|text| &text == s).unwrap_or(false),
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, value)| b.get(key).is_some_and(|other| loose_equals(value, other)))
        }
        _ => left == right,
    }
}

/// `===`: same type and value; arrays also need the same order
pub fn strict_equals(
    left: &Value,
    right: &Value,
) -> bool {
    match (left, right) {
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .zip(b.iter())
                    .all(|((ka, va), (kb, vb))| ka == kb && strict_equals(va, vb))
        }
        _ => left == right,
    }
}

fn compare_numbers(
    left: &Value,
    right: &Value,
) -> Option<Ordering> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        _ => to_float(left).partial_cmp(&to_float(right)),
    }
}

/// Ordering used by `<`, `>`, `min` and `max`; `None` when incomparable
pub fn compare(
    left: &Value,
    right: &Value,
) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, Value::Str(s)) => Some(if s.is_empty() {
            Ordering::Equal
        } else {
            Ordering::Less
        }),
        (Value::Str(s), Value::Null) => Some(if s.is_empty() {
            Ordering::Equal
        } else {
            Ordering::Greater
        }),
        (Value::Null | Value::Bool(_), _) | (_, Value::Null | Value::Bool(_)) => {
            Some(left.is_truthy().cmp(&right.is_truthy()))
        }
        (Value::Str(a), Value::Str(b)) => match (numeric_string(a), numeric_string(b)) {
            (Some(x), Some(y)) => compare_numbers(&x, &y),
            _ => Some(a.cmp(b)),
        },
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => compare_numbers(left, right),
        (Value::Int(_) | Value::Float(_), Value::Str(s)) => match numeric_string(s) {
            Some(parsed) => compare_numbers(left, &parsed),
            None => to_text(left).ok().map(|text| text.as_str().cmp(s.as_str())),
        },
        (Value::Str(_), Value::Int(_) | Value::Float(_)) => compare(right, left).map(Ordering::reverse),
        (Value::Array(a), Value::Array(b)) => {
            if a.len() != b.len() {
                return Some(a.len().cmp(&b.len()));
            }
            for (key, value) in a.iter() {
                match compare(value, b.get(key)?)? {
                    Ordering::Equal => continue,
                    unequal => return Some(unequal),
                }
            }
            Some(Ordering::Equal)
        }
        (Value::Array(_), _) => Some(Ordering::Greater),
        (_, Value::Array(_)) => Some(Ordering::Less),
        _ => {
            if left == right {
                Some(Ordering::Equal)
            } else {
                None
            }
        }
    }
}

/// `++` and `--`
pub fn step(
    value: &Value,
    increment: bool,
) -> EvalResult<Value> {
    match (value, increment) {
        (Value::Null, true) => Ok(Value::Int(1)),
        (Value::Null, false) => Ok(Value::Null),
        (Value::Bool(_), _) => Ok(value.clone()),
        _ => {
            let op = if increment { BinaryOp::Add } else { BinaryOp::Sub };
            arithmetic(op, value, &Value::Int(1))
        }
    }
}
