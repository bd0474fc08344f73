//! Runtime value type system
//!
//! `Value` is the dynamic value universe seen by REPL sessions: everything a
//! caller can inject into a scope and everything an evaluator can hand back.
//! Arrays are ordered keyed maps with value semantics (cloning an array copies
//! it); host objects are shared behind `Rc`.

use std::fmt;
use std::rc::Rc;

use super::array::Array;

/// A structured value owned by the embedding program.
///
/// Host objects are opaque to the evaluator. They only need a type name for
/// display; implementing [`HostObject::to_text`] gives them a custom rendering.
pub trait HostObject: fmt::Debug {
    /// Type name shown when the object has no text conversion
    fn type_name(&self) -> &str;

    /// Custom textual conversion, if the object supports one
    fn to_text(&self) -> Option<String> {
        None
    }
}

/// Opaque handle to an external resource (file, socket, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// What kind of resource this is, e.g. `stream`
    pub kind: String,
    /// Handle id
    pub id: u32,
}

impl Resource {
    pub fn new(
        kind: impl Into<String>,
        id: u32,
    ) -> Self {
        Self {
            kind: kind.into(),
            id,
        }
    }
}

/// Runtime value
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Ordered keyed collection
    Array(Array),
    /// Structured value supplied by the host program
    Object(Rc<dyn HostObject>),
    Resource(Resource),
}

impl Value {
    /// Wrap a host object
    pub fn object(object: impl HostObject + 'static) -> Self {
        Value::Object(Rc::new(object))
    }

    /// Runtime kind name, as reported by `gettype`
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "double",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Resource(_) => "resource",
        }
    }

    /// Short type name used in error messages (`int`, `string`, ...)
    pub fn type_label(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "string".to_string(),
            Value::Array(_) => "array".to_string(),
            Value::Object(object) => object.type_name().to_string(),
            Value::Resource(_) => "resource".to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness: `null`, `false`, `0`, `0.0`, `""`, `"0"` and `[]` are false
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !(s.is_empty() || s == "0"),
            Value::Array(array) => !array.is_empty(),
            Value::Object(_) | Value::Resource(_) => true,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

/// Canonical decimal form of a float
///
/// Uses the shortest digits that round-trip. Magnitudes from `1e15` up, or
/// below `1e-4`, switch to exponent form (`1.0E+20`, `2.5E-7`) so a float
/// never reads like an integer.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "NAN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    if f == 0.0 {
        return format!("{}", f);
    }

    let scientific = format!("{:e}", f);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return format!("{}", f);
    };
    let exponent: i32 = match exponent.parse() {
        Ok(exponent) => exponent,
        Err(_) => return format!("{}", f),
    };
    if (-4..15).contains(&exponent) {
        return format!("{}", f);
    }

    let sign = if exponent < 0 { '-' } else { '+' };
    if mantissa.contains('.') {
        format!("{}E{}{}", mantissa, sign, exponent.abs())
    } else {
        format!("{}.0E{}{}", mantissa, sign, exponent.abs())
    }
}

impl PartialEq for Value {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
            (Value::Resource(a), Value::Resource(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        match i64::try_from(i) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::Float(i as f64),
        }
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Array> for Value {
    fn from(array: Array) -> Self {
        Value::Array(array)
    }
}

impl From<Resource> for Value {
    fn from(resource: Resource) -> Self {
        Value::Resource(resource)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
