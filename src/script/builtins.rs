//! Builtin function registry
//!
//! Builtins are plain function pointers over evaluated arguments. Functions
//! that need interpreter state (`get_defined_vars`) are handled by the
//! interpreter itself.

use std::cmp::Ordering;
use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::ast::BinaryOp;
use super::ops::{self, compare, loose_equals, strict_equals, to_float, to_int, to_text};
use super::EvalResult;
use crate::repl::backend_trait::{EvalError, FatalError, E_USER_ERROR, E_USER_NOTICE, E_USER_WARNING};
use crate::repl::handlers::{self, Severity};
use crate::repl::printer::render;
use crate::runtime::value::{Array, ArrayKey, Value};

/// Builtin function definition
pub struct Builtin {
    /// Function name, lowercase
    pub name: &'static str,
    pub min_args: usize,
    /// `None` for variadic functions
    pub max_args: Option<usize>,
    pub func: fn(&[Value]) -> EvalResult<Value>,
}

impl Builtin {
    /// Check the argument count, then call
    pub fn call(
        &self,
        args: &[Value],
    ) -> EvalResult<Value> {
        let given = args.len();
        let too_many = self.max_args.is_some_and(|max| given > max);
        if given < self.min_args || too_many {
            let (quantifier, expected) = match self.max_args {
                Some(max) if max == self.min_args => ("exactly", max),
                Some(max) if too_many => ("at most", max),
                _ => ("at least", self.min_args),
            };
            return Err(EvalError::transient(format!(
                "{}() expects {} {} argument{}, {} given",
                self.name,
                quantifier,
                expected,
                if expected == 1 { "" } else { "s" },
                given
            )));
        }
        (self.func)(args)
    }
}

/// Builtin registry
pub static BUILTINS: Lazy<BuiltinRegistry> = Lazy::new(|| {
    let mut registry = BuiltinRegistry::default();
    registry.init();
    registry
});

/// Builtin registry type
#[derive(Default)]
pub struct BuiltinRegistry {
    functions: HashMap<&'static str, Builtin>,
}

impl BuiltinRegistry {
    pub fn register(
        &mut self,
        name: &'static str,
        min_args: usize,
        max_args: Option<usize>,
        func: fn(&[Value]) -> EvalResult<Value>,
    ) {
        self.functions.insert(
            name,
            Builtin {
                name,
                min_args,
                max_args,
                func,
            },
        );
    }

    /// Look up a builtin, case-insensitively
    pub fn get(
        &self,
        name: &str,
    ) -> Option<&Builtin> {
        self.functions.get(name.to_ascii_lowercase().as_str())
    }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        self.get(name).is_some()
    }

    fn init(&mut self) {
        // strings
        self.register("strlen", 1, Some(1), builtin_strlen);
        self.register("strtoupper", 1, Some(1), builtin_strtoupper);
        self.register("strtolower", 1, Some(1), builtin_strtolower);
        self.register("str_repeat", 2, Some(2), builtin_str_repeat);
        self.register("implode", 1, Some(2), builtin_implode);
        self.register("explode", 2, Some(2), builtin_explode);

        // arrays
        self.register("count", 1, Some(1), builtin_count);
        self.register("array_keys", 1, Some(1), builtin_array_keys);
        self.register("array_values", 1, Some(1), builtin_array_values);
        self.register("array_sum", 1, Some(1), builtin_array_sum);
        self.register("array_merge", 0, None, builtin_array_merge);
        self.register("in_array", 2, Some(3), builtin_in_array);

        // math
        self.register("abs", 1, Some(1), builtin_abs);
        self.register("max", 1, None, builtin_max);
        self.register("min", 1, None, builtin_min);
        self.register("sqrt", 1, Some(1), builtin_sqrt);

        // types
        self.register("intval", 1, Some(1), builtin_intval);
        self.register("floatval", 1, Some(1), builtin_floatval);
        self.register("strval", 1, Some(1), builtin_strval);
        self.register("gettype", 1, Some(1), builtin_gettype);
        self.register("is_array", 1, Some(1), builtin_is_array);
        self.register("is_null", 1, Some(1), builtin_is_null);
        self.register("is_int", 1, Some(1), builtin_is_int);
        self.register("is_float", 1, Some(1), builtin_is_float);
        self.register("is_bool", 1, Some(1), builtin_is_bool);
        self.register("is_string", 1, Some(1), builtin_is_string);
        self.register("is_numeric", 1, Some(1), builtin_is_numeric);

        // REPL
        self.register("repl_printable", 1, Some(1), builtin_repl_printable);
        self.register("trigger_error", 1, Some(2), builtin_trigger_error);
    }
}

/// Value of a named constant
pub fn constant(name: &str) -> Option<Value> {
    Some(match name {
        "PHP_EOL" => Value::from("\n"),
        "PHP_INT_MAX" => Value::Int(i64::MAX),
        "PHP_INT_MIN" => Value::Int(i64::MIN),
        "M_PI" => Value::Float(std::f64::consts::PI),
        "NAN" => Value::Float(f64::NAN),
        "INF" => Value::Float(f64::INFINITY),
        "E_USER_ERROR" => Value::from(E_USER_ERROR),
        "E_USER_WARNING" => Value::from(E_USER_WARNING),
        "E_USER_NOTICE" => Value::from(E_USER_NOTICE),
        _ => return None,
    })
}

fn type_error(
    function: &str,
    position: usize,
    parameter: &str,
    expected: &str,
    given: &Value,
) -> EvalError {
    EvalError::transient(format!(
        "{}(): Argument #{} (${}) must be of type {}, {} given",
        function,
        position,
        parameter,
        expected,
        given.type_label()
    ))
}

fn array_arg<'a>(
    function: &str,
    args: &'a [Value],
    position: usize,
    parameter: &str,
) -> EvalResult<&'a Array> {
    let value = &args[position - 1];
    value
        .as_array()
        .ok_or_else(|| type_error(function, position, parameter, "array", value))
}

// === strings ===

fn builtin_strlen(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::from(to_text(&args[0])?.len()))
}

fn builtin_strtoupper(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Str(to_text(&args[0])?.to_uppercase()))
}

fn builtin_strtolower(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Str(to_text(&args[0])?.to_lowercase()))
}

fn builtin_str_repeat(args: &[Value]) -> EvalResult<Value> {
    let times = to_int(&args[1]);
    let times = usize::try_from(times).map_err(|_| {
        EvalError::transient("str_repeat(): Argument #2 ($times) must be greater than or equal to 0")
    })?;
    let text = to_text(&args[0])?;
    ops::reserve(text.len().checked_mul(times))?;
    Ok(Value::Str(text.repeat(times)))
}

fn builtin_implode(args: &[Value]) -> EvalResult<Value> {
    let (separator, pieces) = match args {
        [Value::Array(pieces)] => (String::new(), pieces),
        [separator, Value::Array(pieces)] => (to_text(separator)?, pieces),
        [_, other] => return Err(type_error("implode", 2, "array", "?array", other)),
        [other, ..] => return Err(type_error("implode", 1, "separator", "array", other)),
        [] => return Ok(Value::from("")),
    };
    let texts = pieces.values().map(to_text).collect::<EvalResult<Vec<_>>>()?;
    Ok(Value::Str(texts.join(&separator)))
}

fn builtin_explode(args: &[Value]) -> EvalResult<Value> {
    let separator = to_text(&args[0])?;
    if separator.is_empty() {
        return Err(EvalError::transient(
            "explode(): Argument #1 ($separator) cannot be empty",
        ));
    }
    let text = to_text(&args[1])?;
    Ok(text.split(separator.as_str()).map(Value::from).collect::<Array>().into())
}

// === arrays ===

fn builtin_count(args: &[Value]) -> EvalResult<Value> {
    match &args[0] {
        Value::Array(array) => Ok(Value::from(array.len())),
        other => Err(type_error("count", 1, "value", "Countable|array", other)),
    }
}

fn builtin_array_keys(args: &[Value]) -> EvalResult<Value> {
    let array = array_arg("array_keys", args, 1, "array")?;
    Ok(array.keys().map(ArrayKey::to_value).collect::<Array>().into())
}

fn builtin_array_values(args: &[Value]) -> EvalResult<Value> {
    let array = array_arg("array_values", args, 1, "array")?;
    Ok(array.values().cloned().collect::<Array>().into())
}

fn builtin_array_sum(args: &[Value]) -> EvalResult<Value> {
    let array = array_arg("array_sum", args, 1, "array")?;
    array.values().try_fold(Value::Int(0), |sum, value| {
        let value = match value {
            Value::Array(_) | Value::Object(_) => Value::Int(0),
            scalar => ops::to_number(scalar),
        };
        ops::binary(BinaryOp::Add, &sum, &value)
    })
}

fn builtin_array_merge(args: &[Value]) -> EvalResult<Value> {
    let mut merged = Array::new();
    for position in 1..=args.len() {
        let array = array_arg("array_merge", args, position, "arrays")?;
        for (key, value) in array.iter() {
            match key {
                ArrayKey::Int(_) => merged.push(value.clone()),
                ArrayKey::Str(_) => merged.insert(key.clone(), value.clone()),
            }
        }
    }
    Ok(merged.into())
}

fn builtin_in_array(args: &[Value]) -> EvalResult<Value> {
    let haystack = array_arg("in_array", args, 2, "haystack")?;
    let strict = args.get(2).is_some_and(Value::is_truthy);
    let needle = &args[0];
    let found = haystack.values().any(|value| {
        if strict {
            strict_equals(needle, value)
        } else {
            loose_equals(needle, value)
        }
    });
    Ok(Value::Bool(found))
}

// === math ===

fn builtin_abs(args: &[Value]) -> EvalResult<Value> {
    Ok(match ops::to_number(&args[0]) {
        Value::Int(i) => i
            .checked_abs()
            .map(Value::Int)
            .unwrap_or(Value::Float((i as f64).abs())),
        number => Value::Float(to_float(&number).abs()),
    })
}

/// Candidates for `min`/`max`: one array argument, or all arguments
fn extremum(
    function: &str,
    args: &[Value],
    wanted: Ordering,
) -> EvalResult<Value> {
    let candidates: Vec<&Value> = match args {
        [Value::Array(array)] => array.values().collect(),
        [other] => return Err(type_error(function, 1, "value", "array", other)),
        values => values.iter().collect(),
    };
    let mut best = match candidates.first() {
        Some(first) => *first,
        None => {
            return Err(EvalError::transient(format!(
                "{}(): Argument #1 ($value) must contain at least one element",
                function
            )))
        }
    };
    for candidate in &candidates[1..] {
        if compare(candidate, best) == Some(wanted) {
            best = *candidate;
        }
    }
    Ok(best.clone())
}

fn builtin_max(args: &[Value]) -> EvalResult<Value> {
    extremum("max", args, Ordering::Greater)
}

fn builtin_min(args: &[Value]) -> EvalResult<Value> {
    extremum("min", args, Ordering::Less)
}

fn builtin_sqrt(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Float(to_float(&args[0]).sqrt()))
}

// === types ===

fn builtin_intval(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Int(match &args[0] {
        Value::Str(s) => match ops::numeric_string(s) {
            Some(number) => to_int(&number),
            // Leading digits only, without the non-numeric warning
            None => s
                .trim_start()
                .char_indices()
                .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+')))
                .map(|(_, c)| c)
                .collect::<String>()
                .parse::<i64>()
                .unwrap_or(0),
        },
        other => to_int(other),
    }))
}

fn builtin_floatval(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Float(match &args[0] {
        Value::Str(s) => ops::numeric_string(s).map(|n| to_float(&n)).unwrap_or(0.0),
        other => to_float(other),
    }))
}

fn builtin_strval(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Str(to_text(&args[0])?))
}

fn builtin_gettype(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::from(args[0].kind_name()))
}

fn builtin_is_array(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(matches!(args[0], Value::Array(_))))
}

fn builtin_is_null(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(args[0].is_null()))
}

fn builtin_is_int(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(matches!(args[0], Value::Int(_))))
}

fn builtin_is_float(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(matches!(args[0], Value::Float(_))))
}

fn builtin_is_bool(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(matches!(args[0], Value::Bool(_))))
}

fn builtin_is_string(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(matches!(args[0], Value::Str(_))))
}

fn builtin_is_numeric(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(match &args[0] {
        Value::Int(_) | Value::Float(_) => true,
        Value::Str(s) => ops::numeric_string(s).is_some(),
        _ => false,
    }))
}

// === REPL ===

/// The text the prompt would show for a value
fn builtin_repl_printable(args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Str(render(&args[0])))
}

fn builtin_trigger_error(args: &[Value]) -> EvalResult<Value> {
    let message = to_text(&args[0])?;
    let level = args.get(1).map(to_int).unwrap_or(i64::from(E_USER_NOTICE));
    match u32::try_from(level) {
        Ok(E_USER_ERROR) => Err(FatalError::new(E_USER_ERROR, message).into()),
        Ok(E_USER_WARNING) => {
            handlers::report_error(Severity::Warning, &message);
            Ok(Value::Bool(true))
        }
        Ok(E_USER_NOTICE) => {
            handlers::report_error(Severity::Notice, &message);
            Ok(Value::Bool(true))
        }
        _ => Err(EvalError::transient(
            "trigger_error(): Argument #2 ($error_level) must be one of E_USER_ERROR, E_USER_WARNING or E_USER_NOTICE",
        )),
    }
}
