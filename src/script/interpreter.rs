//! Tree-walking interpreter
//!
//! [`Interpreter`] is the bundled [`Evaluator`]: it parses each piece of
//! source text it is handed and runs it directly against the session scope.
//! Declared functions persist across calls; each function call gets a fresh
//! local scope.

use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use tracing::{debug, trace};

use super::ast::{AssignOp, BinaryOp, Expr, FunctionDecl, LogicalOp, Stmt, UnaryOp};
use super::builtins::{self, BUILTINS};
use super::lexer::TemplatePart;
use super::ops::{self, to_text, warn};
use super::parser::{parse_expression, parse_program};
use super::EvalResult;
use crate::repl::backend_trait::{EvalError, Evaluator, FatalError, E_ERROR};
use crate::runtime::scope::Scope;
use crate::runtime::value::{Array, ArrayKey, Value};

/// Default limit on nested user function calls
pub const MAX_CALL_DEPTH: usize = 100;

/// How a statement finished
#[derive(Debug, Clone, PartialEq)]
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// Script interpreter writing `echo` output to `W`
pub struct Interpreter<W: Write = io::Stdout> {
    /// Declared functions, keyed by lowercase name
    functions: HashMap<String, Rc<FunctionDecl>>,
    output: W,
    depth: usize,
    max_call_depth: usize,
}

impl Interpreter<io::Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Interpreter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    pub fn with_output(output: W) -> Self {
        Self {
            functions: HashMap::new(),
            output,
            depth: 0,
            max_call_depth: MAX_CALL_DEPTH,
        }
    }

    pub fn with_max_call_depth(
        mut self,
        max_call_depth: usize,
    ) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Whether a user function with this name has been declared
    pub fn has_function(
        &self,
        name: &str,
    ) -> bool {
        self.functions.contains_key(&name.to_ascii_lowercase())
    }

    /// Names of declared functions, as written
    pub fn function_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.values().map(|f| f.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    fn declare(
        &mut self,
        decl: &Rc<FunctionDecl>,
    ) -> EvalResult<()> {
        let key = decl.name.to_ascii_lowercase();
        if let Some(existing) = self.functions.get(&key) {
            if Rc::ptr_eq(existing, decl) {
                return Ok(());
            }
        }
        if self.functions.contains_key(&key) || BUILTINS.contains(&key) {
            return Err(EvalError::transient(format!(
                "Cannot redeclare {}()",
                decl.name
            )));
        }
        debug!("declared function {}()", decl.name);
        self.functions.insert(key, Rc::clone(decl));
        Ok(())
    }

    /// Register top-level functions before anything runs
    fn hoist(
        &mut self,
        program: &[Stmt],
    ) -> EvalResult<()> {
        for stmt in program {
            if let Stmt::Function(decl) = stmt {
                self.declare(decl)?;
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Statements
    // ---------------------------------------------------------------------

    fn run_block(
        &mut self,
        statements: &[Stmt],
        scope: &mut Scope,
    ) -> EvalResult<Flow> {
        for stmt in statements {
            let flow = self.exec(stmt, scope)?;
            if flow != Flow::Normal {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    /// Run a loop body; `Some(flow)` means the loop must stop with `flow`
    fn loop_body(
        &mut self,
        body: &[Stmt],
        scope: &mut Scope,
    ) -> EvalResult<Option<Flow>> {
        Ok(match self.run_block(body, scope)? {
            Flow::Break => Some(Flow::Normal),
            Flow::Return(value) => Some(Flow::Return(value)),
            Flow::Normal | Flow::Continue => None,
        })
    }

    fn exec(
        &mut self,
        stmt: &Stmt,
        scope: &mut Scope,
    ) -> EvalResult<Flow> {
        #[cfg(feature = "debug")]
        trace!("exec {:?}", stmt);
        match stmt {
            Stmt::Expr(expr) => {
                self.eval(expr, scope)?;
            }
            Stmt::Echo(values) => {
                for value in values {
                    let text = to_text(&self.eval(value, scope)?)?;
                    self.output
                        .write_all(text.as_bytes())
                        .map_err(|e| EvalError::transient(format!("Cannot write output: {}", e)))?;
                }
            }
            Stmt::If {
                branches,
                otherwise,
            } => {
                for (condition, body) in branches {
                    if self.eval(condition, scope)?.is_truthy() {
                        return self.run_block(body, scope);
                    }
                }
                if let Some(body) = otherwise {
                    return self.run_block(body, scope);
                }
            }
            Stmt::While { condition, body } => {
                while self.eval(condition, scope)?.is_truthy() {
                    if let Some(flow) = self.loop_body(body, scope)? {
                        return Ok(flow);
                    }
                }
            }
            Stmt::DoWhile { body, condition } => loop {
                if let Some(flow) = self.loop_body(body, scope)? {
                    return Ok(flow);
                }
                if !self.eval(condition, scope)?.is_truthy() {
                    break;
                }
            },
            Stmt::For {
                init,
                condition,
                step,
                body,
            } => {
                for expr in init {
                    self.eval(expr, scope)?;
                }
                loop {
                    // Every condition runs; the last one decides
                    let mut keep_going = true;
                    for expr in condition {
                        keep_going = self.eval(expr, scope)?.is_truthy();
                    }
                    if !keep_going {
                        break;
                    }
                    if let Some(flow) = self.loop_body(body, scope)? {
                        return Ok(flow);
                    }
                    for expr in step {
                        self.eval(expr, scope)?;
                    }
                }
            }
            Stmt::Foreach {
                subject,
                key,
                value,
                body,
            } => {
                let array = match self.eval(subject, scope)? {
                    Value::Array(array) => array,
                    other => {
                        warn(&format!(
                            "foreach() argument must be of type array|object, {} given",
                            other.type_label()
                        ));
                        return Ok(Flow::Normal);
                    }
                };
                for (k, v) in array.iter() {
                    if let Some(key) = key {
                        scope.set(key.as_str(), k.to_value());
                    }
                    scope.set(value.as_str(), v.clone());
                    if let Some(flow) = self.loop_body(body, scope)? {
                        return Ok(flow);
                    }
                }
            }
            Stmt::Function(decl) => self.declare(decl)?,
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr, scope)?,
                    None => Value::Null,
                };
                return Ok(Flow::Return(value));
            }
            Stmt::Break => return Ok(Flow::Break),
            Stmt::Continue => return Ok(Flow::Continue),
            Stmt::Unset(targets) => {
                for target in targets {
                    let (root, path) = self.place(target, scope)?;
                    match path.split_last() {
                        None => {
                            scope.remove(&root);
                        }
                        Some((last, parents)) => {
                            if let Some(slot) = scope.get_mut(&root) {
                                unset_path(slot, parents, last)?;
                            }
                        }
                    }
                }
            }
            Stmt::Throw(value) => {
                let thrown = self.eval(value, scope)?;
                return Err(EvalError::transient(format!("Uncaught {}", to_text(&thrown)?)));
            }
            Stmt::Block(statements) => return self.run_block(statements, scope),
            Stmt::Empty => {}
        }
        Ok(Flow::Normal)
    }

    // ---------------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------------

    fn eval(
        &mut self,
        expr: &Expr,
        scope: &mut Scope,
    ) -> EvalResult<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Interpolated(parts) => {
                let mut text = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Literal(literal) => text.push_str(literal),
                        TemplatePart::Variable(name) => text.push_str(&to_text(&read_variable(scope, name))?),
                    }
                }
                Ok(Value::Str(text))
            }
            Expr::Variable(name) => Ok(read_variable(scope, name)),
            Expr::Constant(name) => builtins::constant(name)
                .ok_or_else(|| EvalError::transient(format!("Undefined constant \"{}\"", name))),
            Expr::Array(items) => {
                let mut array = Array::new();
                for (key, value) in items {
                    let key = match key {
                        Some(key) => Some(to_key(&self.eval(key, scope)?)?),
                        None => None,
                    };
                    let value = self.eval(value, scope)?;
                    match key {
                        Some(key) => array.insert(key, value),
                        None => array.push(value),
                    }
                }
                Ok(Value::Array(array))
            }
            Expr::Index { target, index } => {
                let Some(index) = index else {
                    return Err(EvalError::transient("Cannot use [] for reading"));
                };
                let base = self.eval(target, scope)?;
                let key = to_key(&self.eval(index, scope)?)?;
                read_index(&base, &key, false)
            }
            Expr::Assign { target, op, value } => self.eval_assign(target, *op, value, scope),
            Expr::Binary { op, left, right } => {
                let left = self.eval(left, scope)?;
                let right = self.eval(right, scope)?;
                ops::binary(*op, &left, &right)
            }
            Expr::Logical { op, left, right } => match op {
                LogicalOp::And => Ok(Value::Bool(
                    self.eval(left, scope)?.is_truthy() && self.eval(right, scope)?.is_truthy(),
                )),
                LogicalOp::Or => Ok(Value::Bool(
                    self.eval(left, scope)?.is_truthy() || self.eval(right, scope)?.is_truthy(),
                )),
                LogicalOp::Coalesce => {
                    let left = self.quiet_read(left, scope)?;
                    if left.is_null() {
                        self.eval(right, scope)
                    } else {
                        Ok(left)
                    }
                }
            },
            Expr::Unary { op, operand } => {
                let value = self.eval(operand, scope)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                    UnaryOp::Neg => ops::binary(BinaryOp::Mul, &value, &Value::Int(-1)),
                    UnaryOp::Plus => ops::binary(BinaryOp::Mul, &value, &Value::Int(1)),
                }
            }
            Expr::IncDec {
                target,
                increment,
                prefix,
            } => {
                let old = self.eval(target, scope)?;
                let new = ops::step(&old, *increment)?;
                self.assign(target, new.clone(), scope)?;
                Ok(if *prefix { new } else { old })
            }
            Expr::Ternary {
                condition,
                then,
                otherwise,
            } => {
                let condition = self.eval(condition, scope)?;
                if !condition.is_truthy() {
                    return self.eval(otherwise, scope);
                }
                match then {
                    Some(then) => self.eval(then, scope),
                    None => Ok(condition),
                }
            }
            Expr::Call { name, args } => self.eval_call(name, args, scope),
        }
    }

    fn eval_assign(
        &mut self,
        target: &Expr,
        op: AssignOp,
        value: &Expr,
        scope: &mut Scope,
    ) -> EvalResult<Value> {
        let value = match op {
            AssignOp::Plain => self.eval(value, scope)?,
            AssignOp::Compound(op) => {
                let current = self.eval(target, scope)?;
                let operand = self.eval(value, scope)?;
                ops::binary(op, &current, &operand)?
            }
            AssignOp::Coalesce => {
                let current = self.quiet_read(target, scope)?;
                if !current.is_null() {
                    return Ok(current);
                }
                self.eval(value, scope)?
            }
        };
        self.assign(target, value.clone(), scope)?;
        Ok(value)
    }

    /// Read without undefined variable or key warnings, as `??` does
    fn quiet_read(
        &mut self,
        expr: &Expr,
        scope: &mut Scope,
    ) -> EvalResult<Value> {
        match expr {
            Expr::Variable(name) => Ok(scope.get(name).cloned().unwrap_or_default()),
            Expr::Index {
                target,
                index: Some(index),
            } => {
                let base = self.quiet_read(target, scope)?;
                let key = to_key(&self.eval(index, scope)?)?;
                read_index(&base, &key, true)
            }
            other => self.eval(other, scope),
        }
    }

    fn eval_call(
        &mut self,
        name: &str,
        args: &[Expr],
        scope: &mut Scope,
    ) -> EvalResult<Value> {
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "get_defined_vars" => return Ok(Value::Array(scope.to_array())),
            "isset" => {
                for arg in args {
                    if self.quiet_read(arg, scope)?.is_null() {
                        return Ok(Value::Bool(false));
                    }
                }
                return Ok(Value::Bool(!args.is_empty()));
            }
            "empty" => {
                let [arg] = args else {
                    return Err(EvalError::transient("empty() expects exactly 1 argument"));
                };
                return Ok(Value::Bool(!self.quiet_read(arg, scope)?.is_truthy()));
            }
            _ => {}
        }

        let values = args
            .iter()
            .map(|arg| self.eval(arg, scope))
            .collect::<EvalResult<Vec<_>>>()?;

        if let Some(decl) = self.functions.get(&lower).cloned() {
            return self.call_user(&decl, values);
        }
        match BUILTINS.get(&lower) {
            Some(builtin) => {
                trace!("calling builtin {}()", builtin.name);
                builtin.call(&values)
            }
            None => Err(EvalError::transient(format!(
                "Call to undefined function {}()",
                name
            ))),
        }
    }

    fn call_user(
        &mut self,
        decl: &FunctionDecl,
        args: Vec<Value>,
    ) -> EvalResult<Value> {
        if self.depth >= self.max_call_depth {
            return Err(FatalError::new(
                E_ERROR,
                format!(
                    "Maximum function nesting level of '{}' reached, aborting!",
                    self.max_call_depth
                ),
            )
            .into());
        }
        trace!("calling {}() with {} arguments", decl.name, args.len());

        let mut local = Scope::new();
        let mut args = args.into_iter();
        for (passed, param) in decl.params.iter().enumerate() {
            let value = match (args.next(), &param.default) {
                (Some(value), _) => value,
                (None, Some(default)) => self.eval(default, &mut local)?,
                (None, None) => {
                    let required = decl.params.iter().filter(|p| p.default.is_none()).count();
                    return Err(EvalError::transient(format!(
                        "Too few arguments to function {}(), {} passed and {} {} expected",
                        decl.name,
                        passed,
                        if required == decl.params.len() {
                            "exactly"
                        } else {
                            "at least"
                        },
                        required
                    )));
                }
            };
            local.set(param.name.as_str(), value);
        }

        self.depth += 1;
        let result = self.run_block(&decl.body, &mut local);
        self.depth -= 1;

        match result? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Null),
            Flow::Break | Flow::Continue => Err(outside_loop()),
        }
    }

    // ---------------------------------------------------------------------
    // Places
    // ---------------------------------------------------------------------

    /// Root variable and evaluated key path of an assignable expression
    fn place(
        &mut self,
        expr: &Expr,
        scope: &mut Scope,
    ) -> EvalResult<(String, Vec<Option<ArrayKey>>)> {
        match expr {
            Expr::Variable(name) => Ok((name.clone(), Vec::new())),
            Expr::Index { target, index } => {
                let (root, mut path) = self.place(target, scope)?;
                let key = match index {
                    Some(index) => Some(to_key(&self.eval(index, scope)?)?),
                    None => None,
                };
                path.push(key);
                Ok((root, path))
            }
            _ => Err(EvalError::transient("Cannot assign to this expression")),
        }
    }

    fn assign(
        &mut self,
        target: &Expr,
        value: Value,
        scope: &mut Scope,
    ) -> EvalResult<()> {
        let (root, path) = self.place(target, scope)?;
        assign_path(scope.slot(&root), &path, value)
    }
}

impl<W: Write> Evaluator for Interpreter<W> {
    fn evaluate(
        &mut self,
        expression: &str,
        scope: &mut Scope,
    ) -> Result<Value, EvalError> {
        let expr = parse_expression(expression)?;
        let value = self.eval(&expr, scope);
        self.output
            .flush()
            .map_err(|e| EvalError::transient(format!("Cannot write output: {}", e)))?;
        value
    }

    fn execute(
        &mut self,
        statements: &str,
        scope: &mut Scope,
    ) -> Result<(), EvalError> {
        let program = parse_program(statements)?;
        self.hoist(&program)?;
        let flow = self.run_block(&program, scope);
        self.output
            .flush()
            .map_err(|e| EvalError::transient(format!("Cannot write output: {}", e)))?;
        match flow? {
            Flow::Normal | Flow::Return(_) => Ok(()),
            Flow::Break | Flow::Continue => Err(outside_loop()),
        }
    }
}

fn outside_loop() -> EvalError {
    EvalError::transient("'break' or 'continue' not in the 'loop' context")
}

fn read_variable(
    scope: &Scope,
    name: &str,
) -> Value {
    match scope.get(name) {
        Some(value) => value.clone(),
        None => {
            warn(&format!("Undefined variable ${}", name));
            Value::Null
        }
    }
}

/// Array key for a value
fn to_key(value: &Value) -> EvalResult<ArrayKey> {
    Ok(match value {
        Value::Int(i) => ArrayKey::Int(*i),
        Value::Str(s) => ArrayKey::from_text(s),
        Value::Bool(b) => ArrayKey::Int(i64::from(*b)),
        Value::Float(_) => ArrayKey::Int(ops::to_int(value)),
        Value::Null => ArrayKey::Str(String::new()),
        Value::Resource(resource) => ArrayKey::Int(i64::from(resource.id)),
        Value::Array(_) | Value::Object(_) => {
            return Err(EvalError::transient(format!(
                "Cannot access offset of type {} on array",
                value.type_label()
            )))
        }
    })
}

fn describe_key(key: &ArrayKey) -> String {
    match key {
        ArrayKey::Int(i) => i.to_string(),
        ArrayKey::Str(s) => format!("\"{}\"", s),
    }
}

fn read_index(
    base: &Value,
    key: &ArrayKey,
    quiet: bool,
) -> EvalResult<Value> {
    match base {
        Value::Array(array) => match array.get(key) {
            Some(value) => Ok(value.clone()),
            None => {
                if !quiet {
                    warn(&format!("Undefined array key {}", describe_key(key)));
                }
                Ok(Value::Null)
            }
        },
        Value::Str(text) => {
            let offset = match key {
                ArrayKey::Int(i) if *i < 0 => i64::try_from(text.len()).unwrap_or(i64::MAX) + i,
                ArrayKey::Int(i) => *i,
                ArrayKey::Str(_) => {
                    return Err(EvalError::transient(format!(
                        "Cannot access offset of type string on string: {}",
                        describe_key(key)
                    )))
                }
            };
            let byte = usize::try_from(offset).ok().and_then(|i| text.as_bytes().get(i));
            match byte {
                Some(byte) => Ok(Value::Str(String::from_utf8_lossy(&[*byte]).into_owned())),
                None => {
                    if !quiet {
                        warn(&format!("Uninitialized string offset {}", offset));
                    }
                    Ok(if quiet { Value::Null } else { Value::from("") })
                }
            }
        }
        Value::Object(object) => Err(EvalError::transient(format!(
            "Cannot use object of type {} as array",
            object.type_name()
        ))),
        _ => {
            if !quiet {
                warn(&format!(
                    "Trying to access array offset on value of type {}",
                    base.type_label()
                ));
            }
            Ok(Value::Null)
        }
    }
}

/// Write `value` at `path` below `slot`, creating arrays on the way
fn assign_path(
    slot: &mut Value,
    path: &[Option<ArrayKey>],
    value: Value,
) -> EvalResult<()> {
    let Some((key, rest)) = path.split_first() else {
        *slot = value;
        return Ok(());
    };
    if slot.is_null() {
        *slot = Value::Array(Array::new());
    }
    match slot {
        Value::Array(array) => {
            let child = match key {
                Some(key) => array.entry(key.clone()),
                None => array.push_slot(),
            };
            assign_path(child, rest, value)
        }
        Value::Str(text) => assign_string_offset(text, key.as_ref(), rest, &value),
        Value::Object(object) => Err(EvalError::transient(format!(
            "Cannot use object of type {} as array",
            object.type_name()
        ))),
        _ => Err(EvalError::transient("Cannot use a scalar value as an array")),
    }
}

/// `$s[3] = 'x'`: replace one byte, padding with spaces
fn assign_string_offset(
    text: &mut String,
    key: Option<&ArrayKey>,
    rest: &[Option<ArrayKey>],
    value: &Value,
) -> EvalResult<()> {
    let offset = match (key, rest.is_empty()) {
        (None, _) => return Err(EvalError::transient("[] operator not supported for strings")),
        (Some(ArrayKey::Int(i)), true) => usize::try_from(*i)
            .map_err(|_| EvalError::transient(format!("Illegal string offset {}", i)))?,
        (Some(_), true) => return Err(EvalError::transient("Illegal string offset")),
        (Some(_), false) => return Err(EvalError::transient("Cannot use string offset as an array")),
    };
    let replacement = to_text(value)?;
    let Some(byte) = replacement.bytes().next() else {
        return Err(EvalError::transient(
            "Cannot assign an empty string to a string offset",
        ));
    };
    if text.len() <= offset {
        ops::reserve(offset.checked_add(1))?;
    }
    let mut bytes = std::mem::take(text).into_bytes();
    if bytes.len() <= offset {
        bytes.resize(offset + 1, b' ');
    }
    bytes[offset] = byte;
    *text = String::from_utf8_lossy(&bytes).into_owned();
    Ok(())
}

fn unset_path(
    slot: &mut Value,
    parents: &[Option<ArrayKey>],
    last: &Option<ArrayKey>,
) -> EvalResult<()> {
    let Value::Array(array) = slot else {
        return Ok(());
    };
    match parents.split_first() {
        None => match last {
            Some(key) => {
                array.remove(key);
                Ok(())
            }
            None => Err(EvalError::transient("Cannot use [] for unsetting")),
        },
        Some((Some(key), rest)) => match array.get_mut(key) {
            Some(child) => unset_path(child, rest, last),
            None => Ok(()),
        },
        Some((None, _)) => Err(EvalError::transient("Cannot use [] for unsetting")),
    }
}
