//! Evaluation scopes
//!
//! A [`Scope`] is the variable table a session evaluates against. It is built
//! by copying a caller's [`ScopeSnapshot`], so nothing the session does can
//! reach back into the caller's bindings.

use indexmap::IndexMap;
use tracing::trace;

use crate::runtime::value::{Array, Value};

/// Names never injected from a caller's snapshot
pub const RESERVED_NAMES: &[&str] = &[
    "GLOBALS", "_GET", "_POST", "_COOKIE", "_SERVER", "_ENV", "_REQUEST", "_FILES", "_SESSION",
    "vars",
];

/// Variable holding the most recently displayed result
pub const LAST_ANSWER: &str = "_ANS";

/// Caller-side variable bindings, name -> value
pub type ScopeSnapshot = IndexMap<String, Value>;

/// Whether `name` is excluded from injection
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// Variable table
#[derive(Debug, Clone, Default)]
pub struct Scope {
    variables: IndexMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy every non-reserved binding of `snapshot` into a fresh scope
    pub fn inject(snapshot: &ScopeSnapshot) -> Self {
        let mut scope = Scope::new();
        for (name, value) in snapshot {
            if is_reserved(name) {
                trace!("skipping reserved variable ${}", name);
                continue;
            }
            scope.set(name.clone(), value.clone());
        }
        scope
    }

    pub fn get(
        &self,
        name: &str,
    ) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        self.variables.contains_key(name)
    }

    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: Value,
    ) {
        self.variables.insert(name.into(), value);
    }

    /// Mutable slot for `name`, created as `null` when missing
    pub fn slot(
        &mut self,
        name: &str,
    ) -> &mut Value {
        self.variables.entry(name.to_string()).or_insert(Value::Null)
    }

    pub fn get_mut(
        &mut self,
        name: &str,
    ) -> Option<&mut Value> {
        self.variables.get_mut(name)
    }

    pub fn remove(
        &mut self,
        name: &str,
    ) -> Option<Value> {
        self.variables.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.variables.iter()
    }

    /// The last displayed result, `null` before the first one
    pub fn last_answer(&self) -> Value {
        self.get(LAST_ANSWER).cloned().unwrap_or_default()
    }

    pub fn set_last_answer(
        &mut self,
        value: Value,
    ) {
        self.set(LAST_ANSWER, value);
    }

    /// All variables as an array keyed by name
    pub fn to_array(&self) -> Array {
        let mut array = Array::new();
        for (name, value) in &self.variables {
            array.insert(name.as_str(), value.clone());
        }
        array
    }
}
