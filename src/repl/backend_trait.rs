//! REPL Backend Trait
//!
//! Defines the evaluation capability a session delegates to.

use thiserror::Error;

use crate::runtime::scope::Scope;
use crate::runtime::value::Value;

/// Engine-level fatal error
pub const E_ERROR: u32 = 1;
/// Engine-level warning
pub const E_WARNING: u32 = 2;
/// Engine-level notice
pub const E_NOTICE: u32 = 8;
pub const E_USER_ERROR: u32 = 256;
pub const E_USER_WARNING: u32 = 512;
pub const E_USER_NOTICE: u32 = 1024;

/// An error the session cannot recover from
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FatalError {
    /// Error level, `E_ERROR` or `E_USER_ERROR`
    pub code: u32,
    pub message: String,
}

impl FatalError {
    pub fn new(
        code: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Evaluation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The statement was abandoned; the session carries on
    #[error("{0}")]
    Transient(String),
    /// The session must end
    #[error(transparent)]
    Fatal(#[from] FatalError),
}

impl EvalError {
    pub fn transient(message: impl Into<String>) -> Self {
        EvalError::Transient(message.into())
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, EvalError::Fatal(_))
    }
}

/// Evaluator Trait
///
/// Compiles and runs source text against a scope. Implementations own any
/// state that outlives a single statement, such as declared functions.
pub trait Evaluator {
    /// Evaluate `expression` and return its value
    fn evaluate(
        &mut self,
        expression: &str,
        scope: &mut Scope,
    ) -> Result<Value, EvalError>;

    /// Run `statements` for their effect
    fn execute(
        &mut self,
        statements: &str,
        scope: &mut Scope,
    ) -> Result<(), EvalError>;
}

impl<E: Evaluator + ?Sized> Evaluator for Box<E> {
    fn evaluate(
        &mut self,
        expression: &str,
        scope: &mut Scope,
    ) -> Result<Value, EvalError> {
        (**self).evaluate(expression, scope)
    }

    fn execute(
        &mut self,
        statements: &str,
        scope: &mut Scope,
    ) -> Result<(), EvalError> {
        (**self).execute(statements, scope)
    }
}
