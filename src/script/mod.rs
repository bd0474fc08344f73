//! Bundled script evaluator
//!
//! A small dynamically typed scripting language with PHP-flavoured syntax:
//! `$variables`, ordered arrays, functions, loops and the usual operators.
//! [`Interpreter`] implements [`Evaluator`](crate::repl::Evaluator) so a
//! session can run it directly.

pub mod ast;
pub mod builtins;
pub mod interpreter;
pub mod lexer;
pub mod ops;
pub mod parser;

pub use interpreter::{Interpreter, MAX_CALL_DEPTH};
pub use lexer::LexError;
pub use parser::{parse_expression, parse_program, ParseError};

use crate::repl::backend_trait::EvalError;

/// Result of evaluating script code
pub type EvalResult<T> = Result<T, EvalError>;

impl From<ParseError> for EvalError {
    fn from(error: ParseError) -> Self {
        EvalError::Transient(error.to_string())
    }
}
