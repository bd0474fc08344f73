//! Interactive breakpoint REPL
//!
//! A [`Session`] reads lines from a [`LineSource`], buffers them until the
//! brackets balance, classifies each complete statement as a value-producing
//! expression or a plain statement, and hands it to an [`Evaluator`].
//! Values are shown with [`render`] (or a custom printer) and remembered as
//! `$_ANS`.

pub mod backend_trait;
pub mod buffer;
pub mod error;
pub mod handlers;
pub mod lexical;
pub mod line;
pub mod options;
pub mod printer;
pub mod session;

pub use backend_trait::{
    EvalError, Evaluator, FatalError, E_ERROR, E_NOTICE, E_USER_ERROR, E_USER_NOTICE, E_USER_WARNING,
    E_WARNING,
};
pub use buffer::{BracketMismatch, BufferState, Feed, LineBuffer};
pub use error::ReplError;
pub use handlers::{ErrorHandler, HandlerGuard, Severity, ShutdownHandler};
pub use lexical::{ends_with_any, is_returnable_expression, starts_with_any};
pub use line::{EditorConfig, EditorSource, LineSource, StdinSource, MAX_LINE_LENGTH};
pub use options::{Printer, ReplOptions};
pub use printer::render;
pub use session::{Session, SessionExit, EXIT_TOKENS};
