//! repl-breakpoint
//!
//! Drop an interactive read-eval-print loop into a running program. The
//! session sees a snapshot of the caller's variables, accepts multi-line
//! input with bracket tracking, shows each expression's value, and keeps the
//! last one as `$_ANS`.
//!
//! # Example
//!
//! ```no_run
//! use repl_breakpoint::breakpoint;
//!
//! let total = 42;
//! let names = vec!["ada", "grace"];
//! breakpoint!(total, names).ok();
//! ```
//!
//! # Crate Features
//!
//! - `debug`: trace every statement the bundled interpreter runs

#![warn(rust_2018_idioms)]

// Public modules
pub mod repl;
pub mod runtime;
pub mod script;

// Utility modules
pub mod util;

// Re-exports
pub use repl::{
    EvalError, Evaluator, FatalError, LineSource, ReplError, ReplOptions, Session, SessionExit, Severity,
    StdinSource,
};
pub use runtime::{Array, ArrayKey, HostObject, Resource, Scope, ScopeSnapshot, Value};
pub use script::Interpreter;

use tracing::debug;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = "repl-breakpoint";

/// Run a session on standard input and output with the bundled interpreter
///
/// # Example
///
/// ```no_run
/// use repl_breakpoint::{run_session, ReplOptions, ScopeSnapshot, Value};
///
/// let mut variables = ScopeSnapshot::new();
/// variables.insert("answer".to_string(), Value::Int(42));
/// run_session(&variables, ReplOptions::new().function("main")).ok();
/// ```
pub fn run_session(
    variables: &ScopeSnapshot,
    options: ReplOptions,
) -> Result<SessionExit, ReplError> {
    run_session_with(Interpreter::new(), variables, options)
}

/// Run a session on standard input and output with a custom evaluator
pub fn run_session_with<E: Evaluator>(
    evaluator: E,
    variables: &ScopeSnapshot,
    options: ReplOptions,
) -> Result<SessionExit, ReplError> {
    debug!("starting session on standard input");
    let mut session = Session::with_stdout(evaluator, StdinSource::stdin(), variables, options);
    session.run()
}

/// Build a [`ScopeSnapshot`] from local variables, keyed by their names.
/// Each variable is cloned and converted with `Value::from`.
#[macro_export]
macro_rules! snapshot {
    ($($name:ident),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut snapshot = $crate::ScopeSnapshot::new();
        $(
            snapshot.insert(
                ::std::string::String::from(stringify!($name)),
                $crate::Value::from($name.clone()),
            );
        )*
        snapshot
    }};
}

/// Open a session over the named local variables, with the current file and
/// line in the banner
#[macro_export]
macro_rules! breakpoint {
    ($($name:ident),* $(,)?) => {
        $crate::run_session(
            &$crate::snapshot!($($name),*),
            $crate::ReplOptions::new().file(file!()).line(line!()),
        )
    };
}
