//! REPL errors

use std::io;

use rustyline::error::ReadlineError;
use thiserror::Error;

/// Errors that stop a session from running at all
#[derive(Debug, Error)]
pub enum ReplError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Readline error: {0}")]
    Readline(#[from] ReadlineError),
}
