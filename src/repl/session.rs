//! REPL session
//!
//! One session is one run of the read/evaluate loop, from launch to an exit
//! token, end of input, or a fatal evaluation error.

use std::io::{self, Write};

use tracing::{debug, info, trace, warn};

use super::backend_trait::{EvalError, Evaluator, FatalError};
use super::buffer::{Feed, LineBuffer};
use super::error::ReplError;
use super::handlers::{self, Severity};
use super::lexical::{ends_with_any, is_returnable_expression};
use super::line::LineSource;
use super::options::ReplOptions;
use super::printer::render;
use crate::runtime::scope::{Scope, ScopeSnapshot, LAST_ANSWER};

/// Lines that end the session when typed on their own
pub const EXIT_TOKENS: [&str; 4] = ["break", "break;", "return", "return;"];

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionExit {
    /// An exit token was entered
    ExitToken,
    /// The input stream closed; anything still buffered was discarded
    EndOfInput,
    /// A fatal error was reported to the shutdown handler
    Fatal(FatalError),
}

/// REPL session
pub struct Session<E: Evaluator, I: LineSource, W: Write> {
    evaluator: E,
    input: I,
    output: W,
    buffer: LineBuffer,
    /// Injected variables plus everything defined during the session
    scope: Scope,
    options: ReplOptions,
}

impl<E: Evaluator, I: LineSource, W: Write> Session<E, I, W> {
    /// Create a session over a copy of `variables`
    pub fn new(
        evaluator: E,
        input: I,
        output: W,
        variables: &ScopeSnapshot,
        options: ReplOptions,
    ) -> Self {
        let mut scope = Scope::inject(variables);
        scope.set(LAST_ANSWER, Default::default());
        Self {
            evaluator,
            input,
            output,
            buffer: LineBuffer::new(),
            scope,
            options,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn buffer(&self) -> &LineBuffer {
        &self.buffer
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    /// Run the loop until the session ends
    pub fn run(&mut self) -> Result<SessionExit, ReplError> {
        let error_handler = self
            .options
            .error_handler
            .take()
            .unwrap_or_else(handlers::default_error_handler);
        let shutdown_handler = self
            .options
            .shutdown_handler
            .take()
            .unwrap_or_else(handlers::default_shutdown_handler);
        let _handlers = handlers::install(error_handler, shutdown_handler);

        info!("REPL session started with {} variables", self.scope.len());
        if let Some(banner) = self.options.banner() {
            write!(self.output, "{}", banner)?;
        }

        let exit = self.run_loop()?;
        self.output.flush()?;
        info!("REPL session ended: {:?}", exit);
        Ok(exit)
    }

    fn run_loop(&mut self) -> Result<SessionExit, ReplError> {
        loop {
            let prompt = self.prompt();
            let line = match self.input.read_line(&prompt, &mut self.output)? {
                Some(line) => line,
                None => {
                    if !self.buffer.buffered_code().is_empty() {
                        debug!("input closed with unevaluated code, discarding it");
                    }
                    return Ok(SessionExit::EndOfInput);
                }
            };
            let code = line.trim();

            if EXIT_TOKENS.contains(&code) {
                return Ok(SessionExit::ExitToken);
            }

            match self.buffer.feed(code) {
                Feed::Incomplete => {}
                Feed::Mismatch(mismatch) => {
                    warn!("{}", mismatch);
                    write!(self.output, "{}", mismatch)?;
                }
                Feed::Complete(statement) => {
                    if let Some(fatal) = self.dispatch(&statement)? {
                        return Ok(SessionExit::Fatal(fatal));
                    }
                }
            }
        }
    }

    /// `> ` at top level, one indent per open bracket while nested
    fn prompt(&self) -> String {
        let level = self.buffer.indentation_level();
        if level > 0 {
            self.options.indent.repeat(level)
        } else {
            format!("\n{}", self.options.prompt)
        }
    }

    /// Evaluate one complete statement. Returns the fatal error that ends the
    /// session, if any.
    fn dispatch(
        &mut self,
        statement: &str,
    ) -> Result<Option<FatalError>, ReplError> {
        if statement.trim().is_empty() {
            return Ok(None);
        }
        // Evaluated code may print on its own
        self.output.flush()?;

        if !is_returnable_expression(statement) {
            trace!("executing: {}", statement);
            let code = if ends_with_any(statement, &[";"]).is_some() {
                statement.to_string()
            } else {
                format!("{};", statement)
            };
            return match self.evaluator.execute(&code, &mut self.scope) {
                Ok(()) => Ok(None),
                Err(e) => Ok(self.report(e)),
            };
        }

        trace!("evaluating: {}", statement);
        match self.evaluator.evaluate(statement, &mut self.scope) {
            Ok(value) => {
                self.scope.set_last_answer(value.clone());
                match self.options.printer.as_mut() {
                    Some(printer) => printer(&value),
                    None => write!(self.output, "{}", render(&value))?,
                }
                Ok(None)
            }
            Err(e) => Ok(self.report(e)),
        }
    }

    fn report(
        &mut self,
        error: EvalError,
    ) -> Option<FatalError> {
        match error {
            EvalError::Transient(message) => {
                debug!("evaluation failed: {}", message);
                handlers::report_error(Severity::Error, &message);
                None
            }
            EvalError::Fatal(fatal) => {
                warn!("fatal evaluation error: {}", fatal);
                handlers::report_fatal(&fatal);
                Some(fatal)
            }
        }
    }
}

impl<E: Evaluator, I: LineSource> Session<E, I, io::Stdout> {
    /// Session writing to standard output
    pub fn with_stdout(
        evaluator: E,
        input: I,
        variables: &ScopeSnapshot,
        options: ReplOptions,
    ) -> Self {
        Self::new(evaluator, input, io::stdout(), variables, options)
    }
}
