//! Session options
//!
//! Options are resolved once when a session starts and stay fixed for its
//! whole run.

use std::fmt;

use super::handlers::{ErrorHandler, Severity, ShutdownHandler};
use super::backend_trait::FatalError;
use crate::runtime::value::Value;
use crate::util::config::ReplConfig;

/// Custom result display, called once per displayed result
pub type Printer = Box<dyn FnMut(&Value)>;

/// Per-session options
pub struct ReplOptions {
    /// Replaces the default transient-error reporting
    pub error_handler: Option<ErrorHandler>,
    /// Replaces the default fatal-error reporting
    pub shutdown_handler: Option<ShutdownHandler>,
    /// Suppress the intro banner
    pub quiet: bool,
    /// Banner context
    pub function: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    /// Replaces the value renderer
    pub printer: Option<Printer>,
    /// Top-level prompt
    pub prompt: String,
    /// Continuation prompt, repeated once per open bracket
    pub indent: String,
}

impl Default for ReplOptions {
    fn default() -> Self {
        Self {
            error_handler: None,
            shutdown_handler: None,
            quiet: false,
            function: None,
            file: None,
            line: None,
            printer: None,
            prompt: "> ".to_string(),
            indent: "    ".to_string(),
        }
    }
}

impl fmt::Debug for ReplOptions {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("ReplOptions")
            .field("error_handler", &self.error_handler.is_some())
            .field("shutdown_handler", &self.shutdown_handler.is_some())
            .field("quiet", &self.quiet)
            .field("function", &self.function)
            .field("file", &self.file)
            .field("line", &self.line)
            .field("printer", &self.printer.is_some())
            .field("prompt", &self.prompt)
            .field("indent", &self.indent)
            .finish()
    }
}

impl ReplOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options seeded from the user configuration
    pub fn from_config(config: &ReplConfig) -> Self {
        Self {
            quiet: config.quiet,
            prompt: config.prompt.clone(),
            indent: " ".repeat(config.indent_width),
            ..Self::default()
        }
    }

    pub fn error_handler(
        mut self,
        handler: impl FnMut(Severity, &str) + 'static,
    ) -> Self {
        self.error_handler = Some(Box::new(handler));
        self
    }

    pub fn shutdown_handler(
        mut self,
        handler: impl FnMut(&FatalError) + 'static,
    ) -> Self {
        self.shutdown_handler = Some(Box::new(handler));
        self
    }

    pub fn quiet(
        mut self,
        quiet: bool,
    ) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn function(
        mut self,
        function: impl Into<String>,
    ) -> Self {
        self.function = Some(function.into());
        self
    }

    pub fn file(
        mut self,
        file: impl Into<String>,
    ) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn line(
        mut self,
        line: u32,
    ) -> Self {
        self.line = Some(line);
        self
    }

    pub fn printer(
        mut self,
        printer: impl FnMut(&Value) + 'static,
    ) -> Self {
        self.printer = Some(Box::new(printer));
        self
    }

    pub fn prompt(
        mut self,
        prompt: impl Into<String>,
    ) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Intro banner, `None` when quiet
    pub fn banner(&self) -> Option<String> {
        if self.quiet {
            return None;
        }
        let mut intro = String::from("REPL launched");
        if let Some(function) = self.function.as_deref().filter(|f| !f.is_empty()) {
            intro.push_str(&format!(" in function {}", function));
        }
        if let Some(file) = &self.file {
            intro.push_str(&format!(" in file {}", file));
        }
        if let Some(line) = self.line {
            intro.push_str(&format!(" on line {}", line));
        }
        intro.push_str("\nTo exit, write \"return\" or \"break\", or press Ctrl+C.");
        Some(intro)
    }
}
