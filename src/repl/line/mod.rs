//! Line sources
//!
//! A session pulls one line at a time from a [`LineSource`]. Two sources are
//! provided: [`StdinSource`] reads any `BufRead` (standard input by default),
//! and [`EditorSource`] uses rustyline for editing and history.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use rustyline::config::Config;
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::{Editor, EditMode};
use tracing::debug;

use super::error::ReplError;

/// Longest line accepted; longer input is truncated
pub const MAX_LINE_LENGTH: usize = 1023;

/// Source of input lines
pub trait LineSource {
    /// Show `prompt` and read the next line, without its line terminator.
    /// `None` means the input is exhausted.
    fn read_line(
        &mut self,
        prompt: &str,
        output: &mut dyn Write,
    ) -> Result<Option<String>, ReplError>;
}

impl<L: LineSource + ?Sized> LineSource for Box<L> {
    fn read_line(
        &mut self,
        prompt: &str,
        output: &mut dyn Write,
    ) -> Result<Option<String>, ReplError> {
        (**self).read_line(prompt, output)
    }
}

/// Cut `line` to at most `max` bytes on a character boundary
fn truncate_line(
    line: &mut String,
    max: usize,
) {
    if line.len() <= max {
        return;
    }
    let mut end = max;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    line.truncate(end);
}

/// Plain blocking reader
#[derive(Debug)]
pub struct StdinSource<R: BufRead> {
    reader: R,
    max_line_length: usize,
}

impl StdinSource<io::StdinLock<'static>> {
    /// Read from the process's standard input
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock())
    }
}

impl<R: BufRead> StdinSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            max_line_length: MAX_LINE_LENGTH,
        }
    }

    pub fn with_max_line_length(
        mut self,
        max_line_length: usize,
    ) -> Self {
        self.max_line_length = max_line_length;
        self
    }
}

impl<R: BufRead> LineSource for StdinSource<R> {
    fn read_line(
        &mut self,
        prompt: &str,
        output: &mut dyn Write,
    ) -> Result<Option<String>, ReplError> {
        write!(output, "{}", prompt)?;
        output.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let content_length = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(content_length);
        truncate_line(&mut line, self.max_line_length);
        Ok(Some(line))
    }
}

/// Editor configuration
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// History file path
    pub history_file: Option<PathBuf>,
    /// Maximum history size
    pub history_size: usize,
    /// Enable VI mode
    pub vi_mode: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_file: None,
            history_size: 1000,
            vi_mode: false,
        }
    }
}

/// rustyline-backed source with line editing and history
pub struct EditorSource {
    editor: Editor<(), FileHistory>,
    history_file: Option<PathBuf>,
    max_line_length: usize,
}

impl EditorSource {
    pub fn new() -> Result<Self, ReplError> {
        Self::with_config(EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> Result<Self, ReplError> {
        let rl_config = Config::builder()
            .history_ignore_space(true)
            .auto_add_history(true)
            .max_history_size(config.history_size)?
            .edit_mode(if config.vi_mode {
                EditMode::Vi
            } else {
                EditMode::Emacs
            })
            .build();

        let mut editor = Editor::with_config(rl_config)?;

        // Load history if file exists
        if let Some(ref history_file) = config.history_file {
            if history_file.exists() {
                if let Err(e) = editor.load_history(history_file) {
                    debug!("could not load history from {}: {}", history_file.display(), e);
                }
            }
        }

        Ok(Self {
            editor,
            history_file: config.history_file,
            max_line_length: MAX_LINE_LENGTH,
        })
    }

    pub fn with_max_line_length(
        mut self,
        max_line_length: usize,
    ) -> Self {
        self.max_line_length = max_line_length;
        self
    }
}

impl LineSource for EditorSource {
    fn read_line(
        &mut self,
        prompt: &str,
        output: &mut dyn Write,
    ) -> Result<Option<String>, ReplError> {
        // rustyline draws the prompt itself; leading newlines go out first
        let trimmed = prompt.trim_start_matches('\n');
        for _ in 0..prompt.len() - trimmed.len() {
            writeln!(output)?;
        }
        output.flush()?;

        match self.editor.readline(trimmed) {
            Ok(mut line) => {
                truncate_line(&mut line, self.max_line_length);
                Ok(Some(line))
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for EditorSource {
    fn drop(&mut self) {
        if let Some(ref history_file) = self.history_file {
            let _ = self.editor.save_history(history_file);
        }
    }
}
