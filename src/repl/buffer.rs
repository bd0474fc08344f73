//! Multi-line input buffering
//!
//! Lines accumulate while brackets are unbalanced or while a line ends with a
//! continuation marker. Once depth is back to zero the buffered text and the
//! current line form one complete statement.

use std::fmt;

use tracing::{debug, trace};

use super::lexical::{continuation_marker, opposite_bracket, scan_brackets, BracketEvent};

/// Buffer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    /// Nothing buffered, depth zero
    AwaitingInput,
    /// Unbalanced brackets or a pending continuation
    Buffering,
}

/// A closing bracket that does not match the innermost open bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketMismatch {
    /// Closer required by the innermost open bracket, `None` if nothing was open
    pub expected: Option<char>,
    /// Closer actually typed
    pub found: char,
}

impl fmt::Display for BracketMismatch {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self.expected {
            Some(expected) => write!(
                f,
                "Incorrect closing paren. Expected {}, not {}",
                expected, self.found
            ),
            None => write!(f, "Incorrect closing paren. Expected nothing, not {}", self.found),
        }
    }
}

impl std::error::Error for BracketMismatch {}

/// Outcome of feeding one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feed {
    /// The line was buffered, more input is needed
    Incomplete,
    /// A complete statement, ready to evaluate
    Complete(String),
    /// Bracket mismatch; all buffered input was discarded
    Mismatch(BracketMismatch),
}

/// Line buffering state machine
///
/// The indentation level is the depth of the open-bracket stack, so the two
/// can never disagree.
#[derive(Debug, Default)]
pub struct LineBuffer {
    /// Accumulated incomplete input
    buffered_code: String,
    /// Open brackets, innermost last
    paren_stack: Vec<char>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current unmatched-open-bracket depth
    pub fn indentation_level(&self) -> usize {
        self.paren_stack.len()
    }

    pub fn buffered_code(&self) -> &str {
        &self.buffered_code
    }

    pub fn paren_stack(&self) -> &[char] {
        &self.paren_stack
    }

    pub fn state(&self) -> BufferState {
        if self.paren_stack.is_empty() && self.buffered_code.is_empty() {
            BufferState::AwaitingInput
        } else {
            BufferState::Buffering
        }
    }

    /// Drop everything buffered and return to depth zero
    pub fn reset(&mut self) {
        self.buffered_code.clear();
        self.paren_stack.clear();
    }

    /// Feed one line of input
    pub fn feed(
        &mut self,
        line: &str,
    ) -> Feed {
        for event in scan_brackets(line) {
            match event {
                BracketEvent::Open(bracket) => self.paren_stack.push(bracket),
                BracketEvent::Close(found) => {
                    let expected = self.paren_stack.pop().and_then(opposite_bracket);
                    if expected != Some(found) {
                        debug!(
                            "bracket mismatch, discarding {} buffered bytes",
                            self.buffered_code.len()
                        );
                        self.reset();
                        return Feed::Mismatch(BracketMismatch { expected, found });
                    }
                }
            }
        }

        if self.indentation_level() > 0 {
            trace!("buffering at depth {}", self.indentation_level());
            self.buffered_code.push_str(line);
            return Feed::Incomplete;
        }

        if let Some(marker) = continuation_marker(line) {
            let line = line.trim_end();
            self.buffered_code
                .push_str(&line[..line.len() - marker.len()]);
            return Feed::Incomplete;
        }

        let mut statement = std::mem::take(&mut self.buffered_code);
        statement.push_str(line);
        Feed::Complete(statement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_statement() {
        let mut buffer = LineBuffer::new();
        assert_eq!(buffer.feed("1 + 1"), Feed::Complete("1 + 1".into()));
        assert_eq!(buffer.state(), BufferState::AwaitingInput);
    }

    #[test]
    fn test_function_definition_spans_lines() {
        let mut buffer = LineBuffer::new();
        assert_eq!(buffer.feed("function sq($x) {"), Feed::Incomplete);
        assert_eq!(buffer.indentation_level(), 1);
        assert_eq!(buffer.state(), BufferState::Buffering);
        assert_eq!(buffer.feed("return $x * $x;"), Feed::Incomplete);
        assert_eq!(
            buffer.feed("}"),
            Feed::Complete("function sq($x) {return $x * $x;}".into())
        );
        assert_eq!(buffer.indentation_level(), 0);
        assert_eq!(buffer.buffered_code(), "");
    }

    #[test]
    fn test_nested_brackets_track_depth() {
        let mut buffer = LineBuffer::new();
        buffer.feed("$a = [");
        buffer.feed("'x' => (");
        assert_eq!(buffer.indentation_level(), 2);
        assert_eq!(buffer.paren_stack(), &['[', '(']);
        buffer.feed("1)");
        assert_eq!(buffer.indentation_level(), 1);
        assert_eq!(
            buffer.feed("]"),
            Feed::Complete("$a = ['x' => (1)]".into())
        );
    }

    #[test]
    fn test_continuation_marker_strips_marker() {
        let mut buffer = LineBuffer::new();
        assert_eq!(buffer.feed("$a = 1 +\\"), Feed::Incomplete);
        assert_eq!(buffer.state(), BufferState::Buffering);
        assert_eq!(buffer.indentation_level(), 0);
        assert_eq!(buffer.feed("2 /"), Feed::Incomplete);
        assert_eq!(buffer.feed("+ 3"), Feed::Complete("$a = 1 +2 + 3".into()));
    }

    #[test]
    fn test_unopened_close_is_mismatch() {
        let mut buffer = LineBuffer::new();
        let feed = buffer.feed(")");
        assert_eq!(
            feed,
            Feed::Mismatch(BracketMismatch {
                expected: None,
                found: ')'
            })
        );
        assert_eq!(buffer.indentation_level(), 0);
        assert_eq!(buffer.buffered_code(), "");
        assert_eq!(buffer.state(), BufferState::AwaitingInput);
    }

    #[test]
    fn test_mismatch_discards_buffer() {
        let mut buffer = LineBuffer::new();
        buffer.feed("foo(");
        buffer.feed("[1, 2");
        let feed = buffer.feed("}");
        assert_eq!(
            feed,
            Feed::Mismatch(BracketMismatch {
                expected: Some(']'),
                found: '}'
            })
        );
        assert_eq!(buffer.state(), BufferState::AwaitingInput);
        assert_eq!(buffer.feed("2"), Feed::Complete("2".into()));
    }

    #[test]
    fn test_mismatch_message() {
        let mismatch = BracketMismatch {
            expected: Some(']'),
            found: ')',
        };
        assert_eq!(
            mismatch.to_string(),
            "Incorrect closing paren. Expected ], not )"
        );
    }

    #[test]
    fn test_empty_line_is_empty_statement() {
        let mut buffer = LineBuffer::new();
        assert_eq!(buffer.feed(""), Feed::Complete(String::new()));
    }
}
