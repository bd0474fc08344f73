//! Lexical classification of REPL input
//!
//! Everything here works on raw text. Brackets inside string literals and
//! comments are counted like any other bracket; the buffering heuristic
//! relies on exactly this behaviour.

use once_cell::sync::Lazy;

/// Brackets that open a nesting level
pub const OPENING_BRACKETS: [char; 3] = ['{', '(', '['];

/// Brackets that close a nesting level
pub const CLOSING_BRACKETS: [char; 3] = ['}', ')', ']'];

/// Trailing markers that request another line
pub const CONTINUATION_MARKERS: [&str; 2] = ["/", "\\"];

/// Statement-leading keywords whose statement has no value to show
pub const NON_RETURNABLE_KEYWORDS: [&str; 24] = [
    "declare",
    "do",
    "echo",
    "elseif",
    "for",
    "foreach",
    "global",
    "goto",
    "if",
    "include",
    "include_once",
    "list",
    "namespace",
    "print",
    "require",
    "require_once",
    "return",
    "switch",
    "throw",
    "try",
    "unset",
    "use",
    "while",
    "yield",
];

/// Characters that end a keyword
const KEYWORD_BOUNDARIES: [char; 6] = ['(', ' ', '\t', '\n', '{', ';'];

/// Every keyword followed by every boundary, e.g. `if(`, `if `, ...
static NON_STARTERS: Lazy<Vec<String>> = Lazy::new(|| {
    NON_RETURNABLE_KEYWORDS
        .iter()
        .flat_map(|keyword| {
            KEYWORD_BOUNDARIES
                .iter()
                .map(move |boundary| format!("{}{}", keyword, boundary))
        })
        .collect()
});

/// A bracket seen while scanning a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketEvent {
    Open(char),
    Close(char),
}

/// Bracket events of `line`, left to right
pub fn scan_brackets(line: &str) -> impl Iterator<Item = BracketEvent> + '_ {
    line.chars().filter_map(|c| {
        if OPENING_BRACKETS.contains(&c) {
            Some(BracketEvent::Open(c))
        } else if CLOSING_BRACKETS.contains(&c) {
            Some(BracketEvent::Close(c))
        } else {
            None
        }
    })
}

/// The partner of a bracket: `(` <-> `)`, `[` <-> `]`, `{` <-> `}`
pub fn opposite_bracket(bracket: char) -> Option<char> {
    match bracket {
        '{' => Some('}'),
        '}' => Some('{'),
        '(' => Some(')'),
        ')' => Some('('),
        '[' => Some(']'),
        ']' => Some('['),
        _ => None,
    }
}

/// First pattern that `text` (leading whitespace ignored) starts with.
/// Empty patterns never match.
pub fn starts_with_any<'p, P: AsRef<str>>(
    text: &str,
    patterns: &'p [P],
) -> Option<&'p str> {
    let text = text.trim_start();
    patterns
        .iter()
        .map(|pattern| pattern.as_ref())
        .find(|pattern| !pattern.is_empty() && text.starts_with(pattern))
}

/// First pattern that `text` (surrounding whitespace ignored) ends with.
/// Empty patterns never match.
pub fn ends_with_any<'p, P: AsRef<str>>(
    text: &str,
    patterns: &'p [P],
) -> Option<&'p str> {
    let text = text.trim();
    patterns
        .iter()
        .map(|pattern| pattern.as_ref())
        .find(|pattern| !pattern.is_empty() && text.ends_with(pattern))
}

/// The continuation marker ending `line`, if any
pub fn continuation_marker(line: &str) -> Option<&'static str> {
    ends_with_any(line, &CONTINUATION_MARKERS)
}

/// Whether a complete statement should be evaluated as an expression and its
/// value displayed, rather than executed for its effect.
pub fn is_returnable_expression(statement: &str) -> bool {
    if starts_with_any(statement, NON_STARTERS.as_slice()).is_some() {
        return false;
    }
    ends_with_any(statement, &[";", "}"]).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_brackets() {
        let events: Vec<_> = scan_brackets("f(a[0]) {").collect();
        assert_eq!(
            events,
            vec![
                BracketEvent::Open('('),
                BracketEvent::Open('['),
                BracketEvent::Close(']'),
                BracketEvent::Close(')'),
                BracketEvent::Open('{'),
            ]
        );
    }

    #[test]
    fn test_scan_brackets_ignores_string_context() {
        let events: Vec<_> = scan_brackets("echo \"(\";").collect();
        assert_eq!(events, vec![BracketEvent::Open('(')]);
    }

    #[test]
    fn test_opposite_bracket() {
        assert_eq!(opposite_bracket('('), Some(')'));
        assert_eq!(opposite_bracket(']'), Some('['));
        assert_eq!(opposite_bracket('x'), None);
    }

    #[test]
    fn test_returnable_expressions() {
        assert!(is_returnable_expression("1 + 1"));
        assert!(is_returnable_expression("$x"));
        assert!(is_returnable_expression("sq(3)"));
        assert!(is_returnable_expression("$x = 5"));
        assert!(is_returnable_expression("iffy($x)"));
        assert!(is_returnable_expression("printf('x')"));
        assert!(is_returnable_expression("double(2)"));
    }

    #[test]
    fn test_statements_are_not_returnable() {
        assert!(!is_returnable_expression("if ($x) { foo(); }"));
        assert!(!is_returnable_expression("$x = 5;"));
        assert!(!is_returnable_expression("echo $x"));
        assert!(!is_returnable_expression("  foreach($a as $b) {}"));
        assert!(!is_returnable_expression("return;"));
        assert!(!is_returnable_expression("unset($x)"));
        assert!(!is_returnable_expression("while\t(true)"));
        assert!(!is_returnable_expression("function sq($x) {return $x * $x;}"));
    }

    #[test]
    fn test_starts_with_any_returns_first_match() {
        assert_eq!(starts_with_any("  abc", &["x", "ab", "a"]), Some("ab"));
        assert_eq!(starts_with_any("abc", &["", "z"]), None);
    }

    #[test]
    fn test_ends_with_any_trims() {
        assert_eq!(ends_with_any("foo; \n", &[";", "}"]), Some(";"));
        assert_eq!(ends_with_any("foo", &[""]), None);
    }

    #[test]
    fn test_continuation_marker() {
        assert_eq!(continuation_marker("$a = 1 +\\"), Some("\\"));
        assert_eq!(continuation_marker("$a = 1 + /"), Some("/"));
        assert_eq!(continuation_marker("$a = 1"), None);
    }
}
