//! Script lexer

use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;

/// Lexer error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("syntax error, unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("syntax error, unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },
    #[error("syntax error, unterminated comment starting at offset {offset}")]
    UnterminatedComment { offset: usize },
    #[error("syntax error, invalid variable name at offset {offset}")]
    InvalidVariable { offset: usize },
}

/// Piece of a double-quoted string
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Literal(String),
    /// `$name` interpolation
    Variable(String),
}

/// Token kind
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `$name`
    Variable(String),
    Ident(String),
    Int(i64),
    Float(f64),
    /// Single-quoted string, or a double-quoted one without interpolation
    Str(String),
    /// Double-quoted string with interpolation
    Template(Vec<TemplatePart>),

    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semicolon,
    /// `=>`
    DoubleArrow,
    Question,
    Colon,
    /// `??`
    Coalesce,

    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    DotAssign,
    CoalesceAssign,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Dot,
    Not,
    AndAnd,
    OrOr,
    Increment,
    Decrement,

    Eq,
    NotEq,
    Identical,
    NotIdentical,
    Lt,
    LtEq,
    Gt,
    GtEq,

    Eof,
}

impl TokenKind {
    /// How the token reads in error messages
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Variable(name) => format!("variable \"${}\"", name),
            TokenKind::Ident(name) => format!("identifier \"{}\"", name),
            TokenKind::Int(i) => format!("integer \"{}\"", i),
            TokenKind::Float(f) => format!("floating-point number \"{}\"", f),
            TokenKind::Str(_) | TokenKind::Template(_) => "string content".to_string(),
            TokenKind::Eof => "end of file".to_string(),
            other => format!("token \"{}\"", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::DoubleArrow => "=>",
            TokenKind::Question => "?",
            TokenKind::Colon => ":",
            TokenKind::Coalesce => "??",
            TokenKind::Assign => "=",
            TokenKind::PlusAssign => "+=",
            TokenKind::MinusAssign => "-=",
            TokenKind::StarAssign => "*=",
            TokenKind::SlashAssign => "/=",
            TokenKind::PercentAssign => "%=",
            TokenKind::DotAssign => ".=",
            TokenKind::CoalesceAssign => "??=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Dot => ".",
            TokenKind::Not => "!",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "||",
            TokenKind::Increment => "++",
            TokenKind::Decrement => "--",
            TokenKind::Eq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Identical => "===",
            TokenKind::NotIdentical => "!==",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            _ => "?",
        }
    }
}

/// Token with its byte offset in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

/// Tokenize source code; the result always ends with `Eof`
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

fn is_ident_continue(c: char) -> bool {
    unicode_ident::is_xid_continue(c)
}

struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.clone().nth(1).map(|(_, c)| c)
    }

    fn advance(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }

    fn offset(&mut self) -> usize {
        self.chars
            .peek()
            .map(|&(offset, _)| offset)
            .unwrap_or(self.source.len())
    }

    fn eat(
        &mut self,
        expected: char,
    ) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                '#' => self.skip_line(),
                '/' if self.peek_next() == Some('/') => self.skip_line(),
                '/' if self.peek_next() == Some('*') => {
                    let start = self.offset();
                    self.advance();
                    self.advance();
                    let mut closed = false;
                    while let Some(c) = self.advance() {
                        if c == '*' && self.eat('/') {
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        return Err(LexError::UnterminatedComment { offset: start });
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.advance() {
            if c == '\n' {
                break;
            }
        }
    }

    fn read_ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if !is_ident_continue(c) {
                break;
            }
            ident.push(c);
            self.advance();
        }
        ident
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace_and_comments()?;
        let offset = self.offset();
        let Some(c) = self.advance() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                offset,
            });
        };

        let kind = match c {
            '$' => match self.peek() {
                Some(next) if is_ident_start(next) => TokenKind::Variable(self.read_ident()),
                _ => return Err(LexError::InvalidVariable { offset }),
            },
            c if is_ident_start(c) => {
                let mut ident = c.to_string();
                ident.push_str(&self.read_ident());
                TokenKind::Ident(ident)
            }
            c if c.is_ascii_digit() => self.number(c),
            '.' if self.peek().is_some_and(|n| n.is_ascii_digit()) => self.number(c),
            '\'' => self.single_quoted(offset)?,
            '"' => self.double_quoted(offset)?,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '?' => {
                if self.eat('?') {
                    if self.eat('=') {
                        TokenKind::CoalesceAssign
                    } else {
                        TokenKind::Coalesce
                    }
                } else {
                    TokenKind::Question
                }
            }
            '=' => {
                if self.eat('=') {
                    if self.eat('=') {
                        TokenKind::Identical
                    } else {
                        TokenKind::Eq
                    }
                } else if self.eat('>') {
                    TokenKind::DoubleArrow
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.eat('=') {
                    if self.eat('=') {
                        TokenKind::NotIdentical
                    } else {
                        TokenKind::NotEq
                    }
                } else {
                    TokenKind::Not
                }
            }
            '<' => {
                if self.eat('=') {
                    TokenKind::LtEq
                } else if self.eat('>') {
                    TokenKind::NotEq
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            '+' => {
                if self.eat('+') {
                    TokenKind::Increment
                } else if self.eat('=') {
                    TokenKind::PlusAssign
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.eat('-') {
                    TokenKind::Decrement
                } else if self.eat('=') {
                    TokenKind::MinusAssign
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.eat('=') {
                    TokenKind::StarAssign
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.eat('=') {
                    TokenKind::SlashAssign
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.eat('=') {
                    TokenKind::PercentAssign
                } else {
                    TokenKind::Percent
                }
            }
            '.' => {
                if self.eat('=') {
                    TokenKind::DotAssign
                } else {
                    TokenKind::Dot
                }
            }
            '&' if self.eat('&') => TokenKind::AndAnd,
            '|' if self.eat('|') => TokenKind::OrOr,
            ch => return Err(LexError::UnexpectedChar { ch, offset }),
        };

        Ok(Token { kind, offset })
    }

    fn number(
        &mut self,
        first: char,
    ) -> TokenKind {
        let mut text = first.to_string();
        let mut is_float = first == '.';

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                if c != '_' {
                    text.push(c);
                }
                self.advance();
            } else if c == '.' && !is_float && self.peek_next().is_some_and(|n| n.is_ascii_digit()) {
                is_float = true;
                text.push(c);
                self.advance();
            } else if (c == 'e' || c == 'E')
                && self
                    .peek_next()
                    .is_some_and(|n| n.is_ascii_digit() || n == '-' || n == '+')
            {
                is_float = true;
                text.push(c);
                self.advance();
                if let Some(sign) = self.peek().filter(|s| *s == '-' || *s == '+') {
                    text.push(sign);
                    self.advance();
                }
            } else {
                break;
            }
        }

        if !is_float {
            if let Ok(i) = text.parse::<i64>() {
                return TokenKind::Int(i);
            }
        }
        // Integer literals too large for i64 become floats
        TokenKind::Float(text.parse::<f64>().unwrap_or(f64::INFINITY))
    }

    fn single_quoted(
        &mut self,
        offset: usize,
    ) -> Result<TokenKind, LexError> {
        let mut text = String::new();
        loop {
            match self.advance() {
                Some('\'') => return Ok(TokenKind::Str(text)),
                Some('\\') => match self.peek() {
                    Some(c @ ('\'' | '\\')) => {
                        text.push(c);
                        self.advance();
                    }
                    _ => text.push('\\'),
                },
                Some(c) => text.push(c),
                None => return Err(LexError::UnterminatedString { offset }),
            }
        }
    }

    fn double_quoted(
        &mut self,
        offset: usize,
    ) -> Result<TokenKind, LexError> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        loop {
            match self.advance() {
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('n') => literal.push('\n'),
                    Some('t') => literal.push('\t'),
                    Some('r') => literal.push('\r'),
                    Some('0') => literal.push('\0'),
                    Some('e') => literal.push('\u{1b}'),
                    Some(c @ ('\\' | '"' | '$')) => literal.push(c),
                    Some(c) => {
                        literal.push('\\');
                        literal.push(c);
                    }
                    None => return Err(LexError::UnterminatedString { offset }),
                },
                Some('$') if self.peek().is_some_and(is_ident_start) => {
                    if !literal.is_empty() {
                        parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                    }
                    parts.push(TemplatePart::Variable(self.read_ident()));
                }
                Some(c) => literal.push(c),
                None => return Err(LexError::UnterminatedString { offset }),
            }
        }

        if parts.is_empty() {
            return Ok(TokenKind::Str(literal));
        }
        if !literal.is_empty() {
            parts.push(TemplatePart::Literal(literal));
        }
        Ok(TokenKind::Template(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .map(|tokens| tokens.into_iter().map(|t| t.kind).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_tokenize_expression() {
        assert_eq!(
            kinds("$x = 1 + 2.5;"),
            vec![
                TokenKind::Variable("x".into()),
                TokenKind::Assign,
                TokenKind::Int(1),
                TokenKind::Plus,
                TokenKind::Float(2.5),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_operators() {
        assert_eq!(
            kinds("=== !== == => ?? ??= ++ .="),
            vec![
                TokenKind::Identical,
                TokenKind::NotIdentical,
                TokenKind::Eq,
                TokenKind::DoubleArrow,
                TokenKind::Coalesce,
                TokenKind::CoalesceAssign,
                TokenKind::Increment,
                TokenKind::DotAssign,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            kinds(r#"'a\'b' "x\ty""#),
            vec![
                TokenKind::Str("a'b".into()),
                TokenKind::Str("x\ty".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_interpolation() {
        assert_eq!(
            kinds(r#""hi $name!""#),
            vec![
                TokenKind::Template(vec![
                    TemplatePart::Literal("hi ".into()),
                    TemplatePart::Variable("name".into()),
                    TemplatePart::Literal("!".into()),
                ]),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("1 // one\n# two\n/* three */ 2"),
            vec![TokenKind::Int(1), TokenKind::Int(2), TokenKind::Eof]
        );
    }

    #[test]
    fn test_big_integer_becomes_float() {
        assert_eq!(
            kinds("99999999999999999999"),
            vec![TokenKind::Float(1e20), TokenKind::Eof]
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            tokenize("'open"),
            Err(LexError::UnterminatedString { offset: 0 })
        );
        assert_eq!(
            tokenize("1 @ 2"),
            Err(LexError::UnexpectedChar { ch: '@', offset: 2 })
        );
        assert_eq!(tokenize("$1"), Err(LexError::InvalidVariable { offset: 0 }));
    }
}
