//! Script parser
//!
//! Recursive descent over the token stream. Expression precedence, lowest
//! first: assignment, ternary, `??`, `||`, `&&`, equality, comparison, `.`,
//! `+ -`, `* / %`, unary, postfix.

use std::rc::Rc;

use thiserror::Error;

use super::ast::{AssignOp, BinaryOp, Expr, FunctionDecl, LogicalOp, Param, Stmt, UnaryOp};
use super::lexer::{tokenize, LexError, Token, TokenKind};
use crate::runtime::value::Value;

/// Deepest nesting of expressions and statements the parser accepts
pub const MAX_NESTING_DEPTH: usize = 128;

/// Parser error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("syntax error, unexpected {found}, expecting {expected}")]
    Expected { expected: String, found: String },
    #[error("syntax error, unexpected {found}")]
    Unexpected { found: String },
    #[error("Cannot assign to this expression")]
    InvalidAssignment,
    #[error("Maximum nesting level of '{0}' reached")]
    TooDeep(usize),
}

/// Parse a sequence of statements
pub fn parse_program(source: &str) -> Result<Vec<Stmt>, ParseError> {
    let mut parser = Parser::new(source)?;
    let mut statements = Vec::new();
    while !parser.at(&TokenKind::Eof) {
        statements.push(parser.statement()?);
    }
    Ok(statements)
}

/// Parse exactly one expression
pub fn parse_expression(source: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(source)?;
    let expr = parser.expression()?;
    parser.expect(&TokenKind::Eof, "end of file")?;
    Ok(expr)
}

type ParseResult<T> = Result<T, ParseError>;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Current nesting, bounded by `MAX_NESTING_DEPTH`
    depth: usize,
}

impl Parser {
    fn new(source: &str) -> ParseResult<Self> {
        Ok(Self {
            tokens: tokenize(source)?,
            pos: 0,
            depth: 0,
        })
    }

    fn peek(&self) -> &TokenKind {
        // The stream always ends with Eof, and `advance` never moves past it
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn peek_at(
        &self,
        ahead: usize,
    ) -> &TokenKind {
        &self.tokens[(self.pos + ahead).min(self.tokens.len() - 1)].kind
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        kind
    }

    fn at(
        &self,
        kind: &TokenKind,
    ) -> bool {
        self.peek() == kind
    }

    fn eat(
        &mut self,
        kind: &TokenKind,
    ) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(
        &mut self,
        kind: &TokenKind,
        expected: &str,
    ) -> ParseResult<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.expected(expected))
        }
    }

    fn expected(
        &self,
        expected: &str,
    ) -> ParseError {
        ParseError::Expected {
            expected: format!("\"{}\"", expected),
            found: self.peek().describe(),
        }
    }

    /// Go one level deeper
    fn enter(&mut self) -> ParseResult<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::TooDeep(MAX_NESTING_DEPTH));
        }
        self.depth += 1;
        Ok(())
    }

    /// Run `parse` one level deeper
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        self.enter()?;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn unexpected(&self) -> ParseError {
        ParseError::Unexpected {
            found: self.peek().describe(),
        }
    }

    /// Case-insensitive keyword check
    fn at_keyword(
        &self,
        keyword: &str,
    ) -> bool {
        matches!(self.peek(), TokenKind::Ident(word) if word.eq_ignore_ascii_case(keyword))
    }

    fn eat_keyword(
        &mut self,
        keyword: &str,
    ) -> bool {
        if self.at_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn variable_name(&mut self) -> ParseResult<String> {
        match self.peek().clone() {
            TokenKind::Variable(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.expected("variable")),
        }
    }

    /// `;`, or nothing before `}` and end of input
    fn end_statement(&mut self) -> ParseResult<()> {
        if self.eat(&TokenKind::Semicolon) || self.at(&TokenKind::RBrace) || self.at(&TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.expected(";"))
        }
    }

    // ---------------------------------------------------------------------
    // Statements
    // ---------------------------------------------------------------------

    fn statement(&mut self) -> ParseResult<Stmt> {
        if self.eat(&TokenKind::Semicolon) {
            return Ok(Stmt::Empty);
        }
        if self.at(&TokenKind::LBrace) {
            return Ok(Stmt::Block(self.block()?));
        }

        let keyword = match self.peek() {
            TokenKind::Ident(word) => word.to_ascii_lowercase(),
            _ => return self.expression_statement(),
        };

        match keyword.as_str() {
            "echo" | "print" => {
                self.advance();
                let mut values = vec![self.expression()?];
                if keyword == "echo" {
                    while self.eat(&TokenKind::Comma) {
                        values.push(self.expression()?);
                    }
                }
                self.end_statement()?;
                Ok(Stmt::Echo(values))
            }
            "if" => self.if_statement(),
            "while" => {
                self.advance();
                let condition = self.condition()?;
                let body = self.body()?;
                Ok(Stmt::While { condition, body })
            }
            "do" => {
                self.advance();
                let body = self.body()?;
                if !self.eat_keyword("while") {
                    return Err(self.expected("while"));
                }
                let condition = self.condition()?;
                self.end_statement()?;
                Ok(Stmt::DoWhile { body, condition })
            }
            "for" => self.for_statement(),
            "foreach" => self.foreach_statement(),
            "function" if matches!(self.peek_at(1), TokenKind::Ident(_)) => self.function_declaration(),
            "return" => {
                self.advance();
                let value = if self.at(&TokenKind::Semicolon)
                    || self.at(&TokenKind::RBrace)
                    || self.at(&TokenKind::Eof)
                {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.end_statement()?;
                Ok(Stmt::Return(value))
            }
            "break" | "continue" => {
                self.advance();
                self.end_statement()?;
                Ok(if keyword == "break" {
                    Stmt::Break
                } else {
                    Stmt::Continue
                })
            }
            "unset" => {
                self.advance();
                self.expect(&TokenKind::LParen, "(")?;
                let targets = self.expression_list(&TokenKind::RParen)?;
                self.expect(&TokenKind::RParen, ")")?;
                self.end_statement()?;
                if targets.iter().any(|target| !target.is_place()) {
                    return Err(ParseError::InvalidAssignment);
                }
                Ok(Stmt::Unset(targets))
            }
            "throw" => {
                self.advance();
                let value = self.expression()?;
                self.end_statement()?;
                Ok(Stmt::Throw(value))
            }
            _ => self.expression_statement(),
        }
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.end_statement()?;
        Ok(Stmt::Expr(expr))
    }

    /// `{ statements }`
    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect(&TokenKind::LBrace, "{")?;
        let mut statements = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            if self.at(&TokenKind::Eof) {
                return Err(self.expected("}"));
            }
            statements.push(self.nested(Self::statement)?);
        }
        self.advance();
        Ok(statements)
    }

    /// A block, or a single statement
    fn body(&mut self) -> ParseResult<Vec<Stmt>> {
        if self.at(&TokenKind::LBrace) {
            self.block()
        } else {
            Ok(vec![self.nested(Self::statement)?])
        }
    }

    /// `( expr )`
    fn condition(&mut self) -> ParseResult<Expr> {
        self.expect(&TokenKind::LParen, "(")?;
        let condition = self.expression()?;
        self.expect(&TokenKind::RParen, ")")?;
        Ok(condition)
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.advance();
        let mut branches = vec![(self.condition()?, self.body()?)];
        let mut otherwise = None;
        loop {
            if self.eat_keyword("elseif") {
                branches.push((self.condition()?, self.body()?));
            } else if self.at_keyword("else") {
                self.advance();
                if self.eat_keyword("if") {
                    branches.push((self.condition()?, self.body()?));
                } else {
                    otherwise = Some(self.body()?);
                    break;
                }
            } else {
                break;
            }
        }
        Ok(Stmt::If {
            branches,
            otherwise,
        })
    }

    fn for_statement(&mut self) -> ParseResult<Stmt> {
        self.advance();
        self.expect(&TokenKind::LParen, "(")?;
        let init = self.expression_list(&TokenKind::Semicolon)?;
        self.expect(&TokenKind::Semicolon, ";")?;
        let condition = self.expression_list(&TokenKind::Semicolon)?;
        self.expect(&TokenKind::Semicolon, ";")?;
        let step = self.expression_list(&TokenKind::RParen)?;
        self.expect(&TokenKind::RParen, ")")?;
        let body = self.body()?;
        Ok(Stmt::For {
            init,
            condition,
            step,
            body,
        })
    }

    fn foreach_statement(&mut self) -> ParseResult<Stmt> {
        self.advance();
        self.expect(&TokenKind::LParen, "(")?;
        let subject = self.expression()?;
        if !self.eat_keyword("as") {
            return Err(self.expected("as"));
        }
        let first = self.variable_name()?;
        let (key, value) = if self.eat(&TokenKind::DoubleArrow) {
            (Some(first), self.variable_name()?)
        } else {
            (None, first)
        };
        self.expect(&TokenKind::RParen, ")")?;
        let body = self.body()?;
        Ok(Stmt::Foreach {
            subject,
            key,
            value,
            body,
        })
    }

    fn function_declaration(&mut self) -> ParseResult<Stmt> {
        self.advance();
        let name = match self.advance() {
            TokenKind::Ident(name) => name,
            _ => return Err(self.expected("identifier")),
        };
        self.expect(&TokenKind::LParen, "(")?;
        let mut params = Vec::new();
        while !self.at(&TokenKind::RParen) {
            // Type hints are accepted and ignored
            if let TokenKind::Ident(_) = self.peek() {
                self.advance();
            }
            let name = self.variable_name()?;
            let default = if self.eat(&TokenKind::Assign) {
                Some(self.expression()?)
            } else {
                None
            };
            params.push(Param { name, default });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, ")")?;
        if self.eat(&TokenKind::Colon) {
            match self.advance() {
                TokenKind::Ident(_) => {}
                _ => return Err(self.expected("type")),
            }
        }
        let body = self.block()?;
        Ok(Stmt::Function(Rc::new(FunctionDecl { name, params, body })))
    }

    /// Comma-separated expressions up to (not including) `end`
    fn expression_list(
        &mut self,
        end: &TokenKind,
    ) -> ParseResult<Vec<Expr>> {
        let mut exprs = Vec::new();
        while !self.at(end) {
            exprs.push(self.expression()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(exprs)
    }

    // ---------------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------------

    fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        self.nested(Self::assignment_level)
    }

    fn assignment_level(&mut self) -> ParseResult<Expr> {
        let target = self.ternary()?;
        let op = match self.peek() {
            TokenKind::Assign => AssignOp::Plain,
            TokenKind::PlusAssign => AssignOp::Compound(BinaryOp::Add),
            TokenKind::MinusAssign => AssignOp::Compound(BinaryOp::Sub),
            TokenKind::StarAssign => AssignOp::Compound(BinaryOp::Mul),
            TokenKind::SlashAssign => AssignOp::Compound(BinaryOp::Div),
            TokenKind::PercentAssign => AssignOp::Compound(BinaryOp::Mod),
            TokenKind::DotAssign => AssignOp::Compound(BinaryOp::Concat),
            TokenKind::CoalesceAssign => AssignOp::Coalesce,
            _ => return Ok(target),
        };
        if !target.is_place() {
            return Err(ParseError::InvalidAssignment);
        }
        self.advance();
        let value = self.assignment()?;
        Ok(Expr::Assign {
            target: Box::new(target),
            op,
            value: Box::new(value),
        })
    }

    fn ternary(&mut self) -> ParseResult<Expr> {
        let condition = self.coalesce()?;
        if !self.eat(&TokenKind::Question) {
            return Ok(condition);
        }
        let then = if self.eat(&TokenKind::Colon) {
            None
        } else {
            let then = self.assignment()?;
            self.expect(&TokenKind::Colon, ":")?;
            Some(Box::new(then))
        };
        let otherwise = self.assignment()?;
        Ok(Expr::Ternary {
            condition: Box::new(condition),
            then,
            otherwise: Box::new(otherwise),
        })
    }

    fn coalesce(&mut self) -> ParseResult<Expr> {
        let left = self.logical_or()?;
        if self.eat(&TokenKind::Coalesce) {
            let right = self.nested(Self::coalesce)?;
            return Ok(Expr::Logical {
                op: LogicalOp::Coalesce,
                left: Box::new(left),
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    fn logical_or(&mut self) -> ParseResult<Expr> {
        let base = self.depth;
        let mut left = self.logical_and()?;
        while self.eat(&TokenKind::OrOr) {
            self.enter()?;
            let right = self.logical_and()?;
            left = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = base;
        Ok(left)
    }

    fn logical_and(&mut self) -> ParseResult<Expr> {
        let base = self.depth;
        let mut left = self.equality()?;
        while self.eat(&TokenKind::AndAnd) {
            self.enter()?;
            let right = self.equality()?;
            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = base;
        Ok(left)
    }

    /// One left-associative binary level
    fn binary_level(
        &mut self,
        operators: &[(TokenKind, BinaryOp)],
        next: fn(&mut Self) -> ParseResult<Expr>,
    ) -> ParseResult<Expr> {
        let base = self.depth;
        let mut left = next(self)?;
        'outer: loop {
            for (token, op) in operators {
                if self.eat(token) {
                    self.enter()?;
                    let right = next(self)?;
                    left = Expr::Binary {
                        op: *op,
                        left: Box::new(left),
                        right: Box::new(right),
                    };
                    continue 'outer;
                }
            }
            self.depth = base;
            return Ok(left);
        }
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        self.binary_level(
            &[
                (TokenKind::Identical, BinaryOp::Identical),
                (TokenKind::NotIdentical, BinaryOp::NotIdentical),
                (TokenKind::Eq, BinaryOp::Eq),
                (TokenKind::NotEq, BinaryOp::NotEq),
            ],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        self.binary_level(
            &[
                (TokenKind::Lt, BinaryOp::Lt),
                (TokenKind::LtEq, BinaryOp::LtEq),
                (TokenKind::Gt, BinaryOp::Gt),
                (TokenKind::GtEq, BinaryOp::GtEq),
            ],
            Self::concat,
        )
    }

    fn concat(&mut self) -> ParseResult<Expr> {
        self.binary_level(&[(TokenKind::Dot, BinaryOp::Concat)], Self::additive)
    }

    fn additive(&mut self) -> ParseResult<Expr> {
        self.binary_level(
            &[(TokenKind::Plus, BinaryOp::Add), (TokenKind::Minus, BinaryOp::Sub)],
            Self::multiplicative,
        )
    }

    fn multiplicative(&mut self) -> ParseResult<Expr> {
        self.binary_level(
            &[
                (TokenKind::Star, BinaryOp::Mul),
                (TokenKind::Slash, BinaryOp::Div),
                (TokenKind::Percent, BinaryOp::Mod),
            ],
            Self::unary,
        )
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        let op = match self.peek() {
            TokenKind::Not => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Increment | TokenKind::Decrement => {
                let increment = self.advance() == TokenKind::Increment;
                let target = self.nested(Self::unary)?;
                if !target.is_place() {
                    return Err(ParseError::InvalidAssignment);
                }
                return Ok(Expr::IncDec {
                    target: Box::new(target),
                    increment,
                    prefix: true,
                });
            }
            _ => return self.postfix(),
        };
        self.advance();
        let operand = self.nested(Self::unary)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn postfix(&mut self) -> ParseResult<Expr> {
        let base = self.depth;
        let mut expr = self.primary()?;
        loop {
            match self.peek() {
                TokenKind::LBracket => {
                    self.advance();
                    self.enter()?;
                    let index = if self.at(&TokenKind::RBracket) {
                        None
                    } else {
                        Some(Box::new(self.expression()?))
                    };
                    self.expect(&TokenKind::RBracket, "]")?;
                    expr = Expr::Index {
                        target: Box::new(expr),
                        index,
                    };
                }
                TokenKind::Increment | TokenKind::Decrement if expr.is_place() => {
                    let increment = self.advance() == TokenKind::Increment;
                    self.enter()?;
                    expr = Expr::IncDec {
                        target: Box::new(expr),
                        increment,
                        prefix: false,
                    };
                }
                _ => {
                    self.depth = base;
                    return Ok(expr);
                }
            }
        }
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        match self.peek().clone() {
            TokenKind::Variable(name) => {
                self.advance();
                Ok(Expr::Variable(name))
            }
            TokenKind::Int(i) => {
                self.advance();
                Ok(Expr::Literal(Value::Int(i)))
            }
            TokenKind::Float(f) => {
                self.advance();
                Ok(Expr::Literal(Value::Float(f)))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Literal(Value::Str(s)))
            }
            TokenKind::Template(parts) => {
                self.advance();
                Ok(Expr::Interpolated(parts))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.expression()?;
                self.expect(&TokenKind::RParen, ")")?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                self.advance();
                self.array_items(&TokenKind::RBracket, "]")
            }
            TokenKind::Ident(name) => {
                self.advance();
                let lower = name.to_ascii_lowercase();
                match lower.as_str() {
                    "true" => return Ok(Expr::Literal(Value::Bool(true))),
                    "false" => return Ok(Expr::Literal(Value::Bool(false))),
                    "null" => return Ok(Expr::Literal(Value::Null)),
                    _ => {}
                }
                if !self.eat(&TokenKind::LParen) {
                    return Ok(Expr::Constant(name));
                }
                if lower == "array" {
                    return self.array_items(&TokenKind::RParen, ")");
                }
                let args = self.expression_list(&TokenKind::RParen)?;
                self.expect(&TokenKind::RParen, ")")?;
                Ok(Expr::Call { name, args })
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Array literal items after the opening bracket, through `close`
    fn array_items(
        &mut self,
        close: &TokenKind,
        close_text: &str,
    ) -> ParseResult<Expr> {
        let mut items = Vec::new();
        while !self.at(close) {
            let first = self.expression()?;
            if self.eat(&TokenKind::DoubleArrow) {
                let value = self.expression()?;
                items.push((Some(first), value));
            } else {
                items.push((None, first));
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(close, close_text)?;
        Ok(Expr::Array(items))
    }
}
