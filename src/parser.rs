use crate::ast::{BinaryOp, Expr, Program, Stmt, UnaryOp};
use crate::error::{EmberError, ErrorKind, Span};
use crate::lexer::{Lexer, Token, TokenType};
use std::rc::Rc;

/// Binding power for the Pratt expression loop, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

fn token_precedence(token_type: TokenType) -> Precedence {
    match token_type {
        TokenType::EqualEqual | TokenType::BangEqual => Precedence::Equals,
        TokenType::Less | TokenType::Greater => Precedence::LessGreater,
        TokenType::Plus | TokenType::Minus => Precedence::Sum,
        TokenType::Star | TokenType::Slash => Precedence::Product,
        TokenType::LeftParen => Precedence::Call,
        TokenType::LeftBracket => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

/// Pratt parser over the lazy token stream. Keeps the current token and one
/// token of lookahead; parse errors are accumulated so a single pass can
/// report several syntax errors, while lexer errors abort the parse.
pub struct Parser {
    lexer: Lexer,
    current: Token,
    peek: Token,
    errors: Vec<EmberError>,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Self {
        let mut parser = Self {
            lexer,
            current: Token::eof(0),
            peek: Token::eof(0),
            errors: Vec::new(),
        };

        // Populate current and peek
        if let Err(err) = parser.advance().and_then(|_| parser.advance()) {
            parser.errors.push(err);
            parser.current = Token::eof(0);
            parser.peek = Token::eof(0);
        }

        parser
    }

    pub fn errors(&self) -> &[EmberError] {
        &self.errors
    }

    /// Parses statements up to end of input. Returns the (possibly partial)
    /// program; any errors hit along the way are left in `errors()`.
    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();

        while !self.current_is(TokenType::Eof) {
            match self.parse_statement() {
                Ok(statement) => {
                    statements.push(statement);
                    if let Err(err) = self.advance() {
                        self.errors.push(err);
                        break;
                    }
                }
                Err(err) => {
                    let fatal = err.kind == ErrorKind::LexError;
                    self.errors.push(err);
                    if fatal {
                        break;
                    }
                    // Skip one token and try to parse the next statement
                    if let Err(err) = self.advance() {
                        self.errors.push(err);
                        break;
                    }
                }
            }
        }

        Program { statements }
    }

    fn parse_statement(&mut self) -> Result<Stmt, EmberError> {
        match self.current.token_type {
            TokenType::Let => self.parse_let_statement(),
            TokenType::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Result<Stmt, EmberError> {
        let span_start = self.current.span.start;

        self.expect_peek(TokenType::Identifier)?;
        let name = self.current.lexeme.clone();

        self.expect_peek(TokenType::Equal)?;
        self.advance()?;

        let value = self.parse_expression(Precedence::Lowest)?;

        if self.peek_is(TokenType::Semicolon) {
            self.advance()?;
        }

        Ok(Stmt::Let {
            name,
            value,
            span: Span::new(span_start, self.current.span.end),
        })
    }

    fn parse_return_statement(&mut self) -> Result<Stmt, EmberError> {
        let span_start = self.current.span.start;
        self.advance()?;

        let value = self.parse_expression(Precedence::Lowest)?;

        if self.peek_is(TokenType::Semicolon) {
            self.advance()?;
        }

        Ok(Stmt::Return {
            value,
            span: Span::new(span_start, self.current.span.end),
        })
    }

    fn parse_expression_statement(&mut self) -> Result<Stmt, EmberError> {
        let span_start = self.current.span.start;
        let expr = self.parse_expression(Precedence::Lowest)?;
        let span = Span::new(span_start, self.current.span.end);

        while self.peek_is(TokenType::Semicolon) {
            self.advance()?;
        }

        Ok(Stmt::Expression { expr, span })
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Result<Expr, EmberError> {
        let mut left = self.parse_prefix()?;

        while !self.peek_is(TokenType::Semicolon)
            && precedence < token_precedence(self.peek.token_type)
        {
            self.advance()?;
            left = self.parse_infix(left)?;
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expr, EmberError> {
        match self.current.token_type {
            TokenType::Identifier => Ok(Expr::Identifier {
                name: self.current.lexeme.clone(),
                span: self.current.span,
            }),
            TokenType::Integer => self.parse_integer_literal(),
            TokenType::True | TokenType::False => Ok(Expr::BooleanLiteral {
                value: self.current_is(TokenType::True),
                span: self.current.span,
            }),
            TokenType::String => Ok(Expr::StringLiteral {
                value: self.current.lexeme.clone(),
                span: self.current.span,
            }),
            TokenType::Bang | TokenType::Minus => self.parse_prefix_expression(),
            TokenType::LeftParen => self.parse_grouped_expression(),
            TokenType::If => self.parse_if_expression(),
            TokenType::Fn => self.parse_function_literal(),
            TokenType::LeftBracket => self.parse_array_literal(),
            TokenType::LeftBrace => self.parse_hash_literal(),
            TokenType::Eof => Err(EmberError::parse_error(
                self.current.span,
                "unexpected end of file, expected expression".to_string(),
            )),
            _ => Err(EmberError::parse_error(
                self.current.span,
                format!("expected expression, got token {:?}", self.current.lexeme),
            )),
        }
    }

    fn parse_infix(&mut self, left: Expr) -> Result<Expr, EmberError> {
        match self.current.token_type {
            TokenType::LeftParen => self.parse_call_expression(left),
            TokenType::LeftBracket => self.parse_index_expression(left),
            _ => self.parse_binary_expression(left),
        }
    }

    fn parse_integer_literal(&mut self) -> Result<Expr, EmberError> {
        let value = self.current.lexeme.parse::<i64>().map_err(|_| {
            EmberError::parse_error(
                self.current.span,
                format!("invalid integer literal: {}", self.current.lexeme),
            )
        })?;
        Ok(Expr::IntegerLiteral {
            value,
            span: self.current.span,
        })
    }

    fn parse_prefix_expression(&mut self) -> Result<Expr, EmberError> {
        let span_start = self.current.span.start;
        let operator = if self.current_is(TokenType::Bang) {
            UnaryOp::Not
        } else {
            UnaryOp::Negate
        };

        self.advance()?;
        let operand = self.parse_expression(Precedence::Prefix)?;

        Ok(Expr::Prefix {
            operator,
            operand: Box::new(operand),
            span: Span::new(span_start, self.current.span.end),
        })
    }

    fn parse_binary_expression(&mut self, left: Expr) -> Result<Expr, EmberError> {
        let operator = match self.current.token_type {
            TokenType::Plus => BinaryOp::Add,
            TokenType::Minus => BinaryOp::Subtract,
            TokenType::Star => BinaryOp::Multiply,
            TokenType::Slash => BinaryOp::Divide,
            TokenType::Less => BinaryOp::Less,
            TokenType::Greater => BinaryOp::Greater,
            TokenType::EqualEqual => BinaryOp::Equal,
            TokenType::BangEqual => BinaryOp::NotEqual,
            _ => {
                return Err(EmberError::parse_error(
                    self.current.span,
                    format!(
                        "cannot parse infix expression for operator {:?}",
                        self.current.lexeme
                    ),
                ))
            }
        };

        let precedence = token_precedence(self.current.token_type);
        let span_start = left.span().start;
        self.advance()?;
        let right = self.parse_expression(precedence)?;

        Ok(Expr::Infix {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            span: Span::new(span_start, self.current.span.end),
        })
    }

    fn parse_grouped_expression(&mut self) -> Result<Expr, EmberError> {
        self.advance()?;
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenType::RightParen)?;
        Ok(expr)
    }

    fn parse_if_expression(&mut self) -> Result<Expr, EmberError> {
        let span_start = self.current.span.start;

        self.expect_peek(TokenType::LeftParen)?;
        self.advance()?;
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenType::RightParen)?;

        self.expect_peek(TokenType::LeftBrace)?;
        let consequence = self.parse_block_statement()?;

        let alternative = if self.peek_is(TokenType::Else) {
            self.advance()?;
            self.expect_peek(TokenType::LeftBrace)?;
            Some(Box::new(self.parse_block_statement()?))
        } else {
            None
        };

        Ok(Expr::If {
            condition: Box::new(condition),
            consequence: Box::new(consequence),
            alternative,
            span: Span::new(span_start, self.current.span.end),
        })
    }

    /// Parses `{ … }` with the opening brace as the current token; on
    /// success the closing brace is the current token.
    fn parse_block_statement(&mut self) -> Result<Stmt, EmberError> {
        let span_start = self.current.span.start;
        let mut statements = Vec::new();
        self.advance()?;

        while !self.current_is(TokenType::RightBrace) {
            if self.current_is(TokenType::Eof) {
                return Err(EmberError::parse_error(
                    self.current.span,
                    "unexpected end of file, expected '}'".to_string(),
                ));
            }
            statements.push(self.parse_statement()?);
            self.advance()?;
        }

        Ok(Stmt::Block {
            statements,
            span: Span::new(span_start, self.current.span.end),
        })
    }

    fn parse_function_literal(&mut self) -> Result<Expr, EmberError> {
        let span_start = self.current.span.start;

        self.expect_peek(TokenType::LeftParen)?;
        let parameters = self.parse_function_parameters()?;

        self.expect_peek(TokenType::LeftBrace)?;
        let body = self.parse_block_statement()?;

        Ok(Expr::FunctionLiteral {
            parameters,
            body: Rc::new(body),
            span: Span::new(span_start, self.current.span.end),
        })
    }

    fn parse_function_parameters(&mut self) -> Result<Vec<String>, EmberError> {
        let mut parameters = Vec::new();

        if self.peek_is(TokenType::RightParen) {
            self.advance()?;
            return Ok(parameters);
        }

        self.expect_peek(TokenType::Identifier)?;
        parameters.push(self.current.lexeme.clone());

        while self.peek_is(TokenType::Comma) {
            self.advance()?;
            self.expect_peek(TokenType::Identifier)?;
            parameters.push(self.current.lexeme.clone());
        }

        self.expect_peek(TokenType::RightParen)?;
        Ok(parameters)
    }

    fn parse_array_literal(&mut self) -> Result<Expr, EmberError> {
        let span_start = self.current.span.start;
        let elements = self.parse_expression_list(TokenType::RightBracket)?;
        Ok(Expr::ArrayLiteral {
            elements,
            span: Span::new(span_start, self.current.span.end),
        })
    }

    fn parse_hash_literal(&mut self) -> Result<Expr, EmberError> {
        let span_start = self.current.span.start;
        let mut pairs = Vec::new();

        while !self.peek_is(TokenType::RightBrace) {
            self.advance()?;
            let key = self.parse_expression(Precedence::Lowest)?;
            self.expect_peek(TokenType::Colon)?;
            self.advance()?;
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));

            if !self.peek_is(TokenType::RightBrace) {
                self.expect_peek(TokenType::Comma)?;
            }
        }

        self.expect_peek(TokenType::RightBrace)?;
        Ok(Expr::HashLiteral {
            pairs,
            span: Span::new(span_start, self.current.span.end),
        })
    }

    fn parse_call_expression(&mut self, callee: Expr) -> Result<Expr, EmberError> {
        let span_start = callee.span().start;
        let arguments = self.parse_expression_list(TokenType::RightParen)?;
        Ok(Expr::Call {
            callee: Box::new(callee),
            arguments,
            span: Span::new(span_start, self.current.span.end),
        })
    }

    fn parse_index_expression(&mut self, target: Expr) -> Result<Expr, EmberError> {
        let span_start = target.span().start;
        self.advance()?;
        let index = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenType::RightBracket)?;
        Ok(Expr::Index {
            target: Box::new(target),
            index: Box::new(index),
            span: Span::new(span_start, self.current.span.end),
        })
    }

    /// Parses a comma-separated expression list with the opening delimiter
    /// as the current token, consuming through the closing delimiter.
    fn parse_expression_list(&mut self, end: TokenType) -> Result<Vec<Expr>, EmberError> {
        let mut items = Vec::new();

        if self.peek_is(end) {
            self.advance()?;
            return Ok(items);
        }

        self.advance()?;
        items.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_is(TokenType::Comma) {
            self.advance()?;
            self.advance()?;
            items.push(self.parse_expression(Precedence::Lowest)?);
        }

        self.expect_peek(end)?;
        Ok(items)
    }

    fn advance(&mut self) -> Result<(), EmberError> {
        let next = self.lexer.next_token()?;
        self.current = std::mem::replace(&mut self.peek, next);
        Ok(())
    }

    fn current_is(&self, token_type: TokenType) -> bool {
        self.current.token_type == token_type
    }

    fn peek_is(&self, token_type: TokenType) -> bool {
        self.peek.token_type == token_type
    }

    fn expect_peek(&mut self, expected: TokenType) -> Result<(), EmberError> {
        if self.peek_is(expected) {
            self.advance()
        } else if self.peek_is(TokenType::Eof) {
            Err(EmberError::parse_error(
                self.peek.span,
                format!("unexpected end of file, expected {}", expected),
            ))
        } else {
            Err(EmberError::parse_error(
                self.peek.span,
                format!(
                    "unexpected token {:?}, expected {}",
                    self.peek.lexeme, expected
                ),
            ))
        }
    }
}
