//! Recursive-descent expression parser
//!
//! Precedence, lowest first: assignment, ternary / Elvis, `||`, `&&`,
//! comparison, additive, multiplicative, unary, postfix.

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::tokenizer::{Spanned, Token, Tokenizer};
use crate::{EvaluationError, Value};

/// Parse expression text into a syntax tree
pub fn parse(input: &str) -> Result<Expr, EvaluationError> {
    let mut parser = Parser::new(input)?;
    let expr = parser.parse_assignment()?;
    if !parser.check(&Token::Eof) {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned>,
    position: usize,
}

impl Parser {
    fn new(input: &str) -> Result<Self, EvaluationError> {
        Ok(Self {
            tokens: Tokenizer::new(input).tokenize()?,
            position: 0,
        })
    }

    fn peek(&self) -> &Token {
        self.tokens
            .get(self.position)
            .map(|(t, _)| t)
            .unwrap_or(&Token::Eof)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.position)
            .or_else(|| self.tokens.last())
            .map(|(_, p)| *p)
            .unwrap_or(0)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.position < self.tokens.len() {
            self.position += 1;
        }
        token
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<(), EvaluationError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {what}")))
        }
    }

    /// Whether the next token is the given word (`and`, `or`, `not`)
    fn check_word(&self, word: &str) -> bool {
        matches!(self.peek(), Token::Identifier(w) if w == word)
    }

    fn error(&self, message: &str) -> EvaluationError {
        EvaluationError::Parse {
            position: self.offset(),
            message: message.to_string(),
        }
    }

    fn parse_assignment(&mut self) -> Result<Expr, EvaluationError> {
        let start = self.offset();
        let target = self.parse_ternary()?;
        if !self.eat(&Token::Assign) {
            return Ok(target);
        }
        if !is_assignable(&target) {
            return Err(EvaluationError::Parse {
                position: start,
                message: "invalid assignment target".to_string(),
            });
        }
        let value = self.parse_assignment()?;
        Ok(Expr::Assign {
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn parse_ternary(&mut self) -> Result<Expr, EvaluationError> {
        let condition = self.parse_or()?;
        if self.eat(&Token::Question) {
            let then = self.parse_assignment()?;
            self.expect(&Token::Colon, "':' in conditional expression")?;
            let otherwise = self.parse_ternary()?;
            return Ok(Expr::Ternary {
                condition: Box::new(condition),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            });
        }
        if self.eat(&Token::Elvis) {
            let fallback = self.parse_ternary()?;
            return Ok(Expr::Elvis {
                value: Box::new(condition),
                fallback: Box::new(fallback),
            });
        }
        Ok(condition)
    }

    fn parse_or(&mut self) -> Result<Expr, EvaluationError> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::OrOr) || self.eat_word("or") {
            let right = self.parse_and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, EvaluationError> {
        let mut left = self.parse_comparison()?;
        while self.eat(&Token::AndAnd) || self.eat_word("and") {
            let right = self.parse_comparison()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.check_word(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr, EvaluationError> {
        let left = self.parse_additive()?;
        let op = match self.peek() {
            Token::EqEq => BinaryOp::Equal,
            Token::NotEq => BinaryOp::NotEqual,
            Token::Less => BinaryOp::Less,
            Token::LessEq => BinaryOp::LessEqual,
            Token::Greater => BinaryOp::Greater,
            Token::GreaterEq => BinaryOp::GreaterEqual,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_additive()?;
        Ok(binary(op, left, right))
    }

    fn parse_additive(&mut self) -> Result<Expr, EvaluationError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Subtract,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, EvaluationError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinaryOp::Multiply,
                Token::Slash => BinaryOp::Divide,
                Token::Percent => BinaryOp::Modulo,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, EvaluationError> {
        let op = if self.eat(&Token::Bang) || self.eat_word("not") {
            UnaryOp::Not
        } else if self.eat(&Token::Minus) {
            UnaryOp::Negate
        } else {
            return self.parse_postfix();
        };
        let operand = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, EvaluationError> {
        let mut expr = self.parse_primary()?;
        loop {
            let null_safe = match self.peek() {
                Token::Dot => false,
                Token::SafeDot => true,
                Token::OpenBracket => {
                    self.advance();
                    let index = self.parse_assignment()?;
                    self.expect(&Token::CloseBracket, "']'")?;
                    expr = Expr::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                    };
                    continue;
                }
                _ => return Ok(expr),
            };
            self.advance();
            let Token::Identifier(name) = self.advance() else {
                return Err(self.error("expected property or method name"));
            };
            if self.eat(&Token::OpenParen) {
                let args = self.parse_arguments(&Token::CloseParen)?;
                expr = Expr::MethodCall {
                    target: Box::new(expr),
                    name,
                    args,
                    null_safe,
                };
            } else {
                expr = Expr::Member {
                    target: Box::new(expr),
                    name,
                    null_safe,
                };
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, EvaluationError> {
        match self.advance() {
            Token::Number(n) => Ok(Expr::Literal(Value::Number(n))),
            Token::Str(s) => Ok(Expr::Literal(Value::Text(s))),
            Token::Variable(name) => match name.as_str() {
                "this" => Ok(Expr::This),
                "root" => Ok(Expr::Root),
                other => {
                    self.position -= 1;
                    Err(self.error(&format!("unknown variable '#{other}'")))
                }
            },
            Token::Identifier(name) => match name.as_str() {
                "true" => Ok(Expr::Literal(Value::Boolean(true))),
                "false" => Ok(Expr::Literal(Value::Boolean(false))),
                "null" => Ok(Expr::Literal(Value::Null)),
                _ if self.eat(&Token::OpenParen) => {
                    let args = self.parse_arguments(&Token::CloseParen)?;
                    Ok(Expr::Call { name, args })
                }
                _ => Ok(Expr::Identifier(name)),
            },
            Token::OpenParen => {
                let inner = self.parse_assignment()?;
                self.expect(&Token::CloseParen, "')'")?;
                Ok(inner)
            }
            Token::OpenBrace => {
                let items = self.parse_arguments(&Token::CloseBrace)?;
                Ok(Expr::List(items))
            }
            Token::Eof => Err(self.error("unexpected end of expression")),
            other => {
                self.position -= 1;
                Err(self.error(&format!("unexpected token {other:?}")))
            }
        }
    }

    /// Comma separated expressions up to (and consuming) `close`
    fn parse_arguments(&mut self, close: &Token) -> Result<Vec<Expr>, EvaluationError> {
        let mut args = Vec::new();
        if self.eat(close) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_assignment()?);
            if self.eat(close) {
                return Ok(args);
            }
            self.expect(&Token::Comma, "',' or closing delimiter")?;
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn is_assignable(expr: &Expr) -> bool {
    match expr {
        Expr::Identifier(_) => true,
        Expr::Member {
            target, null_safe, ..
        } => !null_safe && is_path(target),
        Expr::Index { target, .. } => is_path(target),
        _ => false,
    }
}

fn is_path(expr: &Expr) -> bool {
    match expr {
        Expr::Identifier(_) | Expr::This | Expr::Root => true,
        Expr::Member {
            target, null_safe, ..
        } => !null_safe && is_path(target),
        Expr::Index { target, .. } => is_path(target),
        _ => false,
    }
}
