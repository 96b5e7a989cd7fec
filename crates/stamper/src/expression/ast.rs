//! Expression syntax tree

use crate::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// Bare name, resolved against the branch innermost first
    Identifier(String),
    /// `#this`, the innermost scope
    This,
    /// `#root`, the outermost scope
    Root,
    Member {
        target: Box<Expr>,
        name: String,
        null_safe: bool,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    /// Unqualified call: directives, interfaces, functions, context objects
    Call {
        name: String,
        args: Vec<Expr>,
    },
    MethodCall {
        target: Box<Expr>,
        name: String,
        args: Vec<Expr>,
        null_safe: bool,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Ternary {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// `value ?: fallback`
    Elvis {
        value: Box<Expr>,
        fallback: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    /// Inline list `{a, b, c}`
    List(Vec<Expr>),
}

/// One step of an assignment target path
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Name(String),
    Index(Value),
}
