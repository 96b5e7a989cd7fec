//! Expression language used inside placeholders and comments
//!
//! A small SpEL-like language: literals, property paths with null-safe
//! navigation, indexing, calls, arithmetic, comparisons, logic, ternary and
//! Elvis operators, assignment and inline lists.

mod ast;
mod eval;
mod parser;
mod tokenizer;

pub use ast::{BinaryOp, Expr, Segment, UnaryOp};
pub use eval::{evaluate, index_value, EvaluationContext};
pub use parser::parse;
