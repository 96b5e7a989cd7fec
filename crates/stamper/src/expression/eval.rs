//! Tree-walking evaluator
//!
//! Name resolution, property access and calls are delegated to an
//! [`EvaluationContext`]; the evaluator itself only knows operators.

use super::ast::{BinaryOp, Expr, Segment, UnaryOp};
use crate::value::list_get;
use crate::{EvaluationError, Value};
use std::cmp::Ordering;

/// The surface an expression is evaluated against
pub trait EvaluationContext {
    /// Value of the innermost scope (`#this`)
    fn this(&self) -> Value;

    /// Value of the outermost scope (`#root`)
    fn root(&self) -> Value;

    /// Resolve a bare identifier
    fn lookup(&self, name: &str) -> Result<Value, EvaluationError>;

    fn read_property(&self, target: &Value, name: &str) -> Result<Value, EvaluationError>;

    /// Assign through a path whose first segment is a bare name
    fn assign(&mut self, path: &[Segment], value: Value) -> Result<(), EvaluationError>;

    /// Unqualified call `name(args)`
    fn call_function(&mut self, name: &str, args: &[Value]) -> Result<Value, EvaluationError>;

    /// Receiver call `receiver.name(args)`
    fn call_method(
        &mut self,
        receiver: &Value,
        name: &str,
        args: &[Value],
    ) -> Result<Value, EvaluationError>;
}

/// Evaluate a parsed expression
pub fn evaluate(expr: &Expr, ctx: &mut dyn EvaluationContext) -> Result<Value, EvaluationError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Identifier(name) => ctx.lookup(name),
        Expr::This => Ok(ctx.this()),
        Expr::Root => Ok(ctx.root()),
        Expr::Member {
            target,
            name,
            null_safe,
        } => {
            let target = evaluate(target, ctx)?;
            if *null_safe && target.is_null() {
                return Ok(Value::Null);
            }
            ctx.read_property(&target, name)
        }
        Expr::Index { target, index } => {
            let target = evaluate(target, ctx)?;
            let index = evaluate(index, ctx)?;
            index_value(&target, &index)
        }
        Expr::Call { name, args } => {
            let args = evaluate_all(args, ctx)?;
            ctx.call_function(name, &args)
        }
        Expr::MethodCall {
            target,
            name,
            args,
            null_safe,
        } => {
            let receiver = evaluate(target, ctx)?;
            if *null_safe && receiver.is_null() {
                return Ok(Value::Null);
            }
            let args = evaluate_all(args, ctx)?;
            ctx.call_method(&receiver, name, &args)
        }
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, ctx)?;
            match op {
                UnaryOp::Not => Ok(Value::Boolean(!value.is_truthy())),
                UnaryOp::Negate => match value {
                    Value::Number(n) => Ok(Value::Number(-n)),
                    other => Err(EvaluationError::type_mismatch("number", other.type_name())),
                },
            }
        }
        Expr::Binary { op, left, right } => match op {
            BinaryOp::And => {
                let left = evaluate(left, ctx)?;
                if !left.is_truthy() {
                    return Ok(Value::Boolean(false));
                }
                Ok(Value::Boolean(evaluate(right, ctx)?.is_truthy()))
            }
            BinaryOp::Or => {
                let left = evaluate(left, ctx)?;
                if left.is_truthy() {
                    return Ok(Value::Boolean(true));
                }
                Ok(Value::Boolean(evaluate(right, ctx)?.is_truthy()))
            }
            _ => {
                let left = evaluate(left, ctx)?;
                let right = evaluate(right, ctx)?;
                apply_binary(*op, left, right)
            }
        },
        Expr::Ternary {
            condition,
            then,
            otherwise,
        } => {
            if evaluate(condition, ctx)?.is_truthy() {
                evaluate(then, ctx)
            } else {
                evaluate(otherwise, ctx)
            }
        }
        Expr::Elvis { value, fallback } => {
            let value = evaluate(value, ctx)?;
            match &value {
                Value::Null => evaluate(fallback, ctx),
                Value::Text(s) if s.is_empty() => evaluate(fallback, ctx),
                _ => Ok(value),
            }
        }
        Expr::Assign { target, value } => {
            let value = evaluate(value, ctx)?;
            let path = assignment_path(target, ctx)?;
            ctx.assign(&path, value.clone())?;
            Ok(value)
        }
        Expr::List(items) => Ok(Value::List(evaluate_all(items, ctx)?)),
    }
}

fn evaluate_all(
    exprs: &[Expr],
    ctx: &mut dyn EvaluationContext,
) -> Result<Vec<Value>, EvaluationError> {
    exprs.iter().map(|e| evaluate(e, ctx)).collect()
}

/// Flatten an assignment target into a path rooted at a bare name
fn assignment_path(
    target: &Expr,
    ctx: &mut dyn EvaluationContext,
) -> Result<Vec<Segment>, EvaluationError> {
    match target {
        Expr::Identifier(name) => Ok(vec![Segment::Name(name.clone())]),
        Expr::Member { target, name, .. } => {
            let mut path = assignment_path(target, ctx)?;
            path.push(Segment::Name(name.clone()));
            Ok(path)
        }
        Expr::Index { target, index } => {
            let index = evaluate(index, ctx)?;
            let mut path = assignment_path(target, ctx)?;
            path.push(Segment::Index(index));
            Ok(path)
        }
        _ => Err(EvaluationError::PropertyNotWritable(format!("{target:?}"))),
    }
}

/// `target[index]` on lists, maps and text
pub fn index_value(target: &Value, index: &Value) -> Result<Value, EvaluationError> {
    match target {
        Value::List(items) => list_get(items, index),
        Value::Map(entries) => Ok(entries
            .get(&index.to_display_string())
            .cloned()
            .unwrap_or(Value::Null)),
        Value::Text(s) => {
            let chars: Vec<char> = s.chars().collect();
            let items: Vec<Value> = chars.iter().map(|c| Value::Text(c.to_string())).collect();
            list_get(&items, index)
        }
        other => Err(EvaluationError::type_mismatch("list or map", other.type_name())),
    }
}

fn apply_binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvaluationError> {
    match op {
        BinaryOp::Equal => Ok(Value::Boolean(values_equal(&left, &right))),
        BinaryOp::NotEqual => Ok(Value::Boolean(!values_equal(&left, &right))),
        BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => {
            let ordering = compare(&left, &right)?;
            Ok(Value::Boolean(match op {
                BinaryOp::Less => ordering == Ordering::Less,
                BinaryOp::LessEqual => ordering != Ordering::Greater,
                BinaryOp::Greater => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        BinaryOp::Add => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::List(mut a), Value::List(b)) => {
                a.extend(b);
                Ok(Value::List(a))
            }
            (l @ Value::Text(_), r) | (l, r @ Value::Text(_)) => Ok(Value::Text(format!(
                "{}{}",
                l.to_display_string(),
                r.to_display_string()
            ))),
            (l, r) => Err(EvaluationError::type_mismatch(
                "numbers or text",
                format!("{} + {}", l.type_name(), r.type_name()),
            )),
        },
        BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo => {
            let (Value::Number(a), Value::Number(b)) = (&left, &right) else {
                return Err(EvaluationError::type_mismatch(
                    "number",
                    format!("{} and {}", left.type_name(), right.type_name()),
                ));
            };
            match op {
                BinaryOp::Subtract => Ok(Value::Number(a - b)),
                BinaryOp::Multiply => Ok(Value::Number(a * b)),
                _ if *b == 0.0 => Err(EvaluationError::Arithmetic("division by zero".into())),
                BinaryOp::Divide => Ok(Value::Number(a / b)),
                _ => Ok(Value::Number(a % b)),
            }
        }
        BinaryOp::And | BinaryOp::Or => Ok(Value::Boolean(match op {
            BinaryOp::And => left.is_truthy() && right.is_truthy(),
            _ => left.is_truthy() || right.is_truthy(),
        })),
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    left == right
}

fn compare(left: &Value, right: &Value) -> Result<Ordering, EvaluationError> {
    let ordering = match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
        _ => None,
    };
    ordering.ok_or_else(|| {
        EvaluationError::type_mismatch(
            "comparable values",
            format!("{} and {}", left.type_name(), right.type_name()),
        )
    })
}
