//! Method signatures, injected interfaces, registered functions and the
//! per-hook invoker table that dispatches unqualified calls.

use crate::{EvaluationError, Value, ValueType};
use std::fmt;
use std::sync::Arc;

/// Name and declared parameter types of a callable
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    pub name: String,
    pub params: Vec<ValueType>,
}

impl MethodSignature {
    pub fn new(name: impl Into<String>, params: impl Into<Vec<ValueType>>) -> Self {
        Self {
            name: name.into(),
            params: params.into(),
        }
    }

    /// Same name, exact arity, every argument assignable to its parameter
    pub fn accepts(&self, name: &str, args: &[Value]) -> bool {
        self.name == name
            && self.params.len() == args.len()
            && self.params.iter().zip(args).all(|(p, a)| p.accepts(a))
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<&str> = self.params.iter().map(ValueType::as_str).collect();
        write!(f, "{}({})", self.name, params.join(", "))
    }
}

/// An implementation injected into every evaluation context
pub trait Interface: Send + Sync {
    fn methods(&self) -> Vec<MethodSignature>;

    fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, EvaluationError>;
}

type FunctionBody = dyn Fn(&[Value]) -> Result<Value, EvaluationError> + Send + Sync;

/// A named function registered with the configuration
#[derive(Clone)]
pub struct CustomFunction {
    pub signature: MethodSignature,
    body: Arc<FunctionBody>,
}

impl CustomFunction {
    pub fn new<F>(signature: MethodSignature, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, EvaluationError> + Send + Sync + 'static,
    {
        Self {
            signature,
            body: Arc::new(body),
        }
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, EvaluationError> {
        (self.body)(args)
    }
}

impl fmt::Debug for CustomFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomFunction")
            .field("signature", &self.signature)
            .finish()
    }
}

/// Registered functions, consulted in registration order
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: Vec<CustomFunction>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, params: impl Into<Vec<ValueType>>, body: F)
    where
        F: Fn(&[Value]) -> Result<Value, EvaluationError> + Send + Sync + 'static,
    {
        self.functions
            .push(CustomFunction::new(MethodSignature::new(name, params), body));
    }

    pub fn iter(&self) -> impl Iterator<Item = &CustomFunction> {
        self.functions.iter()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Where a table entry dispatches to
#[derive(Clone)]
pub enum Invoker {
    /// Index of a directive handler owned by the evaluation context
    Directive(usize),
    Interface(Arc<dyn Interface>),
    Function(CustomFunction),
}

impl fmt::Debug for Invoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invoker::Directive(i) => write!(f, "Directive({i})"),
            Invoker::Interface(_) => f.write_str("Interface"),
            Invoker::Function(func) => write!(f, "Function({})", func.signature),
        }
    }
}

/// Signature-keyed dispatch table built once per hook invocation
#[derive(Debug, Default)]
pub struct InvokerTable {
    entries: Vec<(MethodSignature, Invoker)>,
}

impl InvokerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, signature: MethodSignature, invoker: Invoker) {
        self.entries.push((signature, invoker));
    }

    /// First entry accepting the call
    pub fn find(&self, name: &str, args: &[Value]) -> Option<&Invoker> {
        self.entries
            .iter()
            .find(|(signature, _)| signature.accepts(name, args))
            .map(|(_, invoker)| invoker)
    }

    pub fn signatures(&self) -> impl Iterator<Item = &MethodSignature> {
        self.entries.iter().map(|(s, _)| s)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_matching() {
        let sig = MethodSignature::new("greet", [ValueType::Text, ValueType::Any]);
        assert!(sig.accepts("greet", &[Value::from("a"), Value::from(1)]));
        assert!(sig.accepts("greet", &[Value::Null, Value::Null]));
        assert!(!sig.accepts("greet", &[Value::from(1), Value::from(1)]));
        assert!(!sig.accepts("greet", &[Value::from("a")]));
        assert_eq!(sig.to_string(), "greet(text, any)");
    }

    #[test]
    fn test_first_match_wins() {
        let mut table = InvokerTable::new();
        table.add(MethodSignature::new("f", [ValueType::Number]), Invoker::Directive(0));
        table.add(MethodSignature::new("f", [ValueType::Any]), Invoker::Directive(1));
        assert!(matches!(table.find("f", &[Value::from(1)]), Some(Invoker::Directive(0))));
        assert!(matches!(table.find("f", &[Value::from("x")]), Some(Invoker::Directive(1))));
        assert!(table.find("f", &[]).is_none());
    }

    #[test]
    fn test_function_registry() {
        let mut registry = FunctionRegistry::new();
        registry.register("upper", [ValueType::Text], |args| {
            Ok(Value::from(args[0].to_display_string().to_uppercase()))
        });
        let func = registry.iter().next().unwrap();
        assert_eq!(func.call(&[Value::from("x")]).unwrap(), Value::from("X"));
    }
}
