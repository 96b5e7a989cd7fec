//! Union evaluation context
//!
//! Property reads and writes walk the hook's context branch innermost first,
//! asking each configured accessor in turn. Unqualified calls go through the
//! per-hook invoker table (directive handlers, interfaces, functions) and
//! then to context objects on the branch.

use crate::accessor::PropertyAccessor;
use crate::directive::{CommitScope, DirectiveHandler};
use crate::expression::{index_value, EvaluationContext, Segment};
use crate::invoker::{FunctionRegistry, Interface, Invoker, InvokerTable};
use crate::value::builtin_method;
use crate::{ContextBranch, EvaluationError, Result, Value};
use doc_model::DocumentPart;
use std::sync::Arc;

pub struct UnionContext<'a> {
    branch: ContextBranch,
    accessors: &'a [Arc<dyn PropertyAccessor>],
    table: InvokerTable,
    handlers: Vec<Box<dyn DirectiveHandler>>,
}

impl<'a> UnionContext<'a> {
    pub fn new(
        branch: ContextBranch,
        accessors: &'a [Arc<dyn PropertyAccessor>],
        handlers: Vec<Box<dyn DirectiveHandler>>,
        interfaces: &[Arc<dyn Interface>],
        functions: &FunctionRegistry,
    ) -> Self {
        let mut table = InvokerTable::new();
        for (index, handler) in handlers.iter().enumerate() {
            for signature in handler.methods() {
                table.add(signature, Invoker::Directive(index));
            }
        }
        for interface in interfaces {
            for signature in interface.methods() {
                table.add(signature, Invoker::Interface(Arc::clone(interface)));
            }
        }
        for function in functions.iter() {
            table.add(function.signature.clone(), Invoker::Function(function.clone()));
        }

        Self {
            branch,
            accessors,
            table,
            handlers,
        }
    }

    pub fn branch(&self) -> &ContextBranch {
        &self.branch
    }

    pub fn invokers(&self) -> &InvokerTable {
        &self.table
    }

    /// Let every handler apply what it recorded, then reset it
    pub fn commit(&mut self, part: &mut DocumentPart, scope: &mut CommitScope<'_>) -> Result<()> {
        for handler in &mut self.handlers {
            let committed = handler.commit(part, scope);
            handler.reset();
            committed?;
        }
        Ok(())
    }

    fn read(&self, target: &Value, name: &str) -> Option<std::result::Result<Value, EvaluationError>> {
        self.accessors
            .iter()
            .find(|a| a.can_read(target, name))
            .map(|a| a.read(target, name))
    }

    fn read_segment(&self, target: &Value, segment: &Segment) -> std::result::Result<Value, EvaluationError> {
        match segment {
            Segment::Name(name) => self
                .read(target, name)
                .unwrap_or_else(|| Err(EvaluationError::PropertyNotFound(name.clone()))),
            Segment::Index(index) => index_value(target, index),
        }
    }

    fn write_segment(
        &self,
        target: &mut Value,
        segment: &Segment,
        value: Value,
    ) -> std::result::Result<(), EvaluationError> {
        match segment {
            Segment::Name(name) => match self.accessors.iter().find(|a| a.can_write(target, name)) {
                Some(accessor) => accessor.write(target, name, value),
                None => Err(EvaluationError::PropertyNotWritable(name.clone())),
            },
            Segment::Index(index) => write_index(target, index, value),
        }
    }

    /// Write `value` at `path` below `target`.
    ///
    /// Intermediate values are read out, updated and written back; objects
    /// share state, so nothing is written back into them.
    fn write_path(
        &self,
        target: &mut Value,
        path: &[Segment],
        value: Value,
    ) -> std::result::Result<(), EvaluationError> {
        let Some((first, rest)) = path.split_first() else {
            return Ok(());
        };
        if rest.is_empty() {
            return self.write_segment(target, first, value);
        }
        let mut child = self.read_segment(target, first)?;
        self.write_path(&mut child, rest, value)?;
        if matches!(child, Value::Object(_)) {
            return Ok(());
        }
        self.write_segment(target, first, child)
    }
}

fn write_index(target: &mut Value, index: &Value, value: Value) -> std::result::Result<(), EvaluationError> {
    match (target, index) {
        (Value::List(items), Value::Number(n)) if n.fract() == 0.0 => {
            let len = items.len();
            match usize::try_from(*n as i64).ok().and_then(|i| items.get_mut(i)) {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(EvaluationError::IndexOutOfBounds {
                    index: *n as i64,
                    len,
                }),
            }
        }
        (Value::Map(entries), Value::Text(key)) => {
            entries.insert(key.clone(), value);
            Ok(())
        }
        (_, index) => Err(EvaluationError::PropertyNotWritable(format!("[{index}]"))),
    }
}

fn method_not_found(name: &str, args: &[Value]) -> EvaluationError {
    EvaluationError::MethodNotFound {
        name: name.to_string(),
        arity: args.len(),
    }
}

impl EvaluationContext for UnionContext<'_> {
    fn this(&self) -> Value {
        self.branch.leaf().borrow().clone()
    }

    fn root(&self) -> Value {
        self.branch.root().borrow().clone()
    }

    fn lookup(&self, name: &str) -> std::result::Result<Value, EvaluationError> {
        for scope in self.branch.innermost_first() {
            if let Some(result) = self.read(&scope.borrow(), name) {
                return result;
            }
        }
        Err(EvaluationError::PropertyNotFound(name.to_string()))
    }

    fn read_property(&self, target: &Value, name: &str) -> std::result::Result<Value, EvaluationError> {
        self.read(target, name)
            .unwrap_or_else(|| Err(EvaluationError::PropertyNotFound(name.to_string())))
    }

    fn assign(&mut self, path: &[Segment], value: Value) -> std::result::Result<(), EvaluationError> {
        let Some((Segment::Name(first), rest)) = path.split_first() else {
            return Err(EvaluationError::PropertyNotWritable(format!("{path:?}")));
        };

        for scope in self.branch.innermost_first() {
            let mut scope = scope.borrow_mut();
            let handles = if rest.is_empty() {
                self.accessors.iter().any(|a| a.can_write(&scope, first))
            } else {
                self.accessors.iter().any(|a| a.can_read(&scope, first))
            };
            if handles {
                return self.write_path(&mut scope, path, value);
            }
        }
        Err(EvaluationError::PropertyNotWritable(first.clone()))
    }

    fn call_function(&mut self, name: &str, args: &[Value]) -> std::result::Result<Value, EvaluationError> {
        match self.table.find(name, args).cloned() {
            Some(Invoker::Directive(index)) => match self.handlers.get_mut(index) {
                Some(handler) => handler.invoke(name, args),
                None => Err(method_not_found(name, args)),
            },
            Some(Invoker::Interface(interface)) => interface.invoke(name, args),
            Some(Invoker::Function(function)) => function.call(args),
            None => {
                for scope in self.branch.innermost_first() {
                    let object = match &*scope.borrow() {
                        Value::Object(object) => object.clone(),
                        _ => continue,
                    };
                    if let Some(result) = object.call(name, args) {
                        return result;
                    }
                }
                Err(method_not_found(name, args))
            }
        }
    }

    fn call_method(
        &mut self,
        receiver: &Value,
        name: &str,
        args: &[Value],
    ) -> std::result::Result<Value, EvaluationError> {
        if let Value::Object(object) = receiver {
            if let Some(result) = object.call(name, args) {
                return result;
            }
        }
        builtin_method(receiver, name, args).unwrap_or_else(|| Err(method_not_found(name, args)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::default_accessors;
    use crate::expression::{evaluate, parse};
    use crate::{ContextObject, MethodSignature, ValueType};
    use std::cell::RefCell;

    fn eval(ctx: &mut UnionContext<'_>, text: &str) -> std::result::Result<Value, EvaluationError> {
        evaluate(&parse(text)?, ctx)
    }

    fn context<'a>(
        accessors: &'a [Arc<dyn PropertyAccessor>],
        branch: ContextBranch,
        functions: &FunctionRegistry,
    ) -> UnionContext<'a> {
        UnionContext::new(branch, accessors, Vec::new(), &[], functions)
    }

    #[derive(Debug)]
    struct Counter {
        count: RefCell<f64>,
    }

    impl ContextObject for Counter {
        fn type_name(&self) -> &str {
            "Counter"
        }

        fn property(&self, name: &str) -> Option<Value> {
            (name == "count").then(|| Value::from(*self.count.borrow()))
        }

        fn is_writable(&self, name: &str) -> bool {
            name == "count"
        }

        fn set_property(&self, _name: &str, value: Value) -> std::result::Result<(), EvaluationError> {
            *self.count.borrow_mut() = value.as_number().unwrap_or_default();
            Ok(())
        }

        fn call(&self, name: &str, _args: &[Value]) -> Option<std::result::Result<Value, EvaluationError>> {
            (name == "label").then(|| Ok(Value::from("counter")))
        }
    }

    #[test]
    fn test_innermost_scope_wins() {
        let accessors = default_accessors();
        let branch = ContextBranch::new(Value::map([("x", "outer"), ("y", "root")]))
            .extend(Value::map([("x", "inner")]));
        let mut ctx = context(&accessors, branch, &FunctionRegistry::new());
        assert_eq!(eval(&mut ctx, "x").unwrap(), Value::from("inner"));
        assert_eq!(eval(&mut ctx, "y").unwrap(), Value::from("root"));
        assert_eq!(eval(&mut ctx, "#root.x").unwrap(), Value::from("outer"));
        assert!(matches!(
            eval(&mut ctx, "missing"),
            Err(EvaluationError::PropertyNotFound(_))
        ));
    }

    #[test]
    fn test_assignment_targets_owning_scope() {
        let accessors = default_accessors();
        let root = ContextBranch::new(Value::map([(
            "person",
            Value::map([("name", "Homer")]),
        )]));
        let branch = root.extend(Value::map([("item", 1)]));
        let mut ctx = context(&accessors, branch.clone(), &FunctionRegistry::new());

        eval(&mut ctx, "person.name = 'Marge'").unwrap();
        eval(&mut ctx, "fresh = 2").unwrap();
        assert_eq!(eval(&mut ctx, "person.name").unwrap(), Value::from("Marge"));
        // writes land in the innermost scope that can take them
        assert!(branch.leaf().borrow().as_map().unwrap().contains_key("fresh"));
        assert!(root.root().borrow().as_map().unwrap().contains_key("person"));
    }

    #[test]
    fn test_assignment_through_index_and_object() {
        let accessors = default_accessors();
        let counter = Value::object(Counter {
            count: RefCell::new(0.0),
        });
        let branch = ContextBranch::new(Value::map([
            ("items", Value::from(vec![1, 2])),
            ("counter", counter),
        ]));
        let mut ctx = context(&accessors, branch, &FunctionRegistry::new());
        eval(&mut ctx, "items[1] = 5").unwrap();
        eval(&mut ctx, "counter.count = 3").unwrap();
        assert_eq!(eval(&mut ctx, "items[1]").unwrap(), Value::from(5));
        assert_eq!(eval(&mut ctx, "counter.count").unwrap(), Value::from(3));
        assert!(matches!(
            eval(&mut ctx, "items[7] = 1"),
            Err(EvaluationError::IndexOutOfBounds { index: 7, len: 2 })
        ));
    }

    #[test]
    fn test_write_to_read_only_scope_fails() {
        let accessors = default_accessors();
        let branch = ContextBranch::new(Value::from("text"));
        let mut ctx = context(&accessors, branch, &FunctionRegistry::new());
        assert!(matches!(
            eval(&mut ctx, "x = 1"),
            Err(EvaluationError::PropertyNotWritable(_))
        ));
    }

    #[test]
    fn test_call_resolution_order() {
        let accessors = default_accessors();
        let mut functions = FunctionRegistry::new();
        functions.register("label", Vec::<ValueType>::new(), |_| Ok(Value::from("function")));
        functions.register("shout", vec![ValueType::Text], |args| {
            Ok(Value::from(args[0].to_display_string().to_uppercase()))
        });
        let branch = ContextBranch::new(Value::object(Counter {
            count: RefCell::new(0.0),
        }));
        let mut ctx = context(&accessors, branch, &functions);

        assert_eq!(eval(&mut ctx, "label()").unwrap(), Value::from("function"));
        assert_eq!(eval(&mut ctx, "shout('hi')").unwrap(), Value::from("HI"));
        assert_eq!(eval(&mut ctx, "#this.label()").unwrap(), Value::from("counter"));
        assert!(matches!(
            eval(&mut ctx, "shout(1)"),
            Err(EvaluationError::MethodNotFound { .. })
        ));
    }

    #[test]
    fn test_context_object_offered_unmatched_calls() {
        let accessors = default_accessors();
        let branch = ContextBranch::new(Value::object(Counter {
            count: RefCell::new(0.0),
        }));
        let mut ctx = context(&accessors, branch, &FunctionRegistry::new());
        assert_eq!(eval(&mut ctx, "label()").unwrap(), Value::from("counter"));
    }

    struct Greeter;

    impl Interface for Greeter {
        fn methods(&self) -> Vec<MethodSignature> {
            vec![MethodSignature::new("greet", vec![ValueType::Text])]
        }

        fn invoke(&self, _name: &str, args: &[Value]) -> std::result::Result<Value, EvaluationError> {
            Ok(Value::from(format!("Hello, {}", args[0])))
        }
    }

    #[test]
    fn test_interface_methods_in_table() {
        let accessors = default_accessors();
        let interfaces: Vec<Arc<dyn Interface>> = vec![Arc::new(Greeter)];
        let mut ctx = UnionContext::new(
            ContextBranch::new(Value::map([("name", "Bart")])),
            &accessors,
            Vec::new(),
            &interfaces,
            &FunctionRegistry::new(),
        );
        assert_eq!(ctx.invokers().len(), 1);
        assert_eq!(eval(&mut ctx, "greet(name)").unwrap(), Value::from("Hello, Bart"));
    }
}
