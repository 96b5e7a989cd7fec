use super::Target;
use crate::directive::{CommitScope, DirectiveHandler, HookScope};
use crate::{EvaluationError, MethodSignature, Result, Value, ValueType};
use doc_model::{DocumentPart, NodeId};

/// Removes the hook's paragraph, table row or table when a condition fails
#[derive(Debug)]
pub struct DisplayDirective {
    scope: HookScope,
    removals: Vec<NodeId>,
}

impl DisplayDirective {
    pub fn new(scope: HookScope) -> Self {
        Self {
            scope,
            removals: Vec::new(),
        }
    }
}

impl DirectiveHandler for DisplayDirective {
    fn methods(&self) -> Vec<MethodSignature> {
        vec![
            MethodSignature::new("displayParagraphIf", vec![ValueType::Boolean]),
            MethodSignature::new("displayParagraphIfPresent", vec![ValueType::Any]),
            MethodSignature::new("displayParagraphIfAbsent", vec![ValueType::Any]),
            MethodSignature::new("displayTableRowIf", vec![ValueType::Boolean]),
            MethodSignature::new("displayTableIf", vec![ValueType::Boolean]),
        ]
    }

    fn invoke(&mut self, name: &str, args: &[Value]) -> std::result::Result<Value, EvaluationError> {
        let value = args.first().unwrap_or(&Value::Null);
        let (target, keep) = match name {
            "displayParagraphIf" => (Target::Paragraph, value.is_truthy()),
            "displayParagraphIfPresent" => (Target::Paragraph, !value.is_null()),
            "displayParagraphIfAbsent" => (Target::Paragraph, value.is_null()),
            "displayTableRowIf" => (Target::TableRow, value.is_truthy()),
            "displayTableIf" => (Target::Table, value.is_truthy()),
            _ => {
                return Err(EvaluationError::MethodNotFound {
                    name: name.to_string(),
                    arity: args.len(),
                })
            }
        };
        let node = target.locate(name, &self.scope)?;
        if !keep {
            self.removals.push(node);
        }
        Ok(Value::Null)
    }

    fn commit(&mut self, part: &mut DocumentPart, _scope: &mut CommitScope<'_>) -> Result<()> {
        for node in self.removals.drain(..) {
            part.discard_subtree(node);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.removals.clear();
    }
}
