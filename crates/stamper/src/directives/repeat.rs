use super::Target;
use crate::directive::{CommitScope, DirectiveHandler, HookScope};
use crate::{EvaluationError, MethodSignature, Result, Value, ValueType};
use doc_model::{DocumentPart, NodeId};
use tracing::debug;

/// Copies the hook's paragraph or table row once per list item.
///
/// Each copy evaluates against its own `[root, item]` branch; the original
/// is removed, so an empty list removes the content.
#[derive(Debug)]
pub struct RepeatDirective {
    scope: HookScope,
    pending: Vec<(NodeId, Vec<Value>)>,
}

impl RepeatDirective {
    pub fn new(scope: HookScope) -> Self {
        Self {
            scope,
            pending: Vec::new(),
        }
    }
}

impl DirectiveHandler for RepeatDirective {
    fn methods(&self) -> Vec<MethodSignature> {
        vec![
            MethodSignature::new("repeatParagraph", vec![ValueType::List]),
            MethodSignature::new("repeatTableRow", vec![ValueType::List]),
        ]
    }

    fn invoke(&mut self, name: &str, args: &[Value]) -> std::result::Result<Value, EvaluationError> {
        let target = match name {
            "repeatParagraph" => Target::Paragraph,
            "repeatTableRow" => Target::TableRow,
            _ => {
                return Err(EvaluationError::MethodNotFound {
                    name: name.to_string(),
                    arity: args.len(),
                })
            }
        };
        let node = target.locate(name, &self.scope)?;
        let items = args
            .first()
            .and_then(Value::as_list)
            .map(<[Value]>::to_vec)
            .unwrap_or_default();
        self.pending.push((node, items));
        Ok(Value::Null)
    }

    fn commit(&mut self, part: &mut DocumentPart, scope: &mut CommitScope<'_>) -> Result<()> {
        for (original, items) in self.pending.drain(..) {
            if !part.contains(original) {
                debug!(%original, "repeated content already removed");
                continue;
            }
            let mut last = original;
            for item in items {
                last = scope.insert_copy_for_item(part, original, last, item)?;
            }
            part.remove_subtree(original)?;
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.pending.clear();
    }
}
