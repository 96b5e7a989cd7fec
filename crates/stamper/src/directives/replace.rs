use super::Target;
use crate::directive::{CommitScope, DirectiveHandler, HookScope};
use crate::{EvaluationError, MethodSignature, Result, Value, ValueType};
use doc_model::{DocumentPart, NodeId, Run};
use edit_engine::RunSplicer;

/// Replaces the text a comment spans with a value's display string
#[derive(Debug)]
pub struct ReplaceDirective {
    scope: HookScope,
    replacement: Option<String>,
}

impl ReplaceDirective {
    pub fn new(scope: HookScope) -> Self {
        Self {
            scope,
            replacement: None,
        }
    }
}

/// Character offsets of the commented range within its start paragraph.
/// A range ending in a later paragraph runs to the end of this one.
fn commented_range(part: &DocumentPart, paragraph: NodeId, start: NodeId, end: NodeId) -> (usize, usize) {
    let mut offset = 0;
    let mut from = None;
    let mut to = None;
    for node in part.descendants(paragraph) {
        if node == start {
            from = Some(offset);
        } else if node == end {
            to = Some(offset);
        } else if let Some(run) = part.run(node) {
            offset += run.char_len();
        }
    }
    let from = from.unwrap_or(0);
    (from, to.unwrap_or(offset).max(from))
}

impl DirectiveHandler for ReplaceDirective {
    fn methods(&self) -> Vec<MethodSignature> {
        vec![MethodSignature::new("replaceWordWith", vec![ValueType::Text])]
    }

    fn invoke(&mut self, name: &str, args: &[Value]) -> std::result::Result<Value, EvaluationError> {
        if name != "replaceWordWith" {
            return Err(EvaluationError::MethodNotFound {
                name: name.to_string(),
                arity: args.len(),
            });
        }
        Target::Paragraph.locate(name, &self.scope)?;
        if self.scope.comment.is_none() {
            return Err(EvaluationError::Directive(format!(
                "{name} must be attached to a comment"
            )));
        }
        let text = args.first().map(Value::to_display_string).unwrap_or_default();
        self.replacement = Some(text);
        Ok(Value::Null)
    }

    fn commit(&mut self, part: &mut DocumentPart, _scope: &mut CommitScope<'_>) -> Result<()> {
        let (Some(text), Some(paragraph), Some(comment)) =
            (self.replacement.take(), self.scope.paragraph, self.scope.comment.as_ref())
        else {
            return Ok(());
        };
        if !part.contains(paragraph) {
            return Ok(());
        }
        let (start, end) = commented_range(part, paragraph, comment.start, comment.end);
        let runs = if text.is_empty() {
            Vec::new()
        } else {
            vec![Run::new(text)]
        };
        // An empty range is left alone by the splicer
        RunSplicer::replace_range(part, paragraph, start, end, runs)?;
        Ok(())
    }

    fn reset(&mut self) {
        self.replacement = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{CommentBody, PartKind};

    #[test]
    fn test_commented_range_offsets() {
        let mut part = DocumentPart::new(PartKind::Main);
        let para = part.append_text_paragraph(part.root(), &["Hello "]).unwrap();
        let (id, marker) = part
            .append_comment_start(para, CommentBody::new("a", "replaceWordWith('x')"))
            .unwrap();
        part.append_run(para, Run::new("World")).unwrap();
        let end = part.append_comment_end(para, id).unwrap();
        part.append_run(para, Run::new("!")).unwrap();
        let start = part.children(marker)[0];
        assert_eq!(commented_range(&part, para, start, end), (6, 11));
    }
}
