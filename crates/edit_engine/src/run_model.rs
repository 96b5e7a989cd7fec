//! Offset view over the runs of a paragraph

use crate::{EditError, Result};
use doc_model::{DocumentPart, NodeId, NodeType};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A run and the character span it occupies in the paragraph text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSpan {
    pub run: NodeId,
    /// Absolute char offset of the first character
    pub start: usize,
    /// Absolute char offset one past the last character
    pub end: usize,
}

impl RunSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether any character of the span lies inside `range`
    pub fn overlaps(&self, range: &Range<usize>) -> bool {
        self.start < range.end && self.end > range.start
    }
}

/// Snapshot of a paragraph's runs in document order with cumulative offsets.
///
/// Runs nested inside inline markers count too; other non-run children
/// (comment anchors) occupy no characters.
#[derive(Debug, Clone)]
pub struct RunModel {
    paragraph: NodeId,
    spans: Vec<RunSpan>,
    text: String,
}

impl RunModel {
    pub fn of(part: &DocumentPart, paragraph: NodeId) -> Result<Self> {
        if part.node_type(paragraph) != Some(NodeType::Paragraph) {
            return Err(EditError::ParagraphNotFound(paragraph));
        }

        let mut spans = Vec::new();
        let mut text = String::new();
        let mut offset = 0;
        for id in part.descendants(paragraph) {
            if let Some(run) = part.run(id) {
                let len = run.char_len();
                spans.push(RunSpan {
                    run: id,
                    start: offset,
                    end: offset + len,
                });
                text.push_str(&run.text);
                offset += len;
            }
        }

        Ok(Self {
            paragraph,
            spans,
            text,
        })
    }

    pub fn paragraph(&self) -> NodeId {
        self.paragraph
    }

    pub fn spans(&self) -> &[RunSpan] {
        &self.spans
    }

    /// The rendered paragraph text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the text in characters
    pub fn char_len(&self) -> usize {
        self.spans.last().map(|s| s.end).unwrap_or(0)
    }

    /// Characters in `[start, end)`, or `None` if out of bounds
    pub fn slice(&self, start: usize, end: usize) -> Option<String> {
        if start > end || end > self.char_len() {
            return None;
        }
        Some(self.text.chars().skip(start).take(end - start).collect())
    }

    /// Spans touched by a range, in document order
    pub fn runs_in(&self, range: Range<usize>) -> Vec<RunSpan> {
        self.spans
            .iter()
            .filter(|span| span.overlaps(&range))
            .copied()
            .collect()
    }

    /// Char offset of the first literal occurrence of `needle`
    pub fn find(&self, needle: &str) -> Option<usize> {
        if needle.is_empty() {
            return None;
        }
        let byte_index = self.text.find(needle)?;
        Some(self.text[..byte_index].chars().count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{CommentId, PartKind, Run};

    #[test]
    fn test_offsets_accumulate() {
        let mut part = DocumentPart::new(PartKind::Main);
        let para = part.append_text_paragraph(part.root(), &["Hel", "lo, ", "wörld"]).unwrap();
        let model = RunModel::of(&part, para).unwrap();
        let bounds: Vec<_> = model.spans().iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(bounds, vec![(0, 3), (3, 7), (7, 12)]);
        assert_eq!(model.text(), "Hello, wörld");
        assert_eq!(model.slice(7, 12).as_deref(), Some("wörld"));
        assert_eq!(model.slice(7, 13), None);
    }

    #[test]
    fn test_runs_in_range() {
        let mut part = DocumentPart::new(PartKind::Main);
        let para = part.append_text_paragraph(part.root(), &["ab", "cd", "ef"]).unwrap();
        let model = RunModel::of(&part, para).unwrap();
        assert_eq!(model.runs_in(1..3).len(), 2);
        assert_eq!(model.runs_in(2..4).len(), 1);
        assert!(model.runs_in(6..6).is_empty());
    }

    #[test]
    fn test_marker_runs_and_anchors() {
        let mut part = DocumentPart::new(PartKind::Main);
        let para = part.append_text_paragraph(part.root(), &["Hi "]).unwrap();
        part.append_comment_end(para, CommentId(1)).unwrap();
        part.append_placeholder(para, "${name}", None).unwrap();
        part.append_run(para, Run::new("!")).unwrap();
        let model = RunModel::of(&part, para).unwrap();
        assert_eq!(model.text(), "Hi ${name}!");
        assert_eq!(model.find("${name}"), Some(3));
        assert_eq!(model.find("absent"), None);
    }

    #[test]
    fn test_rejects_non_paragraph() {
        let part = DocumentPart::new(PartKind::Main);
        assert!(matches!(
            RunModel::of(&part, part.root()),
            Err(EditError::ParagraphNotFound(_))
        ));
    }
}
