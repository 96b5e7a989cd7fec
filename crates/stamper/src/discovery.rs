//! Marker discovery - turning a document part into an ordered hook list
//!
//! Hooks come from stamping markers (placeholders, inline processors and
//! processor-wrapped comment starts) and from bare comment range-starts.
//! Comments are paired in one forward scan with an explicit stack of open
//! comment ids, so nesting depth never touches the call stack.

use crate::hook::{CommentHook, ExpressionHook, Hook};
use crate::{Result, StampError};
use doc_model::{
    AnchorKind, CommentId, DocNode, DocumentPart, MarkerKind, NodeId, NodeType, ROOT_CONTEXT_KEY,
};
use std::collections::{HashMap, HashSet};

/// A paired comment: its anchors and its place among nested comments
#[derive(Debug, Clone, PartialEq)]
pub struct CommentRecord {
    pub id: CommentId,
    pub start: NodeId,
    pub end: NodeId,
    pub reference: Option<NodeId>,
    /// Comment that was innermost-open when this one started
    pub parent: Option<CommentId>,
    /// Comments opened while this one was innermost-open
    pub children: Vec<CommentId>,
}

struct OpenComment {
    start: NodeId,
    end: Option<NodeId>,
    reference: Option<NodeId>,
    parent: Option<CommentId>,
    children: Vec<CommentId>,
}

/// Pair every comment range-start of a part with its range-end and reference.
///
/// A range-end closes the open comment with the same id wherever it sits on
/// the open stack. Unpaired anchors make the document malformed.
pub fn collect_comments(part: &DocumentPart) -> Result<HashMap<CommentId, CommentRecord>> {
    let mut open_stack: Vec<CommentId> = Vec::new();
    let mut comments: HashMap<CommentId, OpenComment> = HashMap::new();

    for node_id in part.descendants(part.root()) {
        let Some(anchor) = part.get(node_id).and_then(DocNode::as_comment_anchor) else {
            continue;
        };
        let id = anchor.comment;
        match anchor.kind {
            AnchorKind::RangeStart => {
                if comments.contains_key(&id) {
                    return Err(StampError::MalformedDocument(format!(
                        "comment {id} has more than one range-start"
                    )));
                }
                let parent = open_stack.last().copied();
                if let Some(parent) = parent.and_then(|p| comments.get_mut(&p)) {
                    parent.children.push(id);
                }
                comments.insert(
                    id,
                    OpenComment {
                        start: node_id,
                        end: None,
                        reference: None,
                        parent,
                        children: Vec::new(),
                    },
                );
                open_stack.push(id);
            }
            AnchorKind::RangeEnd => {
                let Some(index) = open_stack.iter().rposition(|&open| open == id) else {
                    return Err(StampError::MalformedDocument(format!(
                        "range-end for comment {id} has no open range-start"
                    )));
                };
                open_stack.remove(index);
                if let Some(comment) = comments.get_mut(&id) {
                    comment.end = Some(node_id);
                }
            }
            AnchorKind::Reference => {
                // References to comments anchored elsewhere are ignored
                if let Some(comment) = comments.get_mut(&id) {
                    comment.reference = Some(node_id);
                }
            }
        }
    }

    if let Some(unclosed) = open_stack.first() {
        return Err(StampError::MalformedDocument(format!(
            "range-start for comment {unclosed} is never closed"
        )));
    }

    let mut records = HashMap::with_capacity(comments.len());
    for (id, comment) in comments {
        let end = comment.end.ok_or_else(|| {
            StampError::MalformedDocument(format!("comment {id} has no range-end"))
        })?;
        records.insert(
            id,
            CommentRecord {
                id,
                start: comment.start,
                end,
                reference: comment.reference,
                parent: comment.parent,
                children: comment.children,
            },
        );
    }
    Ok(records)
}

/// Resettable sequence of the hooks of a part, in document order
#[derive(Debug, Clone, Default)]
pub struct HookIterator {
    hooks: Vec<Hook>,
    position: usize,
}

impl HookIterator {
    /// Traverse the part depth-first, pre-order, and build its hooks
    pub fn collect(part: &DocumentPart) -> Result<Self> {
        Ok(Self {
            hooks: discover_hooks(part)?,
            position: 0,
        })
    }

    /// Re-derive the hooks from the current document and rewind
    pub fn reset(&mut self, part: &DocumentPart) -> Result<()> {
        self.hooks = discover_hooks(part)?;
        self.position = 0;
        Ok(())
    }

    pub fn hooks(&self) -> &[Hook] {
        &self.hooks
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl Iterator for HookIterator {
    type Item = Hook;

    fn next(&mut self) -> Option<Hook> {
        let hook = self.hooks.get(self.position).cloned()?;
        self.position += 1;
        Some(hook)
    }
}

fn discover_hooks(part: &DocumentPart) -> Result<Vec<Hook>> {
    let comments = collect_comments(part)?;
    let mut wrapped_starts: HashSet<NodeId> = HashSet::new();
    let mut hooks = Vec::new();

    for node_id in part.descendants(part.root()) {
        match part.get(node_id) {
            Some(DocNode::Marker(marker)) if marker.is_hook() => match marker.kind {
                MarkerKind::Placeholder | MarkerKind::InlineProcessor => {
                    let paragraph = part.enclosing(node_id, NodeType::Paragraph).ok_or_else(|| {
                        StampError::MalformedDocument(format!(
                            "inline marker {node_id} is not inside a paragraph"
                        ))
                    })?;
                    hooks.push(Hook::Expression(ExpressionHook::new(
                        node_id,
                        marker.kind,
                        paragraph,
                        marker.context_key(),
                    )));
                }
                MarkerKind::Processor => {
                    let start = part
                        .children(node_id)
                        .iter()
                        .copied()
                        .find(|&c| part.node_type(c) == Some(NodeType::CommentRangeStart))
                        .ok_or_else(|| {
                            StampError::MalformedDocument(format!(
                                "processor marker {node_id} wraps no comment range-start"
                            ))
                        })?;
                    wrapped_starts.insert(start);
                    let hook = comment_hook(part, &comments, start, Some(node_id), marker.context_key())?;
                    hooks.push(hook);
                }
            },
            Some(DocNode::CommentRangeStart(_)) if !wrapped_starts.contains(&node_id) => {
                let hook = comment_hook(part, &comments, node_id, None, ROOT_CONTEXT_KEY)?;
                hooks.push(hook);
            }
            _ => {}
        }
    }
    Ok(hooks)
}

fn comment_hook(
    part: &DocumentPart,
    comments: &HashMap<CommentId, CommentRecord>,
    start: NodeId,
    marker: Option<NodeId>,
    context_key: &str,
) -> Result<Hook> {
    let id = part
        .get(start)
        .and_then(DocNode::as_comment_anchor)
        .map(|a| a.comment)
        .ok_or_else(|| StampError::MalformedDocument(format!("node {start} is not a range-start")))?;
    let record = comments
        .get(&id)
        .cloned()
        .ok_or_else(|| StampError::MalformedDocument(format!("comment {id} was not paired")))?;
    if !part.comments.contains(id) {
        return Err(StampError::MalformedDocument(format!(
            "comment {id} has no body"
        )));
    }
    Ok(Hook::Comment(CommentHook::new(
        record,
        marker,
        part.enclosing(start, NodeType::Paragraph),
        context_key,
    )))
}
