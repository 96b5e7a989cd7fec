//! Comment model - anchors in the content tree plus comment bodies
//!
//! A comment is physically scattered: a range-start and a range-end bracket
//! the commented content, a reference marks where the comment is attached,
//! and the body (author, paragraphs of text) lives in the part's
//! [`CommentStore`]. Anchors of different comments may nest or interleave;
//! they are matched by [`CommentId`], never by position.

use crate::{DocNode, Node, NodeId, NodeType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier shared by the anchors and the body of one comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommentId(pub u64);

impl CommentId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CommentId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Which end of a comment an anchor marks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorKind {
    RangeStart,
    RangeEnd,
    Reference,
}

/// Zero-width node tying a position in the content to a comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentAnchor {
    id: NodeId,
    pub comment: CommentId,
    pub kind: AnchorKind,
}

impl CommentAnchor {
    pub fn range_start(comment: CommentId) -> Self {
        Self::new(comment, AnchorKind::RangeStart)
    }

    pub fn range_end(comment: CommentId) -> Self {
        Self::new(comment, AnchorKind::RangeEnd)
    }

    pub fn reference(comment: CommentId) -> Self {
        Self::new(comment, AnchorKind::Reference)
    }

    fn new(comment: CommentId, kind: AnchorKind) -> Self {
        Self {
            id: NodeId::new(),
            comment,
            kind,
        }
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }
}

impl Node for CommentAnchor {
    fn id(&self) -> NodeId {
        self.id
    }

    fn node_type(&self) -> NodeType {
        match self.kind {
            AnchorKind::RangeStart => NodeType::CommentRangeStart,
            AnchorKind::RangeEnd => NodeType::CommentRangeEnd,
            AnchorKind::Reference => NodeType::CommentReference,
        }
    }

    fn children(&self) -> &[NodeId] {
        &[]
    }
}

impl From<CommentAnchor> for DocNode {
    fn from(anchor: CommentAnchor) -> Self {
        match anchor.kind {
            AnchorKind::RangeStart => DocNode::CommentRangeStart(anchor),
            AnchorKind::RangeEnd => DocNode::CommentRangeEnd(anchor),
            AnchorKind::Reference => DocNode::CommentReference(anchor),
        }
    }
}

/// The author-supplied content of a comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentBody {
    pub author: String,
    pub created: Option<DateTime<Utc>>,
    /// Text of each paragraph of the comment
    pub paragraphs: Vec<String>,
}

impl CommentBody {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            created: Some(Utc::now()),
            paragraphs: vec![text.into()],
        }
    }

    pub fn with_paragraph(mut self, text: impl Into<String>) -> Self {
        self.paragraphs.push(text.into());
        self
    }

    /// All paragraphs joined by newlines, trimmed
    pub fn text(&self) -> String {
        self.paragraphs.join("\n").trim().to_string()
    }
}

/// Comment bodies of one document part, keyed by comment id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentStore {
    bodies: BTreeMap<CommentId, CommentBody>,
    next_id: u64,
}

impl CommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a body under a freshly allocated id
    pub fn insert(&mut self, body: CommentBody) -> CommentId {
        let id = CommentId(self.next_id);
        self.insert_with_id(id, body);
        id
    }

    /// Insert a body under an explicit id (ids coming from a loaded package)
    pub fn insert_with_id(&mut self, id: CommentId, body: CommentBody) {
        self.next_id = self.next_id.max(id.0 + 1);
        self.bodies.insert(id, body);
    }

    pub fn get(&self, id: CommentId) -> Option<&CommentBody> {
        self.bodies.get(&id)
    }

    pub fn remove(&mut self, id: CommentId) -> Option<CommentBody> {
        self.bodies.remove(&id)
    }

    pub fn contains(&self, id: CommentId) -> bool {
        self.bodies.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = CommentId> + '_ {
        self.bodies.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_allocates_after_explicit_ids() {
        let mut store = CommentStore::new();
        store.insert_with_id(CommentId(7), CommentBody::new("Alice", "a"));
        let next = store.insert(CommentBody::new("Bob", "b"));
        assert_eq!(next, CommentId(8));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_body_text_joins_paragraphs() {
        let body = CommentBody::new("Alice", "  repeatParagraph(")
            .with_paragraph("items)  ");
        assert_eq!(body.text(), "repeatParagraph(\nitems)");
    }

    #[test]
    fn test_anchor_converts_to_matching_variant() {
        let node: DocNode = CommentAnchor::range_end(CommentId(1)).into();
        assert_eq!(node.node_type(), NodeType::CommentRangeEnd);
        let node: DocNode = CommentAnchor::reference(CommentId(1)).into();
        assert_eq!(node.node_type(), NodeType::CommentReference);
    }
}
