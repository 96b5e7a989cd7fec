//! Paragraph and body nodes - block containers

use crate::{Node, NodeId, NodeType};
use serde::{Deserialize, Serialize};

/// Text alignment options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// A paragraph containing runs, inline markers and comment anchors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    id: NodeId,
    /// IDs of child nodes in document order
    pub(crate) children: Vec<NodeId>,
    /// Paragraph style ID reference
    pub style_id: Option<String>,
    pub alignment: Option<Alignment>,
}

impl Paragraph {
    /// Create a new empty paragraph
    pub fn new() -> Self {
        Self {
            id: NodeId::new(),
            children: Vec::new(),
            style_id: None,
            alignment: None,
        }
    }

    /// Create a paragraph with a paragraph style ID
    pub fn with_style(style_id: impl Into<String>) -> Self {
        Self {
            style_id: Some(style_id.into()),
            ..Self::new()
        }
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }
}

impl Default for Paragraph {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for Paragraph {
    fn id(&self) -> NodeId {
        self.id
    }

    fn node_type(&self) -> NodeType {
        NodeType::Paragraph
    }

    fn children(&self) -> &[NodeId] {
        &self.children
    }

    fn can_have_children(&self) -> bool {
        true
    }
}

/// Root container of a document part (body, header, footer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    id: NodeId,
    /// IDs of top-level block children (paragraphs, tables)
    pub(crate) children: Vec<NodeId>,
}

impl Body {
    pub fn new() -> Self {
        Self {
            id: NodeId::new(),
            children: Vec::new(),
        }
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for Body {
    fn id(&self) -> NodeId {
        self.id
    }

    fn node_type(&self) -> NodeType {
        NodeType::Body
    }

    fn children(&self) -> &[NodeId] {
        &self.children
    }

    fn can_have_children(&self) -> bool {
        true
    }
}
