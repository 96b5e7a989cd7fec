//! Core node trait and types

use crate::{
    Body, CommentAnchor, Marker, NodeId, Paragraph, Run, Table, TableCell, TableRow,
};
use serde::{Deserialize, Serialize};

/// Enumeration of all node types in the document tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Body,
    Paragraph,
    Run,
    Table,
    TableRow,
    TableCell,
    Marker,
    CommentRangeStart,
    CommentRangeEnd,
    CommentReference,
}

/// Common interface for all document nodes.
///
/// Nodes know their children but never their parent; parent discovery is a
/// walk from the part root (see [`crate::DocumentPart::parent_of`]).
pub trait Node: std::fmt::Debug {
    /// Get the unique ID of this node
    fn id(&self) -> NodeId;

    /// Get the type of this node
    fn node_type(&self) -> NodeType;

    /// Get the IDs of child nodes
    fn children(&self) -> &[NodeId];

    /// Check if this node can have children
    fn can_have_children(&self) -> bool {
        false
    }

    /// Get the text content of this node (if any)
    fn text_content(&self) -> Option<&str> {
        None
    }
}

/// A node stored in a part's arena
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum DocNode {
    Body(Body),
    Paragraph(Paragraph),
    Run(Run),
    Table(Table),
    TableRow(TableRow),
    TableCell(TableCell),
    Marker(Marker),
    CommentRangeStart(CommentAnchor),
    CommentRangeEnd(CommentAnchor),
    CommentReference(CommentAnchor),
}

impl DocNode {
    fn as_node(&self) -> &dyn Node {
        match self {
            DocNode::Body(n) => n,
            DocNode::Paragraph(n) => n,
            DocNode::Run(n) => n,
            DocNode::Table(n) => n,
            DocNode::TableRow(n) => n,
            DocNode::TableCell(n) => n,
            DocNode::Marker(n) => n,
            DocNode::CommentRangeStart(n)
            | DocNode::CommentRangeEnd(n)
            | DocNode::CommentReference(n) => n,
        }
    }

    pub fn id(&self) -> NodeId {
        self.as_node().id()
    }

    pub fn node_type(&self) -> NodeType {
        self.as_node().node_type()
    }

    pub fn children(&self) -> &[NodeId] {
        self.as_node().children()
    }

    pub fn can_have_children(&self) -> bool {
        self.as_node().can_have_children()
    }

    pub fn text_content(&self) -> Option<&str> {
        self.as_node().text_content()
    }

    /// Mutable access to the content list of container nodes
    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            DocNode::Body(n) => Some(&mut n.children),
            DocNode::Paragraph(n) => Some(&mut n.children),
            DocNode::Table(n) => Some(&mut n.rows),
            DocNode::TableRow(n) => Some(&mut n.cells),
            DocNode::TableCell(n) => Some(&mut n.children),
            DocNode::Marker(n) => Some(&mut n.children),
            DocNode::Run(_)
            | DocNode::CommentRangeStart(_)
            | DocNode::CommentRangeEnd(_)
            | DocNode::CommentReference(_) => None,
        }
    }

    /// Shallow copy with a fresh id and an empty content list
    pub(crate) fn duplicate_shallow(&self) -> DocNode {
        let mut copy = self.clone();
        let id = NodeId::new();
        match &mut copy {
            DocNode::Body(n) => n.set_id(id),
            DocNode::Paragraph(n) => n.set_id(id),
            DocNode::Run(n) => n.set_id(id),
            DocNode::Table(n) => n.set_id(id),
            DocNode::TableRow(n) => n.set_id(id),
            DocNode::TableCell(n) => n.set_id(id),
            DocNode::Marker(n) => n.set_id(id),
            DocNode::CommentRangeStart(n)
            | DocNode::CommentRangeEnd(n)
            | DocNode::CommentReference(n) => n.set_id(id),
        }
        if let Some(children) = copy.children_mut() {
            children.clear();
        }
        copy
    }

    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            DocNode::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_run(&self) -> Option<&Run> {
        match self {
            DocNode::Run(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_marker(&self) -> Option<&Marker> {
        match self {
            DocNode::Marker(m) => Some(m),
            _ => None,
        }
    }

    /// The comment anchor carried by range-start, range-end and reference nodes
    pub fn as_comment_anchor(&self) -> Option<&CommentAnchor> {
        match self {
            DocNode::CommentRangeStart(a)
            | DocNode::CommentRangeEnd(a)
            | DocNode::CommentReference(a) => Some(a),
            _ => None,
        }
    }
}

impl From<Paragraph> for DocNode {
    fn from(p: Paragraph) -> Self {
        DocNode::Paragraph(p)
    }
}

impl From<Run> for DocNode {
    fn from(r: Run) -> Self {
        DocNode::Run(r)
    }
}

impl From<Table> for DocNode {
    fn from(t: Table) -> Self {
        DocNode::Table(t)
    }
}

impl From<TableRow> for DocNode {
    fn from(r: TableRow) -> Self {
        DocNode::TableRow(r)
    }
}

impl From<TableCell> for DocNode {
    fn from(c: TableCell) -> Self {
        DocNode::TableCell(c)
    }
}

impl From<Marker> for DocNode {
    fn from(m: Marker) -> Self {
        DocNode::Marker(m)
    }
}
