//! Table model - tables, rows and cells
//!
//! Only the structure matters to stamping: a table owns rows, a row owns
//! cells, a cell owns block content (paragraphs and nested tables).

use crate::{Node, NodeId, NodeType};
use serde::{Deserialize, Serialize};

/// Row properties that survive row duplication
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowProperties {
    /// Repeat this row as a header on each page
    pub is_header: bool,
    /// Row height in points, if fixed
    pub height: Option<f32>,
}

/// A table containing rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    id: NodeId,
    /// IDs of child rows
    pub(crate) rows: Vec<NodeId>,
    /// Table style ID reference
    pub style_id: Option<String>,
}

impl Table {
    pub fn new() -> Self {
        Self {
            id: NodeId::new(),
            rows: Vec::new(),
            style_id: None,
        }
    }

    pub fn rows(&self) -> &[NodeId] {
        &self.rows
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for Table {
    fn id(&self) -> NodeId {
        self.id
    }

    fn node_type(&self) -> NodeType {
        NodeType::Table
    }

    fn children(&self) -> &[NodeId] {
        &self.rows
    }

    fn can_have_children(&self) -> bool {
        true
    }
}

/// A row within a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    id: NodeId,
    /// IDs of child cells
    pub(crate) cells: Vec<NodeId>,
    pub properties: RowProperties,
}

impl TableRow {
    pub fn new() -> Self {
        Self {
            id: NodeId::new(),
            cells: Vec::new(),
            properties: RowProperties::default(),
        }
    }

    pub fn cells(&self) -> &[NodeId] {
        &self.cells
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }
}

impl Default for TableRow {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for TableRow {
    fn id(&self) -> NodeId {
        self.id
    }

    fn node_type(&self) -> NodeType {
        NodeType::TableRow
    }

    fn children(&self) -> &[NodeId] {
        &self.cells
    }

    fn can_have_children(&self) -> bool {
        true
    }
}

/// A cell within a row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    id: NodeId,
    /// Block content (paragraphs, nested tables)
    pub(crate) children: Vec<NodeId>,
    /// Number of grid columns spanned
    pub grid_span: u32,
}

impl TableCell {
    pub fn new() -> Self {
        Self {
            id: NodeId::new(),
            children: Vec::new(),
            grid_span: 1,
        }
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }
}

impl Default for TableCell {
    fn default() -> Self {
        Self::new()
    }
}

impl Node for TableCell {
    fn id(&self) -> NodeId {
        self.id
    }

    fn node_type(&self) -> NodeType {
        NodeType::TableCell
    }

    fn children(&self) -> &[NodeId] {
        &self.children
    }

    fn can_have_children(&self) -> bool {
        true
    }
}
