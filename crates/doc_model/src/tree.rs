//! Node arena and tree operations for one document part
//!
//! Nodes are stored by id in a flat arena; containers hold ordered content
//! lists of child ids. There are no parent pointers: every "who is my
//! parent" question is answered by walking down from the part root, so the
//! structure can never form reference cycles.

use crate::{
    Body, CommentAnchor, CommentId, CommentStore, DocModelError, DocNode, Marker, NodeId, NodeType, Paragraph,
    PartKind, Result, Run,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Flat storage for the nodes of one part
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeArena {
    nodes: HashMap<NodeId, DocNode>,
}

impl NodeArena {
    pub fn get(&self, id: NodeId) -> Option<&DocNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut DocNode> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn insert(&mut self, node: DocNode) -> NodeId {
        let id = node.id();
        self.nodes.insert(id, node);
        id
    }

    fn remove(&mut self, id: NodeId) -> Option<DocNode> {
        self.nodes.remove(&id)
    }
}

/// One independently stamped part of a document (body, header, footer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentPart {
    pub kind: PartKind,
    nodes: NodeArena,
    root: NodeId,
    /// Bodies of the comments anchored in this part
    pub comments: CommentStore,
}

impl DocumentPart {
    /// Create a part with an empty body
    pub fn new(kind: PartKind) -> Self {
        let mut nodes = NodeArena::default();
        let root = nodes.insert(DocNode::Body(Body::new()));
        Self {
            kind,
            nodes,
            root,
            comments: CommentStore::new(),
        }
    }

    /// Get the root (body) ID
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn arena(&self) -> &NodeArena {
        &self.nodes
    }

    pub fn get(&self, id: NodeId) -> Option<&DocNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut DocNode> {
        self.nodes.get_mut(id)
    }

    /// Whether a node is stored in this part (attached or not)
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    /// Get the node type for a given ID
    pub fn node_type(&self, id: NodeId) -> Option<NodeType> {
        self.nodes.get(id).map(DocNode::node_type)
    }

    /// Child ids of a node; empty for leaves and unknown ids
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(DocNode::children).unwrap_or(&[])
    }

    pub fn paragraph(&self, id: NodeId) -> Option<&Paragraph> {
        self.nodes.get(id).and_then(DocNode::as_paragraph)
    }

    pub fn run(&self, id: NodeId) -> Option<&Run> {
        self.nodes.get(id).and_then(DocNode::as_run)
    }

    pub fn run_mut(&mut self, id: NodeId) -> Option<&mut Run> {
        match self.nodes.get_mut(id) {
            Some(DocNode::Run(run)) => Some(run),
            _ => None,
        }
    }

    pub fn marker(&self, id: NodeId) -> Option<&Marker> {
        self.nodes.get(id).and_then(DocNode::as_marker)
    }

    pub fn marker_mut(&mut self, id: NodeId) -> Option<&mut Marker> {
        match self.nodes.get_mut(id) {
            Some(DocNode::Marker(marker)) => Some(marker),
            _ => None,
        }
    }

    /// Mutable access to a range-start, range-end or reference anchor
    pub fn comment_anchor_mut(&mut self, id: NodeId) -> Option<&mut CommentAnchor> {
        match self.nodes.get_mut(id) {
            Some(
                DocNode::CommentRangeStart(anchor)
                | DocNode::CommentRangeEnd(anchor)
                | DocNode::CommentReference(anchor),
            ) => Some(anchor),
            _ => None,
        }
    }

    /// Check a node's type, failing with a structural error otherwise
    pub fn expect_type(&self, id: NodeId, expected: NodeType) -> Result<()> {
        let found = self
            .node_type(id)
            .ok_or(DocModelError::NodeNotFound(id))?;
        if found != expected {
            return Err(DocModelError::UnexpectedNodeType {
                id,
                expected,
                found,
            });
        }
        Ok(())
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Store a node without attaching it anywhere
    pub fn add(&mut self, node: impl Into<DocNode>) -> NodeId {
        self.nodes.insert(node.into())
    }

    fn content_list_mut(&mut self, parent: NodeId) -> Result<&mut Vec<NodeId>> {
        let node = self
            .nodes
            .get_mut(parent)
            .ok_or(DocModelError::NodeNotFound(parent))?;
        let node_type = node.node_type();
        node.children_mut().ok_or_else(|| {
            DocModelError::InvalidOperation(format!("{node_type:?} nodes cannot have children"))
        })
    }

    /// Append a stored node to the end of a container's content list
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if !self.nodes.contains(child) {
            return Err(DocModelError::NodeNotFound(child));
        }
        self.content_list_mut(parent)?.push(child);
        Ok(())
    }

    /// Insert a stored node at a specific index of a container's content list
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<()> {
        if !self.nodes.contains(child) {
            return Err(DocModelError::NodeNotFound(child));
        }
        let list = self.content_list_mut(parent)?;
        if index > list.len() {
            return Err(DocModelError::InvalidOperation(format!(
                "index {index} out of bounds for content list of length {}",
                list.len()
            )));
        }
        list.insert(index, child);
        Ok(())
    }

    /// Insert a stored node right after an attached sibling
    pub fn insert_after(&mut self, sibling: NodeId, child: NodeId) -> Result<()> {
        let (parent, index) = self.require_parent(sibling)?;
        self.insert_child(parent, index + 1, child)
    }

    /// Insert a stored node right before an attached sibling
    pub fn insert_before(&mut self, sibling: NodeId, child: NodeId) -> Result<()> {
        let (parent, index) = self.require_parent(sibling)?;
        self.insert_child(parent, index, child)
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Remove a node from its parent's content list, keeping it in the arena
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        let (parent, index) = self.require_parent(id)?;
        self.content_list_mut(parent)?.remove(index);
        Ok(())
    }

    /// Detach a node and drop it together with all its descendants
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<()> {
        if id == self.root {
            return Err(DocModelError::InvalidOperation(
                "the part root cannot be removed".into(),
            ));
        }
        if !self.nodes.contains(id) {
            return Err(DocModelError::NodeNotFound(id));
        }
        if let Some((parent, index)) = self.parent_of(id) {
            self.content_list_mut(parent)?.remove(index);
        }
        for descendant in self.descendants(id) {
            self.nodes.remove(descendant);
        }
        Ok(())
    }

    /// Like [`remove_subtree`](Self::remove_subtree) but tolerates nodes that
    /// are already gone. Returns whether anything was removed.
    pub fn discard_subtree(&mut self, id: NodeId) -> bool {
        self.nodes.contains(id) && id != self.root && self.remove_subtree(id).is_ok()
    }

    /// Replace a container by its own children in its parent content list.
    /// Returns the ids of the promoted children.
    pub fn replace_with_children(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        let (parent, index) = self.require_parent(id)?;
        let node = self
            .nodes
            .remove(id)
            .ok_or(DocModelError::NodeNotFound(id))?;
        let promoted = node.children().to_vec();
        let list = self.content_list_mut(parent)?;
        list.splice(index..=index, promoted.iter().copied());
        Ok(promoted)
    }

    // =========================================================================
    // Copying
    // =========================================================================

    /// Deep copy of a subtree with fresh ids; the copy is stored but unattached
    pub fn clone_subtree(&mut self, id: NodeId) -> Result<NodeId> {
        self.clone_subtree_mapped(id).map(|(copy, _)| copy)
    }

    /// Like [`clone_subtree`](Self::clone_subtree), also returning the
    /// original-to-copy id mapping of every copied node
    pub fn clone_subtree_mapped(&mut self, id: NodeId) -> Result<(NodeId, HashMap<NodeId, NodeId>)> {
        let mut mapping = HashMap::new();
        // (original, parent of its copy)
        let mut stack: Vec<(NodeId, Option<NodeId>)> = vec![(id, None)];
        let mut copy_root = None;
        while let Some((original, copy_parent)) = stack.pop() {
            let source = self
                .nodes
                .get(original)
                .ok_or(DocModelError::NodeNotFound(original))?;
            let copy = source.duplicate_shallow();
            let children = source.children().to_vec();
            let copy_id = self.nodes.insert(copy);
            mapping.insert(original, copy_id);
            match copy_parent {
                Some(parent) => self.content_list_mut(parent)?.push(copy_id),
                None => copy_root = Some(copy_id),
            }
            stack.extend(children.into_iter().rev().map(|c| (c, Some(copy_id))));
        }
        let copy_root = copy_root.ok_or(DocModelError::NodeNotFound(id))?;
        Ok((copy_root, mapping))
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// All ids of a subtree in depth-first pre-order, the start node first
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            out.push(current);
            stack.extend(node.children().iter().rev().copied());
        }
        out
    }

    /// Find the path from the root to a node (both inclusive)
    pub fn path_to(&self, target: NodeId) -> Option<Vec<NodeId>> {
        if target == self.root {
            return Some(vec![self.root]);
        }
        let mut path = vec![self.root];
        let mut cursors = vec![0usize];
        while let Some(&node) = path.last() {
            let depth = path.len() - 1;
            let children = self.children(node);
            let cursor = cursors[depth];
            if cursor < children.len() {
                cursors[depth] += 1;
                let child = children[cursor];
                path.push(child);
                if child == target {
                    return Some(path);
                }
                cursors.push(0);
            } else {
                path.pop();
                cursors.pop();
            }
        }
        None
    }

    /// Parent id and index within the parent's content list, found by walking
    /// from the root. `None` for the root and for unattached nodes.
    pub fn parent_of(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let path = self.path_to(id)?;
        if path.len() < 2 {
            return None;
        }
        let parent = path[path.len() - 2];
        let index = self.children(parent).iter().position(|&c| c == id)?;
        Some((parent, index))
    }

    fn require_parent(&self, id: NodeId) -> Result<(NodeId, usize)> {
        if !self.nodes.contains(id) {
            return Err(DocModelError::NodeNotFound(id));
        }
        self.parent_of(id).ok_or_else(|| {
            DocModelError::TreeStructureError(format!("node {id} is not attached to the part"))
        })
    }

    /// Nearest ancestor (or the node itself) of the given type
    pub fn enclosing(&self, id: NodeId, node_type: NodeType) -> Option<NodeId> {
        let path = self.path_to(id)?;
        path.into_iter()
            .rev()
            .find(|&n| self.node_type(n) == Some(node_type))
    }

    /// Whether `id` is attached below the part root
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.path_to(id).is_some()
    }

    /// Concatenated run text beneath a node
    pub fn text_of(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.run(n))
            .map(|run| run.text.as_str())
            .collect()
    }

    /// Text of every top-level paragraph (and paragraphs in tables) in order
    pub fn paragraph_texts(&self) -> Vec<String> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&n| self.node_type(n) == Some(NodeType::Paragraph))
            .map(|p| self.text_of(p))
            .collect()
    }

    /// Ids of the anchors (start, end, reference) of a comment beneath `scope`
    pub fn comment_anchors(&self, scope: NodeId, comment: CommentId) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| {
                self.get(n)
                    .and_then(DocNode::as_comment_anchor)
                    .is_some_and(|a| a.comment == comment)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RunFormat, Table, TableCell, TableRow};

    fn part_with_paragraph(texts: &[&str]) -> (DocumentPart, NodeId) {
        let mut part = DocumentPart::new(PartKind::Main);
        let para = part.add(Paragraph::new());
        part.append_child(part.root(), para).unwrap();
        for text in texts {
            let run = part.add(Run::formatted(*text, RunFormat::new()));
            part.append_child(para, run).unwrap();
        }
        (part, para)
    }

    #[test]
    fn test_parent_of_walks_tree() {
        let (part, para) = part_with_paragraph(&["a", "b"]);
        let second = part.children(para)[1];
        assert_eq!(part.parent_of(second), Some((para, 1)));
        assert_eq!(part.parent_of(para), Some((part.root(), 0)));
        assert_eq!(part.parent_of(part.root()), None);
    }

    #[test]
    fn test_unattached_node_has_no_parent() {
        let (mut part, _) = part_with_paragraph(&["a"]);
        let loose = part.add(Run::new("loose"));
        assert!(part.contains(loose));
        assert_eq!(part.parent_of(loose), None);
        assert!(part.insert_after(loose, loose).is_err());
    }

    #[test]
    fn test_remove_subtree_drops_descendants() {
        let (mut part, para) = part_with_paragraph(&["a", "b"]);
        let runs = part.children(para).to_vec();
        part.remove_subtree(para).unwrap();
        assert!(part.children(part.root()).is_empty());
        assert!(runs.iter().all(|r| !part.contains(*r)));
        assert!(!part.discard_subtree(para));
    }

    #[test]
    fn test_replace_with_children_unwraps_marker() {
        let (mut part, para) = part_with_paragraph(&["Hello, "]);
        let marker = part.add(Marker::placeholder());
        let inner = part.add(Run::new("${name}"));
        part.append_child(marker, inner).unwrap();
        part.append_child(para, marker).unwrap();

        let promoted = part.replace_with_children(marker).unwrap();
        assert_eq!(promoted, vec![inner]);
        assert_eq!(part.children(para).len(), 2);
        assert_eq!(part.parent_of(inner), Some((para, 1)));
        assert!(!part.contains(marker));
    }

    #[test]
    fn test_clone_subtree_uses_fresh_ids() {
        let (mut part, para) = part_with_paragraph(&["x", "y"]);
        let copy = part.clone_subtree(para).unwrap();
        assert_ne!(copy, para);
        assert_eq!(part.text_of(copy), "xy");
        let originals = part.children(para).to_vec();
        assert!(part.children(copy).iter().all(|c| !originals.contains(c)));
        part.insert_after(para, copy).unwrap();
        assert_eq!(part.paragraph_texts(), vec!["xy", "xy"]);
    }

    #[test]
    fn test_clone_mapping_covers_every_node() {
        let (mut part, para) = part_with_paragraph(&["a", "b"]);
        let (copy, mapping) = part.clone_subtree_mapped(para).unwrap();
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping[&para], copy);
        let first = part.children(para)[0];
        assert_eq!(part.children(copy)[0], mapping[&first]);
    }

    #[test]
    fn test_enclosing_finds_row() {
        let mut part = DocumentPart::new(PartKind::Main);
        let table = part.add(Table::new());
        let row = part.add(TableRow::new());
        let cell = part.add(TableCell::new());
        let para = part.add(Paragraph::new());
        part.append_child(part.root(), table).unwrap();
        part.append_child(table, row).unwrap();
        part.append_child(row, cell).unwrap();
        part.append_child(cell, para).unwrap();
        assert_eq!(part.enclosing(para, NodeType::TableRow), Some(row));
        assert_eq!(part.enclosing(para, NodeType::Paragraph), Some(para));
        assert_eq!(part.enclosing(row, NodeType::TableCell), None);
    }

    #[test]
    fn test_leaf_cannot_take_children() {
        let (mut part, para) = part_with_paragraph(&["a"]);
        let run = part.children(para)[0];
        let other = part.add(Run::new("b"));
        assert!(matches!(
            part.append_child(run, other),
            Err(DocModelError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_comment_anchors_in_scope() {
        let (mut part, para) = part_with_paragraph(&["a"]);
        let start = part.add(CommentAnchor::range_start(CommentId(4)));
        let end = part.add(CommentAnchor::range_end(CommentId(4)));
        let other = part.add(CommentAnchor::range_end(CommentId(5)));
        part.insert_child(para, 0, start).unwrap();
        part.append_child(para, end).unwrap();
        part.append_child(para, other).unwrap();
        assert_eq!(part.comment_anchors(para, CommentId(4)), vec![start, end]);
        assert_eq!(part.get(start).unwrap().id(), start);
    }

    proptest::proptest! {
        #[test]
        fn prop_clone_preserves_text(texts in proptest::collection::vec("[a-z ]{0,6}", 0..8)) {
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            let (mut part, para) = part_with_paragraph(&refs);
            let copy = part.clone_subtree(para).unwrap();
            proptest::prop_assert_eq!(part.text_of(copy), texts.concat());
            proptest::prop_assert_eq!(part.descendants(copy).len(), texts.len() + 1);
            part.remove_subtree(copy).unwrap();
            proptest::prop_assert_eq!(part.arena().len(), texts.len() + 2);
        }
    }
}
