//! Directive handlers - stateful objects whose methods are callable from
//! expressions and which change the document structure.
//!
//! A fresh handler is created from its factory for every hook invocation.
//! During evaluation a handler only records what it was asked to do; the
//! document is changed in [`DirectiveHandler::commit`] once the expression
//! has evaluated successfully.

use crate::discovery::CommentRecord;
use crate::{ContextTree, EvaluationError, MethodSignature, Result, Value};
use doc_model::{
    AnchorKind, CommentId, DocNode, DocumentPart, Marker, MarkerKind, NodeId, NodeType, PartKind,
};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Where the hook being evaluated sits in the document
#[derive(Debug, Clone)]
pub struct HookScope {
    pub part: PartKind,
    /// The hook's marker, or its range-start for bare comments
    pub node: NodeId,
    /// Paragraph holding the marker or comment start
    pub paragraph: Option<NodeId>,
    /// Table row around that paragraph
    pub row: Option<NodeId>,
    /// Table around that paragraph
    pub table: Option<NodeId>,
    /// Comment the hook came from, if any
    pub comment: Option<CommentRecord>,
    pub context_key: String,
}

impl HookScope {
    /// Scope of a hook rooted at `node`, locating its enclosing structures
    pub fn locate(
        part: &DocumentPart,
        node: NodeId,
        comment: Option<CommentRecord>,
        context_key: &str,
    ) -> Self {
        let anchor = comment.as_ref().map(|c| c.start).unwrap_or(node);
        let paragraph = part.enclosing(anchor, NodeType::Paragraph);
        Self {
            part: part.kind,
            node,
            paragraph,
            row: part.enclosing(anchor, NodeType::TableRow),
            table: part.enclosing(anchor, NodeType::Table),
            comment,
            context_key: context_key.to_string(),
        }
    }
}

pub trait DirectiveHandler {
    /// Methods exposed to expressions
    fn methods(&self) -> Vec<MethodSignature>;

    /// Record a call; arguments already match one of [`methods`](Self::methods)
    fn invoke(&mut self, name: &str, args: &[Value]) -> std::result::Result<Value, EvaluationError>;

    /// Apply recorded changes to the document
    fn commit(&mut self, part: &mut DocumentPart, scope: &mut CommitScope<'_>) -> Result<()>;

    /// Drop recorded state
    fn reset(&mut self) {}
}

type Factory = dyn Fn(&HookScope) -> Box<dyn DirectiveHandler> + Send + Sync;

/// Factories keyed by interface name, instantiated in registration order
#[derive(Clone, Default)]
pub struct DirectiveRegistry {
    factories: Vec<(String, Arc<Factory>)>,
}

impl DirectiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the factory for an interface
    pub fn register<F>(&mut self, interface: impl Into<String>, factory: F)
    where
        F: Fn(&HookScope) -> Box<dyn DirectiveHandler> + Send + Sync + 'static,
    {
        let interface = interface.into();
        let factory: Arc<Factory> = Arc::new(factory);
        match self.factories.iter_mut().find(|(name, _)| *name == interface) {
            Some(entry) => entry.1 = factory,
            None => self.factories.push((interface, factory)),
        }
    }

    /// One fresh handler per registered interface
    pub fn instantiate(&self, scope: &HookScope) -> Vec<Box<dyn DirectiveHandler>> {
        self.factories.iter().map(|(_, factory)| factory(scope)).collect()
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &str> {
        self.factories.iter().map(|(name, _)| name.as_str())
    }

    pub fn contains(&self, interface: &str) -> bool {
        self.factories.iter().any(|(name, _)| name == interface)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for DirectiveRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.interfaces()).finish()
    }
}

/// What a handler may touch besides the document while committing
pub struct CommitScope<'a> {
    tree: &'a mut ContextTree,
    hook: &'a HookScope,
}

impl<'a> CommitScope<'a> {
    pub fn new(tree: &'a mut ContextTree, hook: &'a HookScope) -> Self {
        Self { tree, hook }
    }

    pub fn hook(&self) -> &HookScope {
        self.hook
    }

    /// Register a `[root, item]` branch and return its key
    pub fn add_branch(&mut self, item: Value) -> String {
        self.tree.add_branch(item)
    }

    /// Copy `original`, attach the copy right after `after` and bind it to a
    /// new branch for `item`.
    ///
    /// In the copy, the originating hook's marker and comment anchors are
    /// dropped, other comments get fresh ids, and every hook marker is tagged
    /// with the new branch key.
    pub fn insert_copy_for_item(
        &mut self,
        part: &mut DocumentPart,
        original: NodeId,
        after: NodeId,
        item: Value,
    ) -> Result<NodeId> {
        let key = self.add_branch(item);
        let (copy, mapping) = part.clone_subtree_mapped(original)?;
        part.insert_after(after, copy)?;

        for origin in self.origin_nodes() {
            if let Some(&copied) = mapping.get(&origin) {
                part.discard_subtree(copied);
            }
        }
        renumber_comments(part, copy);
        tag_markers(part, copy, &key)?;
        Ok(copy)
    }

    fn origin_nodes(&self) -> Vec<NodeId> {
        let mut nodes = vec![self.hook.node];
        if let Some(comment) = &self.hook.comment {
            nodes.push(comment.start);
            nodes.push(comment.end);
            nodes.extend(comment.reference);
        }
        nodes
    }
}

/// Give every comment whose whole range lies in a copied subtree its own id
/// and body.
///
/// Anchors of comments that only partly lie in the subtree are dropped from
/// the copy, together with a processor marker wrapping their start; the
/// comment stays with the original content.
fn renumber_comments(part: &mut DocumentPart, subtree: NodeId) {
    let anchors: Vec<(NodeId, CommentId, AnchorKind)> = part
        .descendants(subtree)
        .into_iter()
        .filter_map(|n| {
            part.get(n)
                .and_then(DocNode::as_comment_anchor)
                .map(|a| (n, a.comment, a.kind))
        })
        .collect();
    let has = |id: CommentId, kind: AnchorKind| anchors.iter().any(|a| a.1 == id && a.2 == kind);
    let ids: BTreeSet<CommentId> = anchors.iter().map(|a| a.1).collect();

    let mut renamed = HashMap::new();
    let mut partial = BTreeSet::new();
    for id in ids {
        if !(has(id, AnchorKind::RangeStart) && has(id, AnchorKind::RangeEnd)) {
            partial.insert(id);
        } else if let Some(body) = part.comments.get(id).cloned() {
            renamed.insert(id, part.comments.insert(body));
        }
    }

    for (anchor_id, comment, _) in anchors {
        if partial.contains(&comment) {
            let wrapper = part
                .parent_of(anchor_id)
                .map(|(parent, _)| parent)
                .filter(|&parent| {
                    part.marker(parent)
                        .is_some_and(|m| m.is_hook() && m.kind == MarkerKind::Processor)
                });
            debug!(comment = %comment, "dropping partly copied comment anchor");
            part.discard_subtree(wrapper.unwrap_or(anchor_id));
        } else if let Some(anchor) = part.comment_anchor_mut(anchor_id) {
            if let Some(&fresh) = renamed.get(&anchor.comment) {
                anchor.comment = fresh;
            }
        }
    }
}

/// Bind every hook in a subtree to a branch key.
///
/// Bare comment range-starts are wrapped in a processor marker first so the
/// key has somewhere to live.
fn tag_markers(part: &mut DocumentPart, subtree: NodeId, key: &str) -> Result<()> {
    for node in part.descendants(subtree) {
        match part.node_type(node) {
            Some(NodeType::Marker) => {
                if let Some(marker) = part.marker_mut(node) {
                    if marker.is_hook() {
                        marker.context = Some(key.to_string());
                    }
                }
            }
            Some(NodeType::CommentRangeStart) => {
                let wrapped = part
                    .parent_of(node)
                    .and_then(|(parent, _)| part.marker(parent))
                    .is_some_and(|m| m.is_hook() && m.kind == MarkerKind::Processor);
                if !wrapped {
                    let wrapper = part.add(Marker::processor().with_context(key));
                    part.insert_before(node, wrapper)?;
                    part.detach(node)?;
                    part.append_child(wrapper, node)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}
