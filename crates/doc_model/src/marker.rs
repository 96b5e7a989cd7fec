//! Stamping markers
//!
//! A preprocessing pass wraps every inline expression and every comment
//! range-start in a marker element so the stamping engine can find them
//! structurally instead of re-scanning text.

use crate::{Node, NodeId, NodeType};
use serde::{Deserialize, Serialize};

/// Element name identifying markers produced for the stamping engine
pub const MARKER_ELEMENT: &str = "officestamper";

/// Branch key used when a marker carries no `context` attribute
pub const ROOT_CONTEXT_KEY: &str = "0";

/// The `type` attribute of a marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerKind {
    /// Wraps a comment range-start; the comment text is the expression
    Processor,
    /// Wraps inline text evaluated for its side effects only
    InlineProcessor,
    /// Wraps inline text whose value replaces it
    Placeholder,
}

impl MarkerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerKind::Processor => "processor",
            MarkerKind::InlineProcessor => "inlineProcessor",
            MarkerKind::Placeholder => "placeholder",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "processor" => Some(MarkerKind::Processor),
            "inlineProcessor" => Some(MarkerKind::InlineProcessor),
            "placeholder" => Some(MarkerKind::Placeholder),
            _ => None,
        }
    }

    /// Inline markers live inside a paragraph and wrap runs
    pub fn is_inline(&self) -> bool {
        !matches!(self, MarkerKind::Processor)
    }
}

impl std::fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structural marker wrapping an expression or a comment range-start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    id: NodeId,
    /// Element name; only [`MARKER_ELEMENT`] markers are hooks
    pub element: String,
    pub kind: MarkerKind,
    /// Context branch key the wrapped expression resolves under
    pub context: Option<String>,
    /// Wrapped content: runs for inline markers, a range-start for processors
    pub(crate) children: Vec<NodeId>,
}

impl Marker {
    pub fn new(kind: MarkerKind) -> Self {
        Self {
            id: NodeId::new(),
            element: MARKER_ELEMENT.to_string(),
            kind,
            context: None,
            children: Vec::new(),
        }
    }

    pub fn placeholder() -> Self {
        Self::new(MarkerKind::Placeholder)
    }

    pub fn inline_processor() -> Self {
        Self::new(MarkerKind::InlineProcessor)
    }

    pub fn processor() -> Self {
        Self::new(MarkerKind::Processor)
    }

    pub fn with_context(mut self, key: impl Into<String>) -> Self {
        self.context = Some(key.into());
        self
    }

    /// Whether the stamping engine should treat this marker as a hook
    pub fn is_hook(&self) -> bool {
        self.element == MARKER_ELEMENT
    }

    /// Branch key, falling back to the root branch
    pub fn context_key(&self) -> &str {
        self.context.as_deref().unwrap_or(ROOT_CONTEXT_KEY)
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }
}

impl Node for Marker {
    fn id(&self) -> NodeId {
        self.id
    }

    fn node_type(&self) -> NodeType {
        NodeType::Marker
    }

    fn children(&self) -> &[NodeId] {
        &self.children
    }

    fn can_have_children(&self) -> bool {
        true
    }
}
