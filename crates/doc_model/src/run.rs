//! Text run node - a contiguous span of text with consistent formatting

use crate::{Node, NodeId, NodeType};
use serde::{Deserialize, Serialize};

/// Formatting descriptor shared by every character of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunFormat {
    /// Character style ID reference (e.g., "Emphasis")
    pub style_id: Option<String>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub strikethrough: Option<bool>,
    /// Font family override
    pub font_family: Option<String>,
    /// Font size in points override
    pub font_size: Option<f32>,
    /// Text color (CSS color string)
    pub color: Option<String>,
    /// Highlight/background color (CSS color string)
    pub highlight: Option<String>,
}

impl RunFormat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bold() -> Self {
        Self {
            bold: Some(true),
            ..Default::default()
        }
    }

    pub fn italic() -> Self {
        Self {
            italic: Some(true),
            ..Default::default()
        }
    }

    pub fn with_style(mut self, style_id: impl Into<String>) -> Self {
        self.style_id = Some(style_id.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_font(mut self, family: impl Into<String>, size: f32) -> Self {
        self.font_family = Some(family.into());
        self.font_size = Some(size);
        self
    }

    /// Check if no property is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A text run - contiguous text with consistent formatting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    id: NodeId,
    /// The text content of this run
    pub text: String,
    /// Formatting descriptor; `None` means the run has not been given one yet
    /// and adopts the formatting of whatever run it replaces
    pub format: Option<RunFormat>,
}

impl Run {
    /// Create an unformatted run
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            text: text.into(),
            format: None,
        }
    }

    /// Create a run carrying an explicit formatting descriptor
    pub fn formatted(text: impl Into<String>, format: RunFormat) -> Self {
        Self {
            id: NodeId::new(),
            text: text.into(),
            format: Some(format),
        }
    }

    /// Copy of this run with a fresh id and different text, same formatting
    pub fn fragment(&self, text: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            text: text.into(),
            format: self.format.clone(),
        }
    }

    /// Length in characters (offsets inside paragraphs are char based)
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Check if this run is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }
}

impl Node for Run {
    fn id(&self) -> NodeId {
        self.id
    }

    fn node_type(&self) -> NodeType {
        NodeType::Run
    }

    fn children(&self) -> &[NodeId] {
        &[]
    }

    fn text_content(&self) -> Option<&str> {
        Some(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_keeps_format() {
        let run = Run::formatted("Hello", RunFormat::bold().with_color("#ff0000"));
        let fragment = run.fragment("He");
        assert_ne!(fragment.id(), run.id());
        assert_eq!(fragment.format, run.format);
        assert_eq!(fragment.text, "He");
    }

    #[test]
    fn test_char_len_counts_chars() {
        assert_eq!(Run::new("héllo").char_len(), 5);
        assert!(Run::new("").is_empty());
    }

    #[test]
    fn test_format_is_empty() {
        assert!(RunFormat::new().is_empty());
        assert!(!RunFormat::italic().is_empty());
    }
}
