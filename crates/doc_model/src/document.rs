//! Document root - the collection of parts a template is made of

use crate::DocumentPart;
use serde::{Deserialize, Serialize};

/// Document metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub created: Option<String>,
    pub modified: Option<String>,
}

/// Which story of the document a part holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartKind {
    Main,
    /// Header, numbered by section
    Header(u32),
    /// Footer, numbered by section
    Footer(u32),
    Footnotes,
    Endnotes,
}

impl PartKind {
    pub fn name(&self) -> String {
        match self {
            PartKind::Main => "document".to_string(),
            PartKind::Header(n) => format!("header{n}"),
            PartKind::Footer(n) => format!("footer{n}"),
            PartKind::Footnotes => "footnotes".to_string(),
            PartKind::Endnotes => "endnotes".to_string(),
        }
    }
}

impl std::fmt::Display for PartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

/// A template or stamped document: the main part plus headers and footers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub metadata: DocumentMetadata,
    parts: Vec<DocumentPart>,
}

impl Document {
    /// Create a document with an empty main part
    pub fn new() -> Self {
        Self {
            metadata: DocumentMetadata::default(),
            parts: vec![DocumentPart::new(PartKind::Main)],
        }
    }

    pub fn main(&self) -> &DocumentPart {
        &self.parts[0]
    }

    pub fn main_mut(&mut self) -> &mut DocumentPart {
        &mut self.parts[0]
    }

    /// Add a part, returning its index. A second main part replaces nothing;
    /// parts are stamped in insertion order.
    pub fn add_part(&mut self, part: DocumentPart) -> usize {
        self.parts.push(part);
        self.parts.len() - 1
    }

    pub fn part(&self, kind: PartKind) -> Option<&DocumentPart> {
        self.parts.iter().find(|p| p.kind == kind)
    }

    pub fn part_mut(&mut self, kind: PartKind) -> Option<&mut DocumentPart> {
        self.parts.iter_mut().find(|p| p.kind == kind)
    }

    pub fn parts(&self) -> &[DocumentPart] {
        &self.parts
    }

    pub fn parts_mut(&mut self) -> &mut [DocumentPart] {
        &mut self.parts
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_has_main_part() {
        let doc = Document::new();
        assert_eq!(doc.parts().len(), 1);
        assert_eq!(doc.main().kind, PartKind::Main);
    }

    #[test]
    fn test_lookup_header_part() {
        let mut doc = Document::new();
        doc.add_part(DocumentPart::new(PartKind::Header(1)));
        assert!(doc.part(PartKind::Header(1)).is_some());
        assert!(doc.part(PartKind::Footer(1)).is_none());
        assert_eq!(PartKind::Header(1).to_string(), "header1");
    }
}
