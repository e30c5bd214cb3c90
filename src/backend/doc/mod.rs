/**
 * Document Collaborator Surface
 *
 * The editing engine itself is an external collaborator; this module
 * models the slice of it the session layer consumes: part geometry and
 * document kind, plus the per-document broker that owns all sessions of
 * one document behind one document-scoped lock.
 *
 * # Module Structure
 *
 * ```
 * doc/
 * ├── mod.rs   - DocumentAccessor trait, DocumentKind, DocumentInfo
 * └── state.rs - DocumentBroker and DocumentRegistry
 * ```
 */
use serde::{Deserialize, Serialize};

/// Per-document session registry and callback fan-out
pub mod state;

pub use state::{DocumentBroker, DocumentRegistry};

/// What the session layer needs to know about a document.
///
/// Flowed-text documents render everything as a single logical part, so
/// implementations collapse parts for them.
pub trait DocumentAccessor {
    /// The part currently shown to this document's views.
    fn current_part(&self) -> i32;
    /// Number of parts (sheets, slides; 1 for text).
    fn part_count(&self) -> i32;
    /// Whether this is a flowed-text document.
    fn is_text_document(&self) -> bool;
}

/// Document kind, as far as part semantics are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Text,
    Spreadsheet,
    Presentation,
    Drawing,
}

impl DocumentKind {
    /// Wire-protocol label of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Text => "text",
            DocumentKind::Spreadsheet => "spreadsheet",
            DocumentKind::Presentation => "presentation",
            DocumentKind::Drawing => "drawing",
        }
    }

    /// Infer the kind from a document name's extension. Unknown extensions
    /// default to text.
    pub fn from_name(name: &str) -> Self {
        match name.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
            Some("ods") | Some("xlsx") | Some("csv") => DocumentKind::Spreadsheet,
            Some("odp") | Some("pptx") => DocumentKind::Presentation,
            Some("odg") => DocumentKind::Drawing,
            _ => DocumentKind::Text,
        }
    }
}

/// Snapshot of the engine-side document state the session layer reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub kind: DocumentKind,
    current_part: i32,
    part_count: i32,
}

impl DocumentInfo {
    pub fn new(kind: DocumentKind) -> Self {
        Self {
            kind,
            current_part: 0,
            part_count: 1,
        }
    }

    pub fn set_current_part(&mut self, part: i32) {
        self.current_part = part.max(0);
    }

    pub fn set_part_count(&mut self, count: i32) {
        self.part_count = count.max(1);
    }
}

impl DocumentAccessor for DocumentInfo {
    fn current_part(&self) -> i32 {
        if self.is_text_document() {
            0
        } else {
            self.current_part
        }
    }

    fn part_count(&self) -> i32 {
        if self.is_text_document() {
            1
        } else {
            self.part_count
        }
    }

    fn is_text_document(&self) -> bool {
        self.kind == DocumentKind::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_name() {
        assert_eq!(DocumentKind::from_name("budget.ods"), DocumentKind::Spreadsheet);
        assert_eq!(DocumentKind::from_name("deck.odp"), DocumentKind::Presentation);
        assert_eq!(DocumentKind::from_name("notes.odt"), DocumentKind::Text);
        assert_eq!(DocumentKind::from_name("no-extension"), DocumentKind::Text);
    }

    #[test]
    fn test_text_documents_collapse_parts() {
        let mut info = DocumentInfo::new(DocumentKind::Text);
        info.set_current_part(5);
        info.set_part_count(12);
        assert_eq!(info.current_part(), 0);
        assert_eq!(info.part_count(), 1);
    }

    #[test]
    fn test_spreadsheet_keeps_parts() {
        let mut info = DocumentInfo::new(DocumentKind::Spreadsheet);
        info.set_current_part(2);
        info.set_part_count(3);
        assert_eq!(info.current_part(), 2);
        assert_eq!(info.part_count(), 3);
    }

    #[test]
    fn test_part_count_never_below_one() {
        let mut info = DocumentInfo::new(DocumentKind::Presentation);
        info.set_part_count(0);
        assert_eq!(info.part_count(), 1);
    }
}
