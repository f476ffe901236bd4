use serde::{Deserialize, Serialize};

/// Whether a field's original value is retrievable verbatim from the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreMode {
    Stored,
    NotStored,
}

/// How a field's value participates in search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexMode {
    NotIndexed,
    /// Indexed as a single verbatim term.
    Verbatim,
    /// Split into terms by the index analyzer.
    Tokenized,
    /// Tokenized, but without field norms (no length normalization).
    TokenizedNoNorms,
}

/// A single named field of an engine-neutral document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocField {
    pub name: String,
    pub value: String,
    pub store: StoreMode,
    pub index: IndexMode,
    pub boost: f32,
}

/// Engine-neutral document: ordered fields plus a document-level boost.
///
/// Created fresh per mapping operation and owned by that operation; field
/// order mirrors the schema declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub boost: f32,
    fields: Vec<DocField>,
}

impl Document {
    pub fn new() -> Self {
        Document {
            boost: 1.0,
            fields: Vec::new(),
        }
    }

    pub fn push(&mut self, field: DocField) {
        self.fields.push(field);
    }

    pub fn fields(&self) -> &[DocField] {
        &self.fields
    }

    /// First value for a field name, matched case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| f.value.as_str())
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}
