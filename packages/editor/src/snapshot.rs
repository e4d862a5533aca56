//! # Snapshots
//!
//! A snapshot is the JSON text of the content tree at one instant. Controls
//! and affordance flags are left out, so two documents with the same content
//! always capture to byte-identical snapshots whatever the edit mode.

use std::sync::Arc;

use crate::document::{Document, Element};
use crate::EditorError;

/// Immutable serialized capture of document content
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Snapshot(Arc<str>);

impl Snapshot {
    pub fn capture(doc: &Document) -> Result<Self, EditorError> {
        let json = serde_json::to_string(doc.root())?;
        Ok(Self(Arc::from(json)))
    }

    /// Wrap previously persisted text. Nothing is validated until restore.
    pub fn from_stored(text: impl Into<String>) -> Self {
        Self(Arc::from(text.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn decode(&self) -> Result<Element, EditorError> {
        Ok(serde_json::from_str(&self.0)?)
    }

    /// Replace the document content with this snapshot. Every element gets a
    /// fresh key; affordances are left for the reconciler to derive. On a
    /// decode failure the document is untouched.
    pub fn restore(&self, doc: &mut Document) -> Result<(), EditorError> {
        let root = self.decode()?;
        doc.replace_root(root);
        Ok(())
    }
}
