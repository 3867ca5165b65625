//! Context block and sub-context types.
//!
//! A `ContextBlock` is either a flat unit carrying its own paragraphs and
//! images, or a parent for an ordered list of `SubContext`s. It is never
//! both: once sub-contexts exist, all content (including images) lives
//! inside them. The serialized shape follows the wire contract consumed by
//! the response-assembly layer.

use serde::{Deserialize, Serialize};

/// Content kind of a block or sub-context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Text only
    #[default]
    Text,
    /// Images only
    Image,
    /// Both text and at least one image
    Mixed,
}

impl ContentKind {
    /// Derive the kind from what a unit actually carries.
    pub fn from_content(has_text: bool, has_images: bool) -> Self {
        match (has_text, has_images) {
            (true, true) => ContentKind::Mixed,
            (false, true) => ContentKind::Image,
            _ => ContentKind::Text,
        }
    }
}

/// A nested, sequence-labeled unit inside a context block (e.g. "TEXT II"
/// with its paragraph and image). Sub-contexts never nest further.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubContext {
    /// Sequence label and ordering key (e.g. "I", "II")
    pub sequence: String,

    /// Content kind
    #[serde(rename = "type")]
    pub kind: ContentKind,

    /// Optional heading for this sub-unit
    pub title: Option<String>,

    /// Fragment texts captured under this sequence, in reading order
    pub content: Vec<String>,

    /// Image references attached to this sub-unit
    pub images: Vec<String>,
}

impl SubContext {
    /// Whether the sub-context carries any text.
    pub fn has_text(&self) -> bool {
        self.title.is_some() || self.content.iter().any(|c| !c.trim().is_empty())
    }
}

/// A top-level grouping of related reading material that one or more
/// questions reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextBlock {
    /// Unique id, assigned in document order starting at 1
    pub id: u32,

    /// Content kind
    #[serde(rename = "type")]
    pub kind: ContentKind,

    /// The "read the text below" style lead-in, when present
    pub statement: Option<String>,

    /// Optional block heading
    pub title: Option<String>,

    /// Paragraph texts; `None` when the block is pure-image or sequenced
    pub paragraphs: Option<Vec<String>>,

    /// Image references; `None` when empty or when sub-contexts exist
    pub images: Option<Vec<String>>,

    /// Ordered sub-contexts; `None` when the block is a single flat unit
    pub sub_contexts: Option<Vec<SubContext>>,
}

impl ContextBlock {
    /// Whether the block or any of its sub-contexts carries an image.
    pub fn has_images(&self) -> bool {
        if self.images.as_ref().is_some_and(|v| !v.is_empty()) {
            return true;
        }
        self.sub_contexts
            .as_ref()
            .is_some_and(|subs| subs.iter().any(|s| !s.images.is_empty()))
    }

    /// Whether the block is a flat unit (no sub-contexts).
    pub fn is_flat(&self) -> bool {
        self.sub_contexts.is_none()
    }

    /// Number of sub-contexts (0 for flat blocks).
    pub fn sub_context_count(&self) -> usize {
        self.sub_contexts.as_ref().map_or(0, |s| s.len())
    }
}
