//! Input types: positioned text fragments and extracted image regions.
//!
//! These mirror the records produced by the external layout/OCR
//! collaborator. Position metadata is only used for its page and vertical
//! extent; the `offset` field preserves reading order within the full
//! concatenated text.

use serde::{Deserialize, Serialize};

/// A 2D point in page coordinates (origin top-left, y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position
    pub x: f32,
    /// Vertical position
    pub y: f32,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An ordered polygon bounding a text fragment or image region.
///
/// Only the vertical extent is consulted by the reconstruction pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Polygon vertices in drawing order
    pub points: Vec<Point>,
}

impl BoundingBox {
    /// Create a bounding box from polygon vertices.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Create a rectangular bounding box from its corner coordinates.
    pub fn from_rect(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            points: vec![
                Point::new(left, top),
                Point::new(right, top),
                Point::new(right, bottom),
                Point::new(left, bottom),
            ],
        }
    }

    /// Topmost Y coordinate (smallest, since y grows downward).
    pub fn top(&self) -> f32 {
        self.points
            .iter()
            .map(|p| p.y)
            .fold(f32::INFINITY, f32::min)
    }

    /// Bottommost Y coordinate (largest).
    pub fn bottom(&self) -> f32 {
        self.points
            .iter()
            .map(|p| p.y)
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// Vertical center of the polygon.
    pub fn vertical_center(&self) -> f32 {
        (self.top() + self.bottom()) / 2.0
    }

    /// Vertical extent (height) of the polygon.
    pub fn height(&self) -> f32 {
        if self.points.is_empty() {
            0.0
        } else {
            self.bottom() - self.top()
        }
    }

    /// Whether the polygon has no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One unit of extracted text with position metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// The extracted text content
    pub text: String,

    /// Page number (1-indexed)
    pub page: u32,

    /// Polygon bounding the text on the page
    pub bounding_box: BoundingBox,

    /// Position in the full concatenated document text
    pub offset: usize,
}

impl Fragment {
    /// Create a new fragment.
    pub fn new(text: impl Into<String>, page: u32, bounding_box: BoundingBox, offset: usize) -> Self {
        Self {
            text: text.into(),
            page,
            bounding_box,
            offset,
        }
    }

    /// Whether the fragment carries no visible text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Role assigned to a fragment by the classifier (closed tag set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum FragmentRole {
    /// Opens a question ("QUESTION 5", "5.", "5)")
    QuestionStem {
        /// Question number captured from the prefix
        number: u32,
        /// Remainder of the fragment after the prefix
        lead: String,
    },

    /// An answer choice ("a) ...")
    AnswerChoice {
        /// Choice letter, lowercased
        letter: char,
        /// Choice text after the letter delimiter
        text: String,
    },

    /// Opens a labeled sub-unit within a block ("TEXT I")
    SequenceMarker {
        /// Normalized sequence label (e.g. "I", "II")
        label: String,
        /// Remainder of the fragment after the marker
        lead: String,
    },

    /// A "read the text below" style lead-in
    InstructionalStatement,

    /// A short heading for a block or sub-unit
    Title,

    /// Ordinary reading-material text (also the fallback role)
    PlainParagraph,
}

impl FragmentRole {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            FragmentRole::QuestionStem { .. } => "question_stem",
            FragmentRole::AnswerChoice { .. } => "answer_choice",
            FragmentRole::SequenceMarker { .. } => "sequence_marker",
            FragmentRole::InstructionalStatement => "instructional_statement",
            FragmentRole::Title => "title",
            FragmentRole::PlainParagraph => "plain_paragraph",
        }
    }
}

/// A fragment together with its assigned role. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedFragment {
    /// The raw fragment
    pub fragment: Fragment,

    /// Role assigned by the classifier
    pub role: FragmentRole,
}

impl ClassifiedFragment {
    /// Create a classified fragment.
    pub fn new(fragment: Fragment, role: FragmentRole) -> Self {
        Self { fragment, role }
    }
}

/// One extracted figure region.
///
/// The payload is an opaque, externally-resolvable handle; raw image bytes
/// never enter this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRegion {
    /// Stable identifier within the request
    pub id: String,

    /// Page number (1-indexed)
    pub page: u32,

    /// Polygon bounding the figure on the page
    pub bounding_box: BoundingBox,

    /// Opaque handle/URL supplied by the external storage collaborator
    pub payload_ref: String,
}

impl ImageRegion {
    /// Create a new image region.
    pub fn new(
        id: impl Into<String>,
        page: u32,
        bounding_box: BoundingBox,
        payload_ref: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            page,
            bounding_box,
            payload_ref: payload_ref.into(),
        }
    }
}
