//! Reconstruction result and data-quality warnings.

use crate::model::ExamDocument;
use thiserror::Error;

/// Non-fatal data-quality conditions observed during reconstruction.
///
/// Warnings are also emitted through the `log` facade; this list exists so
/// callers that install no logger still see them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Warning {
    /// A fragment matched no classification rule and carried no readable
    /// letters; it was kept as a plain paragraph rather than dropped.
    #[error("fragment on page {page} at offset {offset} could not be classified; kept as plain paragraph")]
    UnclassifiedFragment {
        /// Page of the fragment
        page: u32,
        /// Document offset of the fragment
        offset: usize,
    },

    /// Two answer choices of one question used the same letter; the last
    /// occurrence won.
    #[error("question {question} has duplicate alternative letter '{letter}'; last occurrence kept")]
    DuplicateAlternative {
        /// Question number
        question: u32,
        /// The repeated letter
        letter: char,
    },

    /// A question number did not increase over its predecessor.
    #[error("question {number} appears after question {previous}")]
    OutOfOrderQuestion {
        /// The offending question number
        number: u32,
        /// The preceding question number
        previous: u32,
    },

    /// A sequence marker had no following content; an empty sub-context
    /// was emitted.
    #[error("sequence marker '{label}' has no following content")]
    EmptySequenceRun {
        /// The marker label
        label: String,
    },

    /// An image found no anchor on its own page and was attached to the
    /// nearest anchor on an earlier page.
    #[error("image '{id}' on page {page} anchored across pages to page {anchor_page}")]
    CrossPageImage {
        /// Image region id
        id: String,
        /// Page of the image
        page: u32,
        /// Page of the chosen anchor
        anchor_page: u32,
    },

    /// An image matched no anchor at all and was attached to a synthetic
    /// trailing block rather than dropped.
    #[error("image '{id}' has no text anchor; attached to a trailing block")]
    OrphanImage {
        /// Image region id
        id: String,
    },
}

/// Result of one reconstruction run: the immutable document tree plus any
/// data-quality warnings observed while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconstruction {
    /// The reconstructed exam tree
    pub document: ExamDocument,

    /// Data-quality warnings, in the order they were observed
    pub warnings: Vec<Warning>,
}

impl Reconstruction {
    /// Whether any warning was recorded.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Consume the result, keeping only the document.
    pub fn into_document(self) -> ExamDocument {
        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_display() {
        let w = Warning::OrphanImage { id: "img-7".into() };
        assert_eq!(
            w.to_string(),
            "image 'img-7' has no text anchor; attached to a trailing block"
        );

        let w = Warning::DuplicateAlternative {
            question: 4,
            letter: 'b',
        };
        assert!(w.to_string().contains("question 4"));
        assert!(w.to_string().contains('b'));
    }

    #[test]
    fn test_reconstruction_accessors() {
        let r = Reconstruction {
            document: ExamDocument::new(),
            warnings: vec![Warning::OrphanImage { id: "x".into() }],
        };
        assert!(r.has_warnings());
        assert!(r.into_document().is_empty());
    }
}
