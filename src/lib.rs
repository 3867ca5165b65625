//! # examstruct
//!
//! Structured exam reconstruction from raw document-layout/OCR output.
//!
//! This library consumes the flat output of an external layout-analysis
//! service for a scanned exam — positioned text fragments plus extracted
//! image regions — and rebuilds the hierarchical structure: ordered
//! context blocks, nested sequence-labeled sub-contexts, and questions
//! with their answer choices, each linked back to the block that supplies
//! its reading material.
//!
//! ## Quick Start
//!
//! ```no_run
//! use examstruct::{reconstruct, render};
//!
//! fn main() -> examstruct::Result<()> {
//!     let fragments = vec![/* from the layout service */];
//!     let images = vec![/* extracted figure regions */];
//!
//!     let result = reconstruct(fragments, images)?;
//!     for warning in &result.warnings {
//!         eprintln!("data quality: {warning}");
//!     }
//!
//!     let json = render::to_json(&result.document, render::JsonFormat::Pretty)?;
//!     println!("{json}");
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! Six stages run strictly sequentially: fragment classification, question
//! extraction, block assembly, sub-context sequencing, figure association
//! and context–question linking. The whole pipeline is a pure function
//! over its inputs: no I/O, no shared state, deterministic output.

pub mod error;
pub mod model;
pub mod pipeline;
pub mod render;

// Re-export commonly used types
pub use error::{Error, Result};
pub use model::{
    Alternative, BoundingBox, ClassifiedFragment, ContentKind, ContextBlock, ExamDocument,
    Fragment, FragmentRole, ImageRegion, Point, Question, SubContext,
};
pub use pipeline::{
    AnchorCandidate, AnchorPolicy, FigureAssociator, FragmentClassifier, NearestPreceding,
    Reconstruction, ReconstructOptions, Warning,
};
pub use render::JsonFormat;

/// Reconstruct the exam structure from raw layout output.
///
/// # Arguments
///
/// * `fragments` - Positioned text fragments from the layout service
/// * `images` - Extracted figure regions with opaque payload references
///
/// # Returns
///
/// The reconstructed document tree plus any data-quality warnings, or an
/// error if the inputs are malformed or the tree fails final validation.
pub fn reconstruct(
    fragments: Vec<Fragment>,
    images: Vec<ImageRegion>,
) -> Result<Reconstruction> {
    reconstruct_with_options(fragments, images, ReconstructOptions::default())
}

/// Reconstruct with custom options.
///
/// # Example
///
/// ```no_run
/// use examstruct::{reconstruct_with_options, ReconstructOptions};
///
/// let options = ReconstructOptions::new().with_dedup(false);
/// let result = reconstruct_with_options(vec![], vec![], options).unwrap();
/// ```
pub fn reconstruct_with_options(
    fragments: Vec<Fragment>,
    images: Vec<ImageRegion>,
    options: ReconstructOptions,
) -> Result<Reconstruction> {
    Reconstructor::new().with_options(options).run(fragments, images)
}

/// Builder for configuring a reconstruction run.
///
/// # Example
///
/// ```no_run
/// use examstruct::Reconstructor;
///
/// let result = Reconstructor::new()
///     .with_normalization(false)
///     .with_title_max_len(60)
///     .run(vec![], vec![])?;
/// # Ok::<(), examstruct::Error>(())
/// ```
pub struct Reconstructor {
    options: ReconstructOptions,
    associator: FigureAssociator,
}

impl Reconstructor {
    /// Create a new builder with default options and the default
    /// nearest-preceding anchor policy.
    pub fn new() -> Self {
        Self {
            options: ReconstructOptions::default(),
            associator: FigureAssociator::default(),
        }
    }

    /// Replace all options at once.
    pub fn with_options(mut self, options: ReconstructOptions) -> Self {
        self.options = options;
        self
    }

    /// Enable or disable NFC normalization of fragment text.
    pub fn with_normalization(mut self, normalize: bool) -> Self {
        self.options = self.options.with_normalization(normalize);
        self
    }

    /// Enable or disable merging of structurally identical blocks.
    pub fn with_dedup(mut self, dedup: bool) -> Self {
        self.options = self.options.with_dedup(dedup);
        self
    }

    /// Set the maximum length for the title heuristic.
    pub fn with_title_max_len(mut self, len: usize) -> Self {
        self.options = self.options.with_title_max_len(len);
        self
    }

    /// Inject a custom anchor-selection policy for figure association.
    pub fn with_anchor_policy(mut self, policy: Box<dyn AnchorPolicy>) -> Self {
        self.associator = FigureAssociator::new(policy);
        self
    }

    /// Run the pipeline.
    pub fn run(
        &self,
        fragments: Vec<Fragment>,
        images: Vec<ImageRegion>,
    ) -> Result<Reconstruction> {
        pipeline::run_pipeline(fragments, images, &self.options, &self.associator)
    }
}

impl Default for Reconstructor {
    fn default() -> Self {
        Self::new()
    }
}
