//! Error types for the examstruct library.

use thiserror::Error;

/// Result type alias for examstruct operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during document reconstruction.
#[derive(Error, Debug)]
pub enum Error {
    /// An input fragment record is malformed (e.g. page number 0).
    #[error("Invalid fragment at offset {offset}: {reason}")]
    InvalidFragment {
        /// Document offset of the offending fragment
        offset: usize,
        /// Why the fragment was rejected
        reason: String,
    },

    /// An input image-region record is malformed.
    #[error("Invalid image region '{id}': {reason}")]
    InvalidImageRegion {
        /// Id of the offending image region
        id: String,
        /// Why the region was rejected
        reason: String,
    },

    /// The reconstructed tree failed final structural validation.
    ///
    /// This indicates a defect in the reconstruction logic itself, not a
    /// data problem, so the request fails closed.
    #[error("Structural invariant violated: {0}")]
    InvariantViolation(String),

    /// Error during rendering (JSON serialization).
    #[error("Rendering error: {0}")]
    Render(String),
}
