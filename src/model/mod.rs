//! Data model for exam structure reconstruction.
//!
//! Input types (`Fragment`, `ImageRegion`) mirror the records of the
//! external layout/OCR service; output types (`Question`, `ContextBlock`,
//! `SubContext`, `ExamDocument`) form the immutable tree handed to the
//! response-assembly layer. The serialized shape of the output types is
//! the wire contract.

mod context;
mod document;
mod fragment;
mod question;

pub use context::{ContentKind, ContextBlock, SubContext};
pub use document::ExamDocument;
pub use fragment::{
    BoundingBox, ClassifiedFragment, Fragment, FragmentRole, ImageRegion, Point,
};
pub use question::{Alternative, Question};
