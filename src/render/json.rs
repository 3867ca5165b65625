//! JSON rendering for reconstructed exam documents.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::ExamDocument;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize a document to JSON text in the wire-contract shape.
pub fn to_json(document: &ExamDocument, format: JsonFormat) -> Result<String> {
    let out = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(document),
        JsonFormat::Compact => serde_json::to_string(document),
    };
    out.map_err(|e| Error::Render(format!("JSON serialization error: {e}")))
}

/// Serialize a document to an in-memory JSON tree.
///
/// Useful for callers that post-process or inspect the contract shape
/// before emitting text.
pub fn to_json_value(document: &ExamDocument) -> Result<Value> {
    serde_json::to_value(document).map_err(|e| Error::Render(format!("JSON serialization error: {e}")))
}
