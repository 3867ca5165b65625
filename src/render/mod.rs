//! Rendering module for serializing reconstructed documents.

mod json;

pub use json::{to_json, to_json_value, JsonFormat};
