//! Document-level output type.

use super::{ContextBlock, Question};
use serde::{Deserialize, Serialize};

/// The reconstructed exam: ordered questions plus the context-block tree.
///
/// Built once per analysis run and treated as an immutable snapshot by
/// downstream consumers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExamDocument {
    /// Questions in document order
    pub questions: Vec<Question>,

    /// Context blocks in document order, ids contiguous from 1
    pub context_blocks: Vec<ContextBlock>,
}

impl ExamDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of questions.
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Number of context blocks.
    pub fn block_count(&self) -> usize {
        self.context_blocks.len()
    }

    /// Get a context block by id.
    pub fn get_block(&self, id: u32) -> Option<&ContextBlock> {
        self.context_blocks.iter().find(|b| b.id == id)
    }

    /// Whether the document contains no content at all.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty() && self.context_blocks.is_empty()
    }

    /// Plain text of all reading material, in document order.
    pub fn plain_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        for block in &self.context_blocks {
            if let Some(ref statement) = block.statement {
                parts.push(statement.clone());
            }
            if let Some(ref title) = block.title {
                parts.push(title.clone());
            }
            if let Some(ref paragraphs) = block.paragraphs {
                parts.extend(paragraphs.iter().cloned());
            }
            if let Some(ref subs) = block.sub_contexts {
                for sub in subs {
                    if let Some(ref title) = sub.title {
                        parts.push(title.clone());
                    }
                    parts.extend(sub.content.iter().cloned());
                }
            }
        }
        parts.join("\n\n")
    }
}
