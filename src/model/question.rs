//! Question and answer-choice types.

use serde::{Deserialize, Serialize};

/// One answer choice of a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    /// Single lowercase letter, unique within its question
    pub letter: char,

    /// Choice text
    pub text: String,
}

impl Alternative {
    /// Create a new alternative.
    pub fn new(letter: char, text: impl Into<String>) -> Self {
        Self {
            letter,
            text: text.into(),
        }
    }
}

/// A reconstructed exam question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Question number, unique and increasing in document order
    pub number: u32,

    /// Statement text; may be empty only for purely image-driven questions
    #[serde(rename = "question")]
    pub statement: String,

    /// Answer choices in letter order as encountered; empty for open-ended
    pub alternatives: Vec<Alternative>,

    /// Whether the question's reading context carries an image
    #[serde(rename = "hasImage")]
    pub has_image: bool,

    /// Id of the `ContextBlock` supplying this question's reading material
    pub context_id: Option<u32>,
}

impl Question {
    /// Create a new question with no choices and no context link.
    pub fn new(number: u32, statement: impl Into<String>) -> Self {
        Self {
            number,
            statement: statement.into(),
            alternatives: Vec::new(),
            has_image: false,
            context_id: None,
        }
    }

    /// Whether the question has no answer choices (open-ended).
    pub fn is_open_ended(&self) -> bool {
        self.alternatives.is_empty()
    }

    /// Look up an alternative by letter.
    pub fn alternative(&self, letter: char) -> Option<&Alternative> {
        self.alternatives.iter().find(|a| a.letter == letter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_new() {
        let q = Question::new(3, "What is the theme of the text?");
        assert_eq!(q.number, 3);
        assert!(q.is_open_ended());
        assert!(!q.has_image);
        assert!(q.context_id.is_none());
    }

    #[test]
    fn test_alternative_lookup() {
        let mut q = Question::new(1, "Pick one.");
        q.alternatives.push(Alternative::new('a', "first"));
        q.alternatives.push(Alternative::new('b', "second"));

        assert_eq!(q.alternative('b').unwrap().text, "second");
        assert!(q.alternative('c').is_none());
        assert!(!q.is_open_ended());
    }

    #[test]
    fn test_question_serialized_field_names() {
        let q = Question::new(1, "Stem");
        let json = serde_json::to_string(&q).unwrap();
        assert!(json.contains("\"question\":\"Stem\""));
        assert!(json.contains("\"hasImage\":false"));
        assert!(json.contains("\"context_id\":null"));
        assert!(!json.contains("\"statement\""));
    }
}
