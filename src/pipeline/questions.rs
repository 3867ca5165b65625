//! Question extractor (stage 2).
//!
//! Scans classified fragments in document order, folding stems, statement
//! continuations and answer choices into `QuestionDraft`s. Fragments that
//! belong to reading material instead of questions flow through to the
//! block assembler untouched.

use crate::model::{Alternative, ClassifiedFragment, FragmentRole};
use crate::pipeline::Warning;

/// A question under construction, carrying the stem's document offset for
/// the context linker.
#[derive(Debug, Clone)]
pub(crate) struct QuestionDraft {
    pub number: u32,
    pub statement: String,
    pub alternatives: Vec<Alternative>,
    pub stem_offset: usize,
    pub has_image: bool,
    /// Index into the block-draft list, filled by the context linker
    pub context_block: Option<usize>,
}

impl QuestionDraft {
    fn new(number: u32, lead: &str, stem_offset: usize) -> Self {
        Self {
            number,
            statement: lead.to_string(),
            alternatives: Vec::new(),
            stem_offset,
            has_image: false,
            context_block: None,
        }
    }

    fn append_statement(&mut self, text: &str) {
        if self.statement.is_empty() {
            self.statement = text.to_string();
        } else {
            self.statement.push(' ');
            self.statement.push_str(text);
        }
    }

    /// Add a choice; a repeated letter replaces the earlier occurrence.
    fn add_alternative(&mut self, letter: char, text: &str, warnings: &mut Vec<Warning>) {
        if let Some(existing) = self.alternatives.iter_mut().find(|a| a.letter == letter) {
            log::warn!(
                "question {} has duplicate alternative letter '{}'; last occurrence kept",
                self.number,
                letter
            );
            warnings.push(Warning::DuplicateAlternative {
                question: self.number,
                letter,
            });
            existing.text = text.to_string();
        } else {
            self.alternatives.push(Alternative::new(letter, text));
        }
    }
}

/// Output of question extraction.
pub(crate) struct QuestionExtraction {
    /// Questions in document order
    pub questions: Vec<QuestionDraft>,
    /// Fragments not consumed by any question, still in document order
    pub remainder: Vec<ClassifiedFragment>,
}

/// What the scanner is currently accumulating.
enum Mode {
    /// No question open
    Idle,
    /// Collecting statement text for the open question
    Statement,
    /// Collecting answer choices for the open question
    Choices,
}

/// Extract questions from the classified fragment stream.
pub(crate) fn extract_questions(
    fragments: &[ClassifiedFragment],
    warnings: &mut Vec<Warning>,
) -> QuestionExtraction {
    let mut questions: Vec<QuestionDraft> = Vec::new();
    let mut remainder: Vec<ClassifiedFragment> = Vec::new();
    let mut open: Option<QuestionDraft> = None;
    let mut mode = Mode::Idle;

    for classified in fragments {
        match &classified.role {
            FragmentRole::QuestionStem { number, lead } => {
                close_open(&mut open, &mut questions, warnings);
                open = Some(QuestionDraft::new(*number, lead, classified.fragment.offset));
                mode = Mode::Statement;
            }

            FragmentRole::AnswerChoice { letter, text } => match open.as_mut() {
                Some(draft) => {
                    draft.add_alternative(*letter, text, warnings);
                    mode = Mode::Choices;
                }
                // A stray choice with no open question is kept as reading
                // material rather than lost.
                None => remainder.push(classified.clone()),
            },

            FragmentRole::PlainParagraph | FragmentRole::Title => match (&mode, open.as_mut()) {
                (Mode::Statement, Some(draft)) => {
                    draft.append_statement(classified.fragment.text.trim());
                }
                (Mode::Choices, Some(draft)) => {
                    // OCR line wrap: continuation of the previous choice.
                    if let Some(last) = draft.alternatives.last_mut() {
                        if !last.text.is_empty() {
                            last.text.push(' ');
                        }
                        last.text.push_str(classified.fragment.text.trim());
                    }
                }
                _ => remainder.push(classified.clone()),
            },

            FragmentRole::InstructionalStatement | FragmentRole::SequenceMarker { .. } => {
                close_open(&mut open, &mut questions, warnings);
                mode = Mode::Idle;
                remainder.push(classified.clone());
            }
        }
    }

    close_open(&mut open, &mut questions, warnings);

    QuestionExtraction {
        questions,
        remainder,
    }
}

fn close_open(
    open: &mut Option<QuestionDraft>,
    questions: &mut Vec<QuestionDraft>,
    warnings: &mut Vec<Warning>,
) {
    if let Some(draft) = open.take() {
        if let Some(previous) = questions.last() {
            if draft.number <= previous.number {
                log::warn!(
                    "question {} appears after question {}",
                    draft.number,
                    previous.number
                );
                warnings.push(Warning::OutOfOrderQuestion {
                    number: draft.number,
                    previous: previous.number,
                });
            }
        }
        questions.push(draft);
    }
}
