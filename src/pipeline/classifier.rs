//! Fragment classifier (stage 1).
//!
//! Rule-based role assignment over the raw fragment stream. Rules are
//! evaluated in a fixed precedence order per fragment: question stem,
//! answer choice, sequence marker, instructional statement, then the
//! title-vs-paragraph heuristic. An unclassifiable fragment defaults to
//! `PlainParagraph` — silent loss of content is worse than
//! mis-classification, so nothing is ever dropped.

use regex::Regex;

use crate::model::{ClassifiedFragment, Fragment, FragmentRole};
use crate::pipeline::{ReconstructOptions, Warning};

/// Keywords that mark a fragment as an instructional lead-in.
const INSTRUCTION_KEYWORDS: &[&str] = &[
    "read the text",
    "read the texts",
    "analyze the text",
    "analyze the texts",
    "answer the",
    "based on the text",
    "according to the text",
    "consider the text",
];

/// Rule-based fragment classifier.
///
/// Regexes are compiled once at construction; classification itself is a
/// pure function over the fragment list.
pub struct FragmentClassifier {
    question_keyword: Regex,
    question_number: Regex,
    answer_choice: Regex,
    sequence_marker: Regex,
    title_max_len: usize,
}

impl FragmentClassifier {
    /// Create a classifier with the given options.
    pub fn new(options: &ReconstructOptions) -> Self {
        Self {
            question_keyword: Regex::new(r"(?i)^QUESTION\s+(\d{1,3})\s*[.:)\-]?\s*(.*)$")
                .expect("static regex"),
            question_number: Regex::new(r"^(\d{1,3})\s*[.)]\s*(.*)$").expect("static regex"),
            answer_choice: Regex::new(r"^([a-eA-E])\s*[).:\-]\s*(.*)$").expect("static regex"),
            sequence_marker: Regex::new(
                r"(?i)^(?:TEXT|FIGURE)\s+([IVXLCDM]+|\d{1,2})\b\s*[:.\-]?\s*(.*)$",
            )
            .expect("static regex"),
            title_max_len: options.title_max_len,
        }
    }

    /// Assign a role to every fragment, preserving input order.
    ///
    /// Blank fragments are skipped; everything else comes out exactly once.
    pub fn classify(
        &self,
        fragments: &[Fragment],
        warnings: &mut Vec<Warning>,
    ) -> Vec<ClassifiedFragment> {
        let mut classified = Vec::with_capacity(fragments.len());

        for (i, fragment) in fragments.iter().enumerate() {
            if fragment.is_blank() {
                log::debug!("skipping blank fragment at offset {}", fragment.offset);
                continue;
            }

            let next = fragments[i + 1..].iter().find(|f| !f.is_blank());
            let role = self.classify_one(fragment, next, warnings);
            log::debug!(
                "fragment at offset {} classified as {}",
                fragment.offset,
                role.name()
            );
            classified.push(ClassifiedFragment::new(fragment.clone(), role));
        }

        classified
    }

    /// Classify a single fragment against the rule table in precedence
    /// order. `next` is the following non-blank fragment, consulted only
    /// by the title heuristic.
    fn classify_one(
        &self,
        fragment: &Fragment,
        next: Option<&Fragment>,
        warnings: &mut Vec<Warning>,
    ) -> FragmentRole {
        let text = fragment.text.trim();

        if let Some(caps) = self.question_keyword.captures(text) {
            if let Ok(number) = caps[1].parse::<u32>() {
                return FragmentRole::QuestionStem {
                    number,
                    lead: caps[2].trim().to_string(),
                };
            }
        }

        if let Some(caps) = self.question_number.captures(text) {
            if let Ok(number) = caps[1].parse::<u32>() {
                return FragmentRole::QuestionStem {
                    number,
                    lead: caps[2].trim().to_string(),
                };
            }
        }

        if let Some(caps) = self.answer_choice.captures(text) {
            let letter = caps[1]
                .chars()
                .next()
                .map(|c| c.to_ascii_lowercase())
                .unwrap_or('a');
            return FragmentRole::AnswerChoice {
                letter,
                text: caps[2].trim().to_string(),
            };
        }

        if let Some(caps) = self.sequence_marker.captures(text) {
            return FragmentRole::SequenceMarker {
                label: caps[1].to_uppercase(),
                lead: caps[2].trim().to_string(),
            };
        }

        let lowered = text.to_lowercase();
        if INSTRUCTION_KEYWORDS.iter().any(|k| lowered.contains(k)) {
            return FragmentRole::InstructionalStatement;
        }

        if self.looks_like_title(fragment, next) {
            return FragmentRole::Title;
        }

        if !text.chars().any(|c| c.is_alphanumeric()) {
            log::warn!(
                "fragment on page {} at offset {} could not be classified; kept as plain paragraph",
                fragment.page,
                fragment.offset
            );
            warnings.push(Warning::UnclassifiedFragment {
                page: fragment.page,
                offset: fragment.offset,
            });
        }

        FragmentRole::PlainParagraph
    }

    /// Title heuristic: short line without closing punctuation, followed
    /// by a fragment that differs in visual scale or is clearly body text.
    fn looks_like_title(&self, fragment: &Fragment, next: Option<&Fragment>) -> bool {
        let text = fragment.text.trim();
        if text.chars().count() > self.title_max_len {
            return false;
        }
        if !text.chars().any(|c| c.is_alphabetic()) {
            return false;
        }
        if text.ends_with(['.', '!', '?', ';', ',', ':']) {
            return false;
        }

        let Some(next) = next else {
            return false;
        };
        if next.page != fragment.page {
            return false;
        }

        let h = fragment.bounding_box.height();
        let next_h = next.bounding_box.height();
        let scale_differs = h > 0.0 && next_h > 0.0 && (h > next_h * 1.15 || next_h > h * 1.15);
        let followed_by_body = next.text.trim().chars().count() >= 2 * text.chars().count().max(1);

        scale_differs || followed_by_body
    }
}
