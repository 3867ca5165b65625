//! Context–question linker (stage 6).
//!
//! Assigns each question the context block that supplies its reading
//! material. A current-context pointer advances each time a block carrying
//! an instructional statement is passed in document order; explicit
//! multi-question spans ("answer the next three questions") hold the
//! pointer fixed across that many questions.

use regex::Regex;

use crate::pipeline::blocks::BlockDraft;
use crate::pipeline::questions::QuestionDraft;

const NUMBER_WORDS: &[(&str, usize)] = &[
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
];

/// Parse an explicit question-span count from an instructional statement
/// ("answer the next three questions" -> 3).
pub(crate) fn parse_span_count(statement: &str) -> Option<usize> {
    let re = Regex::new(
        r"(?i)next\s+(\d{1,2}|one|two|three|four|five|six|seven|eight|nine|ten)\s+questions",
    )
    .expect("static regex");
    let caps = re.captures(statement)?;
    let token = caps[1].to_lowercase();
    if let Ok(n) = token.parse::<usize>() {
        return Some(n);
    }
    NUMBER_WORDS
        .iter()
        .find(|(word, _)| *word == token)
        .map(|(_, n)| *n)
}

/// Populate `context_block` and `has_image` on every question draft.
///
/// Policy for spans without an explicit count: document order wins — a
/// question that follows a fresh instruction-bearing block adopts that
/// block, even when the block boundary falls between two closely spaced
/// questions. Proximity alone never overrides document order here.
pub(crate) fn link_contexts(questions: &mut [QuestionDraft], blocks: &[BlockDraft]) {
    let mut bi = 0;
    let mut latest: Option<usize> = None;
    let mut latest_count: Option<usize> = None;
    let mut current: Option<usize> = None;
    let mut hold = 0usize;

    for question in questions.iter_mut() {
        while bi < blocks.len() && blocks[bi].anchor.start_offset < question.stem_offset {
            if !blocks[bi].synthetic && blocks[bi].statement.is_some() {
                latest = Some(bi);
                latest_count = blocks[bi]
                    .statement
                    .as_deref()
                    .and_then(parse_span_count);
            }
            bi += 1;
        }

        if hold > 0 {
            hold -= 1;
        } else if let Some(candidate) = latest {
            if current != Some(candidate) {
                current = Some(candidate);
                hold = latest_count.unwrap_or(1).saturating_sub(1);
                log::debug!(
                    "question {} adopts context block index {} (span hold {})",
                    question.number,
                    candidate,
                    hold
                );
            }
        }

        question.context_block = current;
        question.has_image = current.map(|b| blocks[b].carries_images()).unwrap_or(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::blocks::{Anchor, BlockBody};

    fn block(statement: Option<&str>, start_offset: usize, image_ids: Vec<String>) -> BlockDraft {
        BlockDraft {
            statement: statement.map(|s| s.to_string()),
            title: None,
            body: BlockBody::Flat {
                paragraphs: vec!["body".into()],
                image_ids,
            },
            anchor: Anchor {
                page: 1,
                y_top: start_offset as f32,
                y_bottom: start_offset as f32 + 12.0,
                start_offset,
            },
            synthetic: false,
        }
    }

    fn question(number: u32, stem_offset: usize) -> QuestionDraft {
        let mut q = QuestionDraft {
            number,
            statement: format!("question {number}"),
            alternatives: Vec::new(),
            stem_offset,
            has_image: false,
            context_block: None,
        };
        q.statement.push('?');
        q
    }

    #[test]
    fn test_span_count_parsing() {
        assert_eq!(parse_span_count("Answer the next three questions."), Some(3));
        assert_eq!(parse_span_count("answer the NEXT 2 QUESTIONS"), Some(2));
        assert_eq!(parse_span_count("Read the text below."), None);
        assert_eq!(parse_span_count("next questions"), None);
    }

    #[test]
    fn test_explicit_span_holds_pointer() {
        let blocks = vec![
            block(Some("Answer the next three questions."), 0, vec![]),
            block(Some("Read the text below."), 250, vec![]),
        ];
        let mut questions = vec![question(1, 100), question(2, 300), question(3, 400)];

        link_contexts(&mut questions, &blocks);

        // Block at offset 250 appears before question 2, but the explicit
        // span pins all three questions to the first block.
        assert_eq!(questions[0].context_block, Some(0));
        assert_eq!(questions[1].context_block, Some(0));
        assert_eq!(questions[2].context_block, Some(0));
    }

    #[test]
    fn test_document_order_without_span() {
        let blocks = vec![
            block(Some("Read the text below."), 0, vec![]),
            block(Some("Based on the text, answer what follows."), 200, vec![]),
        ];
        let mut questions = vec![question(1, 100), question(2, 300)];

        link_contexts(&mut questions, &blocks);

        assert_eq!(questions[0].context_block, Some(0));
        assert_eq!(questions[1].context_block, Some(1));
    }

    #[test]
    fn test_question_before_any_block() {
        let blocks = vec![block(Some("Read the text below."), 500, vec![])];
        let mut questions = vec![question(1, 100), question(2, 600)];

        link_contexts(&mut questions, &blocks);

        assert_eq!(questions[0].context_block, None);
        assert_eq!(questions[1].context_block, Some(0));
    }

    #[test]
    fn test_blocks_without_statement_do_not_advance() {
        let blocks = vec![
            block(Some("Read the text below."), 0, vec![]),
            block(None, 200, vec![]),
        ];
        let mut questions = vec![question(1, 300)];

        link_contexts(&mut questions, &blocks);

        assert_eq!(questions[0].context_block, Some(0));
    }

    #[test]
    fn test_has_image_follows_linked_block() {
        let blocks = vec![
            block(Some("Read the text below."), 0, vec!["img-1".into()]),
            block(Some("Now answer the following."), 200, vec![]),
        ];
        let mut questions = vec![question(1, 100), question(2, 300)];

        link_contexts(&mut questions, &blocks);

        assert!(questions[0].has_image);
        assert!(!questions[1].has_image);
    }

    #[test]
    fn test_after_span_newest_block_adopted() {
        let blocks = vec![
            block(Some("Answer the next two questions."), 0, vec![]),
            block(Some("Read the text below."), 150, vec![]),
        ];
        let mut questions = vec![question(1, 100), question(2, 200), question(3, 300)];

        link_contexts(&mut questions, &blocks);

        assert_eq!(questions[0].context_block, Some(0));
        assert_eq!(questions[1].context_block, Some(0));
        // Span exhausted; the block passed during the span now applies.
        assert_eq!(questions[2].context_block, Some(1));
    }
}
