//! The document structure reconstruction pipeline.
//!
//! Six stages run strictly sequentially per request: fragment
//! classification, question extraction, block assembly, sub-context
//! sequencing, figure association and context linking. The pipeline is
//! pure and deterministic — no I/O, no shared state, no retries.

mod blocks;
mod classifier;
mod figures;
mod linker;
mod options;
mod questions;
mod report;

pub use classifier::FragmentClassifier;
pub use figures::{AnchorCandidate, AnchorPolicy, FigureAssociator, NearestPreceding};
pub use options::ReconstructOptions;
pub use report::{Reconstruction, Warning};

use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::model::{
    ContentKind, ContextBlock, ExamDocument, Fragment, ImageRegion, Question, SubContext,
};
use blocks::{BlockBody, BlockDraft};
use questions::QuestionDraft;

/// Run the full pipeline over one analysis result.
pub(crate) fn run_pipeline(
    mut fragments: Vec<Fragment>,
    images: Vec<ImageRegion>,
    options: &ReconstructOptions,
    associator: &FigureAssociator,
) -> Result<Reconstruction> {
    check_inputs(&fragments, &images)?;

    if options.normalize_unicode {
        for fragment in &mut fragments {
            fragment.text = fragment.text.nfc().collect();
        }
    }

    // Reading order comes from the concatenated-text offset, not from the
    // order the layout service happened to emit records in.
    fragments.sort_by_key(|f| f.offset);

    let mut warnings = Vec::new();

    let classifier = FragmentClassifier::new(options);
    let classified = classifier.classify(&fragments, &mut warnings);

    let extraction = questions::extract_questions(&classified, &mut warnings);

    let mut block_drafts = blocks::assemble_blocks(&extraction.remainder, options, &mut warnings);

    associator.associate(&mut block_drafts, &images, &mut warnings);
    validate_placement(&block_drafts, &images)?;

    let mut question_drafts = extraction.questions;
    linker::link_contexts(&mut question_drafts, &block_drafts);

    let document = build_document(question_drafts, block_drafts, &images);
    validate_document(&document)?;

    Ok(Reconstruction { document, warnings })
}

fn check_inputs(fragments: &[Fragment], images: &[ImageRegion]) -> Result<()> {
    for fragment in fragments {
        if fragment.page == 0 {
            return Err(Error::InvalidFragment {
                offset: fragment.offset,
                reason: "page number must be >= 1".into(),
            });
        }
    }
    let mut ids = std::collections::BTreeSet::new();
    for image in images {
        if image.page == 0 {
            return Err(Error::InvalidImageRegion {
                id: image.id.clone(),
                reason: "page number must be >= 1".into(),
            });
        }
        if image.id.is_empty() {
            return Err(Error::InvalidImageRegion {
                id: image.id.clone(),
                reason: "id must not be empty".into(),
            });
        }
        if !ids.insert(image.id.as_str()) {
            return Err(Error::InvalidImageRegion {
                id: image.id.clone(),
                reason: "duplicate image id".into(),
            });
        }
    }
    Ok(())
}

/// Assemble the immutable output tree, resolving image ids to their
/// externally supplied payload references.
fn build_document(
    question_drafts: Vec<QuestionDraft>,
    block_drafts: Vec<BlockDraft>,
    images: &[ImageRegion],
) -> ExamDocument {
    let refs: std::collections::BTreeMap<&str, &str> = images
        .iter()
        .map(|i| (i.id.as_str(), i.payload_ref.as_str()))
        .collect();
    // Placement was validated against the input list, so every id resolves.
    let resolve = |ids: &[String]| -> Vec<String> {
        ids.iter()
            .map(|id| {
                refs.get(id.as_str())
                    .expect("placed image id missing from the input region list")
                    .to_string()
            })
            .collect()
    };

    let context_blocks: Vec<ContextBlock> = block_drafts
        .iter()
        .enumerate()
        .map(|(i, draft)| {
            let id = i as u32 + 1;
            match &draft.body {
                BlockBody::Flat {
                    paragraphs,
                    image_ids,
                } => {
                    let has_text = draft.title.is_some()
                        || paragraphs.iter().any(|p| !p.trim().is_empty());
                    ContextBlock {
                        id,
                        kind: ContentKind::from_content(has_text, !image_ids.is_empty()),
                        statement: draft.statement.clone(),
                        title: draft.title.clone(),
                        paragraphs: (!paragraphs.is_empty()).then(|| paragraphs.clone()),
                        images: (!image_ids.is_empty()).then(|| resolve(image_ids)),
                        sub_contexts: None,
                    }
                }
                BlockBody::Sequenced { subs } => {
                    let sub_contexts: Vec<SubContext> = subs
                        .iter()
                        .map(|sub| SubContext {
                            sequence: sub.sequence.clone(),
                            kind: ContentKind::from_content(
                                sub.has_text(),
                                !sub.image_ids.is_empty(),
                            ),
                            title: sub.title.clone(),
                            content: sub.content.clone(),
                            images: resolve(&sub.image_ids),
                        })
                        .collect();
                    let has_text =
                        draft.title.is_some() || sub_contexts.iter().any(|s| s.has_text());
                    let has_images = sub_contexts.iter().any(|s| !s.images.is_empty());
                    ContextBlock {
                        id,
                        kind: ContentKind::from_content(has_text, has_images),
                        statement: draft.statement.clone(),
                        title: draft.title.clone(),
                        paragraphs: None,
                        images: None,
                        sub_contexts: Some(sub_contexts),
                    }
                }
            }
        })
        .collect();

    let questions: Vec<Question> = question_drafts
        .into_iter()
        .map(|draft| Question {
            number: draft.number,
            statement: draft.statement,
            alternatives: draft.alternatives,
            has_image: draft.has_image,
            context_id: draft.context_block.map(|b| b as u32 + 1),
        })
        .collect();

    ExamDocument {
        questions,
        context_blocks,
    }
}

/// Image exclusivity: every input region id appears exactly once across
/// the draft tree. Runs before ids are resolved to payload refs, so a
/// misplaced image is caught even when two regions share a ref.
///
/// A violation here indicates a defect in the figure associator, so the
/// request fails closed instead of returning a patched-up tree.
fn validate_placement(blocks: &[BlockDraft], images: &[ImageRegion]) -> Result<()> {
    let mut placed: std::collections::BTreeMap<&str, usize> = std::collections::BTreeMap::new();
    for block in blocks {
        match &block.body {
            BlockBody::Flat { image_ids, .. } => {
                for id in image_ids {
                    *placed.entry(id.as_str()).or_insert(0) += 1;
                }
            }
            BlockBody::Sequenced { subs } => {
                for sub in subs {
                    for id in &sub.image_ids {
                        *placed.entry(id.as_str()).or_insert(0) += 1;
                    }
                }
            }
        }
    }
    let expected: std::collections::BTreeMap<&str, usize> =
        images.iter().map(|i| (i.id.as_str(), 1)).collect();
    if placed != expected {
        return Err(Error::InvariantViolation(
            "image ids are not placed exactly once across the tree".into(),
        ));
    }
    Ok(())
}

/// Final validation pass over the assembled tree.
///
/// A violation here indicates a defect in the reconstruction logic itself,
/// so the request fails closed instead of returning a patched-up tree.
pub(crate) fn validate_document(document: &ExamDocument) -> Result<()> {
    for (i, block) in document.context_blocks.iter().enumerate() {
        let expected = i as u32 + 1;
        if block.id != expected {
            return Err(Error::InvariantViolation(format!(
                "block id {} at position {} breaks the contiguous sequence",
                block.id, i
            )));
        }

        if block.sub_contexts.is_some() {
            if block.images.as_ref().is_some_and(|v| !v.is_empty()) {
                return Err(Error::InvariantViolation(format!(
                    "block {} has both sub-contexts and top-level images",
                    block.id
                )));
            }
            if block.paragraphs.as_ref().is_some_and(|v| !v.is_empty()) {
                return Err(Error::InvariantViolation(format!(
                    "block {} has both sub-contexts and top-level paragraphs",
                    block.id
                )));
            }
        }
    }

    for question in &document.questions {
        if let Some(id) = question.context_id {
            if document.get_block(id).is_none() {
                return Err(Error::InvariantViolation(format!(
                    "question {} references missing block {}",
                    question.number, id
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundingBox;

    fn frag(text: &str, page: u32, y: f32, offset: usize) -> Fragment {
        Fragment::new(text, page, BoundingBox::from_rect(0.0, y, 400.0, y + 12.0), offset)
    }

    #[test]
    fn test_rejects_page_zero() {
        let fragments = vec![frag("text", 0, 0.0, 0)];
        let result = run_pipeline(
            fragments,
            vec![],
            &ReconstructOptions::default(),
            &FigureAssociator::default(),
        );
        assert!(matches!(result, Err(Error::InvalidFragment { .. })));
    }

    #[test]
    fn test_rejects_empty_image_id() {
        let images = vec![ImageRegion::new(
            "",
            1,
            BoundingBox::from_rect(0.0, 0.0, 10.0, 10.0),
            "blob://x",
        )];
        let result = run_pipeline(
            vec![],
            images,
            &ReconstructOptions::default(),
            &FigureAssociator::default(),
        );
        assert!(matches!(result, Err(Error::InvalidImageRegion { .. })));
    }

    #[test]
    fn test_fragments_reordered_by_offset() {
        let fragments = vec![
            frag("Second sentence of the passage, somewhat longer.", 1, 120.0, 100),
            frag("Read the text below and answer what follows.", 1, 100.0, 0),
        ];
        let result = run_pipeline(
            fragments,
            vec![],
            &ReconstructOptions::default(),
            &FigureAssociator::default(),
        )
        .unwrap();

        let block = &result.document.context_blocks[0];
        assert_eq!(
            block.statement.as_deref(),
            Some("Read the text below and answer what follows.")
        );
    }

    #[test]
    fn test_rejects_duplicate_image_ids() {
        let images = vec![
            ImageRegion::new("img-1", 1, BoundingBox::from_rect(0.0, 0.0, 10.0, 10.0), "blob://a"),
            ImageRegion::new("img-1", 1, BoundingBox::from_rect(0.0, 20.0, 10.0, 30.0), "blob://b"),
        ];
        let result = run_pipeline(
            vec![],
            images,
            &ReconstructOptions::default(),
            &FigureAssociator::default(),
        );
        assert!(matches!(result, Err(Error::InvalidImageRegion { .. })));
    }

    #[test]
    fn test_validation_catches_gapped_ids() {
        let mut document = ExamDocument::new();
        document.context_blocks.push(ContextBlock {
            id: 2,
            kind: ContentKind::Text,
            statement: None,
            title: None,
            paragraphs: Some(vec!["p".into()]),
            images: None,
            sub_contexts: None,
        });
        assert!(matches!(
            validate_document(&document),
            Err(Error::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_validation_catches_shape_violation() {
        let mut document = ExamDocument::new();
        document.context_blocks.push(ContextBlock {
            id: 1,
            kind: ContentKind::Mixed,
            statement: None,
            title: None,
            paragraphs: None,
            images: Some(vec!["blob://img-1".into()]),
            sub_contexts: Some(vec![]),
        });
        assert!(matches!(
            validate_document(&document),
            Err(Error::InvariantViolation(_))
        ));
    }

    fn draft_with_ids(image_ids: Vec<String>) -> BlockDraft {
        BlockDraft {
            statement: None,
            title: None,
            body: BlockBody::Flat {
                paragraphs: vec!["p".into()],
                image_ids,
            },
            anchor: crate::pipeline::blocks::Anchor {
                page: 1,
                y_top: 0.0,
                y_bottom: 12.0,
                start_offset: 0,
            },
            synthetic: false,
        }
    }

    #[test]
    fn test_placement_check_catches_unplaced_image() {
        let blocks = vec![draft_with_ids(vec![])];
        let images = vec![ImageRegion::new(
            "img-1",
            1,
            BoundingBox::from_rect(0.0, 0.0, 10.0, 10.0),
            "blob://img-1",
        )];
        assert!(matches!(
            validate_placement(&blocks, &images),
            Err(Error::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_placement_check_catches_double_placement() {
        let blocks = vec![draft_with_ids(vec!["img-1".into(), "img-1".into()])];
        let images = vec![ImageRegion::new(
            "img-1",
            1,
            BoundingBox::from_rect(0.0, 0.0, 10.0, 10.0),
            "blob://img-1",
        )];
        assert!(matches!(
            validate_placement(&blocks, &images),
            Err(Error::InvariantViolation(_))
        ));
    }
}
