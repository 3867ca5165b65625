//! Block assembler and sub-context sequencer (stages 3 and 4).
//!
//! Walks the non-question fragments in document order and groups them into
//! block drafts. Assembly is an explicit state machine carried as a local
//! accumulator: `NoOpenBlock`, `OpenFlatBlock`, `OpenSequenceRun`. A run of
//! consecutive sequence markers nests under one parent block as
//! sub-contexts instead of spilling into separate top-level blocks.
//!
//! Shape exclusivity is enforced by construction: the sequenced body
//! variant has no top-level paragraph or image storage at all, so a block
//! that owns sub-contexts can never also carry its own content.

use crate::model::{ClassifiedFragment, Fragment, FragmentRole};
use crate::pipeline::{ReconstructOptions, Warning};

/// Position of the last fragment consumed by a unit, plus the offset the
/// unit started at. Used by the figure associator and the context linker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Anchor {
    pub page: u32,
    pub y_top: f32,
    pub y_bottom: f32,
    pub start_offset: usize,
}

impl Anchor {
    fn from_fragment(fragment: &Fragment) -> Self {
        Self {
            page: fragment.page,
            y_top: fragment.bounding_box.top(),
            y_bottom: fragment.bounding_box.bottom(),
            start_offset: fragment.offset,
        }
    }

    /// Move the anchor to a newly consumed fragment, keeping the start
    /// offset of the unit.
    fn advance(&mut self, fragment: &Fragment) {
        self.page = fragment.page;
        self.y_top = fragment.bounding_box.top();
        self.y_bottom = fragment.bounding_box.bottom();
    }
}

/// A sub-context under construction.
#[derive(Debug, Clone)]
pub(crate) struct SubDraft {
    pub sequence: String,
    pub title: Option<String>,
    pub content: Vec<String>,
    pub image_ids: Vec<String>,
    pub anchor: Anchor,
}

impl SubDraft {
    fn new(label: &str, lead: &str, fragment: &Fragment) -> Self {
        Self {
            sequence: label.to_string(),
            title: (!lead.is_empty()).then(|| lead.to_string()),
            content: Vec::new(),
            image_ids: Vec::new(),
            anchor: Anchor::from_fragment(fragment),
        }
    }

    pub fn has_text(&self) -> bool {
        self.title.is_some() || self.content.iter().any(|c| !c.trim().is_empty())
    }

    fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_empty()
    }
}

/// Block content. The `Sequenced` variant deliberately has nowhere to put
/// top-level paragraphs or images.
#[derive(Debug, Clone)]
pub(crate) enum BlockBody {
    Flat {
        paragraphs: Vec<String>,
        image_ids: Vec<String>,
    },
    Sequenced {
        subs: Vec<SubDraft>,
    },
}

/// A context block under construction.
#[derive(Debug, Clone)]
pub(crate) struct BlockDraft {
    pub statement: Option<String>,
    pub title: Option<String>,
    pub body: BlockBody,
    pub anchor: Anchor,
    /// True for the trailing block fabricated for orphan images
    pub synthetic: bool,
}

impl BlockDraft {
    pub fn carries_images(&self) -> bool {
        match &self.body {
            BlockBody::Flat { image_ids, .. } => !image_ids.is_empty(),
            BlockBody::Sequenced { subs } => subs.iter().any(|s| !s.image_ids.is_empty()),
        }
    }

    pub fn has_text(&self) -> bool {
        let own = self.title.is_some();
        match &self.body {
            BlockBody::Flat { paragraphs, .. } => {
                own || paragraphs.iter().any(|p| !p.trim().is_empty())
            }
            BlockBody::Sequenced { subs } => own || subs.iter().any(|s| s.has_text()),
        }
    }

    fn dedup_key(&self) -> Option<(Option<String>, Vec<String>)> {
        match &self.body {
            BlockBody::Flat { paragraphs, .. } if self.has_text() => {
                Some((self.title.clone(), paragraphs.clone()))
            }
            _ => None,
        }
    }
}

/// Assembly accumulator, passed by value between fragment-processing
/// steps so one block's partially-built state cannot leak into the next.
enum AssemblyState {
    NoOpenBlock,
    OpenFlatBlock {
        statement: Option<String>,
        title: Option<String>,
        paragraphs: Vec<String>,
        anchor: Anchor,
    },
    OpenSequenceRun {
        statement: Option<String>,
        title: Option<String>,
        subs: Vec<SubDraft>,
        anchor: Anchor,
    },
}

/// Group the non-question fragments into ordered block drafts.
pub(crate) fn assemble_blocks(
    remainder: &[ClassifiedFragment],
    options: &ReconstructOptions,
    warnings: &mut Vec<Warning>,
) -> Vec<BlockDraft> {
    let mut blocks: Vec<BlockDraft> = Vec::new();
    let mut state = AssemblyState::NoOpenBlock;

    for classified in remainder {
        let fragment = &classified.fragment;
        state = match &classified.role {
            FragmentRole::InstructionalStatement => {
                close_state(state, &mut blocks, warnings);
                AssemblyState::OpenFlatBlock {
                    statement: Some(fragment.text.trim().to_string()),
                    title: None,
                    paragraphs: Vec::new(),
                    anchor: Anchor::from_fragment(fragment),
                }
            }

            FragmentRole::Title => on_title(state, fragment, &mut blocks, warnings),

            FragmentRole::SequenceMarker { label, lead } => {
                on_marker(state, label, lead, fragment, &mut blocks, warnings)
            }

            // Plain paragraphs, plus any stray role that survived question
            // extraction; the raw text is kept either way.
            _ => on_paragraph(state, fragment),
        };
    }

    close_state(state, &mut blocks, warnings);

    if options.dedup_blocks {
        dedup_blocks(&mut blocks);
    }

    blocks
}

fn on_title(
    state: AssemblyState,
    fragment: &Fragment,
    blocks: &mut Vec<BlockDraft>,
    warnings: &mut Vec<Warning>,
) -> AssemblyState {
    let text = fragment.text.trim().to_string();
    match state {
        AssemblyState::NoOpenBlock => AssemblyState::OpenFlatBlock {
            statement: None,
            title: Some(text),
            paragraphs: Vec::new(),
            anchor: Anchor::from_fragment(fragment),
        },
        AssemblyState::OpenFlatBlock {
            statement,
            title: None,
            paragraphs,
            mut anchor,
        } if paragraphs.is_empty() => {
            anchor.advance(fragment);
            AssemblyState::OpenFlatBlock {
                statement,
                title: Some(text),
                paragraphs,
                anchor,
            }
        }
        state @ AssemblyState::OpenFlatBlock { .. } => {
            // A title after body text starts the next block.
            close_state(state, blocks, warnings);
            AssemblyState::OpenFlatBlock {
                statement: None,
                title: Some(text),
                paragraphs: Vec::new(),
                anchor: Anchor::from_fragment(fragment),
            }
        }
        AssemblyState::OpenSequenceRun {
            statement,
            title,
            mut subs,
            mut anchor,
        } => {
            // Inside a run, titles belong to the current sub-context.
            if let Some(sub) = subs.last_mut() {
                if sub.title.is_none() && sub.content.is_empty() {
                    sub.title = Some(text);
                } else {
                    sub.content.push(text);
                }
                sub.anchor.advance(fragment);
            }
            anchor.advance(fragment);
            AssemblyState::OpenSequenceRun {
                statement,
                title,
                subs,
                anchor,
            }
        }
    }
}

fn on_paragraph(state: AssemblyState, fragment: &Fragment) -> AssemblyState {
    let text = fragment.text.trim().to_string();
    match state {
        AssemblyState::NoOpenBlock => AssemblyState::OpenFlatBlock {
            statement: None,
            title: None,
            paragraphs: vec![text],
            anchor: Anchor::from_fragment(fragment),
        },
        AssemblyState::OpenFlatBlock {
            statement,
            title,
            mut paragraphs,
            mut anchor,
        } => {
            paragraphs.push(text);
            anchor.advance(fragment);
            AssemblyState::OpenFlatBlock {
                statement,
                title,
                paragraphs,
                anchor,
            }
        }
        AssemblyState::OpenSequenceRun {
            statement,
            title,
            mut subs,
            mut anchor,
        } => {
            if let Some(sub) = subs.last_mut() {
                sub.content.push(text);
                sub.anchor.advance(fragment);
            }
            anchor.advance(fragment);
            AssemblyState::OpenSequenceRun {
                statement,
                title,
                subs,
                anchor,
            }
        }
    }
}

fn on_marker(
    state: AssemblyState,
    label: &str,
    lead: &str,
    fragment: &Fragment,
    blocks: &mut Vec<BlockDraft>,
    warnings: &mut Vec<Warning>,
) -> AssemblyState {
    let first_sub = SubDraft::new(label, lead, fragment);
    match state {
        AssemblyState::NoOpenBlock => AssemblyState::OpenSequenceRun {
            statement: None,
            title: None,
            subs: vec![first_sub],
            anchor: Anchor::from_fragment(fragment),
        },
        AssemblyState::OpenFlatBlock {
            statement,
            title,
            paragraphs,
            mut anchor,
        } => {
            if paragraphs.is_empty() {
                // The instructional lead-in (and optional title) become the
                // parent of the run.
                anchor.advance(fragment);
                AssemblyState::OpenSequenceRun {
                    statement,
                    title,
                    subs: vec![first_sub],
                    anchor,
                }
            } else {
                // The flat block already owns body text; it is emitted as
                // its own unit and a fresh parent opens for the run.
                close_state(
                    AssemblyState::OpenFlatBlock {
                        statement,
                        title,
                        paragraphs,
                        anchor,
                    },
                    blocks,
                    warnings,
                );
                AssemblyState::OpenSequenceRun {
                    statement: None,
                    title: None,
                    subs: vec![first_sub],
                    anchor: Anchor::from_fragment(fragment),
                }
            }
        }
        AssemblyState::OpenSequenceRun {
            statement,
            title,
            mut subs,
            mut anchor,
        } => {
            if let Some(last) = subs.last() {
                warn_if_empty(last, warnings);
            }
            subs.push(first_sub);
            anchor.advance(fragment);
            AssemblyState::OpenSequenceRun {
                statement,
                title,
                subs,
                anchor,
            }
        }
    }
}

fn close_state(state: AssemblyState, blocks: &mut Vec<BlockDraft>, warnings: &mut Vec<Warning>) {
    match state {
        AssemblyState::NoOpenBlock => {}
        AssemblyState::OpenFlatBlock {
            statement,
            title,
            paragraphs,
            anchor,
        } => {
            if statement.is_none() && title.is_none() && paragraphs.is_empty() {
                return;
            }
            blocks.push(BlockDraft {
                statement,
                title,
                body: BlockBody::Flat {
                    paragraphs,
                    image_ids: Vec::new(),
                },
                anchor,
                synthetic: false,
            });
        }
        AssemblyState::OpenSequenceRun {
            statement,
            title,
            subs,
            anchor,
        } => {
            if let Some(last) = subs.last() {
                warn_if_empty(last, warnings);
            }
            blocks.push(BlockDraft {
                statement,
                title,
                body: BlockBody::Sequenced { subs },
                anchor,
                synthetic: false,
            });
        }
    }
}

fn warn_if_empty(sub: &SubDraft, warnings: &mut Vec<Warning>) {
    if sub.is_empty() {
        log::warn!("sequence marker '{}' has no following content", sub.sequence);
        warnings.push(Warning::EmptySequenceRun {
            label: sub.sequence.clone(),
        });
    }
}

/// Merge structurally identical flat blocks (same title + paragraph set),
/// keeping the first occurrence.
fn dedup_blocks(blocks: &mut Vec<BlockDraft>) {
    let mut seen: Vec<(Option<String>, Vec<String>)> = Vec::new();
    blocks.retain(|block| match block.dedup_key() {
        Some(key) => {
            if seen.contains(&key) {
                log::debug!("dropping duplicate block titled {:?}", key.0);
                false
            } else {
                seen.push(key);
                true
            }
        }
        None => true,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundingBox;

    fn classified(text: &str, offset: usize, role: FragmentRole) -> ClassifiedFragment {
        let y = (offset as f32) / 10.0;
        ClassifiedFragment::new(
            Fragment::new(text, 1, BoundingBox::from_rect(0.0, y, 400.0, y + 12.0), offset),
            role,
        )
    }

    fn instruction(text: &str, offset: usize) -> ClassifiedFragment {
        classified(text, offset, FragmentRole::InstructionalStatement)
    }

    fn paragraph(text: &str, offset: usize) -> ClassifiedFragment {
        classified(text, offset, FragmentRole::PlainParagraph)
    }

    fn marker(label: &str, offset: usize) -> ClassifiedFragment {
        classified(
            &format!("TEXT {label}"),
            offset,
            FragmentRole::SequenceMarker {
                label: label.into(),
                lead: String::new(),
            },
        )
    }

    fn title(text: &str, offset: usize) -> ClassifiedFragment {
        classified(text, offset, FragmentRole::Title)
    }

    fn assemble(fragments: &[ClassifiedFragment]) -> (Vec<BlockDraft>, Vec<Warning>) {
        let mut warnings = Vec::new();
        let blocks = assemble_blocks(fragments, &ReconstructOptions::default(), &mut warnings);
        (blocks, warnings)
    }

    #[test]
    fn test_flat_block_with_statement_and_paragraphs() {
        let (blocks, warnings) = assemble(&[
            instruction("Read the text below.", 0),
            title("The Open Window", 100),
            paragraph("First paragraph.", 200),
            paragraph("Second paragraph.", 300),
        ]);

        assert!(warnings.is_empty());
        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert_eq!(block.statement.as_deref(), Some("Read the text below."));
        assert_eq!(block.title.as_deref(), Some("The Open Window"));
        match &block.body {
            BlockBody::Flat { paragraphs, .. } => {
                assert_eq!(paragraphs, &["First paragraph.", "Second paragraph."]);
            }
            _ => panic!("expected flat body"),
        }
        assert_eq!(block.anchor.start_offset, 0);
    }

    #[test]
    fn test_sequence_run_nests_under_one_parent() {
        let (blocks, warnings) = assemble(&[
            instruction("Analyze the texts below.", 0),
            marker("I", 100),
            paragraph("First text body.", 200),
            marker("II", 300),
            paragraph("Second text body.", 400),
            marker("III", 500),
            paragraph("Third text body.", 600),
        ]);

        assert!(warnings.is_empty());
        assert_eq!(blocks.len(), 1, "run must not spill into top-level blocks");
        let block = &blocks[0];
        assert_eq!(block.statement.as_deref(), Some("Analyze the texts below."));
        match &block.body {
            BlockBody::Sequenced { subs } => {
                assert_eq!(
                    subs.iter().map(|s| s.sequence.as_str()).collect::<Vec<_>>(),
                    vec!["I", "II", "III"]
                );
                assert_eq!(subs[1].content, vec!["Second text body."]);
            }
            _ => panic!("expected sequenced body"),
        }
    }

    #[test]
    fn test_run_after_body_text_opens_fresh_parent() {
        let (blocks, _) = assemble(&[
            instruction("Read the text below.", 0),
            paragraph("Standalone passage.", 100),
            marker("I", 200),
            paragraph("Sequenced body.", 300),
        ]);

        assert_eq!(blocks.len(), 2);
        assert!(matches!(blocks[0].body, BlockBody::Flat { .. }));
        assert!(matches!(blocks[1].body, BlockBody::Sequenced { .. }));
        assert!(blocks[1].statement.is_none());
    }

    #[test]
    fn test_instruction_ends_run() {
        let (blocks, _) = assemble(&[
            marker("I", 0),
            paragraph("Run body.", 100),
            instruction("Answer the next questions.", 200),
            paragraph("Fresh block body.", 300),
        ]);

        assert_eq!(blocks.len(), 2);
        assert!(matches!(blocks[0].body, BlockBody::Sequenced { .. }));
        match &blocks[1].body {
            BlockBody::Flat { paragraphs, .. } => {
                assert_eq!(paragraphs, &["Fresh block body."]);
            }
            _ => panic!("expected flat body"),
        }
    }

    #[test]
    fn test_marker_lead_becomes_sub_title() {
        let (blocks, _) = assemble(&[
            classified(
                "TEXT I: The Road Not Taken",
                0,
                FragmentRole::SequenceMarker {
                    label: "I".into(),
                    lead: "The Road Not Taken".into(),
                },
            ),
            paragraph("Two roads diverged in a yellow wood.", 100),
        ]);

        match &blocks[0].body {
            BlockBody::Sequenced { subs } => {
                assert_eq!(subs[0].title.as_deref(), Some("The Road Not Taken"));
                assert_eq!(subs[0].content, vec!["Two roads diverged in a yellow wood."]);
            }
            _ => panic!("expected sequenced body"),
        }
    }

    #[test]
    fn test_title_inside_run_fills_sub_title() {
        let (blocks, _) = assemble(&[
            marker("I", 0),
            title("First Poem", 100),
            paragraph("Body.", 200),
            marker("II", 300),
            paragraph("Other body.", 400),
        ]);

        match &blocks[0].body {
            BlockBody::Sequenced { subs } => {
                assert_eq!(subs[0].title.as_deref(), Some("First Poem"));
                assert!(subs[1].title.is_none());
            }
            _ => panic!("expected sequenced body"),
        }
    }

    #[test]
    fn test_empty_marker_warns_but_emits() {
        let (blocks, warnings) = assemble(&[marker("I", 0), marker("II", 100), paragraph("x", 200)]);

        match &blocks[0].body {
            BlockBody::Sequenced { subs } => {
                assert_eq!(subs.len(), 2);
                assert!(subs[0].content.is_empty());
            }
            _ => panic!("expected sequenced body"),
        }
        assert_eq!(warnings, vec![Warning::EmptySequenceRun { label: "I".into() }]);
    }

    #[test]
    fn test_orphan_paragraph_opens_untitled_block() {
        let (blocks, _) = assemble(&[paragraph("Loose text with no opener.", 0)]);

        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].statement.is_none());
        assert!(blocks[0].title.is_none());
    }

    #[test]
    fn test_dedup_keeps_first() {
        let (blocks, _) = assemble(&[
            title("Same Title", 0),
            paragraph("Same body.", 100),
            title("Same Title", 200),
            paragraph("Same body.", 300),
            title("Other Title", 400),
            paragraph("Other body.", 500),
        ]);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].title.as_deref(), Some("Same Title"));
        assert_eq!(blocks[0].anchor.start_offset, 0);
        assert_eq!(blocks[1].title.as_deref(), Some("Other Title"));
    }

    #[test]
    fn test_anchor_tracks_last_fragment() {
        let (blocks, _) = assemble(&[
            instruction("Read the text below.", 0),
            paragraph("Body.", 500),
        ]);

        let anchor = blocks[0].anchor;
        assert_eq!(anchor.start_offset, 0);
        assert_eq!(anchor.y_top, 50.0);
    }
}
