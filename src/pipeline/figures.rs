//! Figure associator (stage 5).
//!
//! Places every image region into exactly one block or sub-context, using
//! page/vertical proximity to the nearest qualifying text anchor. The
//! selection rule is injected at construction time as an `AnchorPolicy`,
//! so alternate association behavior never becomes a global mode switch.

use crate::model::ImageRegion;
use crate::pipeline::blocks::{Anchor, BlockBody, BlockDraft};
use crate::pipeline::Warning;

/// One candidate text anchor, in document order.
///
/// Candidates are leaf units: flat blocks and individual sub-contexts. A
/// parent block that owns sub-contexts is represented only by its
/// sub-contexts, which realizes the "most specific enclosing unit"
/// tie-break and keeps images out of sequenced parents entirely.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorCandidate {
    /// Page of the unit's last consumed fragment
    pub page: u32,
    /// Bottom Y of the unit's last consumed fragment
    pub y_bottom: f32,
    /// Position in document order (0-based)
    pub order: usize,
}

/// Anchor-selection policy: given an image and the candidate units in
/// document order, pick the index of the unit that should own the image,
/// or `None` when no candidate qualifies.
pub trait AnchorPolicy {
    /// Select an anchor for `image` from `candidates`.
    fn select(&self, image: &ImageRegion, candidates: &[AnchorCandidate]) -> Option<usize>;
}

/// Default policy: nearest preceding anchor by vertical distance on the
/// same page, falling back to the nearest preceding unit in document
/// order across pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestPreceding;

impl AnchorPolicy for NearestPreceding {
    fn select(&self, image: &ImageRegion, candidates: &[AnchorCandidate]) -> Option<usize> {
        let reference_y = image.bounding_box.vertical_center();

        // Same page, ending above the image: nearest by vertical distance,
        // later document order breaking exact ties.
        let same_page = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.page == image.page && c.y_bottom <= reference_y)
            .max_by(|(_, a), (_, b)| {
                a.y_bottom
                    .partial_cmp(&b.y_bottom)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.order.cmp(&b.order))
            });
        if let Some((idx, _)) = same_page {
            return Some(idx);
        }

        // Cross-page fallback: last unit on any earlier page.
        candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.page < image.page)
            .max_by_key(|(_, c)| c.order)
            .map(|(idx, _)| idx)
    }
}

/// Reference from a candidate back into the block tree.
#[derive(Debug, Clone, Copy)]
struct UnitRef {
    block: usize,
    sub: Option<usize>,
}

/// Assigns image regions to blocks/sub-contexts.
pub struct FigureAssociator {
    policy: Box<dyn AnchorPolicy>,
}

impl FigureAssociator {
    /// Create an associator with the given anchor policy.
    pub fn new(policy: Box<dyn AnchorPolicy>) -> Self {
        Self { policy }
    }

    /// Attach every image to exactly one unit. Images that match no anchor
    /// are collected on a synthetic trailing block, never dropped.
    pub(crate) fn associate(
        &self,
        blocks: &mut Vec<BlockDraft>,
        images: &[ImageRegion],
        warnings: &mut Vec<Warning>,
    ) {
        if images.is_empty() {
            return;
        }

        // Deterministic processing order regardless of input order.
        let mut ordered: Vec<&ImageRegion> = images.iter().collect();
        ordered.sort_by(|a, b| {
            (a.page, a.bounding_box.top())
                .partial_cmp(&(b.page, b.bounding_box.top()))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });

        let (refs, candidates) = flatten_units(blocks);
        let mut orphans: Vec<&ImageRegion> = Vec::new();

        for image in ordered {
            match self.policy.select(image, &candidates) {
                Some(idx) => {
                    let candidate = candidates[idx];
                    if candidate.page != image.page {
                        log::warn!(
                            "image '{}' on page {} anchored across pages to page {}",
                            image.id,
                            image.page,
                            candidate.page
                        );
                        warnings.push(Warning::CrossPageImage {
                            id: image.id.clone(),
                            page: image.page,
                            anchor_page: candidate.page,
                        });
                    }
                    attach(blocks, refs[idx], image.id.clone());
                }
                None => orphans.push(image),
            }
        }

        if !orphans.is_empty() {
            let mut image_ids = Vec::with_capacity(orphans.len());
            for image in orphans {
                log::warn!(
                    "image '{}' has no text anchor; attached to a trailing block",
                    image.id
                );
                warnings.push(Warning::OrphanImage {
                    id: image.id.clone(),
                });
                image_ids.push(image.id.clone());
            }
            blocks.push(BlockDraft {
                statement: None,
                title: None,
                body: BlockBody::Flat {
                    paragraphs: Vec::new(),
                    image_ids,
                },
                anchor: Anchor {
                    page: u32::MAX,
                    y_top: f32::MAX,
                    y_bottom: f32::MAX,
                    start_offset: usize::MAX,
                },
                synthetic: true,
            });
        }
    }
}

impl Default for FigureAssociator {
    fn default() -> Self {
        Self::new(Box::new(NearestPreceding))
    }
}

/// Flatten the block tree into leaf units in document order.
fn flatten_units(blocks: &[BlockDraft]) -> (Vec<UnitRef>, Vec<AnchorCandidate>) {
    let mut refs = Vec::new();
    let mut candidates = Vec::new();
    for (bi, block) in blocks.iter().enumerate() {
        match &block.body {
            BlockBody::Flat { .. } => {
                refs.push(UnitRef {
                    block: bi,
                    sub: None,
                });
                candidates.push(AnchorCandidate {
                    page: block.anchor.page,
                    y_bottom: block.anchor.y_bottom,
                    order: candidates.len(),
                });
            }
            BlockBody::Sequenced { subs } => {
                for (si, sub) in subs.iter().enumerate() {
                    refs.push(UnitRef {
                        block: bi,
                        sub: Some(si),
                    });
                    candidates.push(AnchorCandidate {
                        page: sub.anchor.page,
                        y_bottom: sub.anchor.y_bottom,
                        order: candidates.len(),
                    });
                }
            }
        }
    }
    (refs, candidates)
}

fn attach(blocks: &mut [BlockDraft], unit: UnitRef, image_id: String) {
    match (&mut blocks[unit.block].body, unit.sub) {
        (BlockBody::Flat { image_ids, .. }, None) => image_ids.push(image_id),
        (BlockBody::Sequenced { subs }, Some(si)) => subs[si].image_ids.push(image_id),
        // Unit references are built from the same tree they index into.
        _ => unreachable!("unit reference does not match block shape"),
    }
}
