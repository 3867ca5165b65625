//! Reconstruction options.

/// Options controlling the reconstruction pipeline.
#[derive(Debug, Clone)]
pub struct ReconstructOptions {
    /// NFC-normalize fragment text on ingest (OCR output frequently mixes
    /// composed and decomposed forms)
    pub normalize_unicode: bool,

    /// Merge structurally identical blocks produced by redundant upstream
    /// fragments
    pub dedup_blocks: bool,

    /// Maximum length for the short-line title heuristic, in characters
    pub title_max_len: usize,
}

impl ReconstructOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable NFC normalization of fragment text.
    pub fn with_normalization(mut self, normalize: bool) -> Self {
        self.normalize_unicode = normalize;
        self
    }

    /// Enable or disable block deduplication.
    pub fn with_dedup(mut self, dedup: bool) -> Self {
        self.dedup_blocks = dedup;
        self
    }

    /// Set the maximum length for the title heuristic.
    pub fn with_title_max_len(mut self, len: usize) -> Self {
        self.title_max_len = len;
        self
    }
}

impl Default for ReconstructOptions {
    fn default() -> Self {
        Self {
            normalize_unicode: true,
            dedup_blocks: true,
            title_max_len: 80,
        }
    }
}
