//! Output types handed to renderers and printed by the CLI.

use crate::images::ImageDescriptor;
use crate::outline::DocumentOutline;
use crate::pipeline::normalize::OutlineSource;
use crate::pipeline::slides::{SlideKind, SlidePlan};
use serde::{Deserialize, Serialize};

/// Everything a renderer needs to produce a deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckPlan {
    pub outline: DocumentOutline,
    /// Filtered, size-sorted images. Slide plans and image hints index into this.
    pub images: Vec<ImageDescriptor>,
    pub slides: Vec<SlidePlan>,
    /// Whether the outline came from the analyzer or the heuristic scan.
    pub source: OutlineSource,
    pub stats: PlanStats,
}

/// Statistics about one planning run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlanStats {
    pub sections: usize,
    pub slides_with_images: usize,
    pub table_slides: usize,
    pub images_available: usize,
    pub used_fallback: bool,
    pub analyzer_input_tokens: usize,
    pub analyzer_output_tokens: usize,
    pub analyzer_duration_ms: u64,
    pub total_duration_ms: u64,
}

impl PlanStats {
    /// Count layouts in `slides`.
    pub(crate) fn count_slides(&mut self, slides: &[SlidePlan]) {
        self.sections = slides.len();
        self.slides_with_images = slides
            .iter()
            .filter(|s| matches!(s.kind, SlideKind::WithImage { .. }))
            .count();
        self.table_slides = slides
            .iter()
            .filter(|s| matches!(s.kind, SlideKind::Table { .. }))
            .count();
    }
}
