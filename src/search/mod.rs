//! The matching engine: template in, ranked and de-duplicated candidates out.
//!
//! A match call computes the ZNCC response surface of the template over the
//! screen region, keeps every local response peak at or above the confidence
//! threshold, and collapses clusters of peaks that belong to the same physical
//! instance with box-overlap non-maximum suppression. The engine holds no
//! mutable state and never retries; a miss is an empty result.

use crate::candidate::nms::{nms_boxes, DEFAULT_MAX_OVERLAP};
use crate::candidate::peaks::local_peaks;
use crate::candidate::MatchCandidate;
use crate::image::io::view_to_gray;
use crate::image::{ImageView, OwnedImage};
#[cfg(feature = "rayon")]
use crate::kernel::rayon::ZnccRayon;
use crate::kernel::scalar::ZnccScalar;
use crate::kernel::{Kernel, ResponseMap};
use crate::template::TemplatePlan;
use crate::trace::{trace_event, trace_span};
use crate::util::{LocateError, LocateResult, Point, Size};

/// Configuration for the matching engine.
#[derive(Clone, Debug)]
pub struct MatchConfig {
    /// Convert color inputs to luma before correlating.
    pub grayscale: bool,
    /// Suppress a candidate overlapping a stronger one by at least this
    /// fraction of the smaller box's area.
    pub max_overlap: f32,
    /// Per-sample variance below which an image window is considered flat and
    /// is not scored.
    pub min_var_i: f32,
    /// Use the row-parallel kernel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            grayscale: true,
            max_overlap: DEFAULT_MAX_OVERLAP,
            min_var_i: 0.1,
            parallel: false,
        }
    }
}

/// Template matcher over screen regions.
#[derive(Clone, Debug, Default)]
pub struct Matcher {
    cfg: MatchConfig,
}

impl Matcher {
    /// Creates a matcher with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the matcher configuration.
    pub fn with_config(mut self, cfg: MatchConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &MatchConfig {
        &self.cfg
    }

    /// Finds up to `max_candidates` instances of `template` in `screen`,
    /// highest confidence first.
    ///
    /// Coordinates are relative to the top-left of `screen`. A template that
    /// does not fit in the region yields no candidates.
    pub fn match_template(
        &self,
        screen: ImageView<'_, u8>,
        template: ImageView<'_, u8>,
        min_confidence: f32,
        max_candidates: usize,
    ) -> LocateResult<Vec<MatchCandidate>> {
        let _span = trace_span!(
            "match_template",
            screen_w = screen.width(),
            screen_h = screen.height(),
            tpl_w = template.width(),
            tpl_h = template.height()
        )
        .entered();

        if !(0.0..=1.0).contains(&min_confidence) {
            return Err(LocateError::InvalidMatchInput {
                reason: "min_confidence must lie in [0, 1]",
            });
        }
        if max_candidates == 0 {
            return Ok(Vec::new());
        }
        if template.width() > screen.width() || template.height() > screen.height() {
            trace_event!("template_larger_than_region");
            return Ok(Vec::new());
        }

        let screen_gray: OwnedImage;
        let template_gray: OwnedImage;
        let to_gray = self.cfg.grayscale || screen.channels() != template.channels();
        let screen = if to_gray && screen.channels() != 1 {
            screen_gray = view_to_gray(screen)?;
            screen_gray.view()
        } else {
            screen
        };
        let template = if to_gray && template.channels() != 1 {
            template_gray = view_to_gray(template)?;
            template_gray.view()
        } else {
            template
        };

        let plan = TemplatePlan::from_view(template)?;
        let response = self.response(screen, &plan)?;

        let peaks = local_peaks(&response, min_confidence);
        let size = Size::new(plan.width() as u32, plan.height() as u32);
        let mut raw: Vec<MatchCandidate> = peaks
            .into_iter()
            .map(|peak| MatchCandidate {
                top_left: Point::new(peak.x as i32, peak.y as i32),
                size,
                confidence: peak.score,
            })
            .collect();
        let raw_count = raw.len();
        let kept = nms_boxes(&mut raw, self.cfg.max_overlap, max_candidates);

        trace_event!("match_candidates", raw = raw_count, kept = kept.len());
        Ok(kept)
    }

    /// Convenience wrapper over owned images.
    pub fn match_images(
        &self,
        screen: &OwnedImage,
        template: &OwnedImage,
        min_confidence: f32,
        max_candidates: usize,
    ) -> LocateResult<Vec<MatchCandidate>> {
        self.match_template(screen.view(), template.view(), min_confidence, max_candidates)
    }

    #[cfg(feature = "rayon")]
    fn response(&self, image: ImageView<'_, u8>, plan: &TemplatePlan) -> LocateResult<ResponseMap> {
        if self.cfg.parallel {
            return ZnccRayon::response(image, plan, self.cfg.min_var_i);
        }
        ZnccScalar::response(image, plan, self.cfg.min_var_i)
    }

    #[cfg(not(feature = "rayon"))]
    fn response(&self, image: ImageView<'_, u8>, plan: &TemplatePlan) -> LocateResult<ResponseMap> {
        ZnccScalar::response(image, plan, self.cfg.min_var_i)
    }
}
