//! Correlation kernel implementations.
//!
//! A kernel turns a screen region and a template plan into a dense response
//! surface: one normalized cross-correlation score per valid top-left
//! placement of the template inside the region.

use crate::template::TemplatePlan;
use crate::util::LocateResult;
use crate::ImageView;

pub mod scalar;

#[cfg(feature = "rayon")]
pub mod rayon;

/// Dense ZNCC scores indexed by template placement.
///
/// Placements whose image window is too flat to score hold
/// `f32::NEG_INFINITY`.
#[derive(Clone, Debug)]
pub struct ResponseMap {
    width: usize,
    height: usize,
    scores: Vec<f32>,
}

impl ResponseMap {
    pub(crate) fn from_scores(width: usize, height: usize, scores: Vec<f32>) -> Self {
        debug_assert_eq!(scores.len(), width * height);
        Self {
            width,
            height,
            scores,
        }
    }

    /// Number of horizontal placements.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of vertical placements.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Score for the placement with top-left corner `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.scores.get(y * self.width + x).copied()
    }

    /// Row-major scores.
    pub fn as_slice(&self) -> &[f32] {
        &self.scores
    }
}

/// Full-surface correlation evaluation.
pub trait Kernel {
    /// Computes the response surface over every valid placement.
    fn response(
        image: ImageView<'_, u8>,
        plan: &TemplatePlan,
        min_var_i: f32,
    ) -> LocateResult<ResponseMap>;
}
