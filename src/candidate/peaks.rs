//! Local-peak extraction from a response surface.

use crate::kernel::ResponseMap;

/// Local maximum of a response surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    /// X coordinate (column) of the placement.
    pub x: usize,
    /// Y coordinate (row) of the placement.
    pub y: usize,
    /// ZNCC score at the placement.
    pub score: f32,
}

/// Collects every placement that is at least as high as its 8 neighbors and
/// scores at or above `min_score`, in scan order.
///
/// Plateaus yield several peaks; box suppression collapses them afterwards.
pub(crate) fn local_peaks(response: &ResponseMap, min_score: f32) -> Vec<Peak> {
    let w = response.width();
    let h = response.height();
    let scores = response.as_slice();
    let mut out = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let score = scores[y * w + x];
            if !score.is_finite() || score < min_score {
                continue;
            }
            let mut is_peak = true;
            'neighbors: for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                    if (nx, ny) != (x, y) && scores[ny * w + nx] > score {
                        is_peak = false;
                        break 'neighbors;
                    }
                }
            }
            if is_peak {
                out.push(Peak { x, y, score });
            }
        }
    }

    out
}
