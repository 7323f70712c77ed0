//! Scalar reference kernel for ZNCC response surfaces.

use crate::kernel::{Kernel, ResponseMap};
use crate::template::TemplatePlan;
use crate::util::{LocateError, LocateResult};
use crate::ImageView;

/// Scalar ZNCC kernel over interleaved 8-bit images.
pub struct ZnccScalar;

/// Per-channel summed-area tables of intensities and squared intensities.
///
/// Window sums are O(1) per placement; only the template dot product scales
/// with template size.
pub(crate) struct WindowStats {
    width: usize,
    channels: usize,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl WindowStats {
    pub(crate) fn new(image: ImageView<'_, u8>) -> Self {
        let width = image.width();
        let height = image.height();
        let channels = image.channels();
        let cols = width + 1;
        let len = cols * (height + 1) * channels;
        let mut sum = vec![0.0f64; len];
        let mut sum_sq = vec![0.0f64; len];

        for y in 0..height {
            let row = image.row(y).expect("row within image bounds");
            let mut acc = vec![0.0f64; channels];
            let mut acc_sq = vec![0.0f64; channels];
            for x in 0..width {
                for c in 0..channels {
                    let v = row[x * channels + c] as f64;
                    acc[c] += v;
                    acc_sq[c] += v * v;
                    let here = ((y + 1) * cols + x + 1) * channels + c;
                    let above = (y * cols + x + 1) * channels + c;
                    sum[here] = sum[above] + acc[c];
                    sum_sq[here] = sum_sq[above] + acc_sq[c];
                }
            }
        }

        Self {
            width,
            channels,
            sum,
            sum_sq,
        }
    }

    /// Summed variance numerator `Σc (Σ I² - (Σ I)² / n)` over a window.
    pub(crate) fn window_var(&self, x: usize, y: usize, w: usize, h: usize) -> f64 {
        let cols = self.width + 1;
        let n = (w * h) as f64;
        let idx = |xx: usize, yy: usize, c: usize| (yy * cols + xx) * self.channels + c;
        let mut var = 0.0f64;
        for c in 0..self.channels {
            let s = self.sum[idx(x + w, y + h, c)] - self.sum[idx(x, y + h, c)]
                - self.sum[idx(x + w, y, c)]
                + self.sum[idx(x, y, c)];
            let s2 = self.sum_sq[idx(x + w, y + h, c)] - self.sum_sq[idx(x, y + h, c)]
                - self.sum_sq[idx(x + w, y, c)]
                + self.sum_sq[idx(x, y, c)];
            var += s2 - s * s / n;
        }
        var
    }
}

/// Checks that the template fits and the channel layouts agree.
///
/// Returns the number of placements along x and y.
pub(crate) fn placement_range(
    image: ImageView<'_, u8>,
    plan: &TemplatePlan,
) -> LocateResult<(usize, usize)> {
    if image.channels() != plan.channels() {
        return Err(LocateError::InvalidMatchInput {
            reason: "image and template channel counts differ",
        });
    }
    if image.width() < plan.width() || image.height() < plan.height() {
        return Err(LocateError::RoiOutOfBounds {
            x: 0,
            y: 0,
            width: plan.width(),
            height: plan.height(),
            img_width: image.width(),
            img_height: image.height(),
        });
    }
    Ok((
        image.width() - plan.width() + 1,
        image.height() - plan.height() + 1,
    ))
}

/// Dot product of the zero-mean template with the window at `(x, y)`.
pub(crate) fn window_dot(image: ImageView<'_, u8>, plan: &TemplatePlan, x: usize, y: usize) -> f64 {
    let row_len = plan.width() * plan.channels();
    let t_prime = plan.t_prime();
    let mut dot = 0.0f64;
    for ty in 0..plan.height() {
        let img_row = image.row(y + ty).expect("row within bounds for scan");
        let start = x * plan.channels();
        let window = &img_row[start..start + row_len];
        let tpl_row = &t_prime[ty * row_len..(ty + 1) * row_len];
        let mut acc = 0.0f32;
        for (t, &v) in tpl_row.iter().zip(window) {
            acc += t * v as f32;
        }
        dot += acc as f64;
    }
    dot
}

/// Total variance floor for a window, from a per-sample threshold.
///
/// Flat windows carry summed-area rounding noise far above zero, so the floor
/// has to scale with the number of samples.
pub(crate) fn variance_floor(plan: &TemplatePlan, min_var_i: f32) -> f64 {
    min_var_i as f64 * (plan.width() * plan.height() * plan.channels()) as f64
}

/// Normalizes a dot product into a ZNCC score in `[-1, 1]`.
pub(crate) fn zncc_score(dot: f64, var_t: f32, var_i: f64, floor: f64) -> f32 {
    if var_i <= floor {
        return f32::NEG_INFINITY;
    }
    let score = dot / (var_t as f64 * var_i).sqrt();
    if score.is_finite() {
        score.clamp(-1.0, 1.0) as f32
    } else {
        f32::NEG_INFINITY
    }
}

impl Kernel for ZnccScalar {
    fn response(
        image: ImageView<'_, u8>,
        plan: &TemplatePlan,
        min_var_i: f32,
    ) -> LocateResult<ResponseMap> {
        let (nx, ny) = placement_range(image, plan)?;
        let stats = WindowStats::new(image);
        let floor = variance_floor(plan, min_var_i);
        let mut scores = Vec::with_capacity(nx * ny);
        for y in 0..ny {
            for x in 0..nx {
                let var_i = stats.window_var(x, y, plan.width(), plan.height());
                let score = if var_i <= floor {
                    f32::NEG_INFINITY
                } else {
                    zncc_score(window_dot(image, plan, x, y), plan.var_t(), var_i, floor)
                };
                scores.push(score);
            }
        }
        Ok(ResponseMap::from_scores(nx, ny, scores))
    }
}
