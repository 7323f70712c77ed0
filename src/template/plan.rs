//! Template plan precomputation for ZNCC.

use crate::image::ImageView;
use crate::util::{LocateError, LocateResult};

/// Variance below this is treated as a flat, unmatchable template.
pub(crate) const MIN_TEMPLATE_VARIANCE: f64 = 1e-6;

/// Precomputed statistics and zero-mean buffer for template matching.
///
/// Means are taken per channel so a color template correlates each channel
/// against its own mean, the same way a normalized correlation coefficient is
/// computed over interleaved color data.
#[derive(Clone, Debug)]
pub struct TemplatePlan {
    width: usize,
    height: usize,
    channels: usize,
    means: Vec<f32>,
    var_t: f32,
    t_prime: Vec<f32>,
}

impl TemplatePlan {
    /// Builds a plan from a template view.
    pub fn from_view(tpl: ImageView<'_, u8>) -> LocateResult<Self> {
        let width = tpl.width();
        let height = tpl.height();
        let channels = tpl.channels();
        let count = width
            .checked_mul(height)
            .ok_or(LocateError::InvalidDimensions { width, height })?;

        let mut sums = vec![0.0f64; channels];
        for y in 0..height {
            let row = tpl.row(y).expect("row within template bounds");
            for px in row.chunks_exact(channels) {
                for (c, &value) in px.iter().enumerate() {
                    sums[c] += value as f64;
                }
            }
        }
        let means: Vec<f64> = sums.iter().map(|s| s / count as f64).collect();

        let mut var_t = 0.0f64;
        let mut t_prime = Vec::with_capacity(count * channels);
        for y in 0..height {
            let row = tpl.row(y).expect("row within template bounds");
            for px in row.chunks_exact(channels) {
                for (c, &value) in px.iter().enumerate() {
                    let d = value as f64 - means[c];
                    var_t += d * d;
                    t_prime.push(d as f32);
                }
            }
        }

        if var_t / (count * channels) as f64 <= MIN_TEMPLATE_VARIANCE {
            return Err(LocateError::InvalidMatchInput {
                reason: "template has zero variance",
            });
        }

        Ok(Self {
            width,
            height,
            channels,
            means: means.into_iter().map(|m| m as f32).collect(),
            var_t: var_t as f32,
            t_prime,
        })
    }

    /// Returns the template width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the template height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of interleaved channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the per-channel mean intensity.
    pub fn means(&self) -> &[f32] {
        &self.means
    }

    /// Returns the summed squared deviation over all samples.
    pub fn var_t(&self) -> f32 {
        self.var_t
    }

    /// Returns the zero-mean template samples in row-major interleaved order.
    pub fn t_prime(&self) -> &[f32] {
        &self.t_prime
    }
}

#[cfg(test)]
mod tests {
    use super::TemplatePlan;
    use crate::image::ImageView;
    use crate::util::LocateError;

    #[test]
    fn plan_matches_known_stats() {
        let data = [0u8, 1, 2, 3];
        let view = ImageView::from_slice(&data, 2, 2).unwrap();
        let plan = TemplatePlan::from_view(view).unwrap();
        assert!((plan.means()[0] - 1.5).abs() < 1e-6);
        assert!((plan.var_t() - 5.0).abs() < 1e-6);
        let expected = [-1.5f32, -0.5, 0.5, 1.5];
        for (value, want) in plan.t_prime().iter().zip(expected.iter()) {
            assert!((value - want).abs() < 1e-6);
        }
    }

    #[test]
    fn color_plan_uses_per_channel_means() {
        // Two pixels: (10, 100, 0) and (30, 100, 50).
        let data = [10u8, 100, 0, 30, 100, 50];
        let view = ImageView::from_interleaved(&data, 2, 1, 3).unwrap();
        let plan = TemplatePlan::from_view(view).unwrap();
        assert_eq!(plan.means(), &[20.0, 100.0, 25.0]);
        assert_eq!(plan.t_prime(), &[-10.0, 0.0, -25.0, 10.0, 0.0, 25.0]);
    }

    #[test]
    fn flat_template_is_rejected() {
        let data = [7u8; 9];
        let view = ImageView::from_slice(&data, 3, 3).unwrap();
        let err = TemplatePlan::from_view(view).unwrap_err();
        assert_eq!(
            err,
            LocateError::InvalidMatchInput {
                reason: "template has zero variance"
            }
        );
    }
}
