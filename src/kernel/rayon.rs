//! Rayon-parallel kernel (feature-gated).
//!
//! Parallelizes the response surface over placement rows; each worker scores
//! every x position in its rows against shared summed-area tables.

use crate::kernel::scalar::{placement_range, variance_floor, window_dot, zncc_score, WindowStats};
use crate::kernel::{Kernel, ResponseMap};
use crate::template::TemplatePlan;
use crate::util::LocateResult;
use crate::ImageView;
use rayon::prelude::*;

/// Row-parallel ZNCC kernel.
pub struct ZnccRayon;

impl Kernel for ZnccRayon {
    fn response(
        image: ImageView<'_, u8>,
        plan: &TemplatePlan,
        min_var_i: f32,
    ) -> LocateResult<ResponseMap> {
        let (nx, ny) = placement_range(image, plan)?;
        let stats = WindowStats::new(image);
        let floor = variance_floor(plan, min_var_i);

        let rows: Vec<Vec<f32>> = (0..ny)
            .into_par_iter()
            .map(|y| {
                (0..nx)
                    .map(|x| {
                        let var_i = stats.window_var(x, y, plan.width(), plan.height());
                        if var_i <= floor {
                            return f32::NEG_INFINITY;
                        }
                        zncc_score(window_dot(image, plan, x, y), plan.var_t(), var_i, floor)
                    })
                    .collect()
            })
            .collect();

        let scores = rows.into_iter().flatten().collect();
        Ok(ResponseMap::from_scores(nx, ny, scores))
    }
}
