//! Template precomputation for correlation matching.

mod plan;

pub use plan::TemplatePlan;
