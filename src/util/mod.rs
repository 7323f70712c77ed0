//! Shared utility helpers.

pub mod error;
pub mod geom;

pub use error::{LocateError, Result as LocateResult};
pub use geom::{Point, Rect, Size};
