//! Candidate selection and pruning utilities.
//!
//! Includes local-peak extraction from a response surface and box-overlap
//! non-maximum suppression.

pub(crate) mod nms;
pub(crate) mod peaks;

use crate::util::{Point, Rect, Size};

/// One scored match location, in the coordinate space of the searched image
/// until a locator translates it to screen space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchCandidate {
    /// Top-left pixel of the matched region.
    pub top_left: Point,
    /// Size of the matched region (the template size).
    pub size: Size,
    /// ZNCC score in `[0, 1]` for accepted candidates.
    pub confidence: f32,
}

impl MatchCandidate {
    /// Bounding box of the match.
    pub fn rect(&self) -> Rect {
        Rect {
            origin: self.top_left,
            size: self.size,
        }
    }

    /// Point used for interaction: the center of the bounding box.
    pub fn center(&self) -> Point {
        self.rect().center()
    }

    /// Returns the candidate moved by `(dx, dy)`.
    pub fn translated(self, dx: i32, dy: i32) -> Self {
        Self {
            top_left: self.top_left.offset(dx, dy),
            ..self
        }
    }
}
