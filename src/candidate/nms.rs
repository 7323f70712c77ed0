//! Non-maximum suppression over candidate bounding boxes.

use crate::candidate::MatchCandidate;
use std::cmp::Ordering;

/// Overlap fraction (of the smaller box) at which the weaker box is dropped.
pub const DEFAULT_MAX_OVERLAP: f32 = 0.5;

fn candidate_cmp_desc(a: &MatchCandidate, b: &MatchCandidate) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| a.top_left.y.cmp(&b.top_left.y))
        .then_with(|| a.top_left.x.cmp(&b.top_left.x))
}

/// Applies box-overlap non-maximum suppression.
///
/// Candidates are sorted by descending confidence (ties keep scan order:
/// top-to-bottom, then left-to-right). Each candidate is kept unless it
/// overlaps an already kept box by `max_overlap` or more of the smaller
/// box's area. At most `limit` candidates are returned.
pub fn nms_boxes(
    candidates: &mut [MatchCandidate],
    max_overlap: f32,
    limit: usize,
) -> Vec<MatchCandidate> {
    candidates.sort_by(candidate_cmp_desc);
    let mut kept: Vec<MatchCandidate> = Vec::new();

    'outer: for cand in candidates.iter().copied() {
        if kept.len() >= limit {
            break;
        }
        let rect = cand.rect();
        for kept_cand in kept.iter() {
            if rect.overlap_of_smaller(&kept_cand.rect()) >= max_overlap {
                continue 'outer;
            }
        }
        kept.push(cand);
    }

    kept
}
