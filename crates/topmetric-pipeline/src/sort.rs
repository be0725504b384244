//! Deterministic fallback ordering for batches whose upstream order is not
//! trusted.

use std::cmp::Ordering;

use topmetric_core::VideoRecord;

use crate::normalize::usable_score;

/// Returns a copy of `batch` ordered by:
///
/// 1. `trending_score` descending,
/// 2. regional relevance score descending (absent verdicts count as `0.0`),
/// 3. original `rank` ascending.
///
/// The sort is stable, so records equal on all three keys keep their input
/// order and repeated calls yield the same order.
#[must_use]
pub fn sort_descending(batch: &[VideoRecord]) -> Vec<VideoRecord> {
    let mut sorted = batch.to_vec();
    sorted.sort_by(compare_records);
    sorted
}

fn compare_records(a: &VideoRecord, b: &VideoRecord) -> Ordering {
    usable_score(b.trending_score)
        .total_cmp(&usable_score(a.trending_score))
        .then_with(|| {
            let (a_regional, b_regional) = (a.relevance_sort_score(), b.relevance_sort_score());
            usable_score(b_regional).total_cmp(&usable_score(a_regional))
        })
        .then_with(|| a.rank.cmp(&b.rank))
}
