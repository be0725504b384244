//! Batch-relative score normalization onto a `0.0..=10.0` scale.

use topmetric_core::VideoRecord;

/// Upper bound of the normalized scale.
pub const MAX_NORMALIZED_SCORE: f64 = 10.0;

/// Where a record's normalized score comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreSource {
    /// Always recompute against the batch's top `trending_score`.
    #[default]
    Recompute,
    /// Keep an upstream `normalized_score` when one is present (clamped to
    /// the scale); recompute only for records that lack one.
    TrustUpstream,
}

/// Normalizes a batch by recomputing every score against the batch maximum.
///
/// Equivalent to [`normalize_with`] using [`ScoreSource::Recompute`].
#[must_use]
pub fn normalize(batch: &[VideoRecord]) -> Vec<VideoRecord> {
    normalize_with(batch, ScoreSource::Recompute)
}

/// Returns copies of `batch` with `normalized_score` set in `[0.0, 10.0]`.
///
/// The reference is the largest `trending_score` in the batch; an empty batch
/// or a non-positive maximum uses `1.0` instead. Missing, negative, or
/// non-finite trending scores count as `0.0`. Never fails.
#[must_use]
pub fn normalize_with(batch: &[VideoRecord], source: ScoreSource) -> Vec<VideoRecord> {
    let top_score = top_score(batch);

    tracing::debug!(
        records = batch.len(),
        top_score,
        ?source,
        "normalizing batch"
    );

    batch
        .iter()
        .map(|record| {
            let upstream = match source {
                ScoreSource::TrustUpstream => record
                    .upstream_normalized_score
                    .filter(|s| s.is_finite())
                    .map(clamp_to_scale),
                ScoreSource::Recompute => None,
            };
            let normalized_score = upstream.unwrap_or_else(|| {
                let ratio = usable_score(record.trending_score) / top_score;
                clamp_to_scale(ratio * MAX_NORMALIZED_SCORE)
            });

            VideoRecord {
                normalized_score,
                ..record.clone()
            }
        })
        .collect()
}

/// Largest usable `trending_score`, or `1.0` when none is positive.
fn top_score(batch: &[VideoRecord]) -> f64 {
    let max = batch
        .iter()
        .map(|r| usable_score(r.trending_score))
        .fold(0.0_f64, f64::max);
    if max > 0.0 {
        max
    } else {
        1.0
    }
}

/// Maps missing/negative/non-finite scores to `0.0`.
pub(crate) fn usable_score(score: f64) -> f64 {
    if score.is_finite() && score > 0.0 {
        score
    } else {
        0.0
    }
}

fn clamp_to_scale(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, MAX_NORMALIZED_SCORE)
    } else {
        0.0
    }
}
