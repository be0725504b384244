//! Quality-tier filtering over an already fetched batch.
//!
//! Filters are pure projections of the stored snapshot: they copy the
//! passing records out in input order and never renumber `rank`, so any tier
//! can be re-applied at any time without re-normalizing or re-fetching.

use topmetric_core::{QualityTier, TierSet, VideoRecord};

use crate::error::PipelineError;

/// `true` if `record` is not blacklisted and its regional relevance meets both
/// of the tier's thresholds. Records without a relevance verdict are judged
/// against the conservative default.
#[must_use]
pub fn passes_tier(record: &VideoRecord, tier: &QualityTier) -> bool {
    let relevance = record.relevance();
    !relevance.blacklisted
        && relevance.confidence >= tier.min_confidence
        && relevance.score >= tier.min_regional_score
}

/// Returns the records of `batch` that pass `tier`, in their original order.
///
/// Blacklisted records are excluded under every tier, `all` included. An
/// empty result is a valid outcome, not an error.
#[must_use]
pub fn apply_tier(batch: &[VideoRecord], tier: &QualityTier) -> Vec<VideoRecord> {
    batch
        .iter()
        .filter(|record| passes_tier(record, tier))
        .cloned()
        .collect()
}

/// Looks up `key` in `tiers`.
///
/// # Errors
///
/// Returns [`PipelineError::UnknownTier`] when no tier has that key.
pub fn resolve_tier<'a>(tiers: &'a TierSet, key: &str) -> Result<&'a QualityTier, PipelineError> {
    tiers
        .get(key)
        .ok_or_else(|| PipelineError::UnknownTier(key.to_string()))
}

/// Applies the tier named `key`, failing open on an unknown key.
///
/// An unrecognized key yields the full, unfiltered batch and a warning
/// rather than hiding every result. Callers that must reject unknown keys
/// should use [`resolve_tier`] followed by [`apply_tier`].
#[must_use]
pub fn apply_tier_key(batch: &[VideoRecord], tiers: &TierSet, key: &str) -> Vec<VideoRecord> {
    match resolve_tier(tiers, key) {
        Ok(tier) => apply_tier(batch, tier),
        Err(e) => {
            tracing::warn!(
                tier = key,
                known = ?tiers.keys(),
                error = %e,
                "unknown quality tier, returning unfiltered batch"
            );
            batch.to_vec()
        }
    }
}

#[cfg(test)]
mod tests {
    use topmetric_core::RegionalRelevance;

    use super::*;

    fn record(rank: u32, relevance: Option<(f64, f64, bool)>) -> VideoRecord {
        VideoRecord {
            rank,
            regional_relevance: relevance.map(|(score, confidence, blacklisted)| {
                RegionalRelevance::new(score, confidence, blacklisted, String::new())
            }),
            ..VideoRecord::default()
        }
    }

    fn ranks(records: &[VideoRecord]) -> Vec<u32> {
        records.iter().map(|r| r.rank).collect()
    }

    fn sample_batch() -> Vec<VideoRecord> {
        vec![
            record(1, Some((0.9, 0.95, false))),
            record(2, Some((0.4, 0.55, false))),
            record(3, None),
            record(4, Some((1.0, 1.0, true))),
            record(5, Some((0.6, 0.65, false))),
            record(6, Some((0.05, 0.2, false))),
        ]
    }

    #[test]
    fn all_tier_keeps_every_non_blacklisted_record() {
        let tiers = TierSet::builtin();
        let all = tiers.get("all").unwrap();
        assert_eq!(ranks(&apply_tier(&sample_batch(), all)), vec![1, 2, 3, 5, 6]);
    }

    #[test]
    fn record_without_relevance_passes_all_tier() {
        let tiers = TierSet::builtin();
        let all = tiers.get("all").unwrap();
        assert!(passes_tier(&record(1, None), all));
    }

    #[test]
    fn record_without_relevance_stops_at_good_tier() {
        let tiers = TierSet::builtin();
        assert!(passes_tier(&record(1, None), tiers.get("low-spam").unwrap()));
        assert!(passes_tier(&record(1, None), tiers.get("good").unwrap()));
        assert!(!passes_tier(&record(1, None), tiers.get("regional").unwrap()));
        assert!(!passes_tier(&record(1, None), tiers.get("premium").unwrap()));
    }

    #[test]
    fn blacklisted_record_is_excluded_from_every_tier() {
        let spam = record(1, Some((1.0, 1.0, true)));
        for tier in TierSet::builtin().iter() {
            assert!(!passes_tier(&spam, tier), "tier {} kept spam", tier.key);
        }
    }

    #[test]
    fn thresholds_are_inclusive() {
        let tier = QualityTier::new("edge", 0.5, 0.3);
        assert!(passes_tier(&record(1, Some((0.3, 0.5, false))), &tier));
        assert!(!passes_tier(&record(1, Some((0.29, 0.5, false))), &tier));
    }

    #[test]
    fn stricter_tiers_return_subsets() {
        let batch = sample_batch();
        let tiers = TierSet::builtin();
        let views: Vec<Vec<u32>> = tiers.iter().map(|t| ranks(&apply_tier(&batch, t))).collect();
        for pair in views.windows(2) {
            assert!(pair[1].iter().all(|r| pair[0].contains(r)));
        }
        assert_eq!(ranks(&apply_tier(&batch, tiers.get("premium").unwrap())), vec![1]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let tiers = TierSet::builtin();
        let good = tiers.get("good").unwrap();
        let once = apply_tier(&sample_batch(), good);
        let twice = apply_tier(&once, good);
        assert_eq!(once, twice);
    }

    #[test]
    fn ranks_are_not_renumbered() {
        let tiers = TierSet::builtin();
        let regional = tiers.get("regional").unwrap();
        assert_eq!(ranks(&apply_tier(&sample_batch(), regional)), vec![1, 5]);
    }

    #[test]
    fn switching_tiers_recovers_the_full_set() {
        let batch = sample_batch();
        let tiers = TierSet::builtin();
        let _premium = apply_tier(&batch, tiers.get("premium").unwrap());
        let all = apply_tier(&batch, tiers.get("all").unwrap());
        assert_eq!(all.len(), 5);
        assert_eq!(batch.len(), 6);
    }

    #[test]
    fn no_qualifying_records_yields_empty_vec() {
        let batch = vec![record(1, Some((0.1, 0.1, false)))];
        let tiers = TierSet::builtin();
        assert!(apply_tier(&batch, tiers.get("premium").unwrap()).is_empty());
    }

    #[test]
    fn resolve_tier_rejects_unknown_key() {
        let err = resolve_tier(&TierSet::builtin(), "gold").unwrap_err();
        assert!(matches!(err, PipelineError::UnknownTier(ref k) if k == "gold"));
    }

    #[test]
    fn apply_tier_key_fails_open_on_unknown_key() {
        let batch = sample_batch();
        let view = apply_tier_key(&batch, &TierSet::builtin(), "gold");
        assert_eq!(view, batch);
    }

    #[test]
    fn apply_tier_key_filters_on_known_key() {
        let view = apply_tier_key(&sample_batch(), &TierSet::builtin(), "PREMIUM");
        assert_eq!(ranks(&view), vec![1]);
    }
}
