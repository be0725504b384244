//! End-to-end tests: raw scoring-service JSON through normalization, tier
//! filtering, and CSV export, exercised only through the public API.

use chrono::NaiveDate;
use serde_json::{json, Value};

use topmetric_core::{parse_tiers, TierSet};
use topmetric_pipeline::{
    apply_tier, apply_tier_key, batch_from_json, derive_filename, resolve_tier,
    to_delimited_text, PipelineError, PipelineOptions, ScoreSource, EXPORT_COLUMNS,
};

/// Five records covering every relevance shape the service produces.
fn sample_response() -> Value {
    json!({
        "success": true,
        "query": "gaming news",
        "region": "DE",
        "analyzed_videos": 250,
        "timestamp": "2025-03-01T12:00:00Z",
        "algorithm_used": "v6_clean",
        "top_videos": [
            {
                "rank": 1,
                "title": "Patch notes, explained",
                "channel": "GameStar",
                "views": 120_000,
                "trending_score": 50.0,
                "engagement_rate": 0.05,
                "url": "https://www.youtube.com/watch?v=AAAAAAAAAAA",
                "regionalRelevance": { "score": 0.9, "confidence": 0.95, "blacklisted": false }
            },
            {
                "rank": 2,
                "title": "He said \"hi\", twice",
                "channel": "Clips",
                "views": 80_000,
                "trending_score": 100.0,
                "url": "https://youtu.be/BBBBBBBBBBB",
                "regional_relevance_score": 0.4,
                "confidence": 0.55
            },
            {
                "rank": 3,
                "title": "No verdict",
                "trending_score": 0.0
            },
            {
                "rank": 4,
                "title": "Spam",
                "trending_score": 90.0,
                "regionalRelevance": { "score": 1.0, "confidence": 1.0, "blacklisted": true }
            },
            {
                "rank": 5,
                "title": "Regional pick",
                "trending_score": 25.0,
                "regionalRelevance": { "score": 0.65, "confidence": 0.7, "blacklisted": false }
            }
        ]
    })
}

fn ranks(records: &[topmetric_core::VideoRecord]) -> Vec<u32> {
    records.iter().map(|r| r.rank).collect()
}

#[test]
fn normalizes_against_batch_maximum_and_keeps_upstream_order() {
    let batch = batch_from_json(&sample_response(), &PipelineOptions::default()).unwrap();

    assert_eq!(ranks(batch.records()), vec![1, 2, 3, 4, 5]);
    let scores: Vec<f64> = batch.records().iter().map(|r| r.normalized_score).collect();
    assert_eq!(scores, vec![5.0, 10.0, 0.0, 9.0, 2.5]);
    assert_eq!(batch.metadata().analyzed_count, 250);
    assert_eq!(batch.metadata().algorithm_used.as_deref(), Some("v6_clean"));
}

#[test]
fn untrusted_order_falls_back_to_local_sort() {
    let options = PipelineOptions {
        trust_upstream_order: false,
        score_source: ScoreSource::Recompute,
    };
    let batch = batch_from_json(&sample_response(), &options).unwrap();
    assert_eq!(ranks(batch.records()), vec![2, 4, 1, 5, 3]);
}

#[test]
fn every_tier_is_a_replay_of_the_same_snapshot() {
    let batch = batch_from_json(&sample_response(), &PipelineOptions::default()).unwrap();
    let tiers = TierSet::builtin();

    let view = |key: &str| ranks(&apply_tier(batch.records(), resolve_tier(&tiers, key).unwrap()));

    assert_eq!(view("all"), vec![1, 2, 3, 5]);
    assert_eq!(view("low-spam"), vec![1, 2, 3, 5]);
    assert_eq!(view("good"), vec![1, 2, 3, 5]);
    assert_eq!(view("regional"), vec![1, 5]);
    assert_eq!(view("premium"), vec![1]);
    // Back to "all" after the narrowest view.
    assert_eq!(view("all"), vec![1, 2, 3, 5]);
    assert_eq!(batch.len(), 5);
}

#[test]
fn unknown_tier_fails_open_but_strict_lookup_errors() {
    let batch = batch_from_json(&sample_response(), &PipelineOptions::default()).unwrap();
    let tiers = TierSet::builtin();

    assert_eq!(apply_tier_key(batch.records(), &tiers, "platinum").len(), 5);
    assert!(matches!(
        resolve_tier(&tiers, "platinum"),
        Err(PipelineError::UnknownTier(_))
    ));
}

#[test]
fn custom_tier_file_drives_filtering() {
    let tiers = parse_tiers(
        r"
tiers:
  - key: all
    min_confidence: 0.0
    min_regional_score: 0.0
  - key: strict
    min_confidence: 0.9
    min_regional_score: 0.85
    label: Strict only
",
    )
    .unwrap();
    let batch = batch_from_json(&sample_response(), &PipelineOptions::default()).unwrap();
    let strict = apply_tier_key(batch.records(), &tiers, "strict");
    assert_eq!(ranks(&strict), vec![1]);
}

#[test]
fn filtered_view_exports_to_csv() {
    let batch = batch_from_json(&sample_response(), &PipelineOptions::default()).unwrap();
    let tiers = TierSet::builtin();
    let view = apply_tier(batch.records(), resolve_tier(&tiers, "good").unwrap());

    let text = to_delimited_text(&view).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), view.len() + 1);
    assert_eq!(lines[0], EXPORT_COLUMNS.join(","));
    assert!(lines[1].starts_with("1,\"Patch notes, explained\",\"GameStar\",120000,0,0,5.0,"));
    assert!(lines[1].contains(",5.00%,"));
    assert!(lines[2].starts_with("2,\"He said \"\"hi\"\", twice\",\"Clips\","));
    assert!(lines[2].ends_with("\"https://img.youtube.com/vi/BBBBBBBBBBB/maxresdefault.jpg\""));
    assert!(lines[3].starts_with("3,\"No verdict\",\"Unknown\",0,0,0,0.0,0,\"00:00\",0.00%,"));
}

#[test]
fn empty_tier_view_cannot_be_exported() {
    let body = json!({
        "success": true,
        "top_videos": [{ "regionalRelevance": { "score": 0.1, "confidence": 0.1 } }]
    });
    let batch = batch_from_json(&body, &PipelineOptions::default()).unwrap();
    let view = apply_tier_key(batch.records(), &TierSet::builtin(), "premium");

    assert!(view.is_empty());
    let err = to_delimited_text(&view).unwrap_err();
    assert!(err.is_empty_result());
}

#[test]
fn export_filename_uses_response_query() {
    let batch = batch_from_json(&sample_response(), &PipelineOptions::default()).unwrap();
    let query = batch.metadata().query.as_deref().unwrap_or_default();
    let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    assert_eq!(
        derive_filename(query, "csv", date),
        "trending_gaming_news_2025-03-01.csv"
    );
}

#[test]
fn upstream_failure_never_produces_a_batch() {
    let body = json!({
        "success": false,
        "error": "region not supported",
        "top_videos": [{ "trending_score": 10 }]
    });
    let err = batch_from_json(&body, &PipelineOptions::default()).unwrap_err();
    assert_eq!(err.to_string(), "upstream analysis failed: region not supported");
}

#[test]
fn trusted_upstream_scores_are_clamped_not_recomputed() {
    let body = json!({
        "success": true,
        "top_videos": [
            { "trending_score": 100.0, "normalized_score": 12.5 },
            { "trending_score": 50.0, "normalized_score": 6.4 },
            { "trending_score": 25.0 }
        ]
    });
    let options = PipelineOptions {
        trust_upstream_order: true,
        score_source: ScoreSource::TrustUpstream,
    };
    let batch = batch_from_json(&body, &options).unwrap();
    let scores: Vec<f64> = batch.records().iter().map(|r| r.normalized_score).collect();
    assert_eq!(scores, vec![10.0, 6.4, 2.5]);
}
