//! Boundary between the scoring service's loosely typed JSON and the
//! well-typed records every pipeline stage assumes.
//!
//! Each record is coerced independently. A malformed field is replaced by
//! its documented default and never aborts the rest of the batch.

use serde_json::{Map, Value};
use topmetric_core::{
    AnalysisStatistics, BatchMetadata, RegionalRelevance, VideoRecord, VideoSource,
    DEFAULT_DURATION, UNKNOWN_TEXT,
};

use crate::error::PipelineError;

/// Keys that may hold the record list, in lookup order.
const RECORD_KEYS: [&str; 3] = ["top_videos", "videos", "results"];

const GENERIC_FAILURE: &str = "analysis failed";

/// A successful scoring-service response, coerced but not yet normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResponse {
    pub records: Vec<VideoRecord>,
    pub metadata: BatchMetadata,
    /// Entries of the record list that were not JSON objects.
    pub skipped_records: usize,
}

/// Parses raw response text. See [`parse_analysis_response`].
///
/// # Errors
///
/// Returns [`PipelineError::Deserialize`] if `text` is not JSON, otherwise
/// whatever [`parse_analysis_response`] returns.
pub fn parse_analysis_response_str(text: &str) -> Result<AnalysisResponse, PipelineError> {
    let value: Value = serde_json::from_str(text).map_err(|source| PipelineError::Deserialize {
        context: "analysis response".to_string(),
        source,
    })?;
    parse_analysis_response(&value)
}

/// Validates a scoring-service response and coerces its records.
///
/// # Errors
///
/// - [`PipelineError::InvalidResponse`] if the body is not a JSON object or
///   the record list is present but not an array.
/// - [`PipelineError::UpstreamFailure`] if `success` is missing or false. The
///   message is the response's `error`, else `message`, else a generic one.
pub fn parse_analysis_response(body: &Value) -> Result<AnalysisResponse, PipelineError> {
    let Some(object) = body.as_object() else {
        return Err(PipelineError::InvalidResponse {
            reason: format!("expected a JSON object, got {}", json_kind(body)),
        });
    };

    if object.get("success").and_then(Value::as_bool) != Some(true) {
        let message = ["error", "message"]
            .iter()
            .find_map(|key| non_empty_str(object.get(*key)))
            .unwrap_or(GENERIC_FAILURE)
            .to_string();
        tracing::warn!(error = %message, "scoring service reported failure");
        return Err(PipelineError::UpstreamFailure { message });
    }

    let entries = record_entries(object)?;
    let mut records = Vec::with_capacity(entries.len());
    let mut skipped_records = 0_usize;

    for (index, entry) in entries.iter().enumerate() {
        match entry.as_object() {
            Some(fields) => records.push(coerce_record(fields, index)),
            None => {
                skipped_records += 1;
                tracing::warn!(
                    index,
                    kind = json_kind(entry),
                    "skipping non-object entry in record list"
                );
            }
        }
    }

    Ok(AnalysisResponse {
        records,
        metadata: coerce_metadata(object),
        skipped_records,
    })
}

fn record_entries(object: &Map<String, Value>) -> Result<&[Value], PipelineError> {
    let Some((key, list)) = RECORD_KEYS
        .iter()
        .find_map(|key| object.get(*key).filter(|v| !v.is_null()).map(|v| (*key, v)))
    else {
        return Ok(&[]);
    };

    list.as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| PipelineError::InvalidResponse {
            reason: format!("`{key}` must be an array, got {}", json_kind(list)),
        })
}

fn coerce_record(fields: &Map<String, Value>, index: usize) -> VideoRecord {
    let rank = fields
        .get("rank")
        .and_then(value_as_f64)
        .filter(|r| r.is_finite() && *r >= 1.0)
        .and_then(|r| float_to_u64(r).and_then(|r| u32::try_from(r).ok()))
        .unwrap_or_else(|| u32::try_from(index + 1).unwrap_or(u32::MAX));

    VideoRecord {
        rank,
        video_id: non_empty_str(fields.get("video_id")).map(str::to_string),
        title: text(fields.get("title"), UNKNOWN_TEXT),
        channel: text(fields.get("channel"), UNKNOWN_TEXT),
        views: count(fields.get("views")),
        likes: count(fields.get("likes")),
        comments: count(fields.get("comments")),
        trending_score: number(fields.get("trending_score")),
        normalized_score: 0.0,
        upstream_normalized_score: fields.get("normalized_score").and_then(value_as_f64),
        age_hours: number(fields.get("age_hours")),
        duration_seconds: count(fields.get("duration_seconds")),
        duration_formatted: text(fields.get("duration_formatted"), DEFAULT_DURATION),
        engagement_rate: number(fields.get("engagement_rate")),
        url: text(fields.get("url"), UNKNOWN_TEXT),
        thumbnail: non_empty_str(fields.get("thumbnail")).map(str::to_string),
        source: non_empty_str(fields.get("source"))
            .map_or_else(VideoSource::default, VideoSource::from_tag),
        is_truly_trending: flag(fields.get("is_truly_trending")),
        regional_relevance: coerce_relevance(fields),
    }
}

/// Reads the nested `regionalRelevance` object, else the flat
/// `regional_relevance_score` / `confidence` pair. `None` when neither exists.
fn coerce_relevance(fields: &Map<String, Value>) -> Option<RegionalRelevance> {
    if let Some(nested) = fields.get("regionalRelevance").and_then(Value::as_object) {
        return Some(RegionalRelevance::new(
            nested
                .get("score")
                .and_then(value_as_f64)
                .unwrap_or(RegionalRelevance::UNKNOWN_SCORE),
            nested
                .get("confidence")
                .and_then(value_as_f64)
                .unwrap_or(RegionalRelevance::UNKNOWN_CONFIDENCE),
            flag(nested.get("blacklisted")),
            non_empty_str(nested.get("explanation"))
                .unwrap_or_default()
                .to_string(),
        ));
    }

    let score = fields.get("regional_relevance_score").and_then(value_as_f64);
    let confidence = fields.get("confidence").and_then(value_as_f64);
    if score.is_none() && confidence.is_none() {
        return None;
    }
    Some(RegionalRelevance::new(
        score.unwrap_or(RegionalRelevance::UNKNOWN_SCORE),
        confidence.unwrap_or(RegionalRelevance::UNKNOWN_CONFIDENCE),
        false,
        String::new(),
    ))
}

fn coerce_metadata(object: &Map<String, Value>) -> BatchMetadata {
    BatchMetadata {
        query: non_empty_str(object.get("query")).map(str::to_string),
        region: non_empty_str(object.get("region")).map(str::to_string),
        analysis_mode: non_empty_str(object.get("analysis_mode")).map(str::to_string),
        analyzed_count: count(object.get("analyzed_videos")),
        timestamp: non_empty_str(object.get("timestamp"))
            .unwrap_or_default()
            .to_string(),
        algorithm_used: non_empty_str(object.get("algorithm_used")).map(str::to_string),
        algorithm_info: object.get("algorithm_info").filter(|v| !v.is_null()).cloned(),
        statistics: object
            .get("v6_statistics")
            .or_else(|| object.get("statistics"))
            .and_then(Value::as_object)
            .map(coerce_statistics),
    }
}

fn coerce_statistics(stats: &Map<String, Value>) -> AnalysisStatistics {
    AnalysisStatistics {
        trending_page_videos: count(stats.get("trending_page_videos")),
        api_videos: count(stats.get("api_videos")),
        truly_trending_in_results: count(stats.get("truly_trending_in_results")),
        analysis_time_seconds: number(stats.get("analysis_time_seconds")),
        deduplication_removed: count(stats.get("deduplication_removed")),
        filter_removed: count(stats.get("filter_removed")),
    }
}

/// Accepts JSON numbers and numeric strings.
fn value_as_f64(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
}

/// Non-negative finite number; anything else becomes `0.0`.
fn number(value: Option<&Value>) -> f64 {
    value
        .and_then(value_as_f64)
        .filter(|n| n.is_finite() && *n > 0.0)
        .unwrap_or(0.0)
}

fn count(value: Option<&Value>) -> u64 {
    value
        .and_then(Value::as_u64)
        .or_else(|| float_to_u64(number(value)))
        .unwrap_or(0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn float_to_u64(value: f64) -> Option<u64> {
    // `as` saturates above `u64::MAX`.
    (value.is_finite() && value >= 0.0).then(|| value.trunc() as u64)
}

fn text(value: Option<&Value>, fallback: &str) -> String {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => fallback.to_string(),
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "response_test.rs"]
mod tests;
