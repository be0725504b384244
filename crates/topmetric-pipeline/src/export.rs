//! CSV serialization of the displayed result set.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use topmetric_core::{VideoRecord, DEFAULT_DURATION, UNKNOWN_TEXT};

use crate::error::PipelineError;
use crate::normalize::MAX_NORMALIZED_SCORE;

/// Header row, in the fixed column order of every exported file.
pub const EXPORT_COLUMNS: [&str; 12] = [
    "rank",
    "title",
    "channel",
    "views",
    "likes",
    "comments",
    "normalized_score",
    "age_hours",
    "duration_formatted",
    "engagement_rate",
    "url",
    "thumbnail",
];

const ROW_SEPARATOR: &str = "\n";
const FILENAME_PREFIX: &str = "trending";
const FALLBACK_QUERY_SLUG: &str = "results";
const FALLBACK_EXTENSION: &str = "csv";
const MAX_QUERY_SLUG_LEN: usize = 60;

static NON_ALPHANUMERIC_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("valid non-alphanumeric regex"));

static VIDEO_ID_IN_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[?&]v=|youtu\.be/|/shorts/|/embed/)([A-Za-z0-9_-]{11})")
        .expect("valid video id regex")
});

/// Serializes `records` as comma-delimited text with a header row.
///
/// String cells are always double-quoted with embedded quotes doubled.
/// Numeric cells are plain; only the score and the engagement rate are
/// rounded, every other value keeps its full precision. Rows end with `\n`.
///
/// # Errors
///
/// Returns [`PipelineError::NothingToExport`] when `records` is empty.
pub fn to_delimited_text(records: &[VideoRecord]) -> Result<String, PipelineError> {
    if records.is_empty() {
        return Err(PipelineError::NothingToExport);
    }

    let mut out = String::with_capacity(128 * (records.len() + 1));
    out.push_str(&EXPORT_COLUMNS.join(","));
    out.push_str(ROW_SEPARATOR);

    for record in records {
        let cells = [
            record.rank.to_string(),
            quote(text_or(&record.title, UNKNOWN_TEXT)),
            quote(text_or(&record.channel, UNKNOWN_TEXT)),
            record.views.to_string(),
            record.likes.to_string(),
            record.comments.to_string(),
            format!("{:.1}", bounded_score(record.normalized_score)),
            non_negative(record.age_hours).to_string(),
            quote(text_or(&record.duration_formatted, DEFAULT_DURATION)),
            format!("{:.2}%", non_negative(record.engagement_rate) * 100.0),
            quote(text_or(&record.url, UNKNOWN_TEXT)),
            quote(&resolve_thumbnail(record)),
        ];
        out.push_str(&cells.join(","));
        out.push_str(ROW_SEPARATOR);
    }

    Ok(out)
}

/// Builds an export filename such as `trending_gaming_news_2025-03-01.csv`.
///
/// Every run of non-alphanumeric characters in `query` collapses to `_`, so
/// the result never contains path separators or quotes. An empty query
/// becomes `results`; an empty or unusable extension becomes `csv`.
#[must_use]
pub fn derive_filename(query: &str, extension: &str, date: NaiveDate) -> String {
    let slug = NON_ALPHANUMERIC_RUN.replace_all(query, "_");
    let slug = slug.trim_matches('_');
    let slug = if slug.is_empty() {
        FALLBACK_QUERY_SLUG
    } else {
        // ASCII-only after replacement, so any byte index is a char boundary.
        &slug[..slug.len().min(MAX_QUERY_SLUG_LEN)]
    };

    let extension: String = extension
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase();
    let extension = if extension.is_empty() {
        FALLBACK_EXTENSION
    } else {
        extension.as_str()
    };

    format!(
        "{FILENAME_PREFIX}_{}_{}.{extension}",
        slug.trim_end_matches('_'),
        date.format("%Y-%m-%d")
    )
}

/// Thumbnail URL for a record: the explicit one, else one derived from the
/// video id (taken from `video_id` or parsed out of `url`), else `Unknown`.
#[must_use]
pub fn resolve_thumbnail(record: &VideoRecord) -> String {
    if let Some(thumbnail) = record.thumbnail.as_deref().filter(|t| !t.trim().is_empty()) {
        return thumbnail.to_string();
    }

    record
        .video_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .map(str::to_string)
        .or_else(|| video_id_from_url(&record.url))
        .map_or_else(
            || UNKNOWN_TEXT.to_string(),
            |id| format!("https://img.youtube.com/vi/{id}/maxresdefault.jpg"),
        )
}

/// Extracts the 11-character video id from a watch, short-link, shorts, or
/// embed URL.
#[must_use]
pub fn video_id_from_url(url: &str) -> Option<String> {
    VIDEO_ID_IN_URL
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn text_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/// Maps negative, `-0.0`, and non-finite values to `0.0` so cells never
/// render as `-0.0` or `NaN`.
fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

fn bounded_score(score: f64) -> f64 {
    non_negative(score).min(MAX_NORMALIZED_SCORE)
}

#[cfg(test)]
#[path = "export_test.rs"]
mod tests;
