use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder for string fields the scoring service left out.
pub const UNKNOWN_TEXT: &str = "Unknown";

/// Placeholder for a missing formatted duration.
pub const DEFAULT_DURATION: &str = "00:00";

/// Relevance used for records whose `regionalRelevance` is absent. Must stay
/// below the stricter tier thresholds.
static UNKNOWN_RELEVANCE: RegionalRelevance = RegionalRelevance {
    score: RegionalRelevance::UNKNOWN_SCORE,
    confidence: RegionalRelevance::UNKNOWN_CONFIDENCE,
    blacklisted: false,
    explanation: String::new(),
};

/// Regional relevance verdict attached to a record by the scoring service.
///
/// Serialize-only: values are built through [`RegionalRelevance::new`] so the
/// `[0.0, 1.0]` clamp always applies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalRelevance {
    /// Relevance to the requested region in `[0.0, 1.0]`.
    pub score: f64,
    /// Confidence of the verdict in `[0.0, 1.0]`.
    pub confidence: f64,
    /// Flagged as spam or low-trust upstream.
    pub blacklisted: bool,
    pub explanation: String,
}

impl RegionalRelevance {
    /// Score assumed when the service sent no relevance verdict.
    pub const UNKNOWN_SCORE: f64 = 0.3;
    /// Confidence assumed when the service sent no relevance verdict.
    pub const UNKNOWN_CONFIDENCE: f64 = 0.5;

    /// Builds a relevance verdict with `score` and `confidence` clamped to
    /// `[0.0, 1.0]`. Non-finite inputs collapse to `0.0`.
    #[must_use]
    pub fn new(score: f64, confidence: f64, blacklisted: bool, explanation: String) -> Self {
        Self {
            score: unit_interval(score),
            confidence: unit_interval(confidence),
            blacklisted,
            explanation,
        }
    }
}

impl Default for RegionalRelevance {
    fn default() -> Self {
        UNKNOWN_RELEVANCE.clone()
    }
}

fn unit_interval(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Where the scoring service found a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoSource {
    Api,
    TrendingPage,
    ApiTrending,
    #[default]
    Unknown,
}

impl VideoSource {
    /// Parses the service's source tag. Unrecognized tags map to
    /// [`VideoSource::Unknown`].
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "api" => Self::Api,
            "trending_page" => Self::TrendingPage,
            "api_trending" => Self::ApiTrending,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for VideoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoSource::Api => write!(f, "api"),
            VideoSource::TrendingPage => write!(f, "trending_page"),
            VideoSource::ApiTrending => write!(f, "api_trending"),
            VideoSource::Unknown => write!(f, "unknown"),
        }
    }
}

/// One ranked item from a search, coerced into a well-typed shape.
///
/// Serialize-only; inbound records go through the response boundary, which
/// fills defaults and clamps relevance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoRecord {
    /// 1-based position within the batch the record arrived in.
    pub rank: u32,
    pub video_id: Option<String>,
    pub title: String,
    pub channel: String,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    /// Primary ranking signal from the scoring service. Never negative.
    pub trending_score: f64,
    /// Batch-relative score in `[0.0, 10.0]`, set by normalization.
    pub normalized_score: f64,
    /// Normalized score as reported upstream, before local validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_normalized_score: Option<f64>,
    pub age_hours: f64,
    pub duration_seconds: u64,
    pub duration_formatted: String,
    /// Engagement as a fraction (`0.05` is 5%).
    pub engagement_rate: f64,
    pub url: String,
    pub thumbnail: Option<String>,
    pub source: VideoSource,
    pub is_truly_trending: bool,
    #[serde(
        rename = "regionalRelevance",
        skip_serializing_if = "Option::is_none"
    )]
    pub regional_relevance: Option<RegionalRelevance>,
}

impl VideoRecord {
    /// Relevance used for quality filtering: the attached verdict, or the
    /// conservative unknown default when none was supplied.
    #[must_use]
    pub fn relevance(&self) -> &RegionalRelevance {
        self.regional_relevance.as_ref().unwrap_or(&UNKNOWN_RELEVANCE)
    }

    /// Regional score used as a sort tie-break; absent verdicts count as `0.0`.
    #[must_use]
    pub fn relevance_sort_score(&self) -> f64 {
        self.regional_relevance.as_ref().map_or(0.0, |r| r.score)
    }

    #[must_use]
    pub fn is_blacklisted(&self) -> bool {
        self.relevance().blacklisted
    }
}

impl Default for VideoRecord {
    fn default() -> Self {
        Self {
            rank: 1,
            video_id: None,
            title: UNKNOWN_TEXT.to_string(),
            channel: UNKNOWN_TEXT.to_string(),
            views: 0,
            likes: 0,
            comments: 0,
            trending_score: 0.0,
            normalized_score: 0.0,
            upstream_normalized_score: None,
            age_hours: 0.0,
            duration_seconds: 0,
            duration_formatted: DEFAULT_DURATION.to_string(),
            engagement_rate: 0.0,
            url: UNKNOWN_TEXT.to_string(),
            thumbnail: None,
            source: VideoSource::Unknown,
            is_truly_trending: false,
            regional_relevance: None,
        }
    }
}

/// Counters the scoring service reports about one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStatistics {
    pub trending_page_videos: u64,
    pub api_videos: u64,
    pub truly_trending_in_results: u64,
    pub analysis_time_seconds: f64,
    pub deduplication_removed: u64,
    pub filter_removed: u64,
}

/// Metadata passed through from the scoring service untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchMetadata {
    pub query: Option<String>,
    pub region: Option<String>,
    pub analysis_mode: Option<String>,
    pub analyzed_count: u64,
    /// ISO-8601 timestamp exactly as the service sent it.
    pub timestamp: String,
    pub algorithm_used: Option<String>,
    pub algorithm_info: Option<serde_json::Value>,
    pub statistics: Option<AnalysisStatistics>,
}

/// The immutable snapshot of one search invocation.
///
/// Records are fixed at construction. Every filtered view is derived from
/// this snapshot, so switching tiers can always recover the full set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultBatch {
    records: Vec<VideoRecord>,
    metadata: BatchMetadata,
}

impl ResultBatch {
    #[must_use]
    pub fn new(records: Vec<VideoRecord>, metadata: BatchMetadata) -> Self {
        Self { records, metadata }
    }

    #[must_use]
    pub fn records(&self) -> &[VideoRecord] {
        &self.records
    }

    #[must_use]
    pub fn metadata(&self) -> &BatchMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Parses the pass-through timestamp, if it is valid RFC 3339.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.metadata.timestamp)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}
