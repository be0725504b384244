//! Assembles the immutable raw snapshot from a parsed response.

use serde_json::Value;
use topmetric_core::{AppConfig, ResultBatch};

use crate::error::PipelineError;
use crate::normalize::{normalize_with, ScoreSource};
use crate::response::{parse_analysis_response, AnalysisResponse};
use crate::sort::sort_descending;

/// How much of the scoring service's output to take at face value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Keep the upstream record order. When `false`, the fallback sort runs.
    pub trust_upstream_order: bool,
    pub score_source: ScoreSource,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            trust_upstream_order: true,
            score_source: ScoreSource::Recompute,
        }
    }
}

impl PipelineOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            trust_upstream_order: config.trust_upstream_order,
            score_source: if config.trust_upstream_score {
                ScoreSource::TrustUpstream
            } else {
                ScoreSource::Recompute
            },
        }
    }
}

/// Normalizes the response's records, sorts them if the upstream order is
/// not trusted, and freezes the result as a [`ResultBatch`].
#[must_use]
pub fn build_batch(response: AnalysisResponse, options: &PipelineOptions) -> ResultBatch {
    let normalized = normalize_with(&response.records, options.score_source);
    let records = if options.trust_upstream_order {
        normalized
    } else {
        sort_descending(&normalized)
    };

    tracing::debug!(
        records = records.len(),
        skipped = response.skipped_records,
        sorted = !options.trust_upstream_order,
        "built result batch"
    );

    ResultBatch::new(records, response.metadata)
}

/// Parses `body` and builds the batch in one step.
///
/// # Errors
///
/// Propagates any error from [`parse_analysis_response`]. An upstream
/// failure never reaches normalization.
pub fn batch_from_json(
    body: &Value,
    options: &PipelineOptions,
) -> Result<ResultBatch, PipelineError> {
    let response = parse_analysis_response(body)?;
    Ok(build_batch(response, options))
}
