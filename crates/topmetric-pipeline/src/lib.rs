//! Post-processing pipeline for ranked trending results.
//!
//! Turns a scoring-service response into a stable, comparably scaled
//! [`ResultBatch`](topmetric_core::ResultBatch), re-derives quality-tier views
//! from that snapshot on demand, and serializes the displayed set as CSV.
//! Every stage is a pure function over its input and never mutates it.

pub mod display;
pub mod error;
pub mod export;
pub mod filter;
pub mod normalize;
pub mod pipeline;
pub mod response;
pub mod sort;

pub use display::{format_compact_count, ScoreBand};
pub use error::PipelineError;
pub use export::{
    derive_filename, resolve_thumbnail, to_delimited_text, video_id_from_url, EXPORT_COLUMNS,
};
pub use filter::{apply_tier, apply_tier_key, passes_tier, resolve_tier};
pub use normalize::{normalize, normalize_with, ScoreSource, MAX_NORMALIZED_SCORE};
pub use pipeline::{batch_from_json, build_batch, PipelineOptions};
pub use response::{parse_analysis_response, parse_analysis_response_str, AnalysisResponse};
pub use sort::sort_descending;
