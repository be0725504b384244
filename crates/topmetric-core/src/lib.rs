//! Domain types and configuration shared by the `topmetric` crates.
//!
//! Holds the ranked [`VideoRecord`] shape produced by the upstream scoring
//! service, the immutable [`ResultBatch`] snapshot, the [`QualityTier`]
//! filter policies, and environment-driven [`AppConfig`] loading.

pub mod app_config;
pub mod config;
pub mod records;
pub mod tiers;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use records::{
    AnalysisStatistics, BatchMetadata, RegionalRelevance, ResultBatch, VideoRecord, VideoSource,
    DEFAULT_DURATION, UNKNOWN_TEXT,
};
pub use tiers::{load_tiers, parse_tiers, QualityTier, TierSet, ALL_TIER_KEY};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read tiers file {path}: {source}")]
    TiersFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse tiers file: {0}")]
    TiersFileParse(#[from] serde_yaml::Error),

    #[error("tier configuration invalid: {0}")]
    Validation(String),
}
