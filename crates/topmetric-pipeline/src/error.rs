use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The scoring service reported `success: false`.
    #[error("upstream analysis failed: {message}")]
    UpstreamFailure { message: String },

    #[error("invalid analysis response: {reason}")]
    InvalidResponse { reason: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown quality tier: {0}")]
    UnknownTier(String),

    #[error("nothing to export: the result set is empty")]
    NothingToExport,
}

impl PipelineError {
    /// `true` when the error means "no results" rather than a failure.
    #[must_use]
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::NothingToExport)
    }
}
