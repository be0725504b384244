use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Directory exported CSV files are written into.
    pub export_dir: PathBuf,
    /// Tier applied when the caller does not pick one.
    pub default_tier: String,
    /// Optional YAML file replacing the built-in tier set.
    pub tiers_path: Option<PathBuf>,
    /// When `false`, every batch is re-sorted locally before use.
    pub trust_upstream_order: bool,
    /// When `true`, an upstream `normalized_score` is kept (after clamping)
    /// instead of being recomputed against the batch maximum.
    pub trust_upstream_score: bool,
}
