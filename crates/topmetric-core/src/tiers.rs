use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Key of the permissive tier that every tier set must contain.
pub const ALL_TIER_KEY: &str = "all";

/// A named quality policy: records pass when their regional relevance meets
/// both thresholds and they are not blacklisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityTier {
    pub key: String,
    pub min_confidence: f64,
    pub min_regional_score: f64,
    #[serde(default)]
    pub label: Option<String>,
}

impl QualityTier {
    #[must_use]
    pub fn new(key: &str, min_confidence: f64, min_regional_score: f64) -> Self {
        Self {
            key: key.to_string(),
            min_confidence,
            min_regional_score,
            label: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    /// Human-readable name, falling back to the key.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.key)
    }
}

/// Ordered tier policies, loosest first.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TierSet {
    tiers: Vec<QualityTier>,
}

impl TierSet {
    /// The stock tiers, with monotonically increasing thresholds.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            tiers: vec![
                QualityTier::new(ALL_TIER_KEY, 0.0, 0.0).with_label("All results"),
                QualityTier::new("low-spam", 0.3, 0.1).with_label("Low spam"),
                QualityTier::new("good", 0.5, 0.3).with_label("Good quality"),
                QualityTier::new("regional", 0.6, 0.5).with_label("Regionally relevant"),
                QualityTier::new("premium", 0.8, 0.7).with_label("Premium"),
            ],
        }
    }

    /// Looks up a tier by key, ignoring ASCII case and surrounding whitespace.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&QualityTier> {
        let key = key.trim();
        self.tiers.iter().find(|t| t.key.eq_ignore_ascii_case(key))
    }

    #[must_use]
    pub fn all_tier(&self) -> Option<&QualityTier> {
        self.get(ALL_TIER_KEY)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QualityTier> {
        self.tiers.iter()
    }

    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.tiers.iter().map(|t| t.key.as_str()).collect()
    }
}

impl Default for TierSet {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Load and validate a tier set from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_tiers(path: &Path) -> Result<TierSet, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TiersFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_tiers(&content)
}

/// Parse and validate a tier set from YAML text.
///
/// # Errors
///
/// Returns `ConfigError::TiersFileParse` on malformed YAML and
/// `ConfigError::Validation` when the tiers break an ordering rule.
pub fn parse_tiers(yaml: &str) -> Result<TierSet, ConfigError> {
    let tier_set: TierSet = serde_yaml::from_str(yaml)?;
    validate_tiers(&tier_set)?;
    Ok(tier_set)
}

fn validate_tiers(tier_set: &TierSet) -> Result<(), ConfigError> {
    if tier_set.tiers.is_empty() {
        return Err(ConfigError::Validation(
            "at least one tier must be defined".to_string(),
        ));
    }

    let mut seen_keys = HashSet::new();
    let mut previous: Option<&QualityTier> = None;

    for tier in &tier_set.tiers {
        if tier.key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "tier key must be non-empty".to_string(),
            ));
        }

        if !seen_keys.insert(tier.key.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate tier key: '{}'",
                tier.key
            )));
        }

        for (name, value) in [
            ("min_confidence", tier.min_confidence),
            ("min_regional_score", tier.min_regional_score),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "tier '{}' has {name} {value}; must be within 0.0..=1.0",
                    tier.key
                )));
            }
        }

        if let Some(prev) = previous {
            if tier.min_confidence < prev.min_confidence
                || tier.min_regional_score < prev.min_regional_score
            {
                return Err(ConfigError::Validation(format!(
                    "tier '{}' is looser than the preceding tier '{}'; thresholds must not decrease",
                    tier.key, prev.key
                )));
            }
        }
        previous = Some(tier);
    }

    match tier_set.all_tier() {
        None => {
            return Err(ConfigError::Validation(format!(
                "tier set must contain an '{ALL_TIER_KEY}' tier"
            )));
        }
        Some(all) if all.min_confidence > 0.0 || all.min_regional_score > 0.0 => {
            return Err(ConfigError::Validation(format!(
                "the '{ALL_TIER_KEY}' tier must have zero thresholds"
            )));
        }
        Some(_) => {}
    }

    Ok(())
}

#[cfg(test)]
#[path = "tiers_test.rs"]
mod tests;
