use crate::app_config::{AppConfig, Environment};
use crate::tiers::{load_tiers, TierSet};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if any env var holds an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if any env var holds an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

impl AppConfig {
    /// Resolve the active tier set: the configured YAML file when set,
    /// otherwise the built-in tiers.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the tiers file cannot be loaded or fails
    /// validation, or if `default_tier` is not a key of the resolved set.
    pub fn tier_set(&self) -> Result<TierSet, ConfigError> {
        let tiers = match &self.tiers_path {
            Some(path) => load_tiers(path)?,
            None => TierSet::builtin(),
        };

        if tiers.get(&self.default_tier).is_none() {
            return Err(ConfigError::InvalidEnvVar {
                var: "TOPMETRIC_DEFAULT_TIER".to_string(),
                reason: format!(
                    "unknown tier '{}'; expected one of: {}",
                    self.default_tier,
                    tiers.keys().join(", ")
                ),
            });
        }

        Ok(tiers)
    }
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it with a
/// plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match lookup(var) {
            Err(_) => Ok(default),
            Ok(raw) => parse_flag(&raw).ok_or_else(|| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("expected true/false, got '{raw}'"),
            }),
        }
    };

    let env = parse_environment(&or_default("TOPMETRIC_ENV", "development"))?;
    let log_level = or_default("TOPMETRIC_LOG_LEVEL", "info");
    let export_dir = PathBuf::from(or_default("TOPMETRIC_EXPORT_DIR", "./exports"));

    let default_tier = or_default("TOPMETRIC_DEFAULT_TIER", "all").trim().to_lowercase();
    if default_tier.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "TOPMETRIC_DEFAULT_TIER".to_string(),
            reason: "must not be empty".to_string(),
        });
    }

    let tiers_path = lookup("TOPMETRIC_TIERS_PATH")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);

    let trust_upstream_order = parse_bool("TOPMETRIC_TRUST_UPSTREAM_ORDER", true)?;
    let trust_upstream_score = parse_bool("TOPMETRIC_TRUST_UPSTREAM_SCORE", false)?;

    Ok(AppConfig {
        env,
        log_level,
        export_dir,
        default_tier,
        tiers_path,
        trust_upstream_order,
        trust_upstream_score,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "TOPMETRIC_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
