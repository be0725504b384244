//! Command handlers for the CLI.
//!
//! Each handler reloads the tier set from config and rebuilds the batch from
//! the saved response, so every invocation is an independent replay.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use topmetric_core::{AppConfig, ResultBatch, TierSet, VideoRecord};
use topmetric_pipeline::{
    apply_tier, build_batch, derive_filename, format_compact_count, parse_analysis_response_str,
    resolve_tier, to_delimited_text, PipelineOptions, ScoreBand,
};

const STDIN_PATH: &str = "-";

/// Reads the response body from `path`, or from stdin when `path` is `-`.
pub(crate) fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == STDIN_PATH {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read analysis response from stdin")?;
        return Ok(text);
    }

    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read analysis response {}", path.display()))
}

/// Parses `text` and builds the raw batch with the configured trust options.
pub(crate) fn load_batch(text: &str, config: &AppConfig) -> anyhow::Result<ResultBatch> {
    let response = parse_analysis_response_str(text)?;
    let options = PipelineOptions::from_app_config(config);
    Ok(build_batch(response, &options))
}

/// Applies the tier named `key` (or the configured default), rejecting
/// unknown keys.
pub(crate) fn select_view(
    batch: &ResultBatch,
    tiers: &TierSet,
    key: &str,
) -> anyhow::Result<Vec<VideoRecord>> {
    let tier = resolve_tier(tiers, key)
        .with_context(|| format!("known tiers: {}", tiers.keys().join(", ")))?;
    Ok(apply_tier(batch.records(), tier))
}

/// One display line: rank, score band, score, compact views, title, channel.
pub(crate) fn render_line(record: &VideoRecord) -> String {
    format!(
        "{:>3}. [{:<9}] {:>4.1}  {:>6}  {} ({})",
        record.rank,
        ScoreBand::from_score(record.normalized_score),
        record.normalized_score,
        format_compact_count(record.views),
        record.title,
        record.channel,
    )
}

pub(crate) fn run_show(
    config: &AppConfig,
    input: &Path,
    tier: Option<&str>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let tiers = config.tier_set()?;
    let batch = load_batch(&read_input(input)?, config)?;
    let key = tier.unwrap_or(&config.default_tier);
    let view = select_view(&batch, &tiers, key)?;
    write_view(&batch, &view, key, out)
}

pub(crate) fn write_view(
    batch: &ResultBatch,
    view: &[VideoRecord],
    key: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let metadata = batch.metadata();
    writeln!(
        out,
        "{} of {} records (tier: {key}, analyzed: {})",
        view.len(),
        batch.len(),
        metadata.analyzed_count
    )?;
    if let Some(stats) = &metadata.statistics {
        writeln!(
            out,
            "{} truly trending, {:.2}s analysis, {} filtered upstream",
            stats.truly_trending_in_results, stats.analysis_time_seconds, stats.filter_removed
        )?;
    }
    for record in view {
        writeln!(out, "{}", render_line(record))?;
    }
    Ok(())
}

/// Writes the filtered view as CSV and returns the file's path.
pub(crate) fn run_export(
    config: &AppConfig,
    input: &Path,
    tier: Option<&str>,
    query: Option<&str>,
    out_dir: Option<&Path>,
) -> anyhow::Result<PathBuf> {
    let tiers = config.tier_set()?;
    let batch = load_batch(&read_input(input)?, config)?;
    let key = tier.unwrap_or(&config.default_tier);
    let view = select_view(&batch, &tiers, key)?;

    let text = match to_delimited_text(&view) {
        Err(e) if e.is_empty_result() => {
            anyhow::bail!("tier '{key}' matched none of {} records; {e}", batch.len())
        }
        other => other?,
    };

    let query = query
        .or(batch.metadata().query.as_deref())
        .unwrap_or_default();
    let dir = out_dir.unwrap_or(&config.export_dir);
    let path = dir.join(derive_filename(query, "csv", chrono::Utc::now().date_naive()));

    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export directory {}", dir.display()))?;
    std::fs::write(&path, text)
        .with_context(|| format!("failed to write export {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        tier = key,
        records = view.len(),
        "export written"
    );
    Ok(path)
}

pub(crate) fn run_tiers(config: &AppConfig, out: &mut impl Write) -> anyhow::Result<()> {
    let tiers = config.tier_set()?;
    for tier in tiers.iter() {
        let marker = if tier.key.eq_ignore_ascii_case(&config.default_tier) {
            "*"
        } else {
            " "
        };
        writeln!(
            out,
            "{marker} {:<12} confidence >= {:.2}  regional >= {:.2}  {}",
            tier.key,
            tier.min_confidence,
            tier.min_regional_score,
            tier.display_name()
        )?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "commands_test.rs"]
mod tests;
