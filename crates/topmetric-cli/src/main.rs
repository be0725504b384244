mod commands;

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use topmetric_core::{AppConfig, ConfigError};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "topmetric")]
#[command(about = "Normalize, filter, and export ranked trending results")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the filtered view of a saved analysis response
    Show {
        /// Path to the response JSON, or `-` for stdin
        #[arg(long, short)]
        input: PathBuf,
        /// Quality tier key (defaults to `TOPMETRIC_DEFAULT_TIER`)
        #[arg(long, short)]
        tier: Option<String>,
    },
    /// Write the filtered view as CSV
    Export {
        /// Path to the response JSON, or `-` for stdin
        #[arg(long, short)]
        input: PathBuf,
        /// Quality tier key (defaults to `TOPMETRIC_DEFAULT_TIER`)
        #[arg(long, short)]
        tier: Option<String>,
        /// Query used in the filename (defaults to the response's query)
        #[arg(long, short)]
        query: Option<String>,
        /// Output directory (defaults to `TOPMETRIC_EXPORT_DIR`)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// List the active quality tiers
    Tiers,
}

/// Parse arguments, then load config. `--help` and usage errors surface
/// as `clap::Error` without the environment ever being read.
fn startup<I, T, F>(args: I, load_config: F) -> anyhow::Result<(Cli, AppConfig)>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    F: FnOnce() -> Result<AppConfig, ConfigError>,
{
    let cli = Cli::try_parse_from(args)?;
    let config = load_config()?;
    Ok((cli, config))
}

fn main() -> anyhow::Result<()> {
    let (cli, config) = match startup(std::env::args_os(), topmetric_core::load_app_config) {
        Ok(parsed) => parsed,
        Err(e) => match e.downcast::<clap::Error>() {
            Ok(usage) => usage.exit(),
            Err(e) => return Err(e),
        },
    };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Show { input, tier } => {
            commands::run_show(&config, &input, tier.as_deref(), &mut stdout)?;
        }
        Commands::Export {
            input,
            tier,
            query,
            out_dir,
        } => {
            let path = commands::run_export(
                &config,
                &input,
                tier.as_deref(),
                query.as_deref(),
                out_dir.as_deref(),
            )?;
            writeln!(stdout, "{}", path.display())?;
        }
        Commands::Tiers => commands::run_tiers(&config, &mut stdout)?,
    }

    Ok(())
}
