use anyhow::Result;
use clap::Parser;
use codetrend::cli::{Cli, Commands};
use codetrend::commands::{self, ReportConfig, TrendCommandConfig};
use codetrend::config::{self, CodetrendConfig};
use codetrend::observability::install_panic_hook;
use codetrend::progress::{ProgressConfig, ProgressManager};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);
    install_panic_hook();
    ProgressManager::init_global(ProgressConfig::from_env(cli.quiet, cli.verbose));

    match cli.command {
        Commands::Init { force } => {
            commands::init_config(Path::new("."), force)?;
        }
        Commands::Report { path, temp_dir } => {
            let config = load_configuration(cli.config.as_deref())?;
            let document = commands::handle_report(ReportConfig {
                path,
                temp_dir,
                config,
            })?;
            clear_progress();
            println!("{}", document.display());
        }
        Commands::Trend {
            path,
            file,
            date_from,
            date_to,
            output_dir,
            jobs,
            failed_revisions,
            force,
            json,
        } => {
            let config = load_configuration(cli.config.as_deref())?;
            let outcome = commands::handle_trend(TrendCommandConfig {
                path,
                file,
                date_from,
                date_to,
                output_dir,
                jobs,
                failed_revisions: failed_revisions.map(Into::into),
                force,
                config,
            })?;
            clear_progress();
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome.series)?);
            } else {
                print!("{}", commands::summarize(&outcome));
            }
        }
    }

    Ok(())
}

// RUST_LOG wins over -v.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn load_configuration(explicit: Option<&Path>) -> Result<CodetrendConfig> {
    match explicit {
        Some(path) => Ok(config::load_config_from(path)?),
        None => Ok(config::load_config()),
    }
}

fn clear_progress() {
    if let Err(e) = ProgressManager::global_or_hidden().clear() {
        log::debug!("Failed to clear progress bars: {}", e);
    }
}
