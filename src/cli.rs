use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::FailurePolicy;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FailedRevisions {
    /// Leave failed revisions out of the series
    Drop,
    /// Keep failed revisions as records carrying the error
    Placeholder,
}

impl From<FailedRevisions> for FailurePolicy {
    fn from(value: FailedRevisions) -> Self {
        match value {
            FailedRevisions::Drop => FailurePolicy::Drop,
            FailedRevisions::Placeholder => FailurePolicy::Placeholder,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "codetrend")]
#[command(about = "Code complexity reports and complexity trends across history", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (default: nearest .codetrend.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Complexity report for every matching file of the working tree
    Report {
        /// Repository to analyze
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Directory the report is written to
        #[arg(long, env = "CODETREND_TEMP_DIR")]
        temp_dir: Option<PathBuf>,
    },

    /// Complexity of one file across the revisions of a date range
    Trend {
        /// Repository root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// File to follow, relative to the repository root
        #[arg(short, long)]
        file: PathBuf,

        /// First day of the range (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date_from: NaiveDate,

        /// Last day of the range (YYYY-MM-DD, default: today)
        #[arg(long, value_parser = parse_date)]
        date_to: Option<NaiveDate>,

        /// Root of the trend cache
        #[arg(long, env = "CODETREND_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,

        /// Revisions analyzed at once (0 = one per CPU)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// What to do with revisions whose analysis failed
        #[arg(long, value_enum)]
        failed_revisions: Option<FailedRevisions>,

        /// Recompute even if a cached trend exists
        #[arg(long)]
        force: bool,

        /// Print the series as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Initialize a new codetrend configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got '{}': {}", value, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_arguments_parse() {
        let cli = Cli::try_parse_from([
            "codetrend",
            "-vv",
            "trend",
            "repo",
            "--file",
            "lib/abs.rb",
            "--date-from",
            "2015-04-29",
            "--failed-revisions",
            "placeholder",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Trend {
                path,
                file,
                date_from,
                date_to,
                failed_revisions,
                ..
            } => {
                assert_eq!(path, PathBuf::from("repo"));
                assert_eq!(file, PathBuf::from("lib/abs.rb"));
                assert_eq!(date_from, NaiveDate::from_ymd_opt(2015, 4, 29).unwrap());
                assert_eq!(date_to, None);
                assert!(matches!(failed_revisions, Some(FailedRevisions::Placeholder)));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn malformed_dates_are_rejected() {
        let result = Cli::try_parse_from([
            "codetrend",
            "trend",
            "--file",
            "abs.rb",
            "--date-from",
            "29/04/2015",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn report_defaults_to_current_directory() {
        let cli = Cli::try_parse_from(["codetrend", "report"]).unwrap();
        assert!(matches!(cli.command, Commands::Report { ref path, .. } if path == &PathBuf::from(".")));
    }
}
