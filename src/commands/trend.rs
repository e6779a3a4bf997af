use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::config::{CodetrendConfig, FailurePolicy};
use crate::core::{count_high_complexity, find_max_complexity, TrendRecord};
use crate::errors::Error;
use crate::process::CommandRunner;
use crate::report::parser_for;
use crate::trend::{target_within, AggregationPolicy, TrendAnalysis, TrendOutcome, TrendRequest};
use crate::vcs::GitAdapter;

/// Method score above which flog output is conventionally worth a look.
pub const HIGH_COMPLEXITY_THRESHOLD: f64 = 20.0;

pub struct TrendCommandConfig {
    /// Repository root
    pub path: PathBuf,
    /// File to follow through history
    pub file: PathBuf,
    pub date_from: NaiveDate,
    /// Defaults to today (UTC)
    pub date_to: Option<NaiveDate>,
    pub output_dir: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub failed_revisions: Option<FailurePolicy>,
    pub force: bool,
    pub config: CodetrendConfig,
}

pub fn handle_trend(config: TrendCommandConfig) -> Result<TrendOutcome> {
    let root = config
        .path
        .canonicalize()
        .map_err(|source| Error::PathResolution {
            path: config.path.clone(),
            source,
        })?;
    let date_to = config.date_to.unwrap_or_else(|| Utc::now().date_naive());
    if config.date_from > date_to {
        return Err(Error::Configuration(format!(
            "--date-from {} is after --date-to {}",
            config.date_from, date_to
        ))
        .into());
    }

    let vcs = GitAdapter::new(&root)?;
    let runner = CommandRunner::from_config(&config.config.analyzer).with_working_dir(&root);
    runner.ensure_available()?;
    let parser = parser_for(&config.config.analyzer.parser)?;

    let mut policy = AggregationPolicy::from(&config.config.trend);
    if let Some(failed_revisions) = config.failed_revisions {
        policy.failed_revisions = failed_revisions;
    }
    let jobs = config
        .jobs
        .unwrap_or_else(|| config.config.trend.worker_count());

    let request = TrendRequest {
        target: resolve_target(&root, &config.file),
        repository_root: root,
        date_from: config.date_from,
        date_to,
        output_dir: config
            .output_dir
            .unwrap_or_else(|| config.config.output.resolved_output_dir()),
        force: config.force,
    };

    TrendAnalysis::new(&vcs, &runner, parser.as_ref())
        .with_policy(policy)
        .with_jobs(jobs)
        .run(&request)
        .with_context(|| format!("Trend analysis of {} failed", request.target.display()))
}

// Absolute targets are made repository-relative; relative ones already are.
fn resolve_target(root: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        let file = file.canonicalize().unwrap_or_else(|_| file.to_path_buf());
        target_within(root, &file)
    } else {
        file.to_path_buf()
    }
}

/// Human readable digest of a trend run for stdout.
pub fn summarize(outcome: &TrendOutcome) -> String {
    let mut out = String::new();
    let source = if outcome.cache_hit { "cached" } else { "computed" };
    let _ = writeln!(
        out,
        "{} revision(s) ({}) -> {}",
        outcome.series.len(),
        source,
        outcome.document.display()
    );

    let scored: Vec<&TrendRecord> = outcome.series.iter().filter(|r| !r.is_placeholder()).collect();
    let gaps = outcome.series.len() - scored.len();
    if gaps > 0 {
        let _ = writeln!(out, "{} revision(s) failed and are kept as gaps", gaps);
    }

    if let (Some(first), Some(last)) = (scored.first(), scored.last()) {
        let _ = writeln!(
            out,
            "total: {} -> {}",
            format_score(first.report.total_complexity),
            format_score(last.report.total_complexity)
        );
        let _ = writeln!(
            out,
            "highest method score at {}: {} ({} above {})",
            last.revision,
            format_score(find_max_complexity(&last.report)),
            count_high_complexity(&last.report, HIGH_COMPLEXITY_THRESHOLD),
            HIGH_COMPLEXITY_THRESHOLD
        );
    }
    out
}

fn format_score(score: Option<f64>) -> String {
    score.map_or_else(|| "n/a".to_string(), |s| format!("{:.1}", s))
}
