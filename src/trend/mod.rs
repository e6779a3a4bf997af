//! Trend aggregation: per-revision outcomes in, one cached series out.
//!
//! [`aggregate`] is the pure part: it applies the failure policy and orders
//! records by the version control system's native history order, whatever
//! order the outcomes completed in. [`TrendAnalysis`] wires listing,
//! orchestration, aggregation and the on-disk cache together.

pub mod cache;

use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::{FailurePolicy, TrendConfig};
use crate::core::{Revision, RevisionId, TrendRecord};
use crate::errors::Result;
use crate::observability::{self, AnalysisPhase};
use crate::orchestrator::{RevisionOutcome, RevisionStreamOrchestrator};
use crate::process::ProcessRunner;
use crate::progress::ProgressManager;
use crate::report::ReportParser;
use crate::vcs::{RevisionFilter, VcsAdapter};

/// How failed or empty revisions are treated when building a series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationPolicy {
    pub failed_revisions: FailurePolicy,
    pub skip_empty_reports: bool,
}

impl From<&TrendConfig> for AggregationPolicy {
    fn from(config: &TrendConfig) -> Self {
        Self {
            failed_revisions: config.failed_revisions,
            skip_empty_reports: config.skip_empty_reports,
        }
    }
}

/// Build the series for `target` from the outcomes of `revisions`.
///
/// `revisions` is the list as supplied by version control; its order is the
/// order of the result. Outcomes for revisions missing from that list are
/// discarded.
pub fn aggregate(
    revisions: &[Revision],
    outcomes: Vec<RevisionOutcome>,
    target: &str,
    policy: &AggregationPolicy,
) -> Vec<TrendRecord> {
    let _phase = observability::set_phase(AnalysisPhase::Aggregation);
    let native: HashMap<&RevisionId, (usize, &Revision)> = revisions
        .iter()
        .enumerate()
        .map(|(index, revision)| (&revision.id, (index, revision)))
        .collect();

    let mut indexed: Vec<(usize, TrendRecord)> = outcomes
        .into_iter()
        .filter_map(|outcome| match outcome {
            Ok(success) => {
                let (index, _) = native.get(&success.revision.id).copied()?;
                if policy.skip_empty_reports && success.report.is_empty() {
                    log::info!(
                        "Skipping revision {}: no recognizable analyzer output",
                        success.revision.id
                    );
                    return None;
                }
                Some((index, TrendRecord::new(&success.revision, target, success.report)))
            }
            Err(failure) => {
                let (index, revision) = native.get(&failure.revision).copied()?;
                match policy.failed_revisions {
                    FailurePolicy::Drop => {
                        log::warn!("Dropping {}", failure);
                        None
                    }
                    FailurePolicy::Placeholder => {
                        log::warn!("Keeping placeholder for {}", failure);
                        Some((index, TrendRecord::placeholder(revision, target, failure.message)))
                    }
                }
            }
        })
        .collect();

    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, record)| record).collect()
}

/// One trend invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendRequest {
    /// Repository identity for the cache key
    pub repository_root: PathBuf,
    /// File to follow, relative to the repository root
    pub target: PathBuf,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub output_dir: PathBuf,
    /// Recompute even when a cached document exists
    pub force: bool,
}

impl TrendRequest {
    pub fn cache_key(&self) -> String {
        cache::cache_key(&self.repository_root, self.date_from, self.date_to)
    }

    pub fn document_path(&self) -> PathBuf {
        cache::cache_path(&self.output_dir, &self.cache_key(), self.date_from, self.date_to)
    }

    fn target_label(&self) -> String {
        self.target.to_string_lossy().into_owned()
    }
}

/// Result of a trend invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendOutcome {
    pub document: PathBuf,
    pub cache_hit: bool,
    pub series: Vec<TrendRecord>,
    /// Revisions listed by version control; zero on a cache hit
    pub revisions_listed: usize,
}

pub struct TrendAnalysis<'a> {
    vcs: &'a dyn VcsAdapter,
    runner: &'a dyn ProcessRunner,
    parser: &'a dyn ReportParser,
    policy: AggregationPolicy,
    jobs: usize,
}

impl<'a> TrendAnalysis<'a> {
    pub fn new(
        vcs: &'a dyn VcsAdapter,
        runner: &'a dyn ProcessRunner,
        parser: &'a dyn ReportParser,
    ) -> Self {
        Self {
            vcs,
            runner,
            parser,
            policy: AggregationPolicy::default(),
            jobs: 1,
        }
    }

    pub fn with_policy(mut self, policy: AggregationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Produce the series for `request`, from the cache when possible.
    ///
    /// Per-revision failures only shape the series; listing revisions and
    /// writing the document are the errors that reach the caller.
    pub fn run(&self, request: &TrendRequest) -> Result<TrendOutcome> {
        let document = request.document_path();
        let target = request.target_label();

        if !request.force {
            if let Some(series) = cache::read_cached(&document, &target) {
                log::info!("Using cached trend {}", document.display());
                return Ok(TrendOutcome {
                    document,
                    cache_hit: true,
                    series,
                    revisions_listed: 0,
                });
            }
        }

        let revisions = self.list_revisions(request)?;
        let outcomes = RevisionStreamOrchestrator::new(self.vcs, self.runner, self.parser)
            .with_jobs(self.jobs)
            .run(&request.target, &revisions);
        let series = aggregate(&revisions, outcomes, &target, &self.policy);

        log::info!(
            "{} of {} revision(s) of {} kept in the series",
            series.len(),
            revisions.len(),
            target
        );

        let _phase = observability::set_phase(AnalysisPhase::OutputWriting);
        cache::write_json_atomic(&document, &series)?;

        Ok(TrendOutcome {
            document,
            cache_hit: false,
            series,
            revisions_listed: revisions.len(),
        })
    }

    fn list_revisions(&self, request: &TrendRequest) -> Result<Vec<Revision>> {
        let _phase = observability::set_phase(AnalysisPhase::RevisionListing);
        let spinner = ProgressManager::global_or_hidden().create_spinner("Listing revisions");
        let filter = RevisionFilter::new(&request.target, request.date_from).until(request.date_to);
        let revisions = self.vcs.revisions(&filter);
        spinner.finish_and_clear();

        let revisions = revisions?;
        log::debug!(
            "{} revision(s) of {} between {} and {}",
            revisions.len(),
            request.target.display(),
            request.date_from,
            request.date_to
        );
        Ok(revisions)
    }
}

/// The target as it should appear in records: relative to the repository
/// root when it lies inside it.
pub fn target_within(repository_root: &Path, target: &Path) -> PathBuf {
    target
        .strip_prefix(repository_root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| target.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ComplexityReport;
    use crate::errors::{FailureKind, RevisionFailure};
    use crate::orchestrator::RevisionReport;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn revision(id: &str, day: u32) -> Revision {
        Revision::new(id, Utc.with_ymd_and_hms(2015, 5, day, 23, 0, 0).unwrap())
    }

    fn success(revision: &Revision, total: f64) -> RevisionOutcome {
        Ok(RevisionReport {
            revision: revision.clone(),
            report: ComplexityReport {
                total_complexity: Some(total),
                ..Default::default()
            },
        })
    }

    fn failure(revision: &Revision) -> RevisionOutcome {
        Err(RevisionFailure::new(
            &revision.id,
            FailureKind::AnalyzerProcess,
            "flog exited with exit status: 1",
        ))
    }

    fn ids(series: &[TrendRecord]) -> Vec<&str> {
        series.iter().map(|r| r.revision.as_str()).collect()
    }

    #[test]
    fn orders_by_native_history_not_completion() {
        let revisions = vec![revision("c", 3), revision("a", 1), revision("b", 2)];
        let outcomes = vec![
            success(&revisions[2], 2.0),
            success(&revisions[0], 3.0),
            success(&revisions[1], 1.0),
        ];

        let series = aggregate(&revisions, outcomes, "abs.rb", &AggregationPolicy::default());
        assert_eq!(ids(&series), vec!["c", "a", "b"]);
        assert!(series.iter().all(|r| r.path == "abs.rb"));
    }

    #[test]
    fn failed_revisions_are_dropped_by_default() {
        let revisions = vec![revision("1", 1), revision("2", 2), revision("3", 3)];
        let outcomes = vec![
            success(&revisions[0], 1.0),
            failure(&revisions[1]),
            success(&revisions[2], 3.0),
        ];

        let series = aggregate(&revisions, outcomes, "abs.rb", &AggregationPolicy::default());
        assert_eq!(ids(&series), vec!["1", "3"]);
    }

    #[test]
    fn placeholder_policy_keeps_a_gap_record() {
        let revisions = vec![revision("1", 1), revision("2", 2)];
        let outcomes = vec![failure(&revisions[1]), success(&revisions[0], 1.0)];
        let policy = AggregationPolicy {
            failed_revisions: FailurePolicy::Placeholder,
            skip_empty_reports: false,
        };

        let series = aggregate(&revisions, outcomes, "abs.rb", &policy);
        assert_eq!(ids(&series), vec!["1", "2"]);
        assert!(series[1].is_placeholder());
        assert_eq!(series[1].date, revisions[1].date);
        assert_eq!(series[1].report.total_complexity, None);
    }

    #[test]
    fn empty_reports_are_kept_unless_skipped() {
        let revisions = vec![revision("1", 1)];
        let empty = || {
            vec![Ok(RevisionReport {
                revision: revisions[0].clone(),
                report: ComplexityReport::default(),
            })]
        };

        let kept = aggregate(&revisions, empty(), "abs.rb", &AggregationPolicy::default());
        assert_eq!(kept.len(), 1);

        let policy = AggregationPolicy {
            skip_empty_reports: true,
            ..Default::default()
        };
        assert!(aggregate(&revisions, empty(), "abs.rb", &policy).is_empty());
    }

    #[test]
    fn unknown_revisions_are_discarded() {
        let revisions = vec![revision("1", 1)];
        let stray = revision("zz", 9);
        let outcomes = vec![success(&stray, 5.0), success(&revisions[0], 1.0)];

        let series = aggregate(&revisions, outcomes, "abs.rb", &AggregationPolicy::default());
        assert_eq!(ids(&series), vec!["1"]);
    }

    #[test]
    fn policy_follows_config() {
        let config = TrendConfig {
            failed_revisions: FailurePolicy::Placeholder,
            skip_empty_reports: true,
            jobs: 1,
        };
        let policy = AggregationPolicy::from(&config);
        assert_eq!(policy.failed_revisions, FailurePolicy::Placeholder);
        assert!(policy.skip_empty_reports);
    }

    #[test]
    fn target_is_made_repository_relative() {
        assert_eq!(
            target_within(Path::new("/repo"), Path::new("/repo/lib/abs.rb")),
            PathBuf::from("lib/abs.rb")
        );
        assert_eq!(
            target_within(Path::new("/repo"), Path::new("lib/abs.rb")),
            PathBuf::from("lib/abs.rb")
        );
    }
}
