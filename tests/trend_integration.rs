use chrono::{NaiveDate, TimeZone, Utc};
use codetrend::config::FailurePolicy;
use codetrend::testkit::{MockRunner, MockVcs};
use codetrend::trend::{AggregationPolicy, TrendAnalysis, TrendRequest};
use codetrend::{FlogReportParser, Revision, RevisionId};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CONTENT_123: &str = "def abs(a, b)\n  a - b\nend\n";
const CONTENT_456: &str = "def abs(a, b)\n  a > b ? a - b : b - a\nend\n";

const REPORT_123: &str = "\t22.0: flog total\n\t 7.3: flog/method average\n\n\t18.6: main#none\n\t 1.7: chain#linking_to          /absolute/path/test_abs.rb:8\n";
const REPORT_456: &str = "\t25.1: flog total\n\t 8.4: flog/method average\n\n\t20.2: main#none\n\t 2.5: abs                       /absolute/path/test_abs.rb:1\n";

fn revisions() -> Vec<Revision> {
    vec![
        Revision::new("123", Utc.with_ymd_and_hms(2015, 4, 29, 23, 0, 0).unwrap()),
        Revision::new("456", Utc.with_ymd_and_hms(2015, 5, 4, 23, 0, 0).unwrap()),
    ]
}

fn vcs() -> MockVcs {
    MockVcs::new()
        .with_revisions(revisions())
        .with_content("123", "test_abs.rb", CONTENT_123)
        .with_content("456", "test_abs.rb", CONTENT_456)
}

fn runner() -> MockRunner {
    MockRunner::new()
        .with_output_for(CONTENT_123, REPORT_123)
        .with_output_for(CONTENT_456, REPORT_456)
}

fn request(output_dir: &Path) -> TrendRequest {
    TrendRequest {
        repository_root: PathBuf::from("/repo"),
        target: PathBuf::from("test_abs.rb"),
        date_from: NaiveDate::from_ymd_opt(2015, 4, 1).unwrap(),
        date_to: NaiveDate::from_ymd_opt(2015, 5, 31).unwrap(),
        output_dir: output_dir.to_path_buf(),
        force: false,
    }
}

#[test]
fn series_follows_revision_order_and_is_persisted() {
    let out = TempDir::new().unwrap();
    let (vcs, runner) = (vcs(), runner());

    let outcome = TrendAnalysis::new(&vcs, &runner, &FlogReportParser)
        .run(&request(out.path()))
        .unwrap();

    assert!(!outcome.cache_hit);
    let ids: Vec<&str> = outcome.series.iter().map(|r| r.revision.as_str()).collect();
    assert_eq!(ids, vec!["123", "456"]);
    assert_eq!(
        outcome.series[0].report.method_complexity[1].name,
        "chain#linking_to          /absolute/path/test_abs.rb:8"
    );

    let expected = out
        .path()
        .join(request(out.path()).cache_key())
        .join("2015-04-01_2015-05-31_complexity-trend-data.json");
    assert_eq!(outcome.document, expected);

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&expected).unwrap()).unwrap();
    assert_eq!(written[0]["revision"], "123");
    assert_eq!(written[0]["date"], "2015-04-29T23:00:00.000Z");
    assert_eq!(written[0]["path"], "test_abs.rb");
    assert_eq!(written[0]["totalComplexity"], 22.0);
    assert_eq!(written[1]["revision"], "456");
    assert_eq!(written[1]["date"], "2015-05-04T23:00:00.000Z");
    assert_eq!(written[1]["averageComplexity"], 8.4);
}

#[test]
fn revision_filter_carries_target_and_range() {
    let out = TempDir::new().unwrap();
    let (vcs, runner) = (vcs(), runner());

    TrendAnalysis::new(&vcs, &runner, &FlogReportParser)
        .run(&request(out.path()))
        .unwrap();

    let filters = vcs.filters();
    assert_eq!(filters.len(), 1);
    assert_eq!(filters[0].path, PathBuf::from("test_abs.rb"));
    assert_eq!(filters[0].date_from, NaiveDate::from_ymd_opt(2015, 4, 1).unwrap());
    assert_eq!(filters[0].date_to, NaiveDate::from_ymd_opt(2015, 5, 31));
}

#[test]
fn failed_revision_is_dropped_and_the_rest_complete() {
    let out = TempDir::new().unwrap();
    let mut revs = revisions();
    revs.insert(
        1,
        Revision::new("789", Utc.with_ymd_and_hms(2015, 5, 1, 12, 0, 0).unwrap()),
    );
    let vcs = vcs()
        .with_revisions(revs)
        .with_content("789", "test_abs.rb", "def broken(");
    let runner = runner().with_failure_for("def broken(", "flog exited with exit status: 1");

    let outcome = TrendAnalysis::new(&vcs, &runner, &FlogReportParser)
        .run(&request(out.path()))
        .unwrap();

    let ids: Vec<&str> = outcome.series.iter().map(|r| r.revision.as_str()).collect();
    assert_eq!(ids, vec!["123", "456"]);
    assert_eq!(outcome.revisions_listed, 3);
    assert_eq!(runner.spawn_count(), 3);
}

#[test]
fn missing_file_at_revision_is_isolated() {
    let out = TempDir::new().unwrap();
    let mut revs = revisions();
    revs.insert(0, Revision::new("001", Utc.with_ymd_and_hms(2015, 4, 2, 8, 0, 0).unwrap()));
    let vcs = vcs().with_revisions(revs);
    let runner = runner();

    let outcome = TrendAnalysis::new(&vcs, &runner, &FlogReportParser)
        .run(&request(out.path()))
        .unwrap();

    assert_eq!(outcome.series.len(), 2);
    // No analyzer is started for content that could not be read.
    assert_eq!(runner.spawn_count(), 2);
}

#[test]
fn broken_content_stream_is_isolated() {
    let out = TempDir::new().unwrap();
    let vcs = vcs().with_broken_stream("456", "test_abs.rb", "def abs", "git show exited with exit status: 128");
    let runner = runner();

    let outcome = TrendAnalysis::new(&vcs, &runner, &FlogReportParser)
        .with_policy(AggregationPolicy {
            failed_revisions: FailurePolicy::Placeholder,
            skip_empty_reports: false,
        })
        .run(&request(out.path()))
        .unwrap();

    assert_eq!(outcome.series.len(), 2);
    assert!(!outcome.series[0].is_placeholder());
    assert!(outcome.series[1].is_placeholder());
    assert_eq!(outcome.series[1].revision, RevisionId::new("456"));
    assert!(outcome.series[1]
        .error
        .as_deref()
        .unwrap()
        .contains("exit status: 128"));
}

#[test]
fn cached_series_short_circuits_the_pipeline() {
    let out = TempDir::new().unwrap();
    let first = TrendAnalysis::new(&vcs(), &runner(), &FlogReportParser)
        .run(&request(out.path()))
        .unwrap();

    let (vcs, runner) = (vcs(), runner());
    let second = TrendAnalysis::new(&vcs, &runner, &FlogReportParser)
        .run(&request(out.path()))
        .unwrap();

    assert!(second.cache_hit);
    assert_eq!(second.series, first.series);
    assert_eq!(vcs.revisions_count(), 0);
    assert_eq!(vcs.show_count(), 0);
    assert_eq!(runner.spawn_count(), 0);
}

#[test]
fn empty_series_is_cached_too() {
    let out = TempDir::new().unwrap();
    let unreadable = MockVcs::new().with_revisions(revisions());
    let first = TrendAnalysis::new(&unreadable, &runner(), &FlogReportParser)
        .run(&request(out.path()))
        .unwrap();
    assert!(first.series.is_empty());
    assert!(first.document.exists());

    let (vcs, runner) = (vcs(), runner());
    let second = TrendAnalysis::new(&vcs, &runner, &FlogReportParser)
        .run(&request(out.path()))
        .unwrap();

    assert!(second.cache_hit);
    assert!(second.series.is_empty());
    assert_eq!(vcs.revisions_count(), 0);
    assert_eq!(vcs.show_count(), 0);
    assert_eq!(runner.spawn_count(), 0);
}

#[test]
fn force_recomputes_despite_cache() {
    let out = TempDir::new().unwrap();
    TrendAnalysis::new(&vcs(), &runner(), &FlogReportParser)
        .run(&request(out.path()))
        .unwrap();

    let (vcs, runner) = (vcs(), runner());
    let mut forced = request(out.path());
    forced.force = true;
    let outcome = TrendAnalysis::new(&vcs, &runner, &FlogReportParser)
        .run(&forced)
        .unwrap();

    assert!(!outcome.cache_hit);
    assert_eq!(vcs.revisions_count(), 1);
    assert_eq!(runner.spawn_count(), 2);
}

#[test]
fn different_date_ranges_do_not_collide() {
    let out = TempDir::new().unwrap();
    let (vcs, runner) = (vcs(), runner());
    let analysis = TrendAnalysis::new(&vcs, &runner, &FlogReportParser);

    let april = analysis.run(&request(out.path())).unwrap();
    let mut may = request(out.path());
    may.date_from = NaiveDate::from_ymd_opt(2015, 5, 1).unwrap();
    let may = analysis.run(&may).unwrap();

    assert!(!may.cache_hit);
    assert_ne!(april.document, may.document);
    assert!(april.document.exists() && may.document.exists());
}

#[test]
fn parallel_workers_keep_native_order() {
    let out = TempDir::new().unwrap();
    let mut vcs = MockVcs::new();
    let mut runner = MockRunner::new();
    let mut revs = Vec::new();
    for day in 1..=12u32 {
        let id = format!("rev{day:02}");
        let content = format!("# revision {day}\n");
        vcs = vcs.with_content(&id, "test_abs.rb", &content);
        runner = runner.with_output_for(&content, &format!("{day}.0: flog total\n"));
        revs.push(Revision::new(
            id.as_str(),
            Utc.with_ymd_and_hms(2015, 4, day, 10, 0, 0).unwrap(),
        ));
    }
    let vcs = vcs.with_revisions(revs);

    let outcome = TrendAnalysis::new(&vcs, &runner, &FlogReportParser)
        .with_jobs(4)
        .run(&request(out.path()))
        .unwrap();

    let totals: Vec<f64> = outcome
        .series
        .iter()
        .map(|r| r.report.total_complexity.unwrap())
        .collect();
    assert_eq!(totals, (1..=12).map(f64::from).collect::<Vec<_>>());
}

#[test]
fn unwritable_output_directory_is_fatal() {
    let out = TempDir::new().unwrap();
    let blocker = out.path().join("not-a-dir");
    fs::write(&blocker, "").unwrap();
    let (vcs, runner) = (vcs(), runner());

    let err = TrendAnalysis::new(&vcs, &runner, &FlogReportParser)
        .run(&request(&blocker))
        .unwrap_err();

    assert!(matches!(err, codetrend::Error::CacheWrite { .. }));
}
