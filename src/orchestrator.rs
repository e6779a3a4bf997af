//! Replays the history of one file through the analyzer.
//!
//! For every revision: content stream from version control → analyzer stdin →
//! analyzer stdout → report parser. Each revision yields a [`RevisionOutcome`];
//! a failure in one revision never stops the others.
//!
//! Content is copied into the analyzer in fixed-size chunks on a scoped
//! thread while the calling thread drains stdout, so neither side of the
//! pipe is ever buffered whole and neither can block the other.

use rayon::prelude::*;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::thread;

use crate::core::{ComplexityReport, Revision};
use crate::errors::{FailureKind, RevisionFailure};
use crate::observability::{self, AnalysisPhase};
use crate::process::{PipedProcess, ProcessRunner};
use crate::progress::{ProgressManager, TEMPLATE_REVISIONS};
use crate::report::ReportParser;
use crate::vcs::VcsAdapter;

const CHUNK_SIZE: usize = 8 * 1024;

/// A successfully parsed revision.
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionReport {
    pub revision: Revision,
    pub report: ComplexityReport,
}

pub type RevisionOutcome = Result<RevisionReport, RevisionFailure>;

pub struct RevisionStreamOrchestrator<'a> {
    vcs: &'a dyn VcsAdapter,
    runner: &'a dyn ProcessRunner,
    parser: &'a dyn ReportParser,
    jobs: usize,
}

impl<'a> RevisionStreamOrchestrator<'a> {
    pub fn new(
        vcs: &'a dyn VcsAdapter,
        runner: &'a dyn ProcessRunner,
        parser: &'a dyn ReportParser,
    ) -> Self {
        Self {
            vcs,
            runner,
            parser,
            jobs: 1,
        }
    }

    /// Number of revisions analysed at once; `1` keeps a single analyzer
    /// process alive at any time.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Analyse every revision of `path`.
    ///
    /// Outcomes come back in the order of `revisions`, but callers that need
    /// a particular order should not rely on it.
    pub fn run(&self, path: &Path, revisions: &[Revision]) -> Vec<RevisionOutcome> {
        let _phase = observability::set_phase(AnalysisPhase::RevisionAnalysis);
        observability::set_progress(0, revisions.len());

        let progress = ProgressManager::global_or_hidden()
            .create_bar(revisions.len() as u64, TEMPLATE_REVISIONS);
        progress.set_message(path.display().to_string());

        let analyse = |revision: &Revision| {
            let outcome = self.analyze_revision(path, revision);
            observability::increment_processed();
            progress.inc(1);
            outcome
        };

        let outcomes: Vec<RevisionOutcome> = if self.jobs > 1 {
            match rayon::ThreadPoolBuilder::new().num_threads(self.jobs).build() {
                Ok(pool) => pool.install(|| revisions.par_iter().map(analyse).collect()),
                Err(e) => {
                    log::warn!("Cannot start {} workers ({}); analysing sequentially", self.jobs, e);
                    revisions.iter().map(analyse).collect()
                }
            }
        } else {
            revisions.iter().map(analyse).collect()
        };

        progress.finish_and_clear();
        outcomes
    }

    /// Content → analyzer → parser for a single revision.
    pub fn analyze_revision(&self, path: &Path, revision: &Revision) -> RevisionOutcome {
        let _file = observability::set_current_file(path);
        let _rev = observability::set_current_revision(revision.id.as_str());
        let fail = |kind, message: String| RevisionFailure::new(&revision.id, kind, message);

        let content = self
            .vcs
            .show_revision_stream(&revision.id, path)
            .map_err(|e| fail(FailureKind::VcsRead, e.to_string()))?;
        let process = self
            .runner
            .spawn_piped()
            .map_err(|e| fail(FailureKind::AnalyzerProcess, e.to_string()))?;

        let output = pipe_through(content, process).map_err(|e| match e {
            PipeError::Source(e) => fail(FailureKind::VcsRead, e.to_string()),
            PipeError::Sink(e) | PipeError::Output(e) => {
                fail(FailureKind::AnalyzerProcess, e.to_string())
            }
        })?;

        let report = self
            .parser
            .parse_bytes(&output)
            .map_err(|e| fail(FailureKind::Parse, e.to_string()))?;

        log::debug!(
            "Revision {} of {}: {} method score(s)",
            revision.id,
            path.display(),
            report.method_complexity.len()
        );
        Ok(RevisionReport {
            revision: revision.clone(),
            report,
        })
    }
}

#[derive(Debug)]
enum PipeError {
    /// Reading the revision content failed
    Source(io::Error),
    /// Writing into the analyzer failed
    Sink(io::Error),
    /// Reading the analyzer's report failed, including a non-zero exit
    Output(io::Error),
}

/// Feed `content` into the analyzer and collect everything it prints.
///
/// Both handles are consumed: stdin is closed once content is exhausted and
/// stdout is dropped before returning, which reaps or kills the analyzer.
fn pipe_through(content: Box<dyn Read + Send>, process: PipedProcess) -> Result<Vec<u8>, PipeError> {
    let PipedProcess { stdin, mut stdout } = process;

    thread::scope(|scope| {
        let feeder = scope.spawn(move || feed(content, stdin));

        let mut output = Vec::new();
        let drained = stdout.read_to_end(&mut output);
        drop(stdout);

        let fed = feeder
            .join()
            .unwrap_or_else(|_| Err(PipeError::Sink(io::Error::other("content feeder panicked"))));

        fed?;
        drained.map_err(PipeError::Output)?;
        Ok(output)
    })
}

fn feed(mut source: Box<dyn Read + Send>, mut sink: Box<dyn Write + Send>) -> Result<u64, PipeError> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let n = match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(PipeError::Source(e)),
        };
        match sink.write_all(&buf[..n]) {
            Ok(()) => total += n as u64,
            // The analyzer stopped reading; its exit status decides the outcome.
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                log::debug!("Analyzer closed its input after {} bytes", total);
                return Ok(total);
            }
            Err(e) => return Err(PipeError::Sink(e)),
        }
    }

    match sink.flush() {
        Ok(()) => Ok(total),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(total),
        Err(e) => Err(PipeError::Sink(e)),
    }
}

/// Analyse working-tree files directly, in the given order.
///
/// Unlike revision analysis a failure here aborts: the report covers the
/// current tree and a partial document would silently misreport it.
pub fn analyze_files(
    runner: &dyn ProcessRunner,
    parser: &dyn ReportParser,
    files: &[PathBuf],
) -> crate::errors::Result<Vec<(PathBuf, ComplexityReport)>> {
    let _phase = observability::set_phase(AnalysisPhase::RevisionAnalysis);
    observability::set_progress(0, files.len());
    let progress = ProgressManager::global_or_hidden()
        .create_bar(files.len() as u64, crate::progress::TEMPLATE_FILES);

    let mut reports = Vec::with_capacity(files.len());
    for file in files {
        let _file = observability::set_current_file(file);
        progress.set_message(file.display().to_string());

        let mut output = Vec::new();
        runner.stream(file)?.read_to_end(&mut output).map_err(|e| {
            crate::errors::Error::analyzer(format!("{}: {}", file.display(), e))
        })?;
        reports.push((file.clone(), parser.parse_bytes(&output)?));

        observability::increment_processed();
        progress.inc(1);
    }

    progress.finish_and_clear();
    Ok(reports)
}
