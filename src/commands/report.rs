use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::{CodetrendConfig, FilesConfig};
use crate::core::FileReport;
use crate::errors::Error;
use crate::observability::{self, AnalysisPhase};
use crate::orchestrator::analyze_files;
use crate::process::{CommandRunner, ProcessRunner};
use crate::report::{parser_for, ReportParser};
use crate::repository_path::{discover_files, relativise};
use crate::trend::cache::write_json_atomic;

pub const REPORT_FILE_NAME: &str = "complexity-report.json";

pub struct ReportConfig {
    /// Repository to analyze
    pub path: PathBuf,
    /// Overrides the configured report directory
    pub temp_dir: Option<PathBuf>,
    pub config: CodetrendConfig,
}

/// Analyze the working tree under `root`, one entry per matching file.
///
/// Entries keep discovery order and carry paths relative to `root`.
pub fn build_report(
    root: &Path,
    files: &FilesConfig,
    runner: &dyn ProcessRunner,
    parser: &dyn ReportParser,
) -> crate::errors::Result<Vec<FileReport>> {
    let discovered = {
        let _phase = observability::set_phase(AnalysisPhase::PathResolution);
        discover_files(root, &files.include, &files.extensions)?
    };
    log::info!("Analyzing {} file(s) under {}", discovered.len(), root.display());

    let reports = analyze_files(runner, parser, &discovered)?;
    Ok(reports
        .into_iter()
        .map(|(path, report)| FileReport {
            path: relativise(root, &path),
            report,
        })
        .collect())
}

/// Run the working-tree report and write it; returns the document path.
pub fn handle_report(config: ReportConfig) -> Result<PathBuf> {
    let root = config
        .path
        .canonicalize()
        .map_err(|source| Error::PathResolution {
            path: config.path.clone(),
            source,
        })?;

    let runner = CommandRunner::from_config(&config.config.analyzer).with_working_dir(&root);
    runner.ensure_available()?;
    let parser = parser_for(&config.config.analyzer.parser)?;

    let entries = build_report(&root, &config.config.files, &runner, parser.as_ref())?;

    let output_dir = config
        .temp_dir
        .unwrap_or_else(|| config.config.output.resolved_temp_dir());
    let document = output_dir.join(REPORT_FILE_NAME);

    let _phase = observability::set_phase(AnalysisPhase::OutputWriting);
    write_json_atomic(&document, &entries)
        .with_context(|| format!("Failed to write complexity report for {}", root.display()))?;

    log::info!("Wrote {} report entries to {}", entries.len(), document.display());
    Ok(document)
}
