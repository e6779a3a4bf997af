//! Custom panic hook for structured crash reports.
//!
//! Prints what was being analysed (phase, file, revision) and how far the
//! run got, so a crash in the middle of a long history replay is actionable.

use super::context::{get_current_context, get_progress, AnalysisContext};
use std::panic::PanicHookInfo;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const RULE: &str = "════════════════════════════════════════════════════════════════════════════════";

/// Install the custom panic hook. Call early in `main`.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!();
        eprintln!("{}", render_crash_report(info));
    }));
}

fn render_crash_report(info: &PanicHookInfo<'_>) -> String {
    let mut lines = vec![
        RULE.to_string(),
        "CODETREND CRASH REPORT".to_string(),
        format!("  Version: {}", VERSION),
        format!("  Platform: {}", std::env::consts::OS),
        format!("  Time: {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")),
        format!("  PANIC: {}", extract_panic_message(info)),
    ];
    if let Some(location) = info.location() {
        lines.push(format!(
            "  Location: {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        ));
    }

    let (processed, total) = get_progress();
    lines.extend(context_lines(&get_current_context(), processed, total));

    if std::env::var("RUST_BACKTRACE").is_ok() {
        lines.push(format!("{}", std::backtrace::Backtrace::capture()));
    } else {
        lines.push("  Run with RUST_BACKTRACE=1 for stack trace".to_string());
    }
    lines.push(RULE.to_string());
    lines.join("\n")
}

fn context_lines(context: &AnalysisContext, processed: usize, total: usize) -> Vec<String> {
    let mut lines = vec!["  OPERATION CONTEXT:".to_string()];

    match &context.phase {
        Some(phase) => lines.push(format!("    Phase: {}", phase)),
        None => lines.push("    Phase: (not set - crash occurred before analysis started)".to_string()),
    }
    if let Some(file) = &context.current_file {
        lines.push(format!("    File: {}", file.display()));
    }
    if let Some(revision) = &context.current_revision {
        lines.push(format!("    Revision: {}", revision));
    }
    if total > 0 {
        let pct = (processed as f64 / total as f64 * 100.0) as usize;
        lines.push(format!("    Progress: {} / {} ({}%)", processed, total, pct));
    }
    lines
}

fn extract_panic_message(info: &PanicHookInfo<'_>) -> String {
    if let Some(s) = info.payload().downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::AnalysisPhase;
    use std::path::PathBuf;

    #[test]
    fn context_lines_without_phase() {
        let lines = context_lines(&AnalysisContext::new(), 0, 0);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("not set"));
    }

    #[test]
    fn context_lines_include_file_revision_and_progress() {
        let context = AnalysisContext {
            phase: Some(AnalysisPhase::RevisionAnalysis),
            current_file: Some(PathBuf::from("lib/abs.rb")),
            current_revision: Some("123".to_string()),
        };
        let lines = context_lines(&context, 1, 4);
        assert_eq!(
            lines,
            vec![
                "  OPERATION CONTEXT:",
                "    Phase: revision_analysis",
                "    File: lib/abs.rb",
                "    Revision: 123",
                "    Progress: 1 / 4 (25%)",
            ]
        );
    }
}
