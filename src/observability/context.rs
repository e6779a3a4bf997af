//! Thread-local context tracking for crash reports.
//!
//! Records the current phase, file and revision of a run. Context is
//! per thread (revision workers on the rayon pool each carry their own);
//! progress counters are global atomics.

use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

static ITEMS_PROCESSED: AtomicUsize = AtomicUsize::new(0);
static ITEMS_TOTAL: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static CURRENT_CONTEXT: RefCell<AnalysisContext> = const { RefCell::new(AnalysisContext::new()) };
}

/// What codetrend was doing when something went wrong.
#[derive(Debug, Clone, Default)]
pub struct AnalysisContext {
    pub phase: Option<AnalysisPhase>,
    pub current_file: Option<PathBuf>,
    pub current_revision: Option<String>,
}

impl AnalysisContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: None,
            current_file: None,
            current_revision: None,
        }
    }
}

/// Major stages of a report or trend run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisPhase {
    /// Turning path expressions into files
    PathResolution,
    /// Asking version control for the revisions to analyse
    RevisionListing,
    /// Running the analyzer over file or revision content
    RevisionAnalysis,
    /// Building the ordered series
    Aggregation,
    /// Writing JSON documents
    OutputWriting,
}

impl std::fmt::Display for AnalysisPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PathResolution => write!(f, "path_resolution"),
            Self::RevisionListing => write!(f, "revision_listing"),
            Self::RevisionAnalysis => write!(f, "revision_analysis"),
            Self::Aggregation => write!(f, "aggregation"),
            Self::OutputWriting => write!(f, "output_writing"),
        }
    }
}

/// RAII guard restoring the previous context on drop.
pub struct ContextGuard {
    previous: AnalysisContext,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CURRENT_CONTEXT.with(|ctx| {
            *ctx.borrow_mut() = self.previous.clone();
        });
    }
}

fn update(apply: impl FnOnce(&mut AnalysisContext)) -> ContextGuard {
    CURRENT_CONTEXT.with(|ctx| {
        let previous = ctx.borrow().clone();
        apply(&mut *ctx.borrow_mut());
        ContextGuard { previous }
    })
}

/// Set the current phase until the guard drops.
#[must_use]
pub fn set_phase(phase: AnalysisPhase) -> ContextGuard {
    update(|ctx| ctx.phase = Some(phase))
}

/// Set the file being analysed until the guard drops.
#[must_use]
pub fn set_current_file(path: impl Into<PathBuf>) -> ContextGuard {
    let path = path.into();
    update(|ctx| ctx.current_file = Some(path))
}

/// Set the revision being analysed until the guard drops.
#[must_use]
pub fn set_current_revision(revision: impl Into<String>) -> ContextGuard {
    let revision = revision.into();
    update(|ctx| ctx.current_revision = Some(revision))
}

pub fn set_progress(processed: usize, total: usize) {
    ITEMS_PROCESSED.store(processed, Ordering::Relaxed);
    ITEMS_TOTAL.store(total, Ordering::Relaxed);
}

pub fn increment_processed() {
    ITEMS_PROCESSED.fetch_add(1, Ordering::Relaxed);
}

#[must_use]
pub fn get_current_context() -> AnalysisContext {
    CURRENT_CONTEXT.with(|ctx| ctx.borrow().clone())
}

/// (processed, total)
#[must_use]
pub fn get_progress() -> (usize, usize) {
    (
        ITEMS_PROCESSED.load(Ordering::Relaxed),
        ITEMS_TOTAL.load(Ordering::Relaxed),
    )
}

pub fn reset_context() {
    CURRENT_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = AnalysisContext::new();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_guard_restores_previous() {
        reset_context();

        let _outer = set_phase(AnalysisPhase::RevisionListing);
        {
            let _inner = set_phase(AnalysisPhase::RevisionAnalysis);
            assert_eq!(get_current_context().phase, Some(AnalysisPhase::RevisionAnalysis));
        }

        assert_eq!(get_current_context().phase, Some(AnalysisPhase::RevisionListing));
    }

    #[test]
    fn test_nested_context_guards() {
        reset_context();

        let _phase = set_phase(AnalysisPhase::RevisionAnalysis);
        let _file = set_current_file("lib/abs.rb");
        let _rev = set_current_revision("456");

        let ctx = get_current_context();
        assert_eq!(ctx.phase, Some(AnalysisPhase::RevisionAnalysis));
        assert_eq!(ctx.current_file, Some(PathBuf::from("lib/abs.rb")));
        assert_eq!(ctx.current_revision.as_deref(), Some("456"));
    }

    #[test]
    fn test_analysis_phase_display() {
        assert_eq!(AnalysisPhase::PathResolution.to_string(), "path_resolution");
        assert_eq!(AnalysisPhase::OutputWriting.to_string(), "output_writing");
    }

    #[test]
    fn test_empty_context_by_default() {
        reset_context();
        let ctx = get_current_context();
        assert!(ctx.phase.is_none());
        assert!(ctx.current_file.is_none());
        assert!(ctx.current_revision.is_none());
    }
}
