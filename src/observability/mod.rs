//! Crash-report context for long running analyses.
//!
//! ```ignore
//! use codetrend::observability::{install_panic_hook, set_phase, AnalysisPhase};
//!
//! install_panic_hook();
//! let _phase = set_phase(AnalysisPhase::RevisionListing);
//! ```

pub mod context;
pub mod panic_hook;

pub use context::{
    get_current_context, get_progress, increment_processed, set_current_file,
    set_current_revision, set_phase, set_progress, AnalysisContext, AnalysisPhase, ContextGuard,
};
pub use panic_hook::install_panic_hook;
