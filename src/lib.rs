// Export modules for library usage
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod errors;
pub mod observability;
pub mod orchestrator;
pub mod process;
pub mod progress;
pub mod report;
pub mod repository_path;
#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
pub mod trend;
pub mod vcs;

// Re-export commonly used types
pub use crate::core::{
    ComplexityReport, FileReport, MethodComplexity, Revision, RevisionId, TrendRecord,
};

pub use crate::core::metrics::{count_high_complexity, find_max_complexity, round_to_tenth};

pub use crate::errors::{Error, FailureKind, Result, RevisionFailure};

pub use crate::orchestrator::{
    analyze_files, RevisionOutcome, RevisionReport, RevisionStreamOrchestrator,
};

pub use crate::process::{CommandRunner, PipedProcess, ProcessRunner};

pub use crate::report::{parser_for, FlogReportParser, ReportParser};

pub use crate::trend::{aggregate, AggregationPolicy, TrendAnalysis, TrendOutcome, TrendRequest};

pub use crate::vcs::{GitAdapter, RevisionFilter, VcsAdapter};
