//! Shared error types for codetrend.
//!
//! Two families live here:
//!
//! - [`Error`]: structural failures that abort an invocation (bad root path,
//!   unwritable output directory, missing analyzer, configuration problems).
//! - [`RevisionFailure`]: a failure confined to one revision of a trend run.
//!   These are values that flow through the pipeline and are filtered by the
//!   aggregator; they never abort sibling revisions.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::RevisionId;

/// Main error type for codetrend operations
#[derive(Debug, Error)]
pub enum Error {
    /// A path expression could not be resolved against the filesystem
    #[error("Cannot resolve path {}: {source}", path.display())]
    PathResolution {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File content could not be retrieved from version control
    #[error("Cannot read {} at revision {revision}: {message}", path.display())]
    VcsRead {
        revision: RevisionId,
        path: PathBuf,
        message: String,
    },

    /// The external analyzer could not be started or did not exit cleanly
    #[error("Analyzer process error: {0}")]
    AnalyzerProcess(String),

    /// The analyzer command is not installed
    #[error("Analyzer command not found on PATH: {0}")]
    AnalyzerNotFound(String),

    /// Analyzer output could not be interpreted at all
    #[error("Parse error: {0}")]
    Parse(String),

    /// Writing the output document failed
    #[error("Cannot write {}: {source}", path.display())]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Pattern errors
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    /// Glob iteration errors
    #[error(transparent)]
    Glob(#[from] glob::GlobError),
}

impl Error {
    pub fn vcs_read(
        revision: impl Into<RevisionId>,
        path: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self::VcsRead {
            revision: revision.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn analyzer(message: impl Into<String>) -> Self {
        Self::AnalyzerProcess(message.into())
    }

    pub fn cache_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CacheWrite {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

/// Which stage of a revision pipeline failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    VcsRead,
    AnalyzerProcess,
    Parse,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VcsRead => write!(f, "vcs_read"),
            Self::AnalyzerProcess => write!(f, "analyzer_process"),
            Self::Parse => write!(f, "parse"),
        }
    }
}

/// A failure isolated to one revision of a trend run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionFailure {
    pub revision: RevisionId,
    pub kind: FailureKind,
    pub message: String,
}

impl RevisionFailure {
    pub fn new(revision: impl Into<RevisionId>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            revision: revision.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for RevisionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "revision {} failed ({}): {}", self.revision, self.kind, self.message)
    }
}

impl std::error::Error for RevisionFailure {}
