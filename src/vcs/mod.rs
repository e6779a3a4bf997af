//! Version control collaborator.
//!
//! The orchestrator receives a [`VcsAdapter`] value at construction; nothing
//! in the core looks one up from ambient state.

pub mod git;

use chrono::NaiveDate;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::core::{Revision, RevisionId};
use crate::errors::Result;

pub use git::GitAdapter;

/// Which revisions of which file to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionFilter {
    pub path: PathBuf,
    pub date_from: NaiveDate,
    pub date_to: Option<NaiveDate>,
}

impl RevisionFilter {
    pub fn new(path: impl Into<PathBuf>, date_from: NaiveDate) -> Self {
        Self {
            path: path.into(),
            date_from,
            date_to: None,
        }
    }

    pub fn until(mut self, date_to: NaiveDate) -> Self {
        self.date_to = Some(date_to);
        self
    }
}

pub trait VcsAdapter: Send + Sync {
    /// Revisions touching the filtered path, in the repository's native
    /// history order (oldest first).
    fn revisions(&self, filter: &RevisionFilter) -> Result<Vec<Revision>>;

    /// Content of `path` at `revision`.
    ///
    /// Must fail rather than yield empty content when the path did not exist
    /// at that revision; failure may surface as a read error on the stream.
    fn show_revision_stream(&self, revision: &RevisionId, path: &Path) -> Result<Box<dyn Read + Send>>;
}
