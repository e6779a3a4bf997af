use std::collections::HashMap;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::core::{Revision, RevisionId};
use crate::errors::{Error, Result};
use crate::vcs::{RevisionFilter, VcsAdapter};

#[derive(Clone)]
enum Content {
    Bytes(Vec<u8>),
    /// Yields the bytes, then fails the read that would hit end of stream.
    Broken(Vec<u8>, String),
}

/// In-memory [`VcsAdapter`].
#[derive(Clone, Default)]
pub struct MockVcs {
    revisions: Vec<Revision>,
    contents: HashMap<(RevisionId, PathBuf), Content>,
    revision_calls: Arc<AtomicUsize>,
    show_calls: Arc<AtomicUsize>,
    filters: Arc<Mutex<Vec<RevisionFilter>>>,
}

impl MockVcs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revisions returned by every `revisions` call, in this order.
    pub fn with_revisions(mut self, revisions: Vec<Revision>) -> Self {
        self.revisions = revisions;
        self
    }

    pub fn with_content(mut self, revision: &str, path: &str, content: &str) -> Self {
        self.contents.insert(
            (RevisionId::new(revision), PathBuf::from(path)),
            Content::Bytes(content.as_bytes().to_vec()),
        );
        self
    }

    /// Content whose stream breaks after `partial`, like `git show` exiting non-zero.
    pub fn with_broken_stream(mut self, revision: &str, path: &str, partial: &str, error: &str) -> Self {
        self.contents.insert(
            (RevisionId::new(revision), PathBuf::from(path)),
            Content::Broken(partial.as_bytes().to_vec(), error.to_string()),
        );
        self
    }

    pub fn revisions_count(&self) -> usize {
        self.revision_calls.load(Ordering::SeqCst)
    }

    pub fn show_count(&self) -> usize {
        self.show_calls.load(Ordering::SeqCst)
    }

    /// Filters passed to `revisions`, in call order.
    pub fn filters(&self) -> Vec<RevisionFilter> {
        self.filters.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

struct BrokenStream {
    data: Cursor<Vec<u8>>,
    error: String,
}

impl Read for BrokenStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.data.read(buf)? {
            0 if !buf.is_empty() => Err(io::Error::other(self.error.clone())),
            n => Ok(n),
        }
    }
}

impl VcsAdapter for MockVcs {
    fn revisions(&self, filter: &RevisionFilter) -> Result<Vec<Revision>> {
        self.revision_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut filters) = self.filters.lock() {
            filters.push(filter.clone());
        }
        Ok(self.revisions.clone())
    }

    fn show_revision_stream(&self, revision: &RevisionId, path: &Path) -> Result<Box<dyn Read + Send>> {
        self.show_calls.fetch_add(1, Ordering::SeqCst);
        match self.contents.get(&(revision.clone(), path.to_path_buf())) {
            Some(Content::Bytes(bytes)) => Ok(Box::new(Cursor::new(bytes.clone()))),
            Some(Content::Broken(bytes, error)) => Ok(Box::new(BrokenStream {
                data: Cursor::new(bytes.clone()),
                error: error.clone(),
            })),
            None => Err(Error::vcs_read(
                revision,
                path,
                "path does not exist at this revision",
            )),
        }
    }
}
