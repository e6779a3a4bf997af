use chrono::{DateTime, NaiveDate, Utc};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::{RevisionFilter, VcsAdapter};
use crate::core::{Revision, RevisionId};
use crate::errors::{Error, Result};
use crate::process::ChildStream;
use crate::repository_path::relativise;

/// Create a `Command` for git with process-environment isolation.
///
/// Strips `GIT_DIR` and `GIT_WORK_TREE` so that inherited environment
/// variables cannot override the explicit `-C` path.
fn git_cmd(repo_root: &Path) -> Command {
    let mut cmd = Command::new("git");
    cmd.env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE")
        .arg("-C")
        .arg(repo_root);
    cmd
}

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// [`VcsAdapter`] driving the `git` command line.
#[derive(Debug, Clone)]
pub struct GitAdapter {
    repo_root: PathBuf,
}

impl GitAdapter {
    pub fn new(repo_root: impl Into<PathBuf>) -> Result<Self> {
        let repo_root = repo_root.into();
        let output = git_cmd(&repo_root)
            .args(["rev-parse", "--git-dir"])
            .stderr(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(Error::Configuration(format!(
                "Not a git repository: {}",
                repo_root.display()
            )));
        }
        Ok(Self { repo_root })
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    // git pathspecs and `rev:path` both want repository-relative paths.
    fn repo_relative(&self, path: &Path) -> String {
        relativise(&self.repo_root, path)
    }
}

// Range bounds are UTC days. A bare date makes git keep the current time of
// day, and a missing offset makes it use the local timezone.
fn since_arg(date: NaiveDate) -> String {
    format!("--since={} 00:00:00 +0000", date)
}

fn until_arg(date: NaiveDate) -> String {
    format!("--until={} 23:59:59 +0000", date)
}

/// Parse `%H%x09%cI` lines into revisions.
pub(crate) fn parse_log_lines(output: &str) -> Result<Vec<Revision>> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let (hash, date) = line.split_once('\t').ok_or_else(|| {
                Error::Parse(format!("unexpected git log line: {:?}", line))
            })?;
            let date = DateTime::parse_from_rfc3339(date.trim())
                .map_err(|e| Error::Parse(format!("bad commit date {:?}: {}", date, e)))?
                .with_timezone(&Utc);
            Ok(Revision::new(hash.trim(), date))
        })
        .collect()
}

impl VcsAdapter for GitAdapter {
    fn revisions(&self, filter: &RevisionFilter) -> Result<Vec<Revision>> {
        let mut cmd = git_cmd(&self.repo_root);
        cmd.args(["log", "--reverse", "--format=%H%x09%cI"])
            .arg(since_arg(filter.date_from));
        if let Some(date_to) = filter.date_to {
            cmd.arg(until_arg(date_to));
        }
        cmd.arg("--").arg(self.repo_relative(&filter.path));

        let output = cmd.stderr(Stdio::piped()).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Configuration(format!("git log failed: {}", stderr.trim())));
        }

        let revisions = parse_log_lines(&String::from_utf8_lossy(&output.stdout))?;
        log::debug!(
            "git log found {} revision(s) of {}",
            revisions.len(),
            filter.path.display()
        );
        Ok(revisions)
    }

    fn show_revision_stream(&self, revision: &RevisionId, path: &Path) -> Result<Box<dyn Read + Send>> {
        let object = format!("{}:{}", revision, self.repo_relative(path));
        let mut cmd = git_cmd(&self.repo_root);
        cmd.arg("show").arg(&object).stdin(Stdio::null());

        let stream = ChildStream::spawn(&mut cmd, format!("git show {}", object))
            .map_err(|e| Error::vcs_read(revision, path, e.to_string()))?;
        Ok(Box::new(stream))
    }
}
