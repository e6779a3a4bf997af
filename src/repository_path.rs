//! Resolution of user supplied path expressions into analysis targets.
//!
//! A path expression is a literal file, a directory or a glob pattern.
//! Directories are turned into `<dir>/**/*.*` before expansion; globs and
//! files pass through unchanged. Expansion itself is injected so callers can
//! swap the filesystem glob for anything that maps a pattern to paths.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use crate::errors::{Error, Result};

const GLOB_MARKERS: [char; 4] = ['*', '?', '[', '{'];
const DIRECTORY_GLOB: &str = "**/*.*";

/// True when the expression contains wildcard markers.
pub fn is_glob(path: &str) -> bool {
    path.contains(GLOB_MARKERS)
}

/// Turn a path into a glob expression.
///
/// Globs are returned as-is without touching the filesystem. Anything else is
/// stat'ed: directories get `/**/*.*` appended, files are returned unchanged.
/// A failing stat (including a missing path) is reported as
/// [`Error::PathResolution`].
pub fn make_glob(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let text = path.to_string_lossy();
    if is_glob(&text) {
        return Ok(text.into_owned());
    }

    let metadata = std::fs::metadata(path).map_err(|source| Error::PathResolution {
        path: path.to_path_buf(),
        source,
    })?;

    if metadata.is_dir() {
        Ok(format!("{}/{}", text.trim_end_matches('/'), DIRECTORY_GLOB))
    } else {
        Ok(text.into_owned())
    }
}

/// Apply `expander` to every expression and flatten the results.
///
/// Order is stable: input order first, then the order each expansion returned.
pub fn expand<S, F, I, E>(paths: &[S], mut expander: F) -> std::result::Result<Vec<String>, E>
where
    S: AsRef<str>,
    F: FnMut(&str) -> std::result::Result<I, E>,
    I: IntoIterator<Item = String>,
{
    paths.iter().try_fold(Vec::new(), |mut acc, path| {
        acc.extend(expander(path.as_ref())?);
        Ok(acc)
    })
}

/// Join each path to `root_path` and make a glob of the result.
pub fn normalise<S: AsRef<str>>(root_path: impl AsRef<Path>, paths: &[S]) -> Result<Vec<String>> {
    let root = root_path.as_ref();
    paths
        .iter()
        .map(|path| make_glob(join_clean(root, path.as_ref())))
        .collect()
}

// `root.join(".")` would leak a `./` segment into every expanded path.
fn join_clean(root: &Path, path: &str) -> PathBuf {
    root.join(path)
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}

/// Express `path` relative to `root_path` for display.
///
/// Paths outside the root are returned unchanged.
pub fn relativise(root_path: impl AsRef<Path>, path: impl AsRef<Path>) -> String {
    let root = root_path.as_ref().to_string_lossy();
    let path = path.as_ref().to_string_lossy();
    let root = root.trim_end_matches('/');

    match path.strip_prefix(root) {
        Some("") => String::new(),
        Some(rest) if rest.starts_with('/') => rest[1..].to_string(),
        _ => path.into_owned(),
    }
}

/// Filesystem expander: every regular file matching the glob, in glob order.
pub fn glob_files(pattern: &str) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in glob::glob(pattern)? {
        let path = entry?;
        if path.is_file() {
            files.push(path.to_string_lossy().into_owned());
        }
    }
    Ok(files)
}

/// Resolve include expressions under `root` into concrete files.
///
/// Only files whose extension is listed in `extensions` are kept (an empty
/// list keeps everything). Duplicates produced by overlapping expressions are
/// dropped, keeping the first occurrence.
pub fn discover_files<S: AsRef<str>>(
    root: &Path,
    include: &[S],
    extensions: &[String],
) -> Result<Vec<PathBuf>> {
    let globs = normalise(root, include)?;
    log::debug!("Expanding {} path expression(s): {:?}", globs.len(), globs);
    let candidates = expand(&globs, glob_files)?;

    let mut seen = HashSet::new();
    let files = candidates
        .into_iter()
        .map(PathBuf::from)
        .filter(|path| has_extension(path, extensions))
        .filter(|path| seen.insert(path.clone()))
        .collect();
    Ok(files)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    path.extension()
        .map(|ext| ext.to_string_lossy())
        .is_some_and(|ext| extensions.iter().any(|wanted| wanted.trim_start_matches('.') == ext))
}
