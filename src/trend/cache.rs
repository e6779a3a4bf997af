//! Location, lookup and atomic persistence of trend documents.
//!
//! Documents live at `<output_dir>/<key>/<from>_<to>_complexity-trend-data.json`
//! where `key` hashes the repository root together with the date range, so
//! series for different repositories or ranges never share a file.

use chrono::NaiveDate;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::core::TrendRecord;
use crate::errors::{Error, Result};

const KEY_LENGTH: usize = 40;
const DOCUMENT_SUFFIX: &str = "complexity-trend-data.json";

/// Stable key for a (repository, date range) pair.
pub fn cache_key(repository_root: &Path, date_from: NaiveDate, date_to: NaiveDate) -> String {
    let mut hasher = Sha256::new();
    hasher.update(repository_root.to_string_lossy().as_bytes());
    hasher.update(b"\0");
    hasher.update(date_from.to_string().as_bytes());
    hasher.update(b"\0");
    hasher.update(date_to.to_string().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..KEY_LENGTH].to_string()
}

pub fn document_name(date_from: NaiveDate, date_to: NaiveDate) -> String {
    format!("{}_{}_{}", date_from, date_to, DOCUMENT_SUFFIX)
}

pub fn cache_path(output_dir: &Path, key: &str, date_from: NaiveDate, date_to: NaiveDate) -> PathBuf {
    output_dir.join(key).join(document_name(date_from, date_to))
}

/// A previously written series for `target`, if one is usable.
///
/// Unreadable or unparseable documents count as a miss, as does a document
/// holding records for a different file. An empty series is a hit: the
/// range had nothing to keep.
pub fn read_cached(path: &Path, target: &str) -> Option<Vec<TrendRecord>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Ignoring unreadable trend cache {}: {}", path.display(), e);
            }
            return None;
        }
    };

    let series: Vec<TrendRecord> = match serde_json::from_str(&content) {
        Ok(series) => series,
        Err(e) => {
            log::warn!("Ignoring corrupt trend cache {}: {}", path.display(), e);
            return None;
        }
    };

    if let Some(other) = series.iter().find(|record| record.path != target) {
        log::debug!(
            "Trend cache {} holds records for {} instead of {}; recomputing",
            path.display(),
            other.path,
            target
        );
        return None;
    }

    Some(series)
}

/// Write `document` as pretty JSON, replacing any previous file at once.
///
/// The document is written to a temporary file in the destination directory
/// and renamed into place, so readers never observe a half-written file.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, document: &T) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::Configuration(format!("{} has no parent directory", path.display())))?;
    fs::create_dir_all(dir).map_err(|e| Error::cache_write(dir, e))?;

    let temp = NamedTempFile::new_in(dir).map_err(|e| Error::cache_write(path, e))?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        serde_json::to_writer_pretty(&mut writer, document)
            .map_err(|e| Error::cache_write(path, e.into()))?;
        writer.flush().map_err(|e| Error::cache_write(path, e))?;
    }
    temp.persist(path).map_err(|e| Error::cache_write(path, e.error))?;

    log::debug!("Wrote {}", path.display());
    Ok(())
}
