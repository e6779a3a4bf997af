use std::fs;
use std::path::{Path, PathBuf};

use super::core::CodetrendConfig;
use crate::errors::{Error, Result};

pub const CONFIG_FILE_NAME: &str = ".codetrend.toml";

/// Parse and validate config from a TOML string
pub fn parse_and_validate_config(contents: &str) -> Result<CodetrendConfig> {
    let config = toml::from_str::<CodetrendConfig>(contents)
        .map_err(|e| Error::Configuration(format!("Failed to parse {}: {}", CONFIG_FILE_NAME, e)))?;

    if config.analyzer.command.trim().is_empty() {
        return Err(Error::Configuration(
            "analyzer.command must not be empty".to_string(),
        ));
    }

    Ok(config)
}

/// Load an explicitly requested config file; any failure is fatal.
pub fn load_config_from(path: &Path) -> Result<CodetrendConfig> {
    let contents = fs::read_to_string(path).map_err(|e| {
        Error::Configuration(format!("Cannot read config file {}: {}", path.display(), e))
    })?;
    let config = parse_and_validate_config(&contents)?;
    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Try loading config from a discovered location
pub(crate) fn try_load_config_from_path(config_path: &Path) -> Option<CodetrendConfig> {
    let contents = match fs::read_to_string(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            handle_read_error(config_path, &e);
            return None;
        }
    };

    match parse_and_validate_config(&contents) {
        Ok(config) => {
            log::debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("{}. Using defaults.", e);
            None
        }
    }
}

/// Handle file read errors with appropriate logging
pub(crate) fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    // Only log actual errors, not "file not found"
    if error.kind() != std::io::ErrorKind::NotFound {
        log::warn!(
            "Failed to read config file {}: {}",
            config_path.display(),
            error
        );
    }
}

/// Directory ancestors of `start`, nearest first, up to a depth limit
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Find the nearest `.codetrend.toml` above `start`, or fall back to defaults.
pub fn load_config_near(start: &Path) -> CodetrendConfig {
    const MAX_TRAVERSAL_DEPTH: usize = 10;

    directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            log::debug!(
                "No config found after checking {} directories. Using default config.",
                MAX_TRAVERSAL_DEPTH
            );
            CodetrendConfig::default()
        })
}

/// Search upwards from the current directory.
pub fn load_config() -> CodetrendConfig {
    match std::env::current_dir() {
        Ok(dir) => load_config_near(&dir),
        Err(e) => {
            log::warn!(
                "Failed to get current directory: {}. Using default config.",
                e
            );
            CodetrendConfig::default()
        }
    }
}
