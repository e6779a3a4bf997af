use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure, read from `.codetrend.toml`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct CodetrendConfig {
    /// External analyzer invocation
    pub analyzer: AnalyzerConfig,

    /// Which working-tree files the report covers
    pub files: FilesConfig,

    /// Output locations
    pub output: OutputConfig,

    /// Trend analysis behaviour
    pub trend: TrendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub command: String,
    /// Arguments for analysing a file on disk; the file path is appended.
    pub args: Vec<String>,
    /// Arguments for analysing source piped through stdin.
    pub stdin_args: Vec<String>,
    /// Report parser name
    pub parser: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            command: "flog".to_string(),
            args: vec!["-a".to_string()],
            stdin_args: vec!["-a".to_string(), "-".to_string()],
            parser: "flog".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilesConfig {
    /// Path expressions relative to the repository root
    pub include: Vec<String>,
    /// File extensions to analyze (without the dot); empty means all
    pub extensions: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            include: vec![".".to_string()],
            extensions: vec!["rb".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Where the working-tree report is written
    pub temp_dir: Option<PathBuf>,
    /// Root of the trend cache
    pub output_dir: Option<PathBuf>,
}

impl OutputConfig {
    /// `CODETREND_TEMP_DIR`, then the configured value, then the shared default.
    pub fn resolved_temp_dir(&self) -> PathBuf {
        resolve_dir("CODETREND_TEMP_DIR", self.temp_dir.as_ref(), "tmp")
    }

    /// `CODETREND_OUTPUT_DIR`, then the configured value, then the shared default.
    pub fn resolved_output_dir(&self) -> PathBuf {
        resolve_dir("CODETREND_OUTPUT_DIR", self.output_dir.as_ref(), "output")
    }
}

fn resolve_dir(env_var: &str, configured: Option<&PathBuf>, leaf: &str) -> PathBuf {
    if let Ok(dir) = std::env::var(env_var) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    configured
        .cloned()
        .unwrap_or_else(|| shared_base_dir().join(leaf))
}

/// Platform cache directory for codetrend
pub fn shared_base_dir() -> PathBuf {
    if let Ok(xdg_cache) = std::env::var("XDG_CACHE_HOME") {
        if !xdg_cache.is_empty() {
            return PathBuf::from(xdg_cache).join("codetrend");
        }
    }

    dirs::cache_dir()
        .map(|dir| dir.join("codetrend"))
        .unwrap_or_else(|| std::env::temp_dir().join("codetrend"))
}

/// What happens to revisions whose pipeline failed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Leave the revision out of the series
    #[default]
    Drop,
    /// Keep a record carrying the error instead of scores
    Placeholder,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrendConfig {
    pub failed_revisions: FailurePolicy,
    /// Drop revisions whose report has no recognizable line
    pub skip_empty_reports: bool,
    /// Revisions analysed concurrently (0 = one per CPU)
    pub jobs: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            failed_revisions: FailurePolicy::Drop,
            skip_empty_reports: false,
            jobs: 1,
        }
    }
}

impl TrendConfig {
    pub fn worker_count(&self) -> usize {
        if self.jobs == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.jobs
        }
    }
}
