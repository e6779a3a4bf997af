//! Progress feedback for report and trend runs.
//!
//! Uses `indicatif`. Bars are hidden in quiet mode (`--quiet` or the
//! `CODETREND_QUIET` environment variable) and whenever stderr is not a TTY,
//! so piped output and CI logs stay clean.
//!
//! ```rust,no_run
//! use codetrend::progress::{ProgressConfig, ProgressManager, TEMPLATE_REVISIONS};
//!
//! let manager = ProgressManager::new(ProgressConfig::from_env(false, 0));
//! let progress = manager.create_bar(12, TEMPLATE_REVISIONS);
//! progress.set_message("lib/foo.rb");
//! progress.inc(1);
//! progress.finish_and_clear();
//! ```

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex};

pub const TEMPLATE_FILES: &str = "📁 {msg} {pos}/{len} files ({percent}%) - {eta}";
pub const TEMPLATE_REVISIONS: &str = "🕒 {msg} {pos}/{len} revisions ({percent}%) - {eta}";
pub const TEMPLATE_SPINNER: &str = "{spinner} {msg}";

/// Configuration for progress display behavior
#[derive(Debug, Clone, Default)]
pub struct ProgressConfig {
    /// Whether to suppress all progress output
    pub quiet_mode: bool,
    /// Verbosity level (0 = basic, 1 = detailed, 2 = very detailed)
    pub verbosity: u8,
}

impl ProgressConfig {
    /// Create progress configuration from environment and CLI arguments
    pub fn from_env(quiet: bool, verbosity: u8) -> Self {
        let env_quiet = std::env::var("CODETREND_QUIET").is_ok();
        Self {
            quiet_mode: quiet || env_quiet,
            verbosity,
        }
    }

    pub fn quiet() -> Self {
        Self {
            quiet_mode: true,
            verbosity: 0,
        }
    }

    /// Determine if progress bars should be displayed
    pub fn should_show_progress(&self) -> bool {
        if self.quiet_mode {
            return false;
        }

        use std::io::IsTerminal;
        std::io::stderr().is_terminal()
    }
}

static GLOBAL_PROGRESS: Lazy<Mutex<Option<ProgressManager>>> = Lazy::new(|| Mutex::new(None));

/// Coordinates the progress bars of one invocation
#[derive(Clone)]
pub struct ProgressManager {
    multi: Arc<MultiProgress>,
    config: ProgressConfig,
}

impl ProgressManager {
    pub fn new(config: ProgressConfig) -> Self {
        Self {
            multi: Arc::new(MultiProgress::new()),
            config,
        }
    }

    /// Install the manager used by [`ProgressManager::global_or_hidden`].
    pub fn init_global(config: ProgressConfig) {
        if let Ok(mut slot) = GLOBAL_PROGRESS.lock() {
            *slot = Some(Self::new(config));
        }
    }

    /// The global manager, or a quiet one when none was installed (library use, tests).
    pub fn global_or_hidden() -> Self {
        GLOBAL_PROGRESS
            .lock()
            .ok()
            .and_then(|slot| slot.clone())
            .unwrap_or_else(|| Self::new(ProgressConfig::quiet()))
    }

    /// Create a progress bar with the given length and template
    ///
    /// Returns a hidden progress bar if progress should not be shown
    pub fn create_bar(&self, len: u64, template: &str) -> ProgressBar {
        if !self.config.should_show_progress() {
            return ProgressBar::hidden();
        }

        let style = match ProgressStyle::default_bar().template(template) {
            Ok(style) => style.progress_chars("█▓▒░  "),
            Err(e) => {
                log::debug!("Invalid progress template {:?}: {}", template, e);
                ProgressStyle::default_bar()
            }
        };
        let pb = self.multi.add(ProgressBar::new(len));
        pb.set_style(style);
        pb
    }

    /// Create a spinner progress bar with the given message
    pub fn create_spinner(&self, msg: &str) -> ProgressBar {
        if !self.config.should_show_progress() {
            return ProgressBar::hidden();
        }

        let pb = self.multi.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::default_spinner().template(TEMPLATE_SPINNER) {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }

    pub fn verbosity(&self) -> u8 {
        self.config.verbosity
    }

    /// Clear all progress bars before printing final output.
    pub fn clear(&self) -> std::io::Result<()> {
        self.multi.clear()
    }
}
