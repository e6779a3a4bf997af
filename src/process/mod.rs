//! Running the external complexity analyzer.
//!
//! The core talks to the analyzer only through [`ProcessRunner`], which
//! offers two ways in: analysing a working-tree file directly
//! ([`ProcessRunner::stream`]) or feeding source through the analyzer's stdin
//! ([`ProcessRunner::spawn_piped`]).

mod child;

pub use child::ChildStream;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::AnalyzerConfig;
use crate::errors::{Error, Result};

/// Both ends of an analyzer invocation that reads source from stdin.
///
/// Dropping `stdin` signals end of input. `stdout` yields the report and
/// reports a non-zero exit of the analyzer as a read error at end of stream.
pub struct PipedProcess {
    pub stdin: Box<dyn Write + Send>,
    pub stdout: Box<dyn Read + Send>,
}

pub trait ProcessRunner: Send + Sync {
    /// Analyze a file on disk and stream the analyzer's report.
    fn stream(&self, path: &Path) -> Result<Box<dyn Read + Send>>;

    /// Start an analyzer that reads the source to analyze from stdin.
    fn spawn_piped(&self) -> Result<PipedProcess>;
}

/// [`ProcessRunner`] backed by `std::process::Command`.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: String,
    args: Vec<String>,
    stdin_args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl CommandRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin_args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.command.clone())
            .with_args(config.args.clone())
            .with_stdin_args(config.stdin_args.clone())
    }

    /// Arguments placed before the file path in [`ProcessRunner::stream`].
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Arguments used by [`ProcessRunner::spawn_piped`].
    pub fn with_stdin_args(mut self, args: Vec<String>) -> Self {
        self.stdin_args = args;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Fail early when the analyzer is not installed.
    pub fn ensure_available(&self) -> Result<PathBuf> {
        which::which(&self.program).map_err(|_| Error::AnalyzerNotFound(self.program.clone()))
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl ProcessRunner for CommandRunner {
    fn stream(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let mut cmd = self.command();
        cmd.args(&self.args).arg(path).stdin(Stdio::null());

        let label = format!("{} {}", self.program, path.display());
        let stream = ChildStream::spawn(&mut cmd, label)
            .map_err(|e| Error::analyzer(format!("failed to start {}: {}", self.program, e)))?;
        Ok(Box::new(stream))
    }

    fn spawn_piped(&self) -> Result<PipedProcess> {
        let mut cmd = self.command();
        cmd.args(&self.stdin_args).stdin(Stdio::piped());

        let mut stream = ChildStream::spawn(&mut cmd, self.program.clone())
            .map_err(|e| Error::analyzer(format!("failed to start {}: {}", self.program, e)))?;
        let stdin = stream
            .take_stdin()
            .ok_or_else(|| Error::analyzer(format!("{}: stdin was not captured", self.program)))?;

        Ok(PipedProcess {
            stdin: Box::new(stdin),
            stdout: Box::new(stream),
        })
    }
}
