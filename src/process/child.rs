//! Streaming access to a child process's stdout.

use std::fmt;
use std::io::{self, Read};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};

/// Reads a child's stdout and reaps the child at end of stream.
///
/// A non-zero exit status is reported as an I/O error from the `read` call
/// that hits end of stream, so consumers see process failure through the same
/// channel as any other read failure. The error carries whatever the child
/// wrote to stderr. Dropping the stream before it was read to completion kills
/// the child.
pub struct ChildStream {
    label: String,
    child: Child,
    stdout: ChildStdout,
    stderr: Option<JoinHandle<String>>,
    reaped: bool,
}

impl ChildStream {
    /// Spawn `command` with a piped stdout. Stdin is left to the caller's
    /// configuration of `command`; stderr is collected on a separate thread.
    pub fn spawn(command: &mut Command, label: impl Into<String>) -> io::Result<Self> {
        let label = label.into();
        let mut child = command.stdout(Stdio::piped()).stderr(Stdio::piped()).spawn()?;
        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(io::Error::other(format!("{label}: stdout was not captured")));
            }
        };

        // Drained concurrently so a chatty child cannot block on a full pipe.
        let stderr = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut text = String::new();
                let _ = pipe.read_to_string(&mut text);
                text
            })
        });

        log::trace!("Spawned {} (pid {})", label, child.id());
        Ok(Self {
            label,
            child,
            stdout,
            stderr,
            reaped: false,
        })
    }

    /// Take the child's stdin, if it was configured as piped.
    pub fn take_stdin(&mut self) -> Option<std::process::ChildStdin> {
        self.child.stdin.take()
    }

    fn reap(&mut self) -> io::Result<()> {
        self.reaped = true;
        let status = self.child.wait()?;
        let stderr = self
            .stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        let stderr = stderr.trim();

        if status.success() {
            if !stderr.is_empty() {
                log::debug!("{} stderr: {}", self.label, stderr);
            }
            Ok(())
        } else if stderr.is_empty() {
            Err(io::Error::other(format!("{} exited with {}", self.label, status)))
        } else {
            log::debug!("{} failed with stderr: {}", self.label, stderr);
            Err(io::Error::other(format!(
                "{} exited with {}: {}",
                self.label, status, stderr
            )))
        }
    }
}

impl Read for ChildStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.stdout.read(buf)?;
        if n == 0 && !buf.is_empty() && !self.reaped {
            self.reap()?;
        }
        Ok(n)
    }
}

impl Drop for ChildStream {
    fn drop(&mut self) {
        if !self.reaped {
            log::trace!("Terminating {} before completion", self.label);
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

impl fmt::Debug for ChildStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildStream")
            .field("label", &self.label)
            .field("pid", &self.child.id())
            .field("reaped", &self.reaped)
            .finish()
    }
}
