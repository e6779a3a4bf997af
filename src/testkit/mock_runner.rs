use std::collections::HashMap;
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

use crate::errors::{Error, Result};
use crate::process::{PipedProcess, ProcessRunner};

#[derive(Clone)]
enum Response {
    Output(Vec<u8>),
    Failure(String),
}

impl Response {
    fn into_reader(self) -> io::Result<Cursor<Vec<u8>>> {
        match self {
            Self::Output(bytes) => Ok(Cursor::new(bytes)),
            Self::Failure(message) => Err(io::Error::other(message)),
        }
    }
}

/// In-memory [`ProcessRunner`].
///
/// A piped "analyzer" waits until its stdin is closed, then answers with the
/// response registered for exactly the bytes it received.
#[derive(Clone, Default)]
pub struct MockRunner {
    piped: HashMap<Vec<u8>, Response>,
    files: HashMap<PathBuf, Response>,
    spawn_calls: Arc<AtomicUsize>,
    stream_calls: Arc<Mutex<Vec<PathBuf>>>,
    inputs: Arc<Mutex<Vec<String>>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_for(self, input: &str, output: &str) -> Self {
        self.with_raw_output_for(input, output.as_bytes().to_vec())
    }

    pub fn with_raw_output_for(mut self, input: &str, output: Vec<u8>) -> Self {
        self.piped
            .insert(input.as_bytes().to_vec(), Response::Output(output));
        self
    }

    /// The analyzer fed `input` exits unsuccessfully.
    pub fn with_failure_for(mut self, input: &str, error: &str) -> Self {
        self.piped
            .insert(input.as_bytes().to_vec(), Response::Failure(error.to_string()));
        self
    }

    pub fn with_file_output(mut self, path: impl Into<PathBuf>, output: &str) -> Self {
        self.files
            .insert(path.into(), Response::Output(output.as_bytes().to_vec()));
        self
    }

    pub fn with_file_failure(mut self, path: impl Into<PathBuf>, error: &str) -> Self {
        self.files
            .insert(path.into(), Response::Failure(error.to_string()));
        self
    }

    pub fn spawn_count(&self) -> usize {
        self.spawn_calls.load(Ordering::SeqCst)
    }

    /// Paths passed to `stream`, in call order.
    pub fn streamed_paths(&self) -> Vec<PathBuf> {
        self.stream_calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Everything fed through stdin, one entry per finished invocation.
    pub fn piped_inputs(&self) -> Vec<String> {
        self.inputs.lock().map(|i| i.clone()).unwrap_or_default()
    }
}

struct MockStdin {
    buffer: Vec<u8>,
    done: Option<Sender<Vec<u8>>>,
}

impl Write for MockStdin {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for MockStdin {
    fn drop(&mut self) {
        if let Some(done) = self.done.take() {
            let _ = done.send(std::mem::take(&mut self.buffer));
        }
    }
}

struct MockStdout {
    input: Receiver<Vec<u8>>,
    responses: HashMap<Vec<u8>, Response>,
    inputs: Arc<Mutex<Vec<String>>>,
    output: Option<Cursor<Vec<u8>>>,
}

impl Read for MockStdout {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.output.is_none() {
            let input = self
                .input
                .recv()
                .map_err(|_| io::Error::other("analyzer stdin vanished"))?;
            if let Ok(mut inputs) = self.inputs.lock() {
                inputs.push(String::from_utf8_lossy(&input).into_owned());
            }
            let response = self.responses.get(&input).cloned().ok_or_else(|| {
                io::Error::other(format!(
                    "no analyzer output registered for input {:?}",
                    String::from_utf8_lossy(&input)
                ))
            })?;
            self.output = Some(response.into_reader()?);
        }
        match self.output.as_mut() {
            Some(output) => output.read(buf),
            None => Ok(0),
        }
    }
}

struct FailingReader(String);

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::other(self.0.clone()))
    }
}

impl ProcessRunner for MockRunner {
    fn stream(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        if let Ok(mut calls) = self.stream_calls.lock() {
            calls.push(path.to_path_buf());
        }
        let response = self
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| Error::analyzer(format!("no output registered for {}", path.display())))?;
        match response {
            Response::Output(bytes) => Ok(Box::new(Cursor::new(bytes))),
            Response::Failure(message) => Ok(Box::new(FailingReader(message))),
        }
    }

    fn spawn_piped(&self) -> Result<PipedProcess> {
        self.spawn_calls.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = channel();
        Ok(PipedProcess {
            stdin: Box::new(MockStdin {
                buffer: Vec::new(),
                done: Some(tx),
            }),
            stdout: Box::new(MockStdout {
                input: rx,
                responses: self.piped.clone(),
                inputs: Arc::clone(&self.inputs),
                output: None,
            }),
        })
    }
}
