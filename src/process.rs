//! Running external processes and relaying their output.
//!
//! The orchestrator talks to a [`ProcessRunner`] rather than spawning
//! processes itself, so tests can substitute a runner that records the
//! invocations and returns canned exit codes.

use std::{
    borrow::Cow,
    io::{BufRead, BufReader, Read},
    process::Stdio,
    sync::mpsc::{self, Sender},
    thread,
};

use encoding_rs::Encoding;
use tracing::{debug, warn};

use crate::{
    cmd::Cmd,
    error::{Error, Result},
};

/// Exit code reported when a process could not be spawned or was killed by
/// a signal.
pub const SPAWN_FAILED: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Exit code plus the interleaved output of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    pub exit_code: i32,
    pub output: String,
}

impl ProcessResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

pub trait ProcessRunner: Send {
    /// Run `cmd` to completion, handing every output chunk to `on_output`
    /// as it arrives.
    ///
    /// Failing to spawn is not an error: it is reported as
    /// [`SPAWN_FAILED`].
    fn run(&mut self, cmd: &Cmd, on_output: &mut dyn FnMut(Stream, &str)) -> ProcessResult;
}

/// Decodes process output as UTF-8, falling back to a legacy codepage.
#[derive(Debug, Clone, Copy)]
pub struct OutputDecoder {
    fallback: &'static Encoding,
}

impl OutputDecoder {
    /// `label` is a WHATWG encoding label such as `gbk` or `windows-1252`.
    pub fn new(label: &str) -> Result<Self> {
        let fallback = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| Error::UnknownEncoding(label.to_string()))?;
        Ok(Self { fallback })
    }

    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        match std::str::from_utf8(bytes) {
            Ok(text) => Cow::Borrowed(text),
            Err(_) => {
                let (text, _, had_errors) = self.fallback.decode(bytes);
                if had_errors {
                    debug!(encoding = self.fallback.name(), "lossy output decode");
                }
                text
            }
        }
    }
}

impl Default for OutputDecoder {
    fn default() -> Self {
        Self {
            fallback: encoding_rs::GBK,
        }
    }
}

/// Spawns real OS processes.
#[derive(Debug, Default)]
pub struct SystemRunner {
    decoder: OutputDecoder,
}

impl SystemRunner {
    pub fn new(decoder: OutputDecoder) -> Self {
        Self { decoder }
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&mut self, cmd: &Cmd, on_output: &mut dyn FnMut(Stream, &str)) -> ProcessResult {
        let mut command = cmd.to_command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                warn!(program = cmd.program(), error = %err, "failed to spawn process");
                let line = format!("failed to start {}: {err}", cmd.program());
                on_output(Stream::Stderr, &line);
                return ProcessResult {
                    exit_code: SPAWN_FAILED,
                    output: line,
                };
            }
        };

        let (tx, rx) = mpsc::channel::<(Stream, Vec<u8>)>();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_reader(Stream::Stdout, stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_reader(Stream::Stderr, stderr, tx.clone()));
        }
        drop(tx);

        // Ends once both readers hit EOF and drop their senders.
        let mut output = String::new();
        for (stream, bytes) in rx {
            let text = self.decoder.decode(&bytes);
            on_output(stream, &text);
            output.push_str(&text);
        }

        let lost = join_readers(readers);
        if lost > 0 {
            warn!(program = cmd.program(), lost, "output reader panicked, output may be incomplete");
        }

        let exit_code = match child.wait() {
            Ok(status) => status.code().unwrap_or(SPAWN_FAILED),
            Err(err) => {
                warn!(program = cmd.program(), error = %err, "failed to wait for process");
                SPAWN_FAILED
            }
        };

        debug!(program = cmd.program(), exit_code, "process exited");
        ProcessResult { exit_code, output }
    }
}

/// Wait for the reader threads; returns how many of them panicked.
fn join_readers(readers: Vec<thread::JoinHandle<()>>) -> usize {
    readers
        .into_iter()
        .map(|reader| reader.join())
        .filter(|joined| joined.is_err())
        .count()
}

fn spawn_reader<R>(stream: Stream, pipe: R, tx: Sender<(Stream, Vec<u8>)>) -> thread::JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(pipe);
        loop {
            let mut line = Vec::new();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send((stream, line)).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    debug!(?stream, error = %err, "output pipe closed");
                    break;
                }
            }
        }
    })
}
