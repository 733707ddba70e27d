//! Line-oriented pipes to a child process.
//!
//! A [`Channel`] owns one child process with piped stdin and stdout. Reads
//! are meant to be gated by readiness (see [`crate::poll`]): each call to
//! [`Channel::pull_lines`] performs exactly one `read(2)` and returns only
//! complete lines, keeping the unterminated remainder buffered.

use std::io::{Read, Write};
use std::os::fd::{AsRawFd, RawFd};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use barpyrus_core::{BarError, Result};
use tracing::{debug, instrument, warn};

use crate::input::{LineSink, LineSource};

const READ_CHUNK: usize = 4096;

/// A spawned child process exposed as a line source and line sink.
pub struct Channel {
    name: String,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: ChildStdout,
    buf: Vec<u8>,
    reaped: bool,
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("pid", &self.child.id())
            .field("buffered", &self.buf.len())
            .field("reaped", &self.reaped)
            .finish()
    }
}

impl Channel {
    /// Spawn `argv[0]` with the remaining arguments.
    ///
    /// The channel is named after the program.
    pub fn spawn<S: AsRef<str>>(argv: &[S]) -> Result<Self> {
        let program = argv
            .first()
            .map(|s| s.as_ref().to_string())
            .ok_or_else(|| BarError::internal("cannot spawn an empty command line"))?;
        let mut command = Command::new(&program);
        command.args(argv[1..].iter().map(|s| s.as_ref()));
        Self::from_command(&program, command)
    }

    /// Spawn a prepared [`Command`]; stdin and stdout are replaced by pipes.
    #[instrument(level = "debug", skip_all, fields(channel = %name))]
    pub fn from_command(name: &str, mut command: Command) -> Result<Self> {
        let name = name.to_string();
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| BarError::spawn(&name, e))?;

        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BarError::internal(format!("{name}: stdout was not piped")))?;

        debug!(pid = child.id(), "spawned channel");
        Ok(Self {
            name,
            child,
            stdin,
            stdout,
            buf: Vec::new(),
            reaped: false,
        })
    }

    /// OS process id of the child.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Close the child's stdin, signalling end of input to it.
    pub fn close_stdin(&mut self) {
        if self.stdin.take().is_some() {
            debug!(channel = %self.name, "closed stdin");
        }
    }

    /// Write `text` without appending a newline, then flush.
    pub fn write_raw(&mut self, text: &str) -> Result<()> {
        let name = &self.name;
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            BarError::channel_write(
                name,
                std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdin already closed"),
            )
        })?;
        stdin
            .write_all(text.as_bytes())
            .and_then(|()| stdin.flush())
            .map_err(|e| BarError::channel_write(name, e))
    }
}

impl LineSource for Channel {
    fn name(&self) -> &str {
        &self.name
    }

    fn raw_fd(&self) -> RawFd {
        self.stdout.as_raw_fd()
    }

    fn pull_lines(&mut self) -> Result<Vec<String>> {
        let mut chunk = [0u8; READ_CHUNK];
        let n = loop {
            match self.stdout.read(&mut chunk) {
                Ok(n) => break n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(BarError::channel_read(&self.name, e)),
            }
        };
        if n == 0 {
            return Err(BarError::end_of_stream(&self.name));
        }
        self.buf.extend_from_slice(&chunk[..n]);
        Ok(take_complete_lines(&mut self.buf))
    }

    fn terminate(&mut self) {
        if self.reaped {
            return;
        }
        self.stdin.take();
        // Fails with InvalidInput once the child has been reaped elsewhere
        if let Err(e) = self.child.kill() {
            debug!(channel = %self.name, error = %e, "kill failed");
        }
        match self.child.wait() {
            Ok(status) => debug!(channel = %self.name, %status, "channel reaped"),
            Err(e) => warn!(channel = %self.name, error = %e, "failed to reap channel"),
        }
        self.reaped = true;
    }
}

impl LineSink for Channel {
    fn write_line(&mut self, line: &str) -> Result<()> {
        let mut text = String::with_capacity(line.len() + 1);
        text.push_str(line);
        text.push('\n');
        self.write_raw(&text)
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Remove every newline-terminated line from `buf`.
///
/// Whatever follows the last newline stays in the buffer.
pub(crate) fn take_complete_lines(buf: &mut Vec<u8>) -> Vec<String> {
    let Some(last) = buf.iter().rposition(|&b| b == b'\n') else {
        return Vec::new();
    };
    let complete: Vec<u8> = buf.drain(..=last).collect();
    complete[..complete.len() - 1]
        .split(|&b| b == b'\n')
        .map(|line| String::from_utf8_lossy(line).into_owned())
        .collect()
}
