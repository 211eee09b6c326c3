//! # Line framing for child output.
//!
//! [`LinePump`] buffers the bytes read from the child's standard output and
//! splits off complete lines.
//!
//! ## Rules
//! - Reads are single-attempt: draining stops as soon as a read would block
//!   or the pipe hits end of file.
//! - Only newline-terminated lines are handed out; a trailing partial line
//!   stays buffered for the next drain.
//! - Every complete line is handed out, blanks included. The one exemption
//!   is a buffer holding nothing but a single newline: it yields no line
//!   and the byte is kept until more output gives it context.

use futures::FutureExt;
use tokio::io::AsyncReadExt;
use tokio::process::ChildStdout;
use tracing::debug;

/// Buffer and framing state for one supervisor.
///
/// The buffer outlives individual children; it is cleared when a child is
/// reaped so a retired helper's half-line cannot leak into the next one.
pub(crate) struct LinePump {
    buf: Vec<u8>,
}

impl LinePump {
    pub(crate) fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Appends raw bytes to the buffer.
    pub(crate) fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Drains everything currently readable from `stdout` into the buffer.
    ///
    /// Each read is polled exactly once; a pending read means the pipe is
    /// empty for now and the drain returns.
    pub(crate) fn drain(&mut self, stdout: &mut ChildStdout) {
        let mut chunk = [0u8; 4096];
        loop {
            match stdout.read(&mut chunk).now_or_never() {
                None => break,
                Some(Ok(0)) => break,
                Some(Ok(n)) => self.push(&chunk[..n]),
                Some(Err(e)) => {
                    debug!(error = %e, "stdout read failed");
                    break;
                }
            }
        }
    }

    /// Splits off every complete line, newline stripped, blanks included.
    ///
    /// Anything after the last newline stays buffered. A buffer holding
    /// nothing but a single newline is left untouched; the blank only
    /// becomes a line once later output puts it between boundaries.
    pub(crate) fn take_lines(&mut self) -> Vec<String> {
        if self.buf.len() == 1 && self.buf[0] == b'\n' {
            return Vec::new();
        }
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&line[..pos]).into_owned());
        }
        lines
    }

    /// Number of buffered bytes not yet framed into a line.
    pub(crate) fn residue_len(&self) -> usize {
        self.buf.len()
    }

    /// Discards any buffered residue.
    pub(crate) fn clear(&mut self) {
        self.buf.clear();
    }
}
