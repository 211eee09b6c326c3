//! # Child handle: pipes and signal delivery for one spawned helper.
//!
//! A [`ChildHandle`] owns the process and both pipe ends. Dropping it closes
//! the pipes; the handle is dropped exactly once, when the drain loop reaps
//! the child.

use std::io;
use std::process::ExitStatus;

use futures::FutureExt;
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, ChildStdout};
use tracing::warn;

use crate::error::SpawnError;

/// A live helper process and its pipes.
#[derive(Debug)]
pub(crate) struct ChildHandle {
    /// Process id, captured at spawn time.
    pub(crate) pid: i32,
    child: Child,
    stdin: ChildStdin,
    stdout: ChildStdout,
}

impl ChildHandle {
    /// Takes ownership of a freshly spawned child and its pipe ends.
    pub(crate) fn new(mut child: Child) -> io::Result<Self> {
        let pid = child
            .id()
            .ok_or_else(|| io::Error::other("child pid unavailable"))? as i32;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("child stdin not piped"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("child stdout not piped"))?;
        Ok(Self {
            pid,
            child,
            stdin,
            stdout,
        })
    }

    /// The read end of the child's standard output (non-blocking).
    pub(crate) fn stdout_mut(&mut self) -> &mut ChildStdout {
        &mut self.stdout
    }

    /// Writes `command` plus a newline in a single attempt.
    ///
    /// Partial writes are not retried; a request that does not fit the pipe
    /// buffer in one write is reported as [`SpawnError::ShortWrite`], and a
    /// failed write counts as zero bytes accepted.
    pub(crate) fn send_line(&mut self, command: &str) -> Result<(), SpawnError> {
        let mut line = String::with_capacity(command.len() + 1);
        line.push_str(command);
        line.push('\n');
        let expected = line.len();
        match self.stdin.write(line.as_bytes()).now_or_never() {
            Some(Ok(wrote)) if wrote == expected => Ok(()),
            Some(Ok(wrote)) => {
                warn!(pid = self.pid, wrote, expected, "short write to child stdin");
                Err(SpawnError::ShortWrite { wrote, expected })
            }
            Some(Err(e)) => {
                warn!(pid = self.pid, error = %e, "write to child stdin failed");
                Err(SpawnError::ShortWrite { wrote: 0, expected })
            }
            None => {
                warn!(pid = self.pid, "child stdin full, refusing to queue");
                Err(SpawnError::ShortWrite { wrote: 0, expected })
            }
        }
    }

    /// Non-blocking wait; `Some` means the child has terminated.
    pub(crate) fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }

    /// Delivers `sig` to the child process.
    pub(crate) fn signal(&self, sig: Signal) -> Result<(), SpawnError> {
        deliver_signal(self.pid, sig)
    }
}

/// Raw signal delivery with errno triage.
///
/// `ESRCH` is tolerated: the child may already be a corpse the drain loop
/// has not collected yet.
pub(crate) fn deliver_signal(pid: i32, sig: Signal) -> Result<(), SpawnError> {
    match signal::kill(Pid::from_raw(pid), sig) {
        Ok(()) => Ok(()),
        Err(errno @ (Errno::EINVAL | Errno::EPERM)) => {
            warn!(pid, signal = sig.as_str(), errno = ?errno, "signal refused");
            Err(SpawnError::SignalRefused {
                signal: sig.as_str(),
                reason: errno.desc(),
            })
        }
        Err(errno) => {
            warn!(pid, signal = sig.as_str(), errno = ?errno, "signal not delivered");
            Ok(())
        }
    }
}
