//! # Error types surfaced by the supervisor.
//!
//! Every operation that can refuse work returns a [`SpawnError`]. The
//! supervisor never raises from its timer-driven paths; internal transients
//! are logged and the child's ultimate fate is reported only through the
//! terminal exit event and its [`ExitClass`](crate::ExitClass).
//!
//! The type provides `as_label()` for stable log/metric labels.

use std::io;

use thiserror::Error;

/// # Errors produced by supervisor operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SpawnError {
    /// The helper process could not be created.
    #[error("failed to spawn '{argv0}': {source}")]
    SpawnFailed {
        /// The executable that was asked for.
        argv0: String,
        /// The underlying spawn failure.
        #[source]
        source: io::Error,
    },

    /// A request line was not fully accepted by the child's stdin pipe.
    ///
    /// Partial writes are never retried; a dispatcher that cannot take a
    /// whole request in one write gets rotated instead.
    #[error("wrote {wrote}/{expected} bytes to child stdin")]
    ShortWrite {
        /// Bytes the pipe accepted.
        wrote: usize,
        /// Bytes that were offered.
        expected: usize,
    },

    /// The operation targeted a child that has already been reaped.
    #[error("child already finished")]
    AlreadyFinished,

    /// A cooperative exit request is already in flight.
    #[error("cooperative exit already in flight")]
    ExitInProgress,

    /// The operating system refused to deliver a termination signal.
    #[error("{signal} refused: {reason}")]
    SignalRefused {
        /// Name of the refused signal.
        signal: &'static str,
        /// Kernel's reason for the refusal.
        reason: &'static str,
    },
}

impl SpawnError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SpawnError::SpawnFailed { .. } => "spawn_failed",
            SpawnError::ShortWrite { .. } => "short_write",
            SpawnError::AlreadyFinished => "already_finished",
            SpawnError::ExitInProgress => "exit_in_progress",
            SpawnError::SignalRefused { .. } => "signal_refused",
        }
    }
}
