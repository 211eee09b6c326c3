//! # Events emitted for a supervised helper.
//!
//! A helper produces exactly two kinds of event:
//! - [`EventKind::Stdout`]: one complete output line, newline stripped.
//! - [`EventKind::Exit`]: the terminal event, carrying the [`ExitClass`]
//!   that explains why the child went away. Emitted at most once per child,
//!   always after every line event derived from that child's output.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically, so events can be ordered correctly even when consumed
//! through buffered channels.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of supervisor events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// The child produced one complete line on its standard output.
    Stdout,
    /// The child was reaped; no further events follow for this child.
    Exit,
}

/// Why a reaped child went away.
///
/// Resolved exactly once per child, when the drain loop observes the
/// termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitClass {
    /// No classification yet; never delivered for a child that actually ran.
    Unknown,
    /// The child exited on its own with a zero status.
    Success,
    /// The child exited on its own with a non-zero status.
    Failed,
    /// The child was asked to quit politely and went away in time.
    SigQuit,
    /// The polite request was not honored and the child was forcibly killed.
    SigKill,
    /// A dispatcher acknowledged the in-band `exit` request.
    DispatcherExit,
    /// A dispatcher was retired so a different one could be launched.
    DispatcherChanged,
}

impl ExitClass {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ExitClass::Unknown => "unknown",
            ExitClass::Success => "success",
            ExitClass::Failed => "failed",
            ExitClass::SigQuit => "sigquit",
            ExitClass::SigKill => "sigkill",
            ExitClass::DispatcherExit => "dispatcher_exit",
            ExitClass::DispatcherChanged => "dispatcher_changed",
        }
    }
}

/// Supervisor event with optional payload.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp (may go backwards, use for logging only).
    pub at: SystemTime,
    /// The kind of event.
    pub kind: EventKind,
    /// The output line, for [`EventKind::Stdout`] events.
    pub line: Option<String>,
    /// The exit classification, for [`EventKind::Exit`] events.
    pub class: Option<ExitClass>,
}

impl Event {
    /// Creates a new event of the given kind with the next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            line: None,
            class: None,
        }
    }

    /// Attaches an output line.
    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.line = Some(line.into());
        self
    }

    /// Attaches an exit classification.
    pub fn with_class(mut self, class: ExitClass) -> Self {
        self.class = Some(class);
        self
    }
}
