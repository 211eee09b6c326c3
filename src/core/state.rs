//! # Per-supervisor bookkeeping for the single live child.
//!
//! [`Inner`] is the one mutable record behind the supervisor: the child
//! handle, the output buffer, the two timer tasks, and the exit
//! classification. It persists across many children; the child-specific
//! fields are reset on launch and cleared on reap.
//!
//! ## Rules
//! - `finished` flips to `true` exactly once per child, at reap time.
//! - The exit class is resolved exactly once per child, by
//!   [`resolve_exit_class`], and is the value delivered in the terminal
//!   event.
//! - Waiters blocked on a cooperative exit are woken by bumping the reap
//!   generation; the terminal event is published afterwards, so every line
//!   event precedes it on the bus.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core::child::ChildHandle;
use crate::core::pump::LinePump;
use crate::error::SpawnError;
use crate::events::{Bus, Event, EventKind, ExitClass};

/// Why a cooperative shutdown is in flight.
///
/// One tagged value instead of two booleans, so "rotating without sending
/// exit" cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShutdownReason {
    /// No shutdown requested.
    Idle,
    /// An embedder asked the dispatcher to exit.
    CooperativeExit,
    /// The dispatcher is being retired so a different one can start.
    DispatcherRotation,
}

/// Mutable supervisor state, one per instance.
pub(crate) struct Inner {
    /// The live child, if any.
    pub(crate) child: Option<ChildHandle>,
    /// Output buffer and line framing.
    pub(crate) pump: LinePump,
    /// Drain/reap loop for the live child.
    pub(crate) poll_task: Option<JoinHandle<()>>,
    /// Pending forced-kill follow-up, if a polite kill is in flight.
    pub(crate) kill_task: Option<JoinHandle<()>>,
    /// True once the current child has been reaped.
    pub(crate) finished: bool,
    /// Exit classification for the current child.
    pub(crate) class: ExitClass,
    /// Cooperative shutdown in flight, if any.
    pub(crate) shutdown: ShutdownReason,
    /// Callers blocked until the child is reaped.
    pub(crate) waiters: u32,
    /// Executable identity of the most recently launched child.
    pub(crate) last_argv0: Option<String>,
    /// Environment of the most recently launched child.
    pub(crate) last_envp: Option<Vec<String>>,
    /// Reap generation; bumped once per reaped child.
    pub(crate) reaped: watch::Sender<u64>,
}

impl Inner {
    pub(crate) fn new() -> Self {
        let (reaped, _) = watch::channel(0u64);
        Self {
            child: None,
            pump: LinePump::new(),
            poll_task: None,
            kill_task: None,
            finished: false,
            class: ExitClass::Unknown,
            shutdown: ShutdownReason::Idle,
            waiters: 0,
            last_argv0: None,
            last_envp: None,
            reaped,
        }
    }

    /// Sends one request line to the live child.
    pub(crate) fn send_line(&mut self, command: &str) -> Result<(), SpawnError> {
        let Some(child) = self.child.as_mut() else {
            warn!(command, "child already finished, ignoring");
            return Err(SpawnError::AlreadyFinished);
        };
        debug!(command, "sending line to child stdin");
        child.send_line(command)
    }

    /// Drains readable output and publishes every whole line.
    pub(crate) fn pump_stdout(&mut self, bus: &Bus) {
        if let Some(child) = self.child.as_mut() {
            self.pump.drain(child.stdout_mut());
        }
        for line in self.pump.take_lines() {
            bus.publish(Event::now(EventKind::Stdout).with_line(line));
        }
    }

    /// Final bookkeeping once the child has been waited on.
    ///
    /// Publishes the terminal event last, after pending lines are flushed
    /// and the waiters are woken.
    pub(crate) fn reap(&mut self, success: bool, bus: &Bus) {
        self.pump_stdout(bus);
        if self.pump.residue_len() > 0 {
            debug!(
                bytes = self.pump.residue_len(),
                "discarding unterminated output"
            );
            self.pump.clear();
        }

        self.child = None;
        self.finished = true;
        self.poll_task = None;
        if let Some(kill) = self.kill_task.take() {
            kill.abort();
        }

        self.class = resolve_exit_class(self.class, self.waiters > 0, self.shutdown, success);
        self.reaped.send_modify(|generation| *generation += 1);

        debug!(class = self.class.as_label(), "emitting exit");
        bus.publish(Event::now(EventKind::Exit).with_class(self.class));
    }
}

/// Resolves the exit classification at reap time.
///
/// First matching rule wins:
/// 1. A signal verdict already recorded by the kill path is kept.
/// 2. A waiter blocked on a rotation means the dispatcher was changed.
/// 3. A waiter blocked on a cooperative exit means the dispatcher obeyed it.
/// 4. Otherwise the child's own exit status decides.
pub(crate) fn resolve_exit_class(
    current: ExitClass,
    has_waiter: bool,
    reason: ShutdownReason,
    success: bool,
) -> ExitClass {
    match current {
        ExitClass::SigQuit | ExitClass::SigKill => current,
        _ if has_waiter && reason == ShutdownReason::DispatcherRotation => {
            ExitClass::DispatcherChanged
        }
        _ if has_waiter && reason == ShutdownReason::CooperativeExit => ExitClass::DispatcherExit,
        ExitClass::Unknown if success => ExitClass::Success,
        ExitClass::Unknown => ExitClass::Failed,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_verdicts_are_kept() {
        assert_eq!(
            resolve_exit_class(ExitClass::SigQuit, false, ShutdownReason::Idle, true),
            ExitClass::SigQuit
        );
        assert_eq!(
            resolve_exit_class(
                ExitClass::SigKill,
                true,
                ShutdownReason::CooperativeExit,
                false
            ),
            ExitClass::SigKill
        );
    }

    #[test]
    fn a_waiting_rotation_wins_over_the_exit_status() {
        assert_eq!(
            resolve_exit_class(
                ExitClass::Unknown,
                true,
                ShutdownReason::DispatcherRotation,
                true
            ),
            ExitClass::DispatcherChanged
        );
    }

    #[test]
    fn a_waiting_cooperative_exit_is_reported() {
        assert_eq!(
            resolve_exit_class(
                ExitClass::Unknown,
                true,
                ShutdownReason::CooperativeExit,
                true
            ),
            ExitClass::DispatcherExit
        );
    }

    #[test]
    fn without_a_waiter_the_exit_status_decides() {
        assert_eq!(
            resolve_exit_class(
                ExitClass::Unknown,
                false,
                ShutdownReason::CooperativeExit,
                true
            ),
            ExitClass::Success
        );
        assert_eq!(
            resolve_exit_class(ExitClass::Unknown, false, ShutdownReason::Idle, false),
            ExitClass::Failed
        );
    }
}
