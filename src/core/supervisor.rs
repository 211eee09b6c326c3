//! # Supervisor: one helper process, launched, reused, or retired.
//!
//! The [`Supervisor`] owns at most one child at a time and dispatches
//! backend work to it:
//!
//! - [`run`](Supervisor::run) launches a helper, or feeds the request to a
//!   live dispatcher when the executable and environment match.
//! - [`send_exit`](Supervisor::send_exit) asks a dispatcher to shut down
//!   over its stdin and blocks until the child is reaped.
//! - [`kill`](Supervisor::kill) escalates: SIGQUIT now, SIGKILL 500 ms
//!   later if the child is still around.
//!
//! ## Architecture
//! ```text
//! run(argv, envp) ──► live child? ──► same argv0 + envp? ──► one request line
//!                        │                  │ no
//!                        │ no               └──► rotate: "exit", wait, relaunch
//!                        └──► launch ──► drain loop (50 ms)
//!                                             ├──► Stdout events
//!                                             └──► reap ──► Exit event
//! ```
//!
//! ## Rules
//! - Line events for a child always precede its single exit event.
//! - A nested cooperative exit is refused, not queued.
//! - The forced-kill timer is armed only when the polite signal was
//!   accepted, and is cancelled by the reap.
//! - Dropping the supervisor with a live child sends the polite signal; the
//!   forced follow-up happens only if a runtime is still driving us.

use std::sync::Arc;
use std::time::Duration;

use nix::sys::signal::Signal;
use tokio::sync::{broadcast, Mutex, MutexGuard};
use tokio::time;
use tracing::{debug, warn};

use crate::config::Config;
use crate::core::child;
use crate::core::launcher;
use crate::core::poller;
use crate::core::reuse::{reuse_decision, ReuseDecision};
use crate::core::state::{Inner, ShutdownReason};
use crate::error::SpawnError;
use crate::events::{Bus, Event, ExitClass};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Grace between the polite signal and the forced kill.
pub(crate) const KILL_DELAY: Duration = Duration::from_millis(500);

/// Supervises one helper process at a time.
///
/// Must be created inside a tokio runtime; the drain loop, the kill timer,
/// and the subscriber workers all run on it.
pub struct Supervisor {
    cfg: Config,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    inner: Arc<Mutex<Inner>>,
}

impl Supervisor {
    /// Creates a supervisor with the given config and subscribers (maybe
    /// empty).
    pub fn new(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let bus = Bus::new(cfg.bus_capacity);
        let subs = Arc::new(SubscriberSet::new(subscribers));
        let sup = Self {
            cfg,
            bus,
            subs,
            inner: Arc::new(Mutex::new(Inner::new())),
        };
        sup.subscriber_listener();
        sup
    }

    /// Returns a fresh receiver for the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// True while a child is live (its stdin pipe is open).
    pub async fn is_running(&self) -> bool {
        self.inner.lock().await.child.is_some()
    }

    /// Launches a helper, or reuses the live dispatcher.
    ///
    /// `argv[0]` is the executable, resolved on the search path. `envp` of
    /// `None` inherits the daemon environment; `Some` replaces it with
    /// exactly the given `KEY=VALUE` entries.
    ///
    /// A live dispatcher is reused when `argv[0]` and the whole `envp`
    /// match the descriptor it was started with; the request is then
    /// `argv[1..]` joined with tabs, written as one line (tabs, not spaces,
    /// so request tokens may contain spaces). Any mismatch, and any failed
    /// write, retires the old dispatcher before the fresh launch.
    ///
    /// On a spawn failure nothing is recorded and no event is emitted.
    pub async fn run(&self, argv: &[String], envp: Option<&[String]>) -> Result<(), SpawnError> {
        let Some(argv0) = argv.first() else {
            warn!("refusing to run an empty argv");
            return Err(SpawnError::SpawnFailed {
                argv0: String::new(),
                source: std::io::Error::other("empty argv"),
            });
        };
        debug!(?argv, ?envp, "run requested");

        let mut inner = self.inner.lock().await;
        if inner.child.is_some() {
            let decision = reuse_decision(
                argv0,
                envp,
                inner.last_argv0.as_deref(),
                inner.last_envp.as_deref(),
            );
            if decision == ReuseDecision::Reuse {
                let request = argv[1..].join("\t");
                debug!("reusing the live dispatcher");
                match inner.send_line(&request) {
                    Ok(()) => return Ok(()),
                    Err(e) => {
                        warn!(error = %e, "dispatcher not accepting requests, rotating")
                    }
                }
            } else {
                debug!("descriptor changed, rotating the dispatcher");
            }
            self.rotate(inner).await;
        } else {
            drop(inner);
        }

        let mut inner = self.inner.lock().await;
        self.launch(&mut inner, argv, envp)
    }

    /// Asks the dispatcher to shut down over its stdin.
    ///
    /// Writes the literal line `exit` and blocks until the drain loop reaps
    /// the child; the terminal event then carries
    /// [`ExitClass::DispatcherExit`]. A call while another cooperative exit
    /// is in flight fails with [`SpawnError::ExitInProgress`] and does not
    /// queue a second request.
    ///
    /// ### Notes
    /// There is no intrinsic timeout: a dispatcher that ignores the request
    /// blocks the caller until it dies by other means. Bound the wait with
    /// [`tokio::time::timeout`] if needed; [`kill`](Supervisor::kill) is
    /// the escape hatch.
    pub async fn send_exit(&self) -> Result<(), SpawnError> {
        let mut inner = self.inner.lock().await;
        if inner.shutdown != ShutdownReason::Idle {
            warn!("exit already in flight, ignoring");
            return Err(SpawnError::ExitInProgress);
        }
        inner.shutdown = ShutdownReason::CooperativeExit;
        if let Err(e) = inner.send_line("exit") {
            inner.shutdown = ShutdownReason::Idle;
            return Err(e);
        }

        self.wait_for_reap(inner).await;
        debug!("dispatcher exited");
        Ok(())
    }

    /// Terminates the child: SIGQUIT now, SIGKILL after 500 ms.
    ///
    /// The polite signal tentatively classifies the exit as
    /// [`ExitClass::SigQuit`]; if the child is still live when the timer
    /// fires, the classification becomes [`ExitClass::SigKill`] and the
    /// unignorable signal is sent. Fails with
    /// [`SpawnError::AlreadyFinished`] when the child has been reaped, and
    /// with [`SpawnError::SignalRefused`] when the kernel rejects the
    /// signal, in which case no forced kill is scheduled.
    pub async fn kill(&self) -> Result<(), SpawnError> {
        let mut inner = self.inner.lock().await;
        self.kill_locked(&mut inner)
    }

    /// Spawns the bus-to-subscribers forwarder.
    fn subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
        });
    }

    /// Starts a fresh child and its drain loop.
    fn launch(
        &self,
        inner: &mut Inner,
        argv: &[String],
        envp: Option<&[String]>,
    ) -> Result<(), SpawnError> {
        debug!(argv0 = %argv[0], "launching helper");
        let handle = launcher::spawn_helper(argv, envp)?;
        launcher::renice(handle.pid, self.cfg.spawn_nice_value);

        inner.last_argv0 = Some(argv[0].clone());
        inner.last_envp = envp.map(|e| e.to_vec());
        inner.finished = false;
        inner.class = ExitClass::Unknown;
        inner.child = Some(handle);

        if let Some(stale) = inner.poll_task.take() {
            warn!("drain loop already scheduled, replacing it");
            stale.abort();
        }
        inner.poll_task = Some(poller::spawn_poll_loop(
            Arc::clone(&self.inner),
            self.bus.clone(),
        ));
        Ok(())
    }

    /// Retires the live dispatcher and waits for the drain loop to reap it.
    async fn rotate(&self, mut inner: MutexGuard<'_, Inner>) {
        if inner.shutdown == ShutdownReason::Idle {
            inner.shutdown = ShutdownReason::DispatcherRotation;
            debug!("asking the old dispatcher to exit");
            if inner.send_line("exit").is_err() {
                // deaf or dead pipe; force the old instance out instead
                warn!("dispatcher not accepting the exit request, killing it");
                if let Err(e) = self.kill_locked(&mut inner) {
                    debug!(error = %e, "kill unavailable, relying on the reap");
                }
            }
        } else {
            debug!("shutdown already in flight, waiting for the reap");
        }
        self.wait_for_reap(inner).await;
    }

    /// Blocks the caller until the next reap, then clears the shutdown
    /// reason.
    async fn wait_for_reap(&self, mut inner: MutexGuard<'_, Inner>) {
        let mut rx = inner.reaped.subscribe();
        let seen = *rx.borrow();
        inner.waiters += 1;
        drop(inner);

        let _ = rx.wait_for(|generation| *generation > seen).await;

        let mut inner = self.inner.lock().await;
        inner.waiters = inner.waiters.saturating_sub(1);
        inner.shutdown = ShutdownReason::Idle;
    }

    /// The polite-then-forced escalation, with the state lock held.
    fn kill_locked(&self, inner: &mut Inner) -> Result<(), SpawnError> {
        let Some(pid) = inner.child.as_ref().map(|c| c.pid) else {
            warn!("child already finished, ignoring kill");
            return Err(SpawnError::AlreadyFinished);
        };
        if inner.class == ExitClass::Unknown {
            inner.class = ExitClass::SigQuit;
        }
        debug!(pid, "sending SIGQUIT");
        child::deliver_signal(pid, Signal::SIGQUIT)?;

        // the helper might not handle SIGQUIT; follow up with SIGKILL
        let shared = Arc::clone(&self.inner);
        inner.kill_task = Some(tokio::spawn(async move {
            time::sleep(KILL_DELAY).await;
            let mut inner = shared.lock().await;
            if inner.finished {
                debug!("child exited before the forced kill");
                return;
            }
            // the polite attempt demonstrably failed
            inner.class = ExitClass::SigKill;
            let Some(pid) = inner.child.as_ref().map(|c| c.pid) else {
                return;
            };
            debug!(pid, "sending SIGKILL");
            if let Err(e) = child::deliver_signal(pid, Signal::SIGKILL) {
                warn!(error = %e, "forced kill refused");
            }
            inner.kill_task = None;
        }));
        Ok(())
    }
}

impl Drop for Supervisor {
    /// Cancels the timer tasks and retires a still-live child.
    fn drop(&mut self) {
        let Ok(mut inner) = self.inner.try_lock() else {
            return;
        };
        if let Some(task) = inner.poll_task.take() {
            task.abort();
        }
        if let Some(task) = inner.kill_task.take() {
            task.abort();
        }
        if let Some(handle) = inner.child.take() {
            warn!(pid = handle.pid, "supervisor dropped with a live child");
            let pid = handle.pid;
            let _ = handle.signal(Signal::SIGQUIT);
            // the forced follow-up needs a runtime that keeps ticking
            if let Ok(rt) = tokio::runtime::Handle::try_current() {
                rt.spawn(async move {
                    time::sleep(KILL_DELAY).await;
                    let _ = child::deliver_signal(pid, Signal::SIGKILL);
                });
            }
        }
    }
}
