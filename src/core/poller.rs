//! # The drain/reap loop.
//!
//! One loop per child, spawned at launch and gone after the reap. Each tick:
//!
//! ```text
//! every 50 ms:
//!   ├─► pump stdout  ─► publish whole lines
//!   ├─► try_wait()
//!   │     ├─► still running  → wait for the next tick
//!   │     └─► exited         → final pump, close pipes, classify,
//!   │                          wake waiters, publish the exit event, stop
//!   └─► (a tick after the reap logs and stops)
//! ```
//!
//! The wait is non-blocking; nothing in this loop can stall the scheduler.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use crate::core::state::Inner;
use crate::events::Bus;

/// How often the child is drained and checked for termination.
pub(crate) const POLL_DELAY: Duration = Duration::from_millis(50);

/// Spawns the drain/reap loop for the currently registered child.
pub(crate) fn spawn_poll_loop(shared: Arc<Mutex<Inner>>, bus: Bus) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(POLL_DELAY);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks: u32 = 0;

        loop {
            ticker.tick().await;
            let mut inner = shared.lock().await;
            if inner.finished {
                warn!("child already reaped, ignoring tick");
                break;
            }

            inner.pump_stdout(&bus);

            let Some(child) = inner.child.as_mut() else {
                break;
            };
            // one tick in twenty to keep the log quiet
            if ticks % 20 == 0 {
                debug!(pid = child.pid, "polling child");
            }
            ticks = ticks.wrapping_add(1);

            let status = match child.try_wait() {
                Ok(None) => continue,
                Ok(Some(status)) => status,
                Err(e) => {
                    warn!(error = %e, "wait on child failed");
                    continue;
                }
            };

            inner.reap(status.success(), &bus);
            break;
        }
    })
}
