//! # Event subscriber trait.
//!
//! [`Subscribe`] is the extension point for plugging custom event handlers
//! into the supervisor: forwarding backend output over the daemon's wire
//! protocol, recording exit classifications, collecting metrics.
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (runs independently)
//! - **Bounded queue** (configurable via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics are caught and logged)
//!
//! ## Rules
//! - Slow subscribers only affect themselves (queue overflow drops events
//!   for that subscriber alone)
//! - Panics do not crash the supervisor or other subscribers
//! - Subscribers never block the drain loop

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for supervisor observability.
///
/// Receives events from the supervisor via a dedicated worker task with a
/// bounded queue.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// ### Context
    /// - Called from a dedicated worker task, in queue (FIFO) order
    /// - Panics are caught and logged; the supervisor continues
    ///
    /// ### Implementation notes
    /// - Use async I/O and handle errors internally
    /// - Slow processing only backs up this subscriber's queue
    async fn on_event(&self, event: &Event);

    /// Returns the subscriber name for logging.
    ///
    /// Keep it short and descriptive (e.g., "wire", "metrics").
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this subscriber.
    ///
    /// When the queue is full, new events are dropped for this subscriber
    /// only and a warning is logged. Defaults to 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
