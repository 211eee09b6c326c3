//! # spawnvisor
//!
//! **Spawnvisor** supervises the helper processes a package daemon uses to
//! dispatch work to out-of-process backend scripts.
//!
//! It owns one child at a time, streams the child's standard output as
//! discrete line events, and supports three execution modes: one-shot
//! invocation, reuse of a running dispatcher for a new request, and
//! graceful shutdown via an in-band `exit` command. Termination escalates
//! from a polite SIGQUIT to a forced SIGKILL, and every child's departure
//! is reported with a precise classification.
//!
//! ## Features
//!
//! | Area               | Description                                                        | Key types / traits           |
//! |--------------------|--------------------------------------------------------------------|------------------------------|
//! | **Supervision**    | Launch, reuse, or retire the single helper process.                | [`Supervisor`]               |
//! | **Events**         | Line and exit events with ordering guarantees.                     | [`Event`], [`EventKind`]     |
//! | **Classification** | Why the child went away.                                           | [`ExitClass`]                |
//! | **Subscribers**    | Hook into the event stream (wire forwarding, metrics, logging).    | [`Subscribe`], [`SubscriberSet`] |
//! | **Errors**         | Typed refusals for every operation.                                | [`SpawnError`]               |
//! | **Configuration**  | Spawn niceness and bus capacity.                                   | [`Config`]                   |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] subscriber
//!   _(demo/reference only)_.
//!
//! ```rust,no_run
//! use spawnvisor::{Config, EventKind, Supervisor};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sup = Supervisor::new(Config::default(), Vec::new());
//!     let mut events = sup.subscribe();
//!
//!     let argv = vec!["search-backend.sh".to_string(), "power manager".to_string()];
//!     sup.run(&argv, None).await?;
//!
//!     while let Ok(ev) = events.recv().await {
//!         match ev.kind {
//!             EventKind::Stdout => println!("{}", ev.line.unwrap_or_default()),
//!             EventKind::Exit => break,
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ---

mod config;
mod core;
mod error;
mod events;
mod subscribers;

// ---- Public re-exports ----

pub use config::Config;
pub use error::SpawnError;
pub use self::core::Supervisor;
pub use events::{Event, EventKind, ExitClass};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in console subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
