//! # Supervisor configuration.
//!
//! [`Config`] carries the settings the embedding daemon resolves on behalf of
//! the supervisor: the scheduling niceness applied to spawned helpers (the
//! daemon's `BackendSpawnNiceValue` setting) and the event bus capacity.
//!
//! # Example
//! ```
//! use spawnvisor::Config;
//!
//! let mut cfg = Config::default();
//! cfg.spawn_nice_value = 5;
//!
//! assert_eq!(cfg.bus_capacity, 1024);
//! ```

/// Settings for a [`Supervisor`](crate::Supervisor) instance.
#[derive(Clone, Debug)]
pub struct Config {
    /// Nice value applied to spawned helpers.
    ///
    /// Clamped to `[-20, 19]` before use; `0` leaves the child's scheduling
    /// priority untouched.
    pub spawn_nice_value: i32,
    /// Capacity of the event bus channel.
    pub bus_capacity: usize,
}

impl Default for Config {
    /// Provides a default configuration:
    /// - `spawn_nice_value = 0` (no adjustment)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            spawn_nice_value: 0,
            bus_capacity: 1024,
        }
    }
}
