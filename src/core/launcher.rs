//! # Launching helpers with piped stdio.
//!
//! The executable is resolved on the search path. Standard input and output
//! are piped to the supervisor; standard error stays with the daemon.
//! The child is not auto-reaped here, so the drain loop can observe its
//! exit status.

use std::process::Stdio;

use nix::errno::Errno;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::core::child::ChildHandle;
use crate::error::SpawnError;

/// Lowest and highest scheduling niceness accepted for spawned helpers.
const NICE_MIN: i32 = -20;
const NICE_MAX: i32 = 19;

/// Spawns `argv` with stdin and stdout piped.
///
/// `envp` of `None` inherits the daemon environment; `Some` replaces it
/// with exactly the given `KEY=VALUE` entries, nothing injected.
pub(crate) fn spawn_helper(
    argv: &[String],
    envp: Option<&[String]>,
) -> Result<ChildHandle, SpawnError> {
    let mut cmd = Command::new(&argv[0]);
    cmd.args(&argv[1..]);
    if let Some(envp) = envp {
        cmd.env_clear();
        for entry in envp {
            match entry.split_once('=') {
                Some((key, value)) => {
                    cmd.env(key, value);
                }
                None => warn!(entry = %entry, "skipping malformed environment entry"),
            }
        }
    }
    cmd.stdin(Stdio::piped()).stdout(Stdio::piped());

    let child = cmd.spawn().map_err(|source| SpawnError::SpawnFailed {
        argv0: argv[0].clone(),
        source,
    })?;
    let handle = ChildHandle::new(child).map_err(|source| SpawnError::SpawnFailed {
        argv0: argv[0].clone(),
        source,
    })?;
    debug!(pid = handle.pid, argv0 = %argv[0], "helper spawned");
    Ok(handle)
}

/// Clamps a configured nice value into the range the scheduler accepts.
pub(crate) fn clamp_nice(value: i32) -> i32 {
    value.clamp(NICE_MIN, NICE_MAX)
}

/// Applies `nice` to `pid`; failure is logged and otherwise ignored.
///
/// The adjustment can race a helper that exits immediately.
pub(crate) fn renice(pid: i32, nice: i32) {
    let nice = clamp_nice(nice);
    if nice == 0 {
        return;
    }
    debug!(pid, nice, "renicing helper");
    let rc = unsafe {
        nix::libc::setpriority(nix::libc::PRIO_PROCESS as _, pid as nix::libc::id_t, nice)
    };
    if rc != 0 {
        warn!(pid, nice, errno = ?Errno::last(), "failed to renice helper");
    }
}
