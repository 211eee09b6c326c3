//! Shared helpers for the end-to-end scenarios.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::time::Duration;

use spawnvisor::{Event, EventKind, ExitClass};
use tokio::sync::broadcast;
use tokio::time::timeout;

/// Absolute path to a fixture script, made executable.
pub fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("fixture script exists");
    path
}

pub fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Receives the next event, bounded so a broken scenario cannot hang the
/// suite.
pub async fn next_event(rx: &mut broadcast::Receiver<Event>) -> Event {
    timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event bus closed")
}

/// Collects stdout lines until the exit event arrives.
pub async fn collect_until_exit(rx: &mut broadcast::Receiver<Event>) -> (Vec<String>, ExitClass) {
    let mut lines = Vec::new();
    loop {
        let ev = next_event(rx).await;
        match ev.kind {
            EventKind::Stdout => lines.push(ev.line.expect("stdout event carries a line")),
            EventKind::Exit => return (lines, ev.class.expect("exit event carries a class")),
        }
    }
}

/// Drains whatever stdout lines are already buffered on the receiver.
pub fn drain_lines(rx: &mut broadcast::Receiver<Event>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        if ev.kind == EventKind::Stdout {
            lines.push(ev.line.expect("stdout event carries a line"));
        }
    }
    lines
}
