//! One-shot helper scenarios: spawn failures, line delivery, environment
//! replacement, and the two-stage kill.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use spawnvisor::{Config, Event, EventKind, ExitClass, SpawnError, Subscribe, Supervisor};
use tokio::sync::Mutex;
use tokio::time::sleep;

use common::{argv, collect_until_exit, fixture};

#[tokio::test]
async fn missing_helper_fails_without_events() {
    let sup = Supervisor::new(Config::default(), Vec::new());
    let mut rx = sup.subscribe();

    let err = sup
        .run(&argv(&["spawnvisor-missing-helper.sh"]), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SpawnError::SpawnFailed { .. }));

    sleep(Duration::from_millis(300)).await;
    assert!(rx.try_recv().is_err());
    assert!(!sup.is_running().await);
}

#[tokio::test]
async fn one_shot_helper_reports_every_line_then_success() {
    let sup = Supervisor::new(Config::default(), Vec::new());
    let mut rx = sup.subscribe();

    sup.run(&argv(&[&fixture("backend-lines.sh")]), None)
        .await
        .unwrap();

    let (lines, class) = collect_until_exit(&mut rx).await;
    assert_eq!(class, ExitClass::Success);
    assert_eq!(lines.len(), 15);
    assert_eq!(lines[0], "line-1");
    assert_eq!(lines[14], "line-15");
    assert!(!sup.is_running().await);
}

#[tokio::test]
async fn replacement_environment_reaches_the_helper() {
    let sup = Supervisor::new(Config::default(), Vec::new());
    let mut rx = sup.subscribe();

    let envp = argv(&[
        "http_proxy=username:password@server:port",
        "ftp_proxy=username:password@server:port",
    ]);
    sup.run(&argv(&[&fixture("backend-proxy.sh")]), Some(&envp))
        .await
        .unwrap();

    let (lines, class) = collect_until_exit(&mut rx).await;
    assert_eq!(class, ExitClass::Success);
    assert!(lines.contains(&"http_proxy=username:password@server:port".to_string()));
    assert!(lines.contains(&"ftp_proxy=username:password@server:port".to_string()));
}

#[tokio::test]
async fn helper_ignoring_sigquit_is_forcibly_killed() {
    let sup = Supervisor::new(Config::default(), Vec::new());
    let mut rx = sup.subscribe();

    sup.run(&argv(&[&fixture("backend-hang.sh")]), None)
        .await
        .unwrap();

    sleep(Duration::from_secs(1)).await;
    sup.kill().await.unwrap();

    let started = Instant::now();
    let (_lines, class) = collect_until_exit(&mut rx).await;
    assert_eq!(class, ExitClass::SigKill);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(!sup.is_running().await);
}

#[tokio::test]
async fn helper_handling_sigquit_exits_politely() {
    let sup = Supervisor::new(Config::default(), Vec::new());
    let mut rx = sup.subscribe();

    sup.run(&argv(&[&fixture("backend-sigquit.sh")]), None)
        .await
        .unwrap();

    sleep(Duration::from_secs(1)).await;
    sup.kill().await.unwrap();

    let (_lines, class) = collect_until_exit(&mut rx).await;
    assert_eq!(class, ExitClass::SigQuit);
}

#[tokio::test]
async fn kill_after_the_reap_is_refused() {
    let sup = Supervisor::new(Config::default(), Vec::new());
    let mut rx = sup.subscribe();

    sup.run(&argv(&[&fixture("backend-lines.sh")]), None)
        .await
        .unwrap();
    let (_lines, class) = collect_until_exit(&mut rx).await;
    assert_eq!(class, ExitClass::Success);

    let err = sup.kill().await.unwrap_err();
    assert!(matches!(err, SpawnError::AlreadyFinished));
}

#[tokio::test]
async fn blank_lines_are_delivered_as_events() {
    let sup = Supervisor::new(Config::default(), Vec::new());
    let mut rx = sup.subscribe();

    sup.run(&argv(&[&fixture("backend-blanks.sh")]), None)
        .await
        .unwrap();

    // one event per newline-terminated line, the blank ones included
    let (lines, class) = collect_until_exit(&mut rx).await;
    assert_eq!(class, ExitClass::Success);
    assert_eq!(lines, vec!["alpha", "", "beta", "", "gamma"]);
}

#[tokio::test]
async fn bulk_output_is_framed_line_by_line() {
    let sup = Supervisor::new(Config::default(), Vec::new());
    let mut rx = sup.subscribe();

    sup.run(&argv(&[&fixture("backend-flood.sh")]), None)
        .await
        .unwrap();

    let (lines, class) = collect_until_exit(&mut rx).await;
    assert_eq!(class, ExitClass::Success);
    assert_eq!(lines.len(), 300);
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(line, &format!("flood-{}", i + 1));
    }
}

struct Recorder {
    lines: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        if event.kind == EventKind::Stdout {
            if let Some(line) = &event.line {
                self.lines.lock().await.push(line.clone());
            }
        }
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

#[tokio::test]
async fn subscribers_receive_the_line_events() {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::new(Recorder {
        lines: Arc::clone(&lines),
    });

    let sup = Supervisor::new(Config::default(), vec![recorder]);
    let mut rx = sup.subscribe();

    sup.run(&argv(&[&fixture("backend-lines.sh")]), None)
        .await
        .unwrap();
    let (_lines, class) = collect_until_exit(&mut rx).await;
    assert_eq!(class, ExitClass::Success);

    // the fan-out runs on its own workers; give it a moment to settle
    sleep(Duration::from_millis(300)).await;
    assert_eq!(lines.lock().await.len(), 15);
}
