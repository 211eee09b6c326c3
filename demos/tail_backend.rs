//! Runs a helper script under the supervisor and prints its events.
//!
//! ```text
//! cargo run --example tail_backend -- ./tests/fixtures/backend-lines.sh
//! ```

use spawnvisor::{Config, EventKind, Supervisor};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("usage: tail_backend <helper> [args...]");
        return;
    }

    let sup = Supervisor::new(Config::default(), Vec::new());
    let mut events = sup.subscribe();

    if let Err(e) = sup.run(&args, None).await {
        eprintln!("spawn failed: {e}");
        return;
    }

    while let Ok(ev) = events.recv().await {
        match ev.kind {
            EventKind::Stdout => println!("line: {}", ev.line.unwrap_or_default()),
            EventKind::Exit => {
                let label = ev.class.map_or("unknown", |c| c.as_label());
                println!("exit: {label}");
                break;
            }
        }
    }
}
