use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::Subscribe;

/// Console subscriber that prints line and exit events.
///
/// Enabled via the `logging` feature. Useful for demos and debugging.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, event: &Event) {
        match event.kind {
            EventKind::Stdout => {
                if let Some(line) = &event.line {
                    println!("[stdout] {line}");
                }
            }
            EventKind::Exit => {
                let label = event.class.map_or("unknown", |c| c.as_label());
                println!("[exit] {label}");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
