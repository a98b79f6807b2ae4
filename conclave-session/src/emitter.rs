//! Per-session broadcast of progress events.

use tokio::sync::broadcast;

use conclave_core::models::ProgressEvent;

/// Broadcast sender for one session.
///
/// Never blocks: slow receivers lag instead of holding up the writer.
pub struct ProgressEmitter {
    tx: broadcast::Sender<ProgressEvent>,
}

impl ProgressEmitter {
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish to current subscribers. Returns how many received it.
    pub fn emit(&self, event: ProgressEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
