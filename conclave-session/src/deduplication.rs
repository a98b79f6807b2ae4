//! Observer-side dedup of at-least-once progress delivery.

use std::collections::HashSet;

use conclave_core::models::ProgressEvent;

/// Remembers which (session, task, status) triples an observer has shown.
#[derive(Debug, Default)]
pub struct ProgressDeduplicator {
    seen: HashSet<(String, Option<String>, &'static str)>,
}

impl ProgressDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time an event's key is observed.
    pub fn observe(&mut self, event: &ProgressEvent) -> bool {
        self.seen.insert(event.dedup_key())
    }

    /// Keep only events not seen before, preserving order.
    pub fn filter<I>(&mut self, events: I) -> Vec<ProgressEvent>
    where
        I: IntoIterator<Item = ProgressEvent>,
    {
        events.into_iter().filter(|e| self.observe(e)).collect()
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}
