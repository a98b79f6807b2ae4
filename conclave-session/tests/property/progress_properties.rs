use chrono::Utc;
use conclave_core::models::{ProgressEvent, StatusChange, TaskStatus};
use conclave_session::ProgressDeduplicator;
use proptest::prelude::*;

fn event(task: u8, status: u8, seq: u64) -> ProgressEvent {
    let status = match status % 4 {
        0 => TaskStatus::Dispatched,
        1 => TaskStatus::Retrying,
        2 => TaskStatus::Succeeded,
        _ => TaskStatus::Failed,
    };
    ProgressEvent {
        session_id: "s".into(),
        task_id: Some(format!("t{task}")),
        agent_name: None,
        change: StatusChange::Task(status),
        attempt: 1,
        seq,
        timestamp: Utc::now(),
    }
}

proptest! {
    #[test]
    fn redelivery_never_changes_what_is_shown(
        raw in prop::collection::vec((0u8..4, 0u8..4), 1..40),
        repeats in 1usize..4,
    ) {
        let events: Vec<ProgressEvent> = raw
            .iter()
            .enumerate()
            .map(|(i, (t, s))| event(*t, *s, i as u64))
            .collect();

        let mut once = ProgressDeduplicator::new();
        let shown_once = once.filter(events.clone());

        let mut many = ProgressDeduplicator::new();
        let redelivered: Vec<ProgressEvent> = (0..repeats).flat_map(|_| events.clone()).collect();
        let shown_many = many.filter(redelivered);

        prop_assert_eq!(shown_once.len(), shown_many.len());
        prop_assert_eq!(once.seen_count(), many.seen_count());
    }
}
