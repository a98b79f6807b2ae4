//! Session State Store: atomic transitions, read-your-writes, ordered
//! broadcast, replay for late subscribers, archival and expiry.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use conclave_core::config::SessionConfig;
use conclave_core::models::*;
use conclave_core::traits::ISessionStateStore;
use conclave_session::{spawn_expiry_sweeper, InMemorySessionStore, ProgressDeduplicator, ProgressSummary};
use tokio_util::sync::CancellationToken;

fn new_session(agents: &[&str]) -> (Session, Vec<AgentTask>) {
    let session = Session::new(
        InputDescriptor::new("lib.rs", "fn main() {}"),
        ExecutionStrategy::Parallel,
    );
    let tasks = agents
        .iter()
        .map(|a| AgentTask::new(&session.id, a, "default"))
        .collect();
    (session, tasks)
}

fn store() -> InMemorySessionStore {
    InMemorySessionStore::new(&SessionConfig::default())
}

// ── Transitions ───────────────────────────────────────────────────────────

#[test]
fn create_registers_tasks_in_order() {
    let store = store();
    let (session, tasks) = new_session(&["a", "b"]);
    let ids: Vec<String> = tasks.iter().map(|t| t.id.clone()).collect();
    store.create_session(session.clone(), tasks).unwrap();

    let snap = store.get_snapshot(&session.id).unwrap();
    assert_eq!(snap.session.status, SessionStatus::Created);
    assert_eq!(snap.session.task_ids, ids);
    assert_eq!(snap.tasks.len(), 2);
    assert!(store.create_session(session, vec![]).is_err());
}

#[test]
fn writes_are_visible_to_the_next_read() {
    let store = store();
    let (session, tasks) = new_session(&["a"]);
    let task_id = tasks[0].id.clone();
    store.create_session(session.clone(), tasks).unwrap();

    store.set_session_status(&session.id, SessionStatus::Running).unwrap();
    store.set_status(&session.id, &task_id, TaskStatus::Dispatched).unwrap();
    let snap = store.get_snapshot(&session.id).unwrap();
    assert_eq!(snap.session.status, SessionStatus::Running);
    assert_eq!(snap.task(&task_id).unwrap().status, TaskStatus::Dispatched);
    assert_eq!(snap.task(&task_id).unwrap().attempt_count, 1);
}

#[test]
fn attempt_count_increments_per_dispatch() {
    let store = store();
    let (session, tasks) = new_session(&["a"]);
    let task_id = tasks[0].id.clone();
    store.create_session(session.clone(), tasks).unwrap();

    for status in [
        TaskStatus::Dispatched,
        TaskStatus::Retrying,
        TaskStatus::Dispatched,
        TaskStatus::Retrying,
        TaskStatus::Dispatched,
        TaskStatus::Succeeded,
    ] {
        store.set_status(&session.id, &task_id, status).unwrap();
    }
    let snap = store.get_snapshot(&session.id).unwrap();
    assert_eq!(snap.tasks[0].attempt_count, 3);
}

#[test]
fn invalid_transitions_are_rejected() {
    let store = store();
    let (session, tasks) = new_session(&["a"]);
    let task_id = tasks[0].id.clone();
    store.create_session(session.clone(), tasks).unwrap();

    assert!(store.set_status(&session.id, &task_id, TaskStatus::Succeeded).is_err());
    assert!(store
        .set_session_status(&session.id, SessionStatus::Completed)
        .is_err());
    assert!(store.set_status(&session.id, "missing", TaskStatus::Dispatched).is_err());
    assert!(store.set_status("missing", &task_id, TaskStatus::Dispatched).is_err());

    // A rejected write leaves state unchanged.
    let snap = store.get_snapshot(&session.id).unwrap();
    assert_eq!(snap.tasks[0].status, TaskStatus::Queued);
}

#[test]
fn annotations_do_not_publish() {
    let store = store();
    let (session, tasks) = new_session(&["a"]);
    let task_id = tasks[0].id.clone();
    store.create_session(session.clone(), tasks).unwrap();

    store
        .annotate_task(
            &session.id,
            &task_id,
            TaskAnnotation::Result(ResultRef {
                finding_ids: vec!["m1".into()],
                raw_confidence: Some(0.9),
            }),
        )
        .unwrap();
    store
        .annotate_task(&session.id, &task_id, TaskAnnotation::Error("boom".into()))
        .unwrap();
    let snap = store.get_snapshot(&session.id).unwrap();
    assert_eq!(snap.tasks[0].result_ref.as_ref().unwrap().finding_ids, vec!["m1"]);
    assert_eq!(snap.tasks[0].last_error.as_deref(), Some("boom"));
}

// ── Broadcast ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn subscriber_sees_replay_then_ordered_live_events() {
    let store = store();
    let (session, tasks) = new_session(&["a"]);
    let task_id = tasks[0].id.clone();
    store.create_session(session.clone(), tasks).unwrap();

    let sub = store.subscribe(&session.id).unwrap();

    store.set_session_status(&session.id, SessionStatus::Running).unwrap();
    store.set_status(&session.id, &task_id, TaskStatus::Dispatched).unwrap();
    store.set_status(&session.id, &task_id, TaskStatus::Succeeded).unwrap();
    store.set_session_status(&session.id, SessionStatus::Completed).unwrap();

    let events = sub.collect().await;
    // Replay: queued task + created session. Live: four transitions.
    assert_eq!(events.len(), 6);
    assert_eq!(events[0].change, StatusChange::Task(TaskStatus::Queued));
    assert_eq!(events[1].change, StatusChange::Session(SessionStatus::Created));

    let live = &events[2..];
    let seqs: Vec<u64> = live.iter().map(|e| e.seq).collect();
    assert!(seqs.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(live[1].change, StatusChange::Task(TaskStatus::Dispatched));
    assert_eq!(live[2].change, StatusChange::Task(TaskStatus::Succeeded));
    assert!(live[3].is_terminal());
}

#[tokio::test]
async fn late_subscriber_gets_terminal_state_and_ends() {
    let store = store();
    let (session, tasks) = new_session(&["a"]);
    let task_id = tasks[0].id.clone();
    store.create_session(session.clone(), tasks).unwrap();
    store.set_session_status(&session.id, SessionStatus::Running).unwrap();
    store.set_status(&session.id, &task_id, TaskStatus::Skipped).unwrap();
    store.set_session_status(&session.id, SessionStatus::Cancelled).unwrap();

    let events = store.subscribe(&session.id).unwrap().collect().await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].change, StatusChange::Task(TaskStatus::Skipped));
    assert_eq!(events[1].change, StatusChange::Session(SessionStatus::Cancelled));
}

#[tokio::test]
async fn subscription_ends_after_terminal_event() {
    let store = store();
    let (session, tasks) = new_session(&[]);
    store.create_session(session.clone(), tasks).unwrap();
    let mut sub = store.subscribe(&session.id).unwrap();
    // Drain replay.
    assert!(sub.next().await.is_some());

    store.set_session_status(&session.id, SessionStatus::Failed).unwrap();
    assert!(sub.next().await.unwrap().is_terminal());
    assert!(sub.next().await.is_none());
}

#[test]
fn dedup_filters_redelivered_events() {
    let store = store();
    let (session, tasks) = new_session(&["a"]);
    let task_id = tasks[0].id.clone();
    store.create_session(session.clone(), tasks).unwrap();
    let event = store.set_status(&session.id, &task_id, TaskStatus::Dispatched).unwrap();

    let mut dedup = ProgressDeduplicator::new();
    let shown = dedup.filter(vec![event.clone(), event.clone(), event]);
    assert_eq!(shown.len(), 1);
    assert_eq!(dedup.seen_count(), 1);
}

// ── Summary ───────────────────────────────────────────────────────────────

#[test]
fn summary_counts_statuses() {
    let store = store();
    let (session, tasks) = new_session(&["a", "b", "c", "d"]);
    let ids: Vec<String> = tasks.iter().map(|t| t.id.clone()).collect();
    store.create_session(session.clone(), tasks).unwrap();
    store.set_status(&session.id, &ids[0], TaskStatus::Dispatched).unwrap();
    store.set_status(&session.id, &ids[0], TaskStatus::Succeeded).unwrap();
    store.set_status(&session.id, &ids[1], TaskStatus::Dispatched).unwrap();
    store.set_status(&session.id, &ids[2], TaskStatus::Skipped).unwrap();

    let summary = ProgressSummary::from_snapshot(&store.get_snapshot(&session.id).unwrap());
    assert_eq!(summary.total, 4);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.in_flight, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.queued, 1);
    assert_eq!(summary.attempts, 2);
    assert_eq!(summary.completion, 0.5);
}

// ── Archival / expiry ─────────────────────────────────────────────────────

#[test]
fn archive_refuses_active_sessions() {
    let store = store();
    let (session, tasks) = new_session(&["a"]);
    store.create_session(session.clone(), tasks).unwrap();
    assert!(store.archive(&session.id).is_err());

    store.set_session_status(&session.id, SessionStatus::Cancelled).unwrap();
    store.archive(&session.id).unwrap();
    assert!(store.get_snapshot(&session.id).is_err());
    assert!(store.archive(&session.id).is_err());
}

#[test]
fn expiry_removes_only_terminal_sessions_past_ttl() {
    let store = InMemorySessionStore::new(&SessionConfig {
        ttl_secs: 60,
        ..Default::default()
    });
    let (done, done_tasks) = new_session(&[]);
    let (active, active_tasks) = new_session(&[]);
    store.create_session(done.clone(), done_tasks).unwrap();
    store.create_session(active.clone(), active_tasks).unwrap();
    store.set_session_status(&done.id, SessionStatus::Failed).unwrap();

    assert_eq!(store.expire_stale_at(Utc::now()), 0);
    let later = Utc::now() + chrono::Duration::seconds(120);
    assert_eq!(store.expire_stale_at(later), 1);
    assert!(store.get_snapshot(&done.id).is_err());
    assert!(store.get_snapshot(&active.id).is_ok());
    assert_eq!(store.session_ids(), vec![active.id.clone()]);
}

#[tokio::test(start_paused = true)]
async fn sweeper_purges_expired_sessions() {
    let store = Arc::new(InMemorySessionStore::new(&SessionConfig {
        ttl_secs: 0,
        ..Default::default()
    }));
    let (session, tasks) = new_session(&[]);
    store.create_session(session.clone(), tasks).unwrap();
    store.set_session_status(&session.id, SessionStatus::Cancelled).unwrap();

    let cancel = CancellationToken::new();
    let handle = spawn_expiry_sweeper(store.clone(), Duration::from_secs(5), cancel.clone());
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(store.session_count(), 0);

    cancel.cancel();
    handle.await.unwrap();
}

#[test]
fn concurrent_writers_on_distinct_tasks_lose_nothing() {
    let store = store();
    let agents: Vec<String> = (0..16).map(|i| format!("agent-{i}")).collect();
    let names: Vec<&str> = agents.iter().map(String::as_str).collect();
    let (session, tasks) = new_session(&names);
    let ids: Vec<String> = tasks.iter().map(|t| t.id.clone()).collect();
    store.create_session(session.clone(), tasks).unwrap();

    std::thread::scope(|scope| {
        for id in &ids {
            let store = store.clone();
            let session_id = session.id.clone();
            scope.spawn(move || {
                store.set_status(&session_id, id, TaskStatus::Dispatched).unwrap();
                store.set_status(&session_id, id, TaskStatus::Succeeded).unwrap();
            });
        }
    });

    let snap = store.get_snapshot(&session.id).unwrap();
    assert!(snap.tasks.iter().all(|t| t.status == TaskStatus::Succeeded));
}
