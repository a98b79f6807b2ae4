use conclave_core::errors::{ConclaveError, DispatchError, ErrorClass, StorageError};
use conclave_core::models::*;

#[test]
fn session_transitions_follow_lifecycle() {
    use SessionStatus::*;
    assert!(Created.can_transition_to(Running));
    assert!(Created.can_transition_to(Cancelled));
    assert!(Created.can_transition_to(Failed));
    assert!(Running.can_transition_to(PartiallyFailed));
    assert!(!Created.can_transition_to(Completed));
    assert!(!Completed.can_transition_to(Cancelled));
    assert!(!Cancelled.can_transition_to(Running));

    for terminal in [Completed, PartiallyFailed, Failed, Cancelled] {
        assert!(terminal.is_terminal());
    }
    assert!(!Running.is_terminal());
}

#[test]
fn task_transitions_follow_lifecycle() {
    use TaskStatus::*;
    assert!(Queued.can_transition_to(Dispatched));
    assert!(Queued.can_transition_to(Skipped));
    assert!(Dispatched.can_transition_to(Retrying));
    assert!(Retrying.can_transition_to(Dispatched));
    assert!(!Queued.can_transition_to(Succeeded));
    assert!(!Succeeded.can_transition_to(Dispatched));
    assert!(!Skipped.can_transition_to(Dispatched));
}

#[test]
fn status_names_are_snake_case() {
    assert_eq!(SessionStatus::PartiallyFailed.to_string(), "partially_failed");
    assert_eq!(
        serde_json::to_string(&SessionStatus::PartiallyFailed).unwrap(),
        "\"partially_failed\""
    );
    assert_eq!(TaskStatus::Retrying.to_string(), "retrying");
}

#[test]
fn strategy_parses_case_insensitively() {
    assert_eq!("PARALLEL".parse::<ExecutionStrategy>().unwrap(), ExecutionStrategy::Parallel);
    assert!("random".parse::<ExecutionStrategy>().is_err());
}

#[test]
fn memory_entry_derives_fingerprint_from_payload() {
    let a = MemoryEntry::new("injection", "Unsanitized  SQL", "s1", "security");
    let b = MemoryEntry::new("injection", "unsanitized sql", "s2", "security");
    assert_eq!(a.fingerprint, b.fingerprint);
    assert_ne!(a.id, b.id);
    assert_eq!(a.accuracy_weight, 1.0);
    assert!(a.feedback_label.is_none());
}

#[test]
fn progress_event_dedup_key_ignores_seq() {
    let event = |seq| ProgressEvent {
        session_id: "s1".into(),
        task_id: Some("t1".into()),
        agent_name: Some("security".into()),
        change: StatusChange::Task(TaskStatus::Succeeded),
        attempt: 1,
        seq,
        timestamp: chrono::Utc::now(),
    };
    assert_eq!(event(3).dedup_key(), event(9).dedup_key());
    assert!(!event(3).is_terminal());
}

#[test]
fn only_terminal_session_events_end_the_stream() {
    let mut event = ProgressEvent {
        session_id: "s1".into(),
        task_id: None,
        agent_name: None,
        change: StatusChange::Session(SessionStatus::Running),
        attempt: 0,
        seq: 1,
        timestamp: chrono::Utc::now(),
    };
    assert!(!event.is_terminal());
    event.change = StatusChange::Session(SessionStatus::Cancelled);
    assert!(event.is_terminal());
}

#[test]
fn input_descriptor_validation() {
    assert!(InputDescriptor::new("a.rs", "fn main() {}").validate().is_ok());
    assert!(InputDescriptor::new("", "fn main() {}").validate().is_err());
    assert!(InputDescriptor::new("a.rs", "").validate().is_err());
}

#[test]
fn finding_payload_includes_location() {
    let finding = Finding::new("injection", "raw query").at("db.rs:10");
    assert_eq!(finding.payload(), "raw query\n@ db.rs:10");
}

#[test]
fn error_classes() {
    let rate_limited = DispatchError::RateLimited {
        provider: "p".into(),
        retry_after_ms: None,
    };
    assert_eq!(rate_limited.class(), ErrorClass::TransientProvider);
    assert!(rate_limited.is_rate_limit());

    let timeout = DispatchError::Timeout {
        agent: "a".into(),
        timeout_ms: 10,
    };
    assert!(timeout.is_transient());
    assert!(!timeout.is_rate_limit());

    let err: ConclaveError = StorageError::Unavailable {
        reason: "locked".into(),
    }
    .into();
    assert!(err.is_store_unavailable());

    let err: ConclaveError = StorageError::SqliteError {
        message: "constraint".into(),
    }
    .into();
    assert_eq!(err.class(), ErrorClass::Permanent);

    let err = ConclaveError::InvalidInput("bad".into());
    assert_eq!(err.class(), ErrorClass::InvalidInput);
}
