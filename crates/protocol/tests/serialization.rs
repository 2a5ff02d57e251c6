//! Wire-format tests pinning the serialized shapes consumers depend on.

use std::time::Duration;
use tk_protocol::{
    AttemptFailure, Event, ProcessSpec, ProcessState, RunState, Task, TaskState,
};

#[test]
fn test_state_enums_use_screaming_snake_case() {
    assert_eq!(
        serde_json::to_string(&ProcessState::Success).unwrap(),
        r#""SUCCESS""#
    );
    assert_eq!(
        serde_json::to_string(&TaskState::Active).unwrap(),
        r#""ACTIVE""#
    );
    assert_eq!(
        serde_json::to_string(&RunState::FailedPermanent).unwrap(),
        r#""FAILED_PERMANENT""#
    );
}

#[test]
fn test_event_tagged_shape() {
    let event = Event::AttemptFinished {
        process: "p1".to_string(),
        attempt: 2,
        state: ProcessState::Failed,
        failure: Some(AttemptFailure::NonZeroExit { code: 1 }),
    };

    let json: serde_json::Value = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "attemptFinished");
    assert_eq!(json["payload"]["process"], "p1");
    assert_eq!(json["payload"]["failure"]["kind"], "NON_ZERO_EXIT");
    assert_eq!(json["payload"]["failure"]["code"], 1);
}

#[test]
fn test_task_yaml_round_trip() {
    let task = Task {
        name: "pingping".to_string(),
        resources: Default::default(),
        processes: vec![ProcessSpec {
            name: "p1".to_string(),
            cmdline: "echo ping".to_string(),
            min_duration: Duration::from_secs(1),
            max_failures: 5,
        }],
    };

    let yaml = serde_yaml::to_string(&task).unwrap();
    let back: Task = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(back, task);
}
