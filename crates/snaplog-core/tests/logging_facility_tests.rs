#![allow(clippy::unwrap_used, clippy::expect_used)]

use serde_json::json;
use snaplog_core::config::SequencerConfig;
use snaplog_core::errors::SnaplogError;
use snaplog_core::logging_facility::test_capture::init_test_capture;
use snaplog_core::scheduler::{run_entities, CancelFlag, EntityGroup, SchedulerOptions};
use snaplog_core::sequencer::sequence_entity;
use snaplog_core::value::Value;
use snaplog_core::{log_op_end, log_op_error, log_op_start};
use snaplog_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_DURATION_MS, FIELD_ENTITY_KEY, FIELD_ERR_CODE,
    FIELD_EVENT_COUNT, FIELD_SNAPSHOT_COUNT,
};
use tracing::Level;

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name, entity_key = "P001");

    let start = capture
        .events()
        .into_iter()
        .find(|e| e.is(op_name, EVENT_START))
        .expect("start event captured");
    assert_eq!(start.field(FIELD_ENTITY_KEY), Some("P001"));
}

#[test]
fn test_log_op_end_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let end_events: Vec<_> = capture
        .events()
        .into_iter()
        .filter(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END))
        .collect();
    assert_eq!(end_events.len(), 1, "Should have exactly one end event");
    assert_eq!(end_events[0].fields.get(FIELD_DURATION_MS), Some(&"42".to_string()));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    log_op_error!(op_name, SnaplogError::ZeroWorkers, duration_ms = 10);

    let events = capture.events();
    let error = events
        .iter()
        .find(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END_ERROR))
        .expect("error event captured");
    assert_eq!(error.level, Level::ERROR);
    assert_eq!(
        error.fields.get(FIELD_ERR_CODE),
        Some(&"ERR_INVALID_CONFIG".to_string())
    );
}

#[test]
fn test_malformed_snapshot_logged_as_warning() {
    let capture = init_test_capture();
    let key = "ENTITY_WARN_UNIQUE_4";

    sequence_entity(
        &SequencerConfig::default(),
        key,
        [Value::from(json!({"a": 1})), Value::from(json!([1, 2]))],
    )
    .unwrap();

    let warnings = capture
        .for_entity(key)
        .into_iter()
        .filter(|e| e.level == Level::WARN)
        .count();
    assert_eq!(warnings, 1);
}

#[test]
fn test_run_entities_logs_boundaries() {
    let capture = init_test_capture();

    run_entities(
        &SequencerConfig::default(),
        &[EntityGroup::new(
            "ENTITY_RUN_UNIQUE_5",
            vec![Value::from(json!({"x": 1})), Value::from(json!({"x": 2}))],
        )],
        &SchedulerOptions { workers: 1 },
        &CancelFlag::new(),
    )
    .unwrap();

    capture.assert_event_exists("run_entities", EVENT_START);
    capture.assert_event_exists("run_entities", EVENT_END);
}

#[test]
fn test_finished_chain_logs_counts() {
    let capture = init_test_capture();
    let key = "ENTITY_DONE_UNIQUE_6";

    sequence_entity(
        &SequencerConfig::default(),
        key,
        [Value::from(json!({"x": 1})), Value::from(json!({"x": 2}))],
    )
    .unwrap();

    let done = capture
        .for_entity(key)
        .into_iter()
        .find(|e| e.field(FIELD_SNAPSHOT_COUNT).is_some())
        .expect("debug summary captured");
    assert_eq!(done.field(FIELD_SNAPSHOT_COUNT), Some("2"));
    assert_eq!(done.field(FIELD_EVENT_COUNT), Some("1"));
}
