// Boundary logging of the changelog command

use serde_json::json;
use snaplog_core::config::SnaplogConfig;
use snaplog_core::logging_facility::test_capture::init_test_capture;
use snaplog_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_COMPONENT, FIELD_ENTITY_COUNT, FIELD_ERR_KIND,
    FIELD_EVENT_COUNT,
};
use snaplog_engine::commands::changelog::{run_changelog, ChangelogOptions, ChangelogSource};
use snaplog_store::loader::jsonl::JsonlSource;
use tempfile::TempDir;

fn jsonl_source(temp_dir: &TempDir, key: &str) -> ChangelogSource {
    let path = temp_dir.path().join("landing.jsonl");
    let lines = [
        json!({"policy_id": key, "ingested_at": "2024-01-01T00:00:00", "raw_json": {"a": 1}}),
        json!({"policy_id": key, "ingested_at": "2024-02-01T00:00:00", "raw_json": {"a": 2}}),
    ];
    std::fs::write(
        &path,
        lines.iter().map(|l| l.to_string()).collect::<Vec<_>>().join("\n"),
    )
    .unwrap();
    ChangelogSource::Jsonl {
        path,
        layout: JsonlSource::default(),
    }
}

#[test]
fn test_changelog_logs_start_and_end_with_run_id() {
    let capture = init_test_capture();
    let temp_dir = TempDir::new().unwrap();
    let source = jsonl_source(&temp_dir, "LOG_P001");

    let report =
        run_changelog(&source, &SnaplogConfig::default(), &ChangelogOptions::default()).unwrap();
    let run_id = report.run_id.to_string();

    let ours = capture.for_run(&run_id);

    let start = ours
        .iter()
        .find(|e| e.is("changelog", EVENT_START))
        .expect("start event captured");
    assert!(start.field(FIELD_COMPONENT).is_some());

    let end = ours
        .iter()
        .find(|e| e.is("changelog", EVENT_END))
        .expect("end event captured");
    assert_eq!(end.field(FIELD_ENTITY_COUNT), Some("1"));
    assert_eq!(end.field(FIELD_EVENT_COUNT), Some("1"));
}

#[test]
fn test_changelog_failure_logs_error_kind() {
    let capture = init_test_capture();
    let config = SnaplogConfig {
        workers: 0,
        ..SnaplogConfig::default()
    };
    let source = ChangelogSource::Jsonl {
        path: "/definitely/not/here.jsonl".into(),
        layout: JsonlSource::default(),
    };

    let err = run_changelog(&source, &config, &ChangelogOptions::default()).unwrap_err();
    let run_id = err.run_id().expect("run id attached").to_string();

    let failure = capture
        .for_run(&run_id)
        .into_iter()
        .find(|e| e.is("changelog", EVENT_END_ERROR))
        .expect("error event captured");
    assert_eq!(failure.field(FIELD_ERR_KIND), Some("InvalidConfig"));
}
