// CSV report written to disk

use snaplog_core::diff::ChangeKind;
use snaplog_core::sequencer::ChangeEvent;
use snaplog_core::value::{Node, Scalar};
use snaplog_store::config_file::load_config_file;
use snaplog_store::report::csv::{write_csv_file, UTF8_BOM};
use std::fs;
use tempfile::TempDir;

fn sample_event(seq: u32) -> ChangeEvent {
    ChangeEvent {
        entity_key: "P001".to_string(),
        compare_sequence: seq,
        field_path: "plcyNm".to_string(),
        kind: ChangeKind::ValueChanged,
        old_value: Node::Scalar(Scalar::Text("a".to_string())),
        new_value: Node::Scalar(Scalar::Text("b".to_string())),
        base_timestamp: Some("2024-01-01".to_string()),
        change_timestamp: Some("2024-02-01".to_string()),
    }
}

#[test]
fn test_write_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("reports").join("nested").join("diff.csv");
    let events = vec![sample_event(2), sample_event(3)];

    let rows = write_csv_file(&path, &events).unwrap();

    assert_eq!(rows, 2);
    let bytes = fs::read(&path).unwrap();
    assert!(bytes.starts_with(UTF8_BOM));
    let body = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
    assert_eq!(body.lines().count(), 3);
    assert!(body.contains("P001,3,plcyNm,a,b,2024-01-01,2024-02-01"));
}

#[test]
fn test_write_into_file_path_parent_fails_as_io() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("blocker");
    fs::write(&blocker, "x").unwrap();

    let err = write_csv_file(&blocker.join("diff.csv"), &[sample_event(2)]).unwrap_err();
    assert_eq!(err.code(), "ERR_IO");
}

#[test]
fn test_config_file_loaded_from_disk() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("snaplog.yaml");
    fs::write(
        &path,
        "changelog:\n  excluded_paths: [lastMdfcnDt]\n  structural_changes: report\n",
    )
    .unwrap();

    let file = load_config_file(&path).unwrap();
    assert_eq!(file.changelog.excluded_paths, vec!["lastMdfcnDt".to_string()]);
    assert!(file.changelog.validate().is_ok());
}

#[test]
fn test_missing_config_file_names_setting() {
    let temp_dir = TempDir::new().unwrap();
    let err = load_config_file(&temp_dir.path().join("absent.yaml")).unwrap_err();
    assert_eq!(err.code(), "ERR_INVALID_CONFIG");
    assert_eq!(err.setting(), Some("config_file"));
}
