//! Integration tests for the changelog command.
//!
//! All tests use a real SQLite file or JSONL file (via TempDir).

use rusqlite::{params, Connection};
use serde_json::json;
use snaplog_core::config::{ChainMode, SnaplogConfig};
use snaplog_core::errors::ExErrorKind;
use snaplog_core::scheduler::CancelFlag;
use snaplog_engine::commands::changelog::{
    run_changelog, ChangelogOptions, ChangelogSource,
};
use snaplog_store::loader::jsonl::JsonlSource;
use snaplog_store::loader::sqlite::LandingSource;
use std::path::PathBuf;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Setup helpers
// ---------------------------------------------------------------------------

fn setup_landing(rows: &[(&str, serde_json::Value, &str)]) -> (TempDir, ChangelogSource) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("landing.db");

    let conn = Connection::open(&db_path).unwrap();
    conn.execute_batch(
        "CREATE TABLE youthpolicy_landing (
            raw_ingest_id INTEGER PRIMARY KEY,
            policy_id TEXT NOT NULL,
            raw_json TEXT,
            record_hash TEXT,
            ingested_at TEXT
        )",
    )
    .unwrap();
    for (i, (policy_id, raw_json, ingested_at)) in rows.iter().enumerate() {
        conn.execute(
            "INSERT INTO youthpolicy_landing (policy_id, raw_json, record_hash, ingested_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![policy_id, raw_json.to_string(), format!("h{}", i), ingested_at],
        )
        .unwrap();
    }

    let source = ChangelogSource::Sqlite {
        path: db_path,
        landing: LandingSource::default(),
    };
    (temp_dir, source)
}

fn policy(name: &str, status: &str, modified: &str) -> serde_json::Value {
    json!({"plcyNm": name, "status": status, "lastMdfcnDt": modified, "frstRegDt": "2023-12-01"})
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn test_changelog_chains_landing_rows() {
    let (_temp_dir, source) = setup_landing(&[
        ("P001", policy("Youth rent", "open", "2024-01-01"), "2024-01-02 00:00:00"),
        ("P001", policy("Youth rent", "closed", "2024-02-01"), "2024-02-02 00:00:00"),
        ("P001", policy("Youth rent+", "closed", "2024-03-01"), "2024-03-02 00:00:00"),
        ("P002", policy("Single", "open", "2024-01-01"), "2024-01-02 00:00:00"),
    ]);

    let report = run_changelog(&source, &SnaplogConfig::default(), &ChangelogOptions::default())
        .unwrap();

    assert!(!report.cancelled);
    assert_eq!(report.run_stats.entities, 1);
    assert_eq!(report.load_stats.rows, 3);

    let rows: Vec<_> = report
        .events()
        .map(|e| {
            (
                e.compare_sequence,
                e.field_path.as_str(),
                e.old_value.to_string(),
                e.new_value.to_string(),
                e.base_timestamp.clone(),
                e.change_timestamp.clone(),
            )
        })
        .collect();
    assert_eq!(
        rows,
        vec![
            (
                2,
                "status",
                "open".to_string(),
                "closed".to_string(),
                Some("2024-01-01".to_string()),
                Some("2024-02-01".to_string())
            ),
            (
                3,
                "plcyNm",
                "Youth rent".to_string(),
                "Youth rent+".to_string(),
                Some("2024-02-01".to_string()),
                Some("2024-03-01".to_string())
            ),
        ]
    );
    assert_eq!(report.event_count(), 2);
}

#[test]
fn test_changelog_compare_to_first_mode() {
    let (_temp_dir, source) = setup_landing(&[
        ("P001", json!({"x": 1}), "2024-01-01 00:00:00"),
        ("P001", json!({"x": 2}), "2024-01-02 00:00:00"),
        ("P001", json!({"x": 3}), "2024-01-03 00:00:00"),
    ]);
    let config = SnaplogConfig {
        chain_mode: ChainMode::First,
        ..SnaplogConfig::default()
    };

    let report = run_changelog(&source, &config, &ChangelogOptions::default()).unwrap();

    let olds: Vec<_> = report.events().map(|e| e.old_value.to_string()).collect();
    assert_eq!(olds, vec!["1", "1"]);
}

#[test]
fn test_invalid_config_fails_before_opening_source() {
    let source = ChangelogSource::Sqlite {
        path: PathBuf::from("/definitely/not/here.db"),
        landing: LandingSource::default(),
    };
    let config = SnaplogConfig {
        excluded_paths: vec!["root[".to_string()],
        ..SnaplogConfig::default()
    };

    let err = run_changelog(&source, &config, &ChangelogOptions::default()).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::InvalidConfig);
    assert_eq!(err.setting(), Some("excluded_paths"));
    assert!(err.run_id().is_some());
}

#[test]
fn test_missing_database_is_persistence_error() {
    let temp_dir = TempDir::new().unwrap();
    let source = ChangelogSource::Sqlite {
        path: temp_dir.path().join("absent.db"),
        landing: LandingSource::default(),
    };

    let err = run_changelog(&source, &SnaplogConfig::default(), &ChangelogOptions::default())
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Persistence);
}

#[test]
fn test_changelog_from_jsonl() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("landing.jsonl");
    let lines = [
        json!({"policy_id": "P001", "ingested_at": "2024-02-01T00:00:00", "raw_json": {"tags": ["b", "a"], "lastMdfcnDt": "2024-02-01"}}),
        json!({"policy_id": "P001", "ingested_at": "2024-01-01T00:00:00", "raw_json": {"tags": ["a", "b"], "lastMdfcnDt": "2024-01-01"}}),
        json!({"policy_id": "P001", "ingested_at": "2024-03-01T00:00:00", "raw_json": {"tags": ["a", "c"], "lastMdfcnDt": "2024-03-01"}}),
    ];
    std::fs::write(
        &path,
        lines.iter().map(|l| l.to_string()).collect::<Vec<_>>().join("\n"),
    )
    .unwrap();
    let source = ChangelogSource::Jsonl {
        path,
        layout: JsonlSource::default(),
    };

    let report = run_changelog(&source, &SnaplogConfig::default(), &ChangelogOptions::default())
        .unwrap();

    let events: Vec<_> = report.events().collect();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].compare_sequence, 3);
    assert_eq!(events[0].field_path, "tags[0]");
    assert_eq!(events[0].change_timestamp.as_deref(), Some("2024-03-01"));
    assert_eq!(report.run_stats.identical_pairs, 1);
}

#[test]
fn test_cancelled_run_reports_flag() {
    let (_temp_dir, source) = setup_landing(&[
        ("P001", json!({"x": 1}), "2024-01-01 00:00:00"),
        ("P001", json!({"x": 2}), "2024-01-02 00:00:00"),
    ]);
    let cancel = CancelFlag::new();
    cancel.cancel();

    let report = run_changelog(
        &source,
        &SnaplogConfig::default(),
        &ChangelogOptions { cancel },
    )
    .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.events().count(), 0);
}
