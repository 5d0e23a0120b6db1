// crates/provisioner-store-sqlite/tests/sqlite_store.rs
// ============================================================================
// Module: SQLite Job Store Tests
// Description: Persistence, history, retention, and integrity checks.
// Purpose: Ensure job records survive reopen and fail closed on tampering.
// Dependencies: provisioner-store-sqlite, provisioner-core, rusqlite, tempfile
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeMap;

use provisioner_core::JobId;
use provisioner_core::JobOperation;
use provisioner_core::JobRecord;
use provisioner_core::JobState;
use provisioner_core::JobStore;
use provisioner_core::StoreError;
use provisioner_core::Workspace;
use provisioner_store_sqlite::SqliteJobStore;
use provisioner_store_sqlite::SqliteStoreConfig;
use serde_json::Map;
use serde_json::json;
use tempfile::TempDir;

fn sample_record(id: &str) -> JobRecord {
    let mut variables = Map::new();
    variables.insert("tf_id".to_string(), json!(id));
    let workspace =
        Workspace::new(variables, "resource {}", BTreeMap::new(), Vec::new(), Vec::new()).expect("workspace");
    JobRecord::staged(JobId::new(id), workspace, 1_700_000_000_000)
}

fn open(dir: &TempDir) -> SqliteJobStore {
    SqliteJobStore::open(SqliteStoreConfig::at(dir.path().join("jobs.sqlite"))).expect("open store")
}

#[test]
fn records_survive_reopen() {
    let dir = TempDir::new().expect("tempdir");
    let record = sample_record("tf:inst:");
    open(&dir).save(&record).expect("save");

    let reopened = open(&dir);
    assert_eq!(reopened.load(&record.id).expect("load"), Some(record));
    assert!(reopened.load(&JobId::new("tf:other:")).expect("load").is_none());
}

#[test]
fn every_save_appends_a_version() {
    let dir = TempDir::new().expect("tempdir");
    let store = open(&dir);
    let mut record = sample_record("tf:inst:");
    store.save(&record).expect("save staged");
    record.state = JobState::Running;
    record.operation = Some(JobOperation::Create);
    store.save(&record).expect("save running");
    record.state = JobState::Succeeded;
    store.save(&record).expect("save succeeded");

    let states: Vec<JobState> = store.history(&record.id).expect("history").into_iter().map(|r| r.state).collect();
    assert_eq!(states, vec![JobState::Staged, JobState::Running, JobState::Succeeded]);
    assert_eq!(store.load(&record.id).expect("load").map(|r| r.state), Some(JobState::Succeeded));
}

#[test]
fn retention_prunes_old_versions_but_keeps_the_job() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = SqliteStoreConfig::at(dir.path().join("jobs.sqlite"));
    config.max_versions = Some(2);
    let store = SqliteJobStore::open(config).expect("open");
    let mut record = sample_record("tf:inst:");
    for updated_at_ms in 0..5 {
        record.updated_at_ms = updated_at_ms;
        store.save(&record).expect("save");
    }

    let history = store.history(&record.id).expect("history");
    assert_eq!(history.iter().map(|r| r.updated_at_ms).collect::<Vec<_>>(), vec![3, 4]);
    assert!(store.load(&record.id).expect("load").is_some());
}

#[test]
fn ids_in_state_tracks_the_current_state() {
    let dir = TempDir::new().expect("tempdir");
    let store = open(&dir);
    let mut running = sample_record("tf:a:");
    running.state = JobState::Running;
    store.save(&running).expect("save");
    store.save(&sample_record("tf:b:")).expect("save");

    assert_eq!(store.ids_in_state(JobState::Running).expect("query"), vec![JobId::new("tf:a:")]);
    running.state = JobState::Failed;
    store.save(&running).expect("save");
    assert!(store.ids_in_state(JobState::Running).expect("query").is_empty());
}

#[test]
fn tampered_records_fail_closed() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("jobs.sqlite");
    let store = SqliteJobStore::open(SqliteStoreConfig::at(&path)).expect("open");
    let record = sample_record("tf:inst:");
    store.save(&record).expect("save");

    let raw = rusqlite::Connection::open(&path).expect("raw connection");
    raw.execute("UPDATE job_record_versions SET record_hash = 'deadbeef'", []).expect("tamper");
    drop(raw);

    let err = store.load(&record.id).expect_err("tampered record rejected");
    assert!(matches!(err, StoreError::Corrupt(_)), "unexpected error: {err}");
}

#[test]
fn zero_retention_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = SqliteStoreConfig::at(dir.path().join("jobs.sqlite"));
    config.max_versions = Some(0);
    assert!(SqliteJobStore::open(config).is_err());
}

#[test]
fn directory_paths_are_rejected() {
    let dir = TempDir::new().expect("tempdir");
    assert!(SqliteJobStore::open(SqliteStoreConfig::at(dir.path())).is_err());
}
