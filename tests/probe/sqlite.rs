//! Probe runs against SQLite database files

use isoprobe::{
    race, reset_table, Backend, Error, IsolationLevel, Probe, ProbeConfig, SqliteBackend,
    SyncMode, TableName,
};
use tempfile::TempDir;

use crate::common::*;

fn backend(dir: &TempDir) -> SqliteBackend {
    SqliteBackend::new(dir.path().join("probe.db"))
}

#[test]
fn fixture_creates_table_in_new_file() {
    let dir = tempfile::tempdir().unwrap();
    let backend = backend(&dir);
    let mut conn = backend.connect().unwrap();
    reset_table(&mut conn, &TableName::default()).unwrap();
    reset_table(&mut conn, &TableName::default()).unwrap();
    assert_eq!(probe_rows(&backend), 0);
}

#[test]
fn sqlite_races_never_double_insert() {
    let dir = tempfile::tempdir().unwrap();
    let backend = backend(&dir);
    let mut conn = backend.connect().unwrap();
    reset_table(&mut conn, &TableName::default()).unwrap();

    for sync in [SyncMode::Barrier, SyncMode::Timing] {
        for _ in 0..10 {
            match race(&backend, &probe_config().with_sync(sync)) {
                Ok(()) => assert_eq!(probe_rows(&backend), 1),
                Err(err) => assert!(err.is_lock_contention(), "{}", err),
            }
        }
    }
}

#[test]
fn sample_reports_no_phantoms() {
    let dir = tempfile::tempdir().unwrap();
    let probe = Probe::new(backend(&dir), ProbeConfig::default()).unwrap();
    let report = probe.sample(10).unwrap();
    assert_eq!(report.trials, 10);
    assert_eq!(report.backend, "sqlite");
}

#[test]
fn weaker_isolation_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let probe = Probe::new(
        backend(&dir),
        ProbeConfig::default().with_isolation(Some(IsolationLevel::ReadCommitted)),
    )
    .unwrap();
    assert!(matches!(
        probe.run(),
        Err(Error::UnsupportedIsolation {
            backend: "sqlite",
            ..
        })
    ));
}
