//! Race scenarios across isolation levels

use isoprobe::{
    classify, race, reset_table, Backend, Connection, ContentionKind, Error, IsolationLevel,
    MemoryConfig, MemoryDatabase, PrimaryMode, Probe, RaceOutcome, Statement, SyncMode, TableName,
};

use crate::common::*;

fn prepared(db: &MemoryDatabase) {
    let mut conn = db.connect().unwrap();
    reset_table(&mut conn, &TableName::default()).unwrap();
}

#[test]
fn strict_isolation_never_leaves_two_rows() {
    for level in [IsolationLevel::RepeatableRead, IsolationLevel::Serializable] {
        for db in [overlapping_db(level), plain_db(level)] {
            for _ in 0..5 {
                prepared(&db);
                match race(&db, &probe_config()) {
                    Ok(()) => assert_eq!(probe_rows(&db), 1),
                    Err(err) => assert!(err.is_lock_contention(), "{}", err),
                }
            }
        }
    }
}

#[test]
fn read_committed_race_double_inserts() {
    let db = overlapping_db(IsolationLevel::ReadCommitted);
    prepared(&db);
    race(&db, &probe_config()).unwrap();
    assert_eq!(probe_rows(&db), 2);
}

#[test]
fn read_committed_run_fails_with_phantom_read() {
    let probe = Probe::new(overlapping_db(IsolationLevel::ReadCommitted), probe_config()).unwrap();
    let err = probe.run().unwrap_err();
    assert!(matches!(err, Error::PhantomRead { rows: 2, .. }));
    assert!(err
        .to_string()
        .starts_with("found phantom read, transaction is not properly isolated"));
}

#[test]
fn weaker_worker_isolation_exposes_phantom_on_strict_database() {
    // Database default stays repeatable read; only the worker's transaction is weakened
    let probe = Probe::new(
        overlapping_db(IsolationLevel::RepeatableRead),
        probe_config().with_isolation(Some(IsolationLevel::ReadCommitted)),
    )
    .unwrap();
    assert!(matches!(probe.run(), Err(Error::PhantomRead { .. })));
}

#[test]
fn repeatable_read_run_reaches_contention_target() {
    let probe = Probe::new(
        overlapping_db(IsolationLevel::RepeatableRead),
        probe_config().with_target_contentions(3),
    )
    .unwrap();
    let report = probe.run().unwrap();
    assert_eq!(report.total_contentions(), 3);
    assert_eq!(report.contentions[&ContentionKind::Deadlock], 3);
}

#[test]
fn explicit_primary_also_contends() {
    let probe = Probe::new(
        overlapping_db(IsolationLevel::Serializable),
        probe_config().with_primary(PrimaryMode::Explicit),
    )
    .unwrap();
    let report = probe.run().unwrap();
    assert_eq!(report.total_contentions(), 1);
}

#[test]
fn timing_mode_still_classifies_every_trial() {
    let probe = Probe::new(
        plain_db(IsolationLevel::RepeatableRead),
        probe_config().with_sync(SyncMode::Timing),
    )
    .unwrap();
    let report = probe.sample(5).unwrap();
    assert_eq!(report.trials, 5);
    assert_eq!(report.clean + report.total_contentions(), 5);
}

#[test]
fn classifier_scenarios() {
    assert_eq!(classify(Ok(()), || Ok(1)).unwrap(), RaceOutcome::CleanIsolation);
    assert_eq!(
        classify(Ok(()), || Ok(2)).unwrap(),
        RaceOutcome::PhantomRead { rows: 2 }
    );
    for rows in [0, 1, 2] {
        let lock_error = Err(Error::contention(ContentionKind::LockWaitTimeout, "timeout"));
        assert_eq!(
            classify(lock_error, || Ok(rows)).unwrap(),
            RaceOutcome::LockContention {
                kind: ContentionKind::LockWaitTimeout
            }
        );
    }
}

#[test]
fn lock_wait_timeout_counts_as_contention() {
    // A holder that never commits forces the racing inserts to time out
    let db = MemoryDatabase::new(MemoryConfig::default().with_lock_wait_timeout_ms(20));
    prepared(&db);
    let mut holder = db.connect().unwrap();
    holder.begin(None).unwrap();
    holder
        .execute(&Statement::insert_probe(&TableName::default()))
        .unwrap();

    let outcome = classify(race(&db, &probe_config()), || Ok(probe_rows(&db))).unwrap();
    assert_eq!(
        outcome,
        RaceOutcome::LockContention {
            kind: ContentionKind::LockWaitTimeout
        }
    );
    holder.rollback().unwrap();
}
