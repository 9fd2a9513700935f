//! Shared test utilities for the integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use isoprobe::{
    Backend, Connection, IsolationLevel, MemoryConfig, MemoryDatabase, ProbeConfig, Statement,
    TableName,
};

/// Pause between check and insert that makes every race overlap.
pub const OVERLAP_GAP_MS: u64 = 50;

/// In-memory database at `level` whose races always overlap.
pub fn overlapping_db(level: IsolationLevel) -> MemoryDatabase {
    MemoryDatabase::new(
        MemoryConfig::default()
            .with_default_isolation(level)
            .with_read_write_gap_ms(OVERLAP_GAP_MS),
    )
}

/// In-memory database at `level` with no artificial race window.
pub fn plain_db(level: IsolationLevel) -> MemoryDatabase {
    MemoryDatabase::new(
        MemoryConfig::default()
            .with_default_isolation(level)
            .with_read_write_gap_ms(0),
    )
}

/// Probe settings used by most tests: default table, small trial bound.
pub fn probe_config() -> ProbeConfig {
    ProbeConfig::default().with_max_trials(50)
}

/// Probe rows currently in the default table of `backend`.
pub fn probe_rows<B: Backend>(backend: &B) -> i64 {
    backend
        .connect()
        .unwrap()
        .query_scalar(&Statement::count_probe(&TableName::default()))
        .unwrap()
}
