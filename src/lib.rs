//! isoprobe - transaction isolation probe
//!
//! Races two concurrent conditional inserts against a shared table and
//! checks that the database's isolation prevents a phantom read:
//!
//! ```sql
//! insert into t select 1 where not exists (select * from t where num = 1)
//! ```
//!
//! A correctly isolated database either leaves exactly one row or refuses
//! one of the inserters a lock (deadlock, lock wait timeout, busy). Two rows
//! means both transactions saw the row as absent.
//!
//! # Quick Start
//!
//! ```ignore
//! use isoprobe::{MemoryDatabase, Probe, ProbeConfig};
//!
//! let probe = Probe::new(MemoryDatabase::default(), ProbeConfig::default())?;
//! let report = probe.run()?;
//! println!("{}", report);
//! ```
//!
//! # Architecture
//!
//! - [`isoprobe_core`]: errors, statements, `Connection` and `Backend` traits
//! - [`isoprobe_storage`] and [`isoprobe_concurrency`]: rows, locks and
//!   transactions of the in-memory engine
//! - [`isoprobe_engine`]: the backends
//! - [`isoprobe_harness`]: fixture, race driver, classifier and trial loop

pub use isoprobe_concurrency;
pub use isoprobe_core;
pub use isoprobe_engine;
pub use isoprobe_harness;
pub use isoprobe_storage;

pub use isoprobe_core::{
    run_in_transaction, Backend, Connection, ContentionKind, Error, IsolationLevel, Result,
    Statement, TableName,
};
pub use isoprobe_engine::{BackendConfig, MemoryConfig, MemoryDatabase, SqliteConfig};
#[cfg(feature = "sqlite")]
pub use isoprobe_engine::SqliteBackend;
pub use isoprobe_harness::{
    classify, race, reset_table, PrimaryMode, Probe, ProbeConfig, ProbeReport, RaceOutcome,
    SyncMode,
};
