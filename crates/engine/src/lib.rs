//! Database backends for isoprobe
//!
//! This crate provides the databases the probe races against:
//! - MemoryDatabase: in-process reference engine with predicate locks and
//!   deadlock detection, built on the storage and concurrency layers
//! - SqliteBackend: real SQLite database files (feature `sqlite`)
//! - BackendConfig: the `[backend]` section of the configuration file

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use config::{BackendConfig, MemoryConfig, SqliteConfig};
pub use memory::{MemoryConnection, MemoryDatabase};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteBackend, SqliteConnection};
