//! Error types for isoprobe
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Only [`Error::LockContention`] is an expected outcome of a race. Every other
//! variant terminates a probe run.

use crate::types::{ContentionKind, IsolationLevel};
use std::io;
use thiserror::Error;

/// Result type alias for isoprobe operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for isoprobe
#[derive(Debug, Error)]
pub enum Error {
    /// The database refused a lock and aborted the transaction
    ///
    /// Covers deadlock victims, lock wait timeouts and busy databases.
    #[error("Lock contention ({kind}): {message}")]
    LockContention {
        /// Which mechanism refused the lock
        kind: ContentionKind,
        /// Backend-specific detail
        message: String,
    },

    /// More than one probe row survived a race that completed without a lock error
    #[error("found phantom read, transaction is not properly isolated (trial {trial}: {rows} rows)")]
    PhantomRead {
        /// 1-based trial number that exposed the anomaly
        trial: u64,
        /// Number of rows carrying the probe value
        rows: i64,
    },

    /// A race completed without a lock error but left no probe row behind
    #[error("no probe row after a completed race (found {rows} rows)")]
    MissingRow {
        /// Number of rows carrying the probe value
        rows: i64,
    },

    /// The contention target was not reached within the trial budget
    #[error(
        "lock contention target not reached: observed {observed} of {target} after {trials} trials"
    )]
    ContentionTargetNotReached {
        /// Trials executed
        trials: u64,
        /// Lock contention outcomes observed
        observed: u64,
        /// Lock contention outcomes required
        target: u64,
    },

    /// Table does not exist
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Table already exists
    #[error("Table already exists: {0}")]
    TableExists(String),

    /// Operation requires an open transaction
    #[error("No active transaction")]
    NoActiveTransaction,

    /// `begin` called while a transaction is already open
    #[error("Transaction already active")]
    TransactionActive,

    /// Backend cannot run at the requested isolation level
    #[error("Isolation level {level} is not supported by the {backend} backend")]
    UnsupportedIsolation {
        /// Requested level
        level: IsolationLevel,
        /// Backend name
        backend: &'static str,
    },

    /// Statement is not valid for the requested operation
    #[error("Unsupported statement: {0}")]
    UnsupportedStatement(String),

    /// Invalid identifier or malformed input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded or is inconsistent
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A racing thread could not be spawned or panicked
    #[error("Race interrupted: {0}")]
    Interrupted(String),

    /// Backend error that is not lock contention
    #[error("Database error: {0}")]
    Database(String),

    /// I/O error (database files, config files)
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

impl Error {
    /// Build a lock contention error
    pub fn contention(kind: ContentionKind, message: impl Into<String>) -> Self {
        Error::LockContention {
            kind,
            message: message.into(),
        }
    }

    /// Build a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// True when the error is an expected lock contention outcome
    pub fn is_lock_contention(&self) -> bool {
        matches!(self, Error::LockContention { .. })
    }

    /// The contention kind, if this is a lock contention error
    pub fn contention_kind(&self) -> Option<ContentionKind> {
        match self {
            Error::LockContention { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
