//! Core traits for database access
//!
//! This module defines the Connection and Backend traits that let the probe
//! drive any engine: the in-memory reference engine, SQLite, or anything else
//! that can execute the probe statements.
//!
//! Lock contention is not an exception path here. It comes back as
//! [`Error::LockContention`] from whichever call the database refused.

use crate::error::Result;
use crate::statement::Statement;
use crate::types::IsolationLevel;
use tracing::warn;

/// A single database session
///
/// A connection is owned by one thread at a time. Statements issued outside
/// an explicit transaction auto-commit.
pub trait Connection: Send {
    /// Execute a statement that modifies data or schema
    ///
    /// Returns the number of affected rows (0 for schema statements).
    ///
    /// # Errors
    ///
    /// Returns `LockContention` when the database refused a lock. Backends
    /// that abort the whole transaction in that case leave the connection
    /// without an active transaction.
    fn execute(&mut self, statement: &Statement) -> Result<u64>;

    /// Execute a query returning a single integer
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedStatement` if the statement is not a query.
    fn query_scalar(&mut self, statement: &Statement) -> Result<i64>;

    /// Open an explicit transaction
    ///
    /// `None` uses the database default isolation level.
    ///
    /// # Errors
    ///
    /// Returns `TransactionActive` if a transaction is already open and
    /// `UnsupportedIsolation` if the backend cannot honor `isolation`.
    fn begin(&mut self, isolation: Option<IsolationLevel>) -> Result<()>;

    /// Commit the open transaction
    fn commit(&mut self) -> Result<()>;

    /// Roll back the open transaction
    ///
    /// Rolling back when no transaction is open is a no-op, since the
    /// database may already have aborted it.
    fn rollback(&mut self) -> Result<()>;

    /// Whether an explicit transaction is open
    fn in_transaction(&self) -> bool;
}

/// A database that hands out independent connections
///
/// Every racing path gets its own connection; connections are never shared.
pub trait Backend: Send + Sync {
    /// Connection type produced by this backend
    type Conn: Connection + 'static;

    /// Open a new connection
    fn connect(&self) -> Result<Self::Conn>;

    /// Short backend name for logs and reports
    fn name(&self) -> &'static str;
}

/// Run `work` inside an explicit transaction
///
/// Commits when `work` succeeds and rolls back when `work` or the commit
/// fails. A rollback failure is logged and the original error is returned.
///
/// # Errors
///
/// Returns the error from `begin`, `work` or `commit`.
pub fn run_in_transaction<C, T, F>(
    conn: &mut C,
    isolation: Option<IsolationLevel>,
    work: F,
) -> Result<T>
where
    C: Connection + ?Sized,
    F: FnOnce(&mut C) -> Result<T>,
{
    conn.begin(isolation)?;
    let outcome = work(conn).and_then(|value| conn.commit().map(|()| value));
    if let Err(err) = &outcome {
        // A refused commit can leave the transaction open on some engines
        if conn.in_transaction() {
            if let Err(rollback_err) = conn.rollback() {
                warn!(
                    target: "isoprobe::txn",
                    error = %rollback_err,
                    cause = %err,
                    "Rollback failed after transaction error"
                );
            }
        }
    }
    outcome
}

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn execute(&mut self, statement: &Statement) -> Result<u64> {
        (**self).execute(statement)
    }

    fn query_scalar(&mut self, statement: &Statement) -> Result<i64> {
        (**self).query_scalar(statement)
    }

    fn begin(&mut self, isolation: Option<IsolationLevel>) -> Result<()> {
        (**self).begin(isolation)
    }

    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }

    fn rollback(&mut self) -> Result<()> {
        (**self).rollback()
    }

    fn in_transaction(&self) -> bool {
        (**self).in_transaction()
    }
}
