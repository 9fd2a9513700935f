//! Transaction state tracked by a connection
//!
//! State transitions:
//! - `Active` → `Committed`
//! - `Active` → `Aborted` (explicit rollback, deadlock victim, lock wait timeout)
//!
//! Terminal states accept no further statements.

use isoprobe_core::{Error, IsolationLevel, Result};
use isoprobe_storage::{TxnId, Visibility};

/// Status of a transaction in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Transaction is executing statements
    Active,
    /// Transaction committed successfully
    Committed,
    /// Transaction was aborted
    Aborted {
        /// Human-readable reason for abort
        reason: String,
    },
}

/// A running transaction
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Unique identifier, also the lock owner id
    pub id: TxnId,
    /// Isolation level fixed at begin
    pub isolation: IsolationLevel,
    /// True for the single-statement transaction wrapping an auto-commit statement
    pub implicit: bool,
    /// Lifecycle state
    pub status: TransactionStatus,
}

impl Transaction {
    /// Create an active transaction
    pub fn new(id: TxnId, isolation: IsolationLevel, implicit: bool) -> Self {
        Self {
            id,
            isolation,
            implicit,
            status: TransactionStatus::Active,
        }
    }

    /// Whether the transaction still accepts statements
    pub fn is_active(&self) -> bool {
        self.status == TransactionStatus::Active
    }

    /// Fail unless the transaction is active
    pub fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(Error::NoActiveTransaction)
        }
    }

    /// Rows this transaction's reads observe
    ///
    /// Read uncommitted sees every row. All other levels read the latest
    /// committed rows plus their own writes; repeatable read and
    /// serializable get their stability from predicate locks, not from an
    /// older snapshot.
    pub fn visibility(&self) -> Visibility {
        match self.isolation {
            IsolationLevel::ReadUncommitted => Visibility::Uncommitted,
            _ => Visibility::CommittedAndOwn(self.id),
        }
    }

    /// Transition to `Committed`
    pub fn mark_committed(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.status = TransactionStatus::Committed;
        Ok(())
    }

    /// Transition to `Aborted`
    pub fn mark_aborted(&mut self, reason: impl Into<String>) {
        self.status = TransactionStatus::Aborted {
            reason: reason.into(),
        };
    }
}
