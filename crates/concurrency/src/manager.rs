//! Transaction manager: id allocation and lifecycle metrics
//!
//! The metric counters use Relaxed ordering: they are observational only and
//! do not synchronize other memory. Id allocation uses SeqCst.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use isoprobe_core::IsolationLevel;
use isoprobe_storage::TxnId;

use crate::transaction::Transaction;

/// Snapshot of transaction counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionStats {
    /// Transactions currently open
    pub active: u64,
    /// Transactions started since creation
    pub started: u64,
    /// Transactions committed
    pub committed: u64,
    /// Transactions aborted (rollback, deadlock, timeout)
    pub aborted: u64,
}

/// Allocates transaction ids and tracks lifecycle counts
#[derive(Debug)]
pub struct TransactionManager {
    next_txn_id: AtomicU64,
    active: AtomicU64,
    started: AtomicU64,
    committed: AtomicU64,
    aborted: AtomicU64,
}

impl TransactionManager {
    /// Create a manager whose first transaction id is 1
    pub fn new() -> Self {
        Self {
            next_txn_id: AtomicU64::new(1),
            active: AtomicU64::new(0),
            started: AtomicU64::new(0),
            committed: AtomicU64::new(0),
            aborted: AtomicU64::new(0),
        }
    }

    /// Allocate next transaction ID
    pub fn next_txn_id(&self) -> TxnId {
        self.next_txn_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Start a transaction at `isolation`
    pub fn begin(&self, isolation: IsolationLevel, implicit: bool) -> Transaction {
        let txn = Transaction::new(self.next_txn_id(), isolation, implicit);
        self.active.fetch_add(1, Ordering::Relaxed);
        self.started.fetch_add(1, Ordering::Relaxed);
        debug!(target: "isoprobe::txn", txn = txn.id, %isolation, implicit, "Transaction started");
        txn
    }

    /// Record a commit
    pub fn record_commit(&self, txn: &Transaction) {
        self.active.fetch_sub(1, Ordering::Relaxed);
        self.committed.fetch_add(1, Ordering::Relaxed);
        debug!(target: "isoprobe::txn", txn = txn.id, "Transaction committed");
    }

    /// Record an abort
    pub fn record_abort(&self, txn: &Transaction) {
        self.active.fetch_sub(1, Ordering::Relaxed);
        self.aborted.fetch_add(1, Ordering::Relaxed);
        debug!(target: "isoprobe::txn", txn = txn.id, status = ?txn.status, "Transaction aborted");
    }

    /// Current counters
    pub fn stats(&self) -> TransactionStats {
        TransactionStats {
            active: self.active.load(Ordering::Relaxed),
            started: self.started.load(Ordering::Relaxed),
            committed: self.committed.load(Ordering::Relaxed),
            aborted: self.aborted.load(Ordering::Relaxed),
        }
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}
