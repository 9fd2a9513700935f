//! In-memory reference engine
//!
//! A small lock-based database that behaves like InnoDB for the probe's
//! statements. Isolation is what the probe is meant to observe, so the
//! engine implements it faithfully rather than serializing everything:
//!
//! - Repeatable read and serializable lock the `(table, value)` predicate:
//!   shared for the existence check, exclusive for the insert. Two
//!   overlapping inserters deadlock and one of them is rolled back.
//! - Read committed and read uncommitted check existence without locks, so
//!   two overlapping inserters both insert.
//!
//! Schema statements take effect immediately and implicitly commit any open
//! transaction on the issuing connection.

mod connection;

pub use connection::MemoryConnection;

use std::sync::Arc;

use isoprobe_concurrency::{LockManager, TransactionManager, TransactionStats};
use isoprobe_core::{Backend, IsolationLevel, Result};
use isoprobe_storage::MemoryStore;

use crate::config::MemoryConfig;

/// State shared by every connection of one database
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) store: MemoryStore,
    pub(crate) locks: LockManager,
    pub(crate) txns: TransactionManager,
    pub(crate) config: MemoryConfig,
}

/// Handle to an in-memory database
///
/// Cloning is cheap and yields a handle to the same database.
///
/// # Example
///
/// ```text
/// use isoprobe_engine::{MemoryDatabase, MemoryConfig};
///
/// let db = MemoryDatabase::new(MemoryConfig::default());
/// let mut conn = db.connect()?;
/// conn.execute(&Statement::create_table(&table))?;
/// ```
#[derive(Debug, Clone)]
pub struct MemoryDatabase {
    shared: Arc<Shared>,
}

impl MemoryDatabase {
    /// Create an empty database
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                store: MemoryStore::new(),
                locks: LockManager::new(),
                txns: TransactionManager::new(),
                config,
            }),
        }
    }

    /// Create an empty database with default settings at `level`
    pub fn with_default_isolation(level: IsolationLevel) -> Self {
        Self::new(MemoryConfig::default().with_default_isolation(level))
    }

    /// Engine settings
    pub fn config(&self) -> &MemoryConfig {
        &self.shared.config
    }

    /// Transaction counters
    pub fn stats(&self) -> TransactionStats {
        self.shared.txns.stats()
    }

    /// Locks currently held across all transactions
    pub fn lock_count(&self) -> usize {
        self.shared.locks.lock_count()
    }

    /// Underlying row store, for inspection in tests and tooling
    pub fn store(&self) -> &MemoryStore {
        &self.shared.store
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

impl Backend for MemoryDatabase {
    type Conn = MemoryConnection;

    fn connect(&self) -> Result<MemoryConnection> {
        Ok(MemoryConnection::new(Arc::clone(&self.shared)))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
