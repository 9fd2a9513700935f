//! Predicate lock manager
//!
//! Locks are taken on `(table, value)` predicates, which is all the probe's
//! existence check needs: "no row with num = 1" is protected by a shared lock
//! on `(t, 1)`, and inserting such a row requires the exclusive lock.
//!
//! ## Acquisition
//!
//! ```text
//! 1. Compute blockers: other holders whose mode conflicts with the request
//! 2. No blockers: grant (upgrading S to X in place) and return
//! 3. A blocker already waits on us (transitively): deadlock, requester is the victim
//! 4. Past the deadline: lock wait timeout
//! 5. Record wait-for edges, sleep on the condvar, goto 1
//! ```
//!
//! Locks are held until [`LockManager::release_all`], i.e. strict two-phase locking.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use isoprobe_core::{ContentionKind, Error, Result, TableName};
use isoprobe_storage::TxnId;

use crate::deadlock::WaitForGraph;

/// Lock mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockMode {
    /// Compatible with other shared locks
    Shared,
    /// Compatible with nothing held by another transaction
    Exclusive,
}

impl LockMode {
    /// Whether a holder in `self` blocks a request for `requested`
    pub fn conflicts_with(self, requested: LockMode) -> bool {
        !(self == LockMode::Shared && requested == LockMode::Shared)
    }
}

/// Predicate `table.num = value`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockTarget {
    /// Table the predicate ranges over
    pub table: TableName,
    /// Column value
    pub value: i64,
}

impl LockTarget {
    /// Create a target
    pub fn new(table: &TableName, value: i64) -> Self {
        Self {
            table: table.clone(),
            value,
        }
    }
}

impl fmt::Display for LockTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.num = {}", self.table, self.value)
    }
}

#[derive(Debug, Default)]
struct LockTable {
    holders: HashMap<LockTarget, HashMap<TxnId, LockMode>>,
    graph: WaitForGraph,
}

impl LockTable {
    fn blockers(&self, txn: TxnId, target: &LockTarget, mode: LockMode) -> HashSet<TxnId> {
        self.holders
            .get(target)
            .map(|held| {
                held.iter()
                    .filter(|(holder, held_mode)| **holder != txn && held_mode.conflicts_with(mode))
                    .map(|(holder, _)| *holder)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn grant(&mut self, txn: TxnId, target: &LockTarget, mode: LockMode) {
        let held = self
            .holders
            .entry(target.clone())
            .or_default()
            .entry(txn)
            .or_insert(mode);
        *held = (*held).max(mode);
    }
}

/// Blocking lock manager with deadlock detection
#[derive(Debug, Default)]
pub struct LockManager {
    state: Mutex<LockTable>,
    released: Condvar,
}

impl LockManager {
    /// Create an empty lock manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire `mode` on `target` for `txn`, waiting up to `timeout`
    ///
    /// Re-acquiring a held lock is a no-op; requesting `Exclusive` while
    /// holding `Shared` upgrades.
    ///
    /// # Errors
    ///
    /// - `LockContention { kind: Deadlock }` if waiting would close a cycle
    /// - `LockContention { kind: LockWaitTimeout }` if `timeout` elapses
    ///
    /// Locks already held by `txn` are kept; the caller decides whether to
    /// release them.
    pub fn acquire(
        &self,
        txn: TxnId,
        target: &LockTarget,
        mode: LockMode,
        timeout: Duration,
    ) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            let blockers = state.blockers(txn, target, mode);
            if blockers.is_empty() {
                state.grant(txn, target, mode);
                state.graph.clear_waits(txn);
                debug!(target: "isoprobe::lock", txn, %target, ?mode, "Lock granted");
                return Ok(());
            }

            if state.graph.would_deadlock(txn, &blockers) {
                state.graph.clear_waits(txn);
                warn!(
                    target: "isoprobe::lock",
                    txn, %target, ?mode, ?blockers,
                    "Deadlock detected, aborting requester"
                );
                return Err(Error::contention(
                    ContentionKind::Deadlock,
                    format!(
                        "Deadlock found when trying to get {:?} lock on {} for txn {}",
                        mode, target, txn
                    ),
                ));
            }

            if Instant::now() >= deadline {
                state.graph.clear_waits(txn);
                debug!(target: "isoprobe::lock", txn, %target, ?mode, "Lock wait timeout");
                return Err(Error::contention(
                    ContentionKind::LockWaitTimeout,
                    format!(
                        "Lock wait timeout exceeded after {:?} waiting for {:?} lock on {} (txn {})",
                        timeout, mode, target, txn
                    ),
                ));
            }

            debug!(target: "isoprobe::lock", txn, %target, ?mode, ?blockers, "Waiting for lock");
            state.graph.set_waits(txn, blockers);
            self.released.wait_until(&mut state, deadline);
        }
    }

    /// Release every lock held by `txn` and wake waiters
    ///
    /// Returns the number of locks released.
    pub fn release_all(&self, txn: TxnId) -> usize {
        let mut state = self.state.lock();
        let mut released = 0;
        state.holders.retain(|_, held| {
            if held.remove(&txn).is_some() {
                released += 1;
            }
            !held.is_empty()
        });
        state.graph.remove(txn);
        drop(state);

        if released > 0 {
            self.released.notify_all();
        }
        released
    }

    /// Mode `txn` holds on `target`, if any
    pub fn held_mode(&self, txn: TxnId, target: &LockTarget) -> Option<LockMode> {
        self.state
            .lock()
            .holders
            .get(target)
            .and_then(|held| held.get(&txn).copied())
    }

    /// Number of locks currently held by anyone
    pub fn lock_count(&self) -> usize {
        self.state.lock().holders.values().map(HashMap::len).sum()
    }

    /// Number of transactions currently blocked
    pub fn waiting_count(&self) -> usize {
        self.state.lock().graph.waiting_count()
    }
}
