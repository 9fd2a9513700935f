//! Wait-for graph for deadlock detection
//!
//! An edge `a -> b` means transaction `a` is blocked on a lock held by `b`.
//! A transaction about to block checks whether any of its blockers can
//! already reach it; if so, waiting would close a cycle.

use std::collections::{HashMap, HashSet};

use isoprobe_storage::TxnId;

/// Directed wait-for graph between transactions
#[derive(Debug, Default)]
pub struct WaitForGraph {
    edges: HashMap<TxnId, HashSet<TxnId>>,
}

impl WaitForGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `waiter` blocking on `blockers` would close a cycle
    pub fn would_deadlock(&self, waiter: TxnId, blockers: &HashSet<TxnId>) -> bool {
        let mut stack: Vec<TxnId> = blockers.iter().copied().collect();
        let mut seen = HashSet::new();
        while let Some(txn) = stack.pop() {
            if txn == waiter {
                return true;
            }
            if !seen.insert(txn) {
                continue;
            }
            if let Some(next) = self.edges.get(&txn) {
                stack.extend(next.iter().copied());
            }
        }
        false
    }

    /// Record that `waiter` is blocked on `blockers`, replacing older edges
    pub fn set_waits(&mut self, waiter: TxnId, blockers: HashSet<TxnId>) {
        self.edges.insert(waiter, blockers);
    }

    /// `waiter` is no longer blocked
    pub fn clear_waits(&mut self, waiter: TxnId) {
        self.edges.remove(&waiter);
    }

    /// Forget `txn` entirely, as waiter and as blocker
    pub fn remove(&mut self, txn: TxnId) {
        self.edges.remove(&txn);
        for blockers in self.edges.values_mut() {
            blockers.remove(&txn);
        }
        self.edges.retain(|_, blockers| !blockers.is_empty());
    }

    #[cfg(test)]
    fn waits_of(&self, waiter: TxnId) -> Option<&HashSet<TxnId>> {
        self.edges.get(&waiter)
    }

    /// Number of blocked transactions
    pub fn waiting_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(ids: &[TxnId]) -> HashSet<TxnId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_two_party_cycle() {
        let mut graph = WaitForGraph::new();
        graph.set_waits(1, set(&[2]));
        assert!(graph.would_deadlock(2, &set(&[1])));
    }

    #[test]
    fn test_no_cycle_without_back_edge() {
        let mut graph = WaitForGraph::new();
        graph.set_waits(1, set(&[2]));
        assert!(!graph.would_deadlock(3, &set(&[1])));
        assert!(!graph.would_deadlock(1, &set(&[2])));
    }

    #[test]
    fn test_transitive_cycle() {
        let mut graph = WaitForGraph::new();
        graph.set_waits(1, set(&[2]));
        graph.set_waits(2, set(&[3]));
        assert!(graph.would_deadlock(3, &set(&[1])));
    }

    #[test]
    fn test_remove_breaks_cycle() {
        let mut graph = WaitForGraph::new();
        graph.set_waits(1, set(&[2]));
        graph.set_waits(2, set(&[3]));
        graph.remove(2);
        assert!(!graph.would_deadlock(3, &set(&[1])));
        assert_eq!(graph.waiting_count(), 0);
    }

    #[test]
    fn test_clear_waits() {
        let mut graph = WaitForGraph::new();
        graph.set_waits(1, set(&[2]));
        assert!(graph.waits_of(1).is_some());
        graph.clear_waits(1);
        assert!(graph.waits_of(1).is_none());
    }

    proptest! {
        #[test]
        fn prop_chain_deadlocks_only_when_closed(len in 2u64..12, start in 1u64..12) {
            // 1 -> 2 -> ... -> len
            let mut graph = WaitForGraph::new();
            for txn in 1..len {
                graph.set_waits(txn, set(&[txn + 1]));
            }
            prop_assert!(graph.would_deadlock(len, &set(&[start.min(len - 1)])));
            prop_assert!(!graph.would_deadlock(len + 1, &set(&[start.min(len)])));
        }
    }
}
