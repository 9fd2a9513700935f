//! Concurrency layer for isoprobe
//!
//! This crate implements pessimistic concurrency control for the reference engine:
//! - Transaction: lifecycle state and read visibility per isolation level
//! - TransactionManager: id allocation and lifecycle counters
//! - LockManager: shared/exclusive predicate locks held until commit or abort
//! - WaitForGraph: deadlock detection on lock waits

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod deadlock;
pub mod lock;
pub mod manager;
pub mod transaction;

pub use deadlock::WaitForGraph;
pub use lock::{LockManager, LockMode, LockTarget};
pub use manager::{TransactionManager, TransactionStats};
pub use transaction::{Transaction, TransactionStatus};
