//! Core types and traits for isoprobe
//!
//! This crate defines the foundational types used throughout the system:
//! - Error: Error type hierarchy, including the lock contention kinds
//! - IsolationLevel: Transaction isolation levels a backend may honor
//! - TableName: Validated identifier for the shared probe table
//! - Statement: Typed form of every statement the probe issues
//! - Traits: Connection and Backend abstractions, plus `run_in_transaction`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod statement;
pub mod traits;
pub mod types;

// Re-export commonly used types and traits
pub use error::{Error, Result};
pub use statement::{Statement, PROBE_VALUE, VALUE_COLUMN};
pub use traits::{run_in_transaction, Backend, Connection};
pub use types::{ContentionKind, IsolationLevel, TableName};
