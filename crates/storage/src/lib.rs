//! Storage layer for isoprobe
//!
//! This crate implements the in-memory row store used by the reference engine:
//! - Table: single integer column, pending rows per transaction
//! - Visibility: which rows a reader at a given isolation level observes
//! - MemoryStore: catalog of tables behind a `parking_lot::RwLock`,
//!   plus the commit version counter

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod store;
pub mod table;

pub use store::MemoryStore;
pub use table::{Row, RowId, RowState, Table, TxnId, Visibility};
