//! Core types for isoprobe
//!
//! This module defines the foundational types:
//! - IsolationLevel: SQL transaction isolation levels
//! - ContentionKind: How a database refused a lock
//! - TableName: Validated SQL identifier for the probe table

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// SQL transaction isolation level
///
/// Levels are ordered from weakest to strongest, so `level >= RepeatableRead`
/// reads as "at least repeatable read".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IsolationLevel {
    /// Reads may observe uncommitted rows of other transactions
    ReadUncommitted,
    /// Each statement reads the latest committed rows
    ReadCommitted,
    /// Locking reads protect the ranges they examined until commit
    RepeatableRead,
    /// Fully serializable execution
    Serializable,
}

impl IsolationLevel {
    /// All levels, weakest first
    pub const ALL: [IsolationLevel; 4] = [
        IsolationLevel::ReadUncommitted,
        IsolationLevel::ReadCommitted,
        IsolationLevel::RepeatableRead,
        IsolationLevel::Serializable,
    ];

    /// Whether an existence check at this level must lock the range it examined
    ///
    /// Levels below repeatable read leave the range unprotected, which is
    /// exactly the window a phantom insert slips through.
    pub fn locks_ranges(self) -> bool {
        self >= IsolationLevel::RepeatableRead
    }

    /// SQL spelling, e.g. `READ COMMITTED`
    pub fn as_sql(self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for IsolationLevel {
    type Err = Error;

    /// Accepts `read-committed`, `read_committed` and `READ COMMITTED` alike.
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '-' | '_' | ' ' => ' ',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        IsolationLevel::ALL
            .into_iter()
            .find(|level| level.as_sql() == normalized)
            .ok_or_else(|| Error::InvalidInput(format!("unknown isolation level '{}'", s)))
    }
}

/// How the database refused to grant a lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentionKind {
    /// The transaction was chosen as a deadlock victim
    Deadlock,
    /// The transaction waited longer than the lock wait timeout
    LockWaitTimeout,
    /// The database reported itself busy or locked
    Busy,
}

impl fmt::Display for ContentionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentionKind::Deadlock => f.write_str("deadlock"),
            ContentionKind::LockWaitTimeout => f.write_str("lock wait timeout"),
            ContentionKind::Busy => f.write_str("busy"),
        }
    }
}

/// Validated SQL identifier naming the probe table
///
/// Only ASCII letters, digits and `_` are accepted, and the name may not
/// start with a digit, so it can be spliced into SQL text without quoting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName(String);

impl TableName {
    /// Validate and wrap a table name
    ///
    /// # Errors
    /// Returns `InvalidInput` for empty names or names with other characters.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let mut chars = name.chars();
        let valid_start = chars
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false);
        if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::InvalidInput(format!(
                "invalid table name '{}': expected [A-Za-z_][A-Za-z0-9_]*",
                name
            )));
        }
        Ok(Self(name))
    }

    /// The identifier as written in SQL
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TableName {
    fn default() -> Self {
        Self("t".to_string())
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TableName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<TableName> for String {
    fn from(name: TableName) -> Self {
        name.0
    }
}

impl FromStr for TableName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}
