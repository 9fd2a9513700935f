//! Backend configuration, the `[backend]` table of `isoprobe.toml`
//!
//! ```toml
//! [backend]
//! kind = "memory"
//! default_isolation = "repeatable-read"
//! lock_wait_timeout_ms = 1000
//! read_write_gap_ms = 5
//! ```
//!
//! or
//!
//! ```toml
//! [backend]
//! kind = "sqlite"
//! path = "probe.db"
//! busy_timeout_ms = 0
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use isoprobe_core::{Error, IsolationLevel, Result};

/// Which database the probe races against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BackendConfig {
    /// The in-process reference engine
    Memory(MemoryConfig),
    /// A SQLite database file (requires the `sqlite` feature)
    Sqlite(SqliteConfig),
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Memory(MemoryConfig::default())
    }
}

impl BackendConfig {
    /// Backend name as used in logs and reports
    pub fn name(&self) -> &'static str {
        match self {
            BackendConfig::Memory(_) => "memory",
            BackendConfig::Sqlite(_) => "sqlite",
        }
    }

    /// Check the configuration for values no backend can run with
    ///
    /// # Errors
    ///
    /// Returns `Config` for an empty SQLite path.
    pub fn validate(&self) -> Result<()> {
        match self {
            BackendConfig::Memory(_) => Ok(()),
            BackendConfig::Sqlite(sqlite) if sqlite.path.as_os_str().is_empty() => {
                Err(Error::config("sqlite backend requires a non-empty `path`"))
            }
            BackendConfig::Sqlite(_) => Ok(()),
        }
    }
}

/// Settings of the in-memory reference engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Isolation for auto-commit statements and `begin(None)`
    pub default_isolation: IsolationLevel,
    /// How long a statement waits for a lock before giving up
    pub lock_wait_timeout_ms: u64,
    /// Pause between a conditional insert's existence check and its write
    ///
    /// The engine finishes a check-then-insert in microseconds, so without
    /// a gap two racing inserters almost never overlap. Zero disables it.
    pub read_write_gap_ms: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            default_isolation: IsolationLevel::RepeatableRead,
            lock_wait_timeout_ms: 1000,
            read_write_gap_ms: 5,
        }
    }
}

impl MemoryConfig {
    /// Set the default isolation level
    pub fn with_default_isolation(mut self, level: IsolationLevel) -> Self {
        self.default_isolation = level;
        self
    }

    /// Set the lock wait timeout
    pub fn with_lock_wait_timeout_ms(mut self, ms: u64) -> Self {
        self.lock_wait_timeout_ms = ms;
        self
    }

    /// Set the pause between existence check and write
    pub fn with_read_write_gap_ms(mut self, ms: u64) -> Self {
        self.read_write_gap_ms = ms;
        self
    }

    /// Lock wait timeout as a `Duration`
    pub fn lock_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_wait_timeout_ms)
    }

    /// Read/write gap as a `Duration`
    pub fn read_write_gap(&self) -> Duration {
        Duration::from_millis(self.read_write_gap_ms)
    }
}

/// Settings of the SQLite backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Database file, created if missing
    pub path: PathBuf,
    /// SQLite busy timeout; 0 reports contention immediately
    #[serde(default)]
    pub busy_timeout_ms: u64,
}

impl SqliteConfig {
    /// Configuration for `path` with no busy timeout
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: 0,
        }
    }

    /// Set the busy timeout
    pub fn with_busy_timeout_ms(mut self, ms: u64) -> Self {
        self.busy_timeout_ms = ms;
        self
    }

    /// Busy timeout as a `Duration`
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}
