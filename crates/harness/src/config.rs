//! Probe configuration, the `[probe]` table of `isoprobe.toml`

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use isoprobe_core::{Error, IsolationLevel, Result, TableName};

/// How the two racing paths line up before the critical insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// Both paths rendezvous on a two-party barrier
    #[default]
    Barrier,
    /// No rendezvous; overlap relies on thread start-up timing alone
    Timing,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::Barrier => f.write_str("barrier"),
            SyncMode::Timing => f.write_str("timing"),
        }
    }
}

/// How the primary path issues its insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrimaryMode {
    /// Single auto-committed statement at the database default isolation
    #[default]
    AutoCommit,
    /// Inside an explicit transaction, like the worker
    Explicit,
}

/// Settings of one probe run
///
/// # Example
///
/// ```toml
/// [probe]
/// table = "t"
/// target_contentions = 1
/// max_trials = 10000
/// sync = "barrier"
/// worker_delay_ms = 1
/// primary = "auto-commit"
/// # isolation = "read-committed"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Shared table both paths insert into
    pub table: TableName,
    /// Lock contention outcomes to observe before the run succeeds
    pub target_contentions: u64,
    /// Upper bound on trials before the run gives up
    pub max_trials: u64,
    /// Rendezvous strategy
    pub sync: SyncMode,
    /// Worker sleep between rendezvous and insert
    pub worker_delay_ms: u64,
    /// Primary path transaction style
    pub primary: PrimaryMode,
    /// Isolation of the explicit transactions; `None` uses the database default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isolation: Option<IsolationLevel>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            table: TableName::default(),
            target_contentions: 1,
            max_trials: 10_000,
            sync: SyncMode::Barrier,
            worker_delay_ms: 1,
            primary: PrimaryMode::AutoCommit,
            isolation: None,
        }
    }
}

impl ProbeConfig {
    /// Set the table name
    pub fn with_table(mut self, table: TableName) -> Self {
        self.table = table;
        self
    }

    /// Set the contention target
    pub fn with_target_contentions(mut self, target: u64) -> Self {
        self.target_contentions = target;
        self
    }

    /// Set the trial bound
    pub fn with_max_trials(mut self, max_trials: u64) -> Self {
        self.max_trials = max_trials;
        self
    }

    /// Set the rendezvous strategy
    pub fn with_sync(mut self, sync: SyncMode) -> Self {
        self.sync = sync;
        self
    }

    /// Set the worker delay
    pub fn with_worker_delay_ms(mut self, ms: u64) -> Self {
        self.worker_delay_ms = ms;
        self
    }

    /// Set the primary path transaction style
    pub fn with_primary(mut self, primary: PrimaryMode) -> Self {
        self.primary = primary;
        self
    }

    /// Set the isolation level of the explicit transactions
    pub fn with_isolation(mut self, isolation: Option<IsolationLevel>) -> Self {
        self.isolation = isolation;
        self
    }

    /// Worker delay as a `Duration`
    pub fn worker_delay(&self) -> Duration {
        Duration::from_millis(self.worker_delay_ms)
    }

    /// Reject settings a run cannot complete with
    ///
    /// # Errors
    ///
    /// Returns `Config` if the target is zero or exceeds the trial bound.
    pub fn validate(&self) -> Result<()> {
        if self.target_contentions == 0 {
            return Err(Error::config("target_contentions must be at least 1"));
        }
        if self.max_trials < self.target_contentions {
            return Err(Error::config(format!(
                "max_trials ({}) must be at least target_contentions ({})",
                self.max_trials, self.target_contentions
            )));
        }
        Ok(())
    }
}
