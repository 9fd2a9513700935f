//! Summary of a probe run

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use isoprobe_core::{ContentionKind, IsolationLevel};

use crate::classify::RaceOutcome;
use crate::config::{ProbeConfig, SyncMode};

/// Tallies of one `run` or `sample`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    /// Unique id of this run
    pub run_id: Uuid,
    /// Backend the probe raced against
    pub backend: String,
    /// Isolation of the explicit transactions, if overridden
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isolation: Option<IsolationLevel>,
    /// Rendezvous strategy
    pub sync: SyncMode,
    /// Wall-clock start
    pub started_at: DateTime<Utc>,
    /// Trials executed
    pub trials: u64,
    /// Trials that ended in clean isolation
    pub clean: u64,
    /// Trials that ended in lock contention, by kind
    pub contentions: BTreeMap<ContentionKind, u64>,
    /// Run duration in milliseconds
    pub elapsed_ms: u64,
}

impl ProbeReport {
    /// Empty report for a run starting now
    pub fn new(backend: &str, config: &ProbeConfig) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            backend: backend.to_string(),
            isolation: config.isolation,
            sync: config.sync,
            started_at: Utc::now(),
            trials: 0,
            clean: 0,
            contentions: BTreeMap::new(),
            elapsed_ms: 0,
        }
    }

    /// Count one trial
    ///
    /// Phantom reads end a run before they are recorded, so they only
    /// bump the trial count.
    pub fn record(&mut self, outcome: &RaceOutcome) {
        self.trials += 1;
        match outcome {
            RaceOutcome::CleanIsolation => self.clean += 1,
            RaceOutcome::LockContention { kind } => {
                *self.contentions.entry(*kind).or_insert(0) += 1;
            }
            RaceOutcome::PhantomRead { .. } => {}
        }
    }

    /// Lock contention outcomes of every kind
    pub fn total_contentions(&self) -> u64 {
        self.contentions.values().sum()
    }

    /// Set the elapsed time
    pub fn finish(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self
    }
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "run {} against {} ({} sync)", self.run_id, self.backend, self.sync)?;
        if let Some(isolation) = self.isolation {
            writeln!(f, "  isolation:   {}", isolation)?;
        }
        writeln!(f, "  trials:      {}", self.trials)?;
        writeln!(f, "  clean:       {}", self.clean)?;
        write!(f, "  contentions: {}", self.total_contentions())?;
        for (kind, count) in &self.contentions {
            write!(f, "\n    {}: {}", kind, count)?;
        }
        write!(f, "\n  elapsed:     {} ms", self.elapsed_ms)
    }
}
