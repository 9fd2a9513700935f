//! Trial loop
//!
//! Each trial resets the shared table, runs one race and classifies it.
//! [`Probe::run`] repeats until the lock contention target is reached,
//! failing on the first phantom read; [`Probe::sample`] runs a fixed number
//! of trials for engines where contention is rare.

use std::time::Instant;

use tracing::{debug, error, info};

use isoprobe_core::{Backend, Error, Result};

use crate::classify::{classify, RaceOutcome};
use crate::config::ProbeConfig;
use crate::fixture::{count_probe_rows, reset_table};
use crate::race::race;
use crate::report::ProbeReport;

/// Phantom read probe against one backend
#[derive(Debug)]
pub struct Probe<B: Backend> {
    backend: B,
    config: ProbeConfig,
}

impl<B: Backend> Probe<B> {
    /// Create a probe
    ///
    /// # Errors
    ///
    /// Returns `Config` if `config` fails validation.
    pub fn new(backend: B, config: ProbeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { backend, config })
    }

    /// Probe settings
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Backend under test
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run one trial: reset the table, race, classify
    pub fn trial(&self) -> Result<RaceOutcome> {
        let table = &self.config.table;
        let mut conn = self.backend.connect()?;
        reset_table(&mut conn, table)?;

        let result = race(&self.backend, &self.config);
        classify(result, || count_probe_rows(&mut conn, table))
    }

    /// Trial until `target_contentions` lock contention outcomes are seen
    ///
    /// # Errors
    ///
    /// - `PhantomRead` on the first race that double-inserted
    /// - `ContentionTargetNotReached` once `max_trials` are spent
    /// - any fatal fixture, race or classification error
    pub fn run(&self) -> Result<ProbeReport> {
        let started = Instant::now();
        let target = self.config.target_contentions;
        let mut report = ProbeReport::new(self.backend.name(), &self.config);
        let mut observed = 0;

        for trial in 1..=self.config.max_trials {
            let outcome = self.observe(trial)?;
            report.record(&outcome);
            if let RaceOutcome::LockContention { .. } = outcome {
                observed += 1;
                if observed == target {
                    info!(
                        target: "isoprobe::probe",
                        trials = trial, contentions = observed,
                        "Contention target reached without phantom reads"
                    );
                    return Ok(report.finish(started.elapsed()));
                }
            }
        }

        Err(Error::ContentionTargetNotReached {
            trials: self.config.max_trials,
            observed,
            target,
        })
    }

    /// Run exactly `trials` trials and report the tallies
    ///
    /// # Errors
    ///
    /// Same as [`Probe::run`], minus the contention target.
    pub fn sample(&self, trials: u64) -> Result<ProbeReport> {
        let started = Instant::now();
        let mut report = ProbeReport::new(self.backend.name(), &self.config);
        for trial in 1..=trials {
            let outcome = self.observe(trial)?;
            report.record(&outcome);
        }
        info!(
            target: "isoprobe::probe",
            trials, clean = report.clean, contentions = report.total_contentions(),
            "Sample complete"
        );
        Ok(report.finish(started.elapsed()))
    }

    /// One trial, with a phantom read turned into an error
    fn observe(&self, trial: u64) -> Result<RaceOutcome> {
        let outcome = self.trial()?;
        match outcome {
            RaceOutcome::PhantomRead { rows } => {
                error!(target: "isoprobe::probe", trial, rows, "Phantom read");
                Err(Error::PhantomRead { trial, rows })
            }
            RaceOutcome::LockContention { kind } => {
                info!(target: "isoprobe::probe", trial, %kind, "Lock contention");
                Ok(outcome)
            }
            RaceOutcome::CleanIsolation => {
                debug!(target: "isoprobe::probe", trial, "Clean isolation");
                Ok(outcome)
            }
        }
    }
}
