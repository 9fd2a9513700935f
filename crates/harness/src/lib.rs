//! Race-and-verify protocol of the isolation probe
//!
//! This crate drives the probe against any [`isoprobe_core::Backend`]:
//! - fixture: resets the shared table before every trial
//! - race: two paths collide on the same conditional insert
//! - classify: clean isolation, phantom read or lock contention
//! - trial: the loop that repeats races until the contention target is met
//! - report: tallies of a run

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod classify;
pub mod config;
pub mod fixture;
pub mod race;
pub mod report;
pub mod trial;

pub use classify::{classify, classify_rows, RaceOutcome};
pub use config::{PrimaryMode, ProbeConfig, SyncMode};
pub use fixture::{count_probe_rows, reset_table};
pub use race::race;
pub use report::ProbeReport;
pub use trial::Probe;
