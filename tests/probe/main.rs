//! Probe Integration Tests
//!
//! End-to-end runs of the fixture, race driver, classifier and trial loop
//! against the in-memory engine (and SQLite with the `sqlite` feature).

#[path = "../common/mod.rs"]
mod common;

mod fixture;
mod scenarios;
#[cfg(feature = "sqlite")]
mod sqlite;
