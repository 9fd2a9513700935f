//! isoprobe: transaction isolation probe.
//!
//! Races two conditional inserts against the configured database and fails
//! (exit code 1) on a phantom read or when the lock contention target is
//! not reached within the trial bound.
//!
//! - `isoprobe run`: race until the contention target is reached
//! - `isoprobe sample --trials N`: race N times and report the tallies
//! - `isoprobe config`: print the default configuration file

mod commands;
mod format;
mod settings;

use std::process;

use anyhow::{Context, Result};
use tracing::debug;

use isoprobe_core::Backend;
use isoprobe_engine::{BackendConfig, MemoryDatabase};
use isoprobe_harness::{Probe, ProbeConfig, ProbeReport};

use commands::build_cli;
use format::{format_report, OutputMode};
use settings::Settings;

/// What to do with a configured probe.
#[derive(Debug, Clone, Copy)]
enum Action {
    Run,
    Sample(u64),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("isoprobe: error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = build_cli().get_matches();
    let action = match matches.subcommand() {
        Some(("config", _)) => {
            print!("{}", Settings::default_toml());
            return Ok(());
        }
        Some(("sample", sub)) => Action::Sample(sub.get_one::<u64>("trials").copied().unwrap_or(100)),
        _ => Action::Run,
    };
    let mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let settings = Settings::load(&matches)?;
    debug!(target: "isoprobe::cli", ?settings, ?action, "Settings loaded");

    let report = match &settings.backend {
        BackendConfig::Memory(memory) => {
            probe(MemoryDatabase::new(memory.clone()), settings.probe.clone(), action)?
        }
        #[cfg(feature = "sqlite")]
        BackendConfig::Sqlite(sqlite) => probe(
            isoprobe_engine::SqliteBackend::from_config(sqlite),
            settings.probe.clone(),
            action,
        )?,
        #[cfg(not(feature = "sqlite"))]
        BackendConfig::Sqlite(_) => {
            anyhow::bail!("the sqlite backend requires building with the `sqlite` feature")
        }
    };

    println!("{}", format_report(&report, mode));
    Ok(())
}

fn probe<B: Backend>(backend: B, config: ProbeConfig, action: Action) -> Result<ProbeReport> {
    let name = backend.name();
    let probe = Probe::new(backend, config)?;
    let report = match action {
        Action::Run => probe.run(),
        Action::Sample(trials) => probe.sample(trials),
    };
    report.with_context(|| format!("probe against the {} backend failed", name))
}
