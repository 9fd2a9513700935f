//! Configuration via `isoprobe.toml` plus command-line overrides.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};

use isoprobe_core::IsolationLevel;
use isoprobe_engine::{BackendConfig, MemoryConfig, SqliteConfig};
use isoprobe_harness::{PrimaryMode, ProbeConfig, SyncMode};

/// Everything a probe run needs: `[probe]` and `[backend]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Race and trial loop settings.
    #[serde(default)]
    pub probe: ProbeConfig,
    /// Database to race against.
    #[serde(default)]
    pub backend: BackendConfig,
}

impl Settings {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# isoprobe configuration

[probe]
# Shared table both racing paths insert into
table = "t"
# Lock contention outcomes (deadlock, lock wait timeout, busy) to observe
target_contentions = 1
# Give up after this many trials
max_trials = 10000
# "barrier" lines both paths up before the insert, "timing" does not
sync = "barrier"
# Worker sleep between rendezvous and insert
worker_delay_ms = 1
# "auto-commit" or "explicit" transaction for the primary path
primary = "auto-commit"
# Isolation of the explicit transactions (default: database default)
# isolation = "read-committed"

[backend]
kind = "memory"
default_isolation = "repeatable-read"
lock_wait_timeout_ms = 1000
# Pause between existence check and insert; lets the two inserts overlap
read_write_gap_ms = 5

# [backend]
# kind = "sqlite"
# path = "probe.db"
# busy_timeout_ms = 0
"#
    }

    /// Read and parse settings from a file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))
    }

    /// Settings from `--config` (or defaults) with flag overrides applied.
    pub fn load(matches: &ArgMatches) -> Result<Self> {
        let mut settings = match matches.get_one::<String>("config") {
            Some(path) => Self::from_file(Path::new(path))?,
            None => Self::default(),
        };
        settings.apply_args(matches)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply command-line overrides.
    pub fn apply_args(&mut self, matches: &ArgMatches) -> Result<()> {
        let db = matches.get_one::<String>("db").map(PathBuf::from);
        match (matches.get_one::<String>("backend").map(String::as_str), db) {
            (Some("memory"), Some(_)) => bail!("--db only applies to the sqlite backend"),
            (Some("memory"), None) => {
                if !matches!(self.backend, BackendConfig::Memory(_)) {
                    self.backend = BackendConfig::Memory(MemoryConfig::default());
                }
            }
            (_, Some(path)) => match &mut self.backend {
                BackendConfig::Sqlite(sqlite) => sqlite.path = path,
                BackendConfig::Memory(_) => {
                    self.backend = BackendConfig::Sqlite(SqliteConfig::new(path))
                }
            },
            (Some(_), None) => {
                if !matches!(self.backend, BackendConfig::Sqlite(_)) {
                    bail!("--backend sqlite requires --db PATH or a [backend] path in the config file");
                }
            }
            (None, None) => {}
        }

        if let Some(level) = matches.get_one::<String>("isolation") {
            self.probe.isolation = Some(IsolationLevel::from_str(level)?);
        }
        if let Some(target) = matches.get_one::<u64>("target") {
            self.probe.target_contentions = *target;
        }
        if let Some(max_trials) = matches.get_one::<u64>("max-trials") {
            self.probe.max_trials = *max_trials;
        }
        if matches.get_flag("timing") {
            self.probe.sync = SyncMode::Timing;
        }
        if matches.get_flag("explicit-primary") {
            self.probe.primary = PrimaryMode::Explicit;
        }
        if let Some(delay) = matches.get_one::<u64>("worker-delay-ms") {
            self.probe.worker_delay_ms = *delay;
        }
        if let Some(gap) = matches.get_one::<u64>("read-write-gap-ms") {
            match &mut self.backend {
                BackendConfig::Memory(memory) => memory.read_write_gap_ms = *gap,
                BackendConfig::Sqlite(_) => {
                    bail!("--read-write-gap-ms only applies to the memory backend")
                }
            }
        }
        Ok(())
    }

    /// Check both sections.
    pub fn validate(&self) -> Result<()> {
        self.probe.validate()?;
        self.backend.validate()?;
        Ok(())
    }
}
