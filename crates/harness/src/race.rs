//! Race driver
//!
//! One race is two paths issuing the same conditional insert against the
//! shared table, each on its own connection:
//!
//! ```text
//! primary (caller thread)            worker ("race-worker")
//! ----------------------             ----------------------
//! truncate table
//! spawn worker ───────────────────▶  connect
//! connect                            arrive at barrier
//! arrive at barrier ◀──────────────▶ sleep worker_delay
//! insert (auto-commit or explicit)   begin; insert; commit
//! join worker ◀────────────────────  done
//! ```
//!
//! In [`SyncMode::Timing`] neither path waits at the barrier. The primary
//! always joins the worker before returning, so nothing inspects the table
//! while a racing statement may still be in flight.

use std::sync::Barrier;
use std::thread;

use tracing::debug;

use isoprobe_core::{run_in_transaction, Backend, Connection, Error, Result, Statement};

use crate::config::{PrimaryMode, ProbeConfig, SyncMode};

/// A path's turn at the rendezvous
///
/// Arrives on drop if the path bailed out early, so the other path is
/// never left waiting on a barrier that can no longer trip.
struct Arrival<'a> {
    barrier: Option<&'a Barrier>,
    arrived: bool,
}

impl<'a> Arrival<'a> {
    fn new(barrier: Option<&'a Barrier>) -> Self {
        Self {
            barrier,
            arrived: false,
        }
    }

    fn arrive(&mut self) {
        if self.arrived {
            return;
        }
        self.arrived = true;
        if let Some(barrier) = self.barrier {
            barrier.wait();
        }
    }
}

impl Drop for Arrival<'_> {
    fn drop(&mut self) {
        self.arrive();
    }
}

/// Run one race
///
/// Returns `Ok(())` when both inserts completed; the row count is then the
/// observable result. Otherwise returns the error of the failing path. When
/// both fail, an error other than lock contention takes precedence, then the
/// primary's.
///
/// # Errors
///
/// - `LockContention` when either path was refused a lock
/// - `Interrupted` when the worker thread could not be spawned or panicked
/// - any other backend error
pub fn race<B: Backend>(backend: &B, config: &ProbeConfig) -> Result<()> {
    let table = &config.table;
    let insert = Statement::insert_probe(table);
    {
        let mut conn = backend.connect()?;
        conn.execute(&Statement::truncate(table))?;
    }

    let barrier = match config.sync {
        SyncMode::Barrier => Some(Barrier::new(2)),
        SyncMode::Timing => None,
    };
    let barrier = barrier.as_ref();
    let insert = &insert;

    thread::scope(|scope| {
        let worker = thread::Builder::new()
            .name("race-worker".to_string())
            .spawn_scoped(scope, move || worker_path(backend, config, barrier, insert))
            .map_err(|e| Error::Interrupted(format!("failed to spawn worker thread: {}", e)))?;

        let primary = primary_path(backend, config, barrier, insert);
        let worker = worker
            .join()
            .map_err(|_| Error::Interrupted("worker thread panicked".to_string()))?;

        merge(primary, worker)
    })
}

fn worker_path<B: Backend>(
    backend: &B,
    config: &ProbeConfig,
    barrier: Option<&Barrier>,
    insert: &Statement,
) -> Result<()> {
    let mut arrival = Arrival::new(barrier);
    let mut conn = backend.connect()?;
    arrival.arrive();

    let delay = config.worker_delay();
    if !delay.is_zero() {
        thread::sleep(delay);
    }
    let rows = run_in_transaction(&mut conn, config.isolation, |c| c.execute(insert))?;
    debug!(target: "isoprobe::race", path = "worker", rows, "Insert committed");
    Ok(())
}

fn primary_path<B: Backend>(
    backend: &B,
    config: &ProbeConfig,
    barrier: Option<&Barrier>,
    insert: &Statement,
) -> Result<()> {
    let mut arrival = Arrival::new(barrier);
    let mut conn = backend.connect()?;
    arrival.arrive();

    let rows = match config.primary {
        PrimaryMode::AutoCommit => conn.execute(insert)?,
        PrimaryMode::Explicit => {
            run_in_transaction(&mut conn, config.isolation, |c| c.execute(insert))?
        }
    };
    debug!(target: "isoprobe::race", path = "primary", rows, "Insert committed");
    Ok(())
}

fn merge(primary: Result<()>, worker: Result<()>) -> Result<()> {
    match (primary, worker) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(err), Ok(())) | (Ok(()), Err(err)) => Err(err),
        (Err(primary), Err(worker)) => {
            debug!(target: "isoprobe::race", %primary, %worker, "Both paths failed");
            if primary.is_lock_contention() && !worker.is_lock_contention() {
                Err(worker)
            } else {
                Err(primary)
            }
        }
    }
}
