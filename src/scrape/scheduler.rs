//! Bounded worker pool over independent work units.
//!
//! Units run in pool-scheduling order with no ordering guarantees across
//! them; results are keyed by the unit identity passed into the worker, not
//! by completion order. One unit's failure never aborts its siblings: the
//! worker body owns all error handling, and the progress guard reports the
//! unit whatever happens inside.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::{UnitKey, UnitOutcome, WorkUnit};

use super::progress::{spawn_monitor, ProgressBoard};

/// Pool sizing and monitor cadence for one run.
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub workers: usize,
    pub monitor_interval: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            monitor_interval: Duration::from_millis(500),
        }
    }
}

/// Outcome of a full scheduler run.
#[derive(Debug)]
pub struct RunReport {
    outcomes: HashMap<UnitKey, UnitOutcome>,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn outcome_of(&self, key: &UnitKey) -> Option<UnitOutcome> {
        self.outcomes.get(key).copied()
    }

    fn count(&self, outcome: UnitOutcome) -> usize {
        self.outcomes.values().filter(|o| **o == outcome).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(UnitOutcome::Succeeded)
    }

    pub fn empty_skipped(&self) -> usize {
        self.count(UnitOutcome::EmptySkipped)
    }

    pub fn failed(&self) -> usize {
        self.count(UnitOutcome::Failed)
    }

    pub fn log_summary(&self) {
        info!(
            "run complete: {} units, {} succeeded, {} empty, {} failed",
            self.total(),
            self.succeeded(),
            self.empty_skipped(),
            self.failed()
        );
    }
}

/// Runs every unit through `unit_fn` across a fixed-size pool, tracking
/// completion on a shared progress board polled by a monitor task.
pub async fn run_pool<F, Fut>(units: Vec<WorkUnit>, config: PoolConfig, unit_fn: F) -> RunReport
where
    F: Fn(WorkUnit) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = UnitOutcome> + Send + 'static,
{
    let board = ProgressBoard::new(units.iter().map(WorkUnit::key));
    info!(
        "scheduling {} units across {} workers",
        board.total(),
        config.workers.max(1)
    );

    let token = CancellationToken::new();
    let monitor = spawn_monitor(board.clone(), config.monitor_interval, token.clone());

    let semaphore = Arc::new(Semaphore::new(config.workers.max(1)));
    let unit_fn = Arc::new(unit_fn);

    let mut handles = Vec::with_capacity(units.len());
    for unit in units {
        let semaphore = Arc::clone(&semaphore);
        let unit_fn = Arc::clone(&unit_fn);
        let guard = board.guard(unit.key());
        handles.push(tokio::spawn(async move {
            // the guard reports a failure if this task dies before finish
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            let outcome = unit_fn(unit).await;
            guard.finish(outcome);
        }));
    }

    for result in join_all(handles).await {
        if let Err(e) = result {
            warn!("worker task aborted: {e}");
        }
    }

    token.cancel();
    if let Err(e) = monitor.await {
        warn!("progress monitor aborted: {e}");
    }

    let report = RunReport {
        outcomes: board.outcomes(),
    };
    report.log_summary();
    report
}
