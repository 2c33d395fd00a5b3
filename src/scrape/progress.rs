//! Shared progress tracking across the worker pool.
//!
//! One entry per work unit, incremented exactly once when the unit
//! finishes, whatever the outcome. Workers hold a [`CompletionGuard`]
//! instead of touching the board directly: a guard that is dropped without
//! reporting (worker error, panic, cancellation) records the unit as
//! failed, so the increment is guaranteed on every path.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::{UnitKey, UnitOutcome};

struct BoardState {
    completed: HashMap<UnitKey, u8>,
    outcomes: HashMap<UnitKey, UnitOutcome>,
}

/// Process-wide completion map, cloneable across workers and the monitor.
#[derive(Clone)]
pub struct ProgressBoard {
    state: Arc<Mutex<BoardState>>,
    total: usize,
}

impl ProgressBoard {
    pub fn new(keys: impl IntoIterator<Item = UnitKey>) -> Self {
        let completed: HashMap<UnitKey, u8> = keys.into_iter().map(|k| (k, 0)).collect();
        let total = completed.len();
        Self {
            state: Arc::new(Mutex::new(BoardState {
                completed,
                outcomes: HashMap::new(),
            })),
            total,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.lock().completed.values().map(|v| *v as usize).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.completed() >= self.total
    }

    pub fn outcomes(&self) -> HashMap<UnitKey, UnitOutcome> {
        self.lock().outcomes.clone()
    }

    /// Hands out the completion hook for one unit.
    pub fn guard(&self, key: UnitKey) -> CompletionGuard {
        CompletionGuard {
            board: self.clone(),
            key: Some(key),
        }
    }

    fn record(&self, key: &UnitKey, outcome: UnitOutcome) {
        let mut guard = self.lock();
        let state = &mut *guard;
        match state.completed.get_mut(key) {
            Some(count) if *count == 0 => {
                *count = 1;
                state.outcomes.insert(key.clone(), outcome);
            }
            Some(_) => warn!("unit {key} reported completion more than once"),
            None => warn!("unit {key} completed but was never scheduled"),
        }
    }
}

/// Scoped on-completion hook for one unit.
///
/// `finish` consumes the guard with the real outcome; dropping it
/// unconsumed records the unit as failed. Either way the board entry is
/// incremented exactly once.
pub struct CompletionGuard {
    board: ProgressBoard,
    key: Option<UnitKey>,
}

impl CompletionGuard {
    pub fn finish(mut self, outcome: UnitOutcome) {
        if let Some(key) = self.key.take() {
            self.board.record(&key, outcome);
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            warn!("unit {key} never reported an outcome, recording as failed");
            self.board.record(&key, UnitOutcome::Failed);
        }
    }
}

fn render(board: &ProgressBoard) {
    let done = board.completed();
    let total = board.total().max(1);
    let filled = done * 20 / total;
    let bar: String = (0..20).map(|i| if i < filled { '#' } else { '-' }).collect();
    info!("[{bar}] {done}/{} units", board.total());
}

/// Polls the board on a fixed cadence and renders a coarse progress bar,
/// terminating once every unit has reported (or on cancellation).
pub fn spawn_monitor(
    board: ProgressBoard,
    interval: Duration,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    render(&board);
                    if board.is_complete() {
                        break;
                    }
                }
            }
        }
        render(&board);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WorkUnit;

    fn keys(names: &[&str]) -> Vec<UnitKey> {
        names
            .iter()
            .map(|n| WorkUnit::new(vec![("STATE_NAME", (*n).to_string())]).key())
            .collect()
    }

    #[test]
    fn finishing_a_guard_reports_exactly_once() {
        let board = ProgressBoard::new(keys(&["A", "B"]));
        assert_eq!(board.completed(), 0);

        let guard = board.guard(keys(&["A"])[0].clone());
        guard.finish(UnitOutcome::Succeeded);
        assert_eq!(board.completed(), 1);
        assert!(!board.is_complete());
    }

    #[test]
    fn dropping_a_guard_records_a_failure() {
        let board = ProgressBoard::new(keys(&["A"]));
        {
            let _guard = board.guard(keys(&["A"])[0].clone());
            // worker dies here without reporting
        }
        assert_eq!(board.completed(), 1);
        assert_eq!(
            board.outcomes().values().next().copied(),
            Some(UnitOutcome::Failed)
        );
    }

    #[test]
    fn double_reports_do_not_inflate_the_count() {
        let board = ProgressBoard::new(keys(&["A"]));
        let key = keys(&["A"])[0].clone();
        board.guard(key.clone()).finish(UnitOutcome::Succeeded);
        board.guard(key).finish(UnitOutcome::Failed);
        assert_eq!(board.completed(), 1);
        assert_eq!(
            board.outcomes().values().next().copied(),
            Some(UnitOutcome::Succeeded)
        );
    }

    #[tokio::test]
    async fn monitor_terminates_once_the_sum_reaches_the_total() {
        let board = ProgressBoard::new(keys(&["A", "B"]));
        let token = CancellationToken::new();
        let monitor = spawn_monitor(board.clone(), Duration::from_millis(2), token);

        board.guard(keys(&["A"])[0].clone()).finish(UnitOutcome::Succeeded);
        board.guard(keys(&["B"])[0].clone()).finish(UnitOutcome::EmptySkipped);

        tokio::time::timeout(Duration::from_secs(1), monitor)
            .await
            .expect("monitor should stop at full completion")
            .expect("monitor task should not panic");
    }
}
