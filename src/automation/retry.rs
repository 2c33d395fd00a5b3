//! Bounded-retry combinators.
//!
//! The dashboard exposes no render-complete signal, so every wait in the
//! scrape core is a bounded poll. The three policies that used to live as
//! inline loop state are named here so they can be tested in isolation:
//! a clickability-style wait with a deadline, a stale-read retry, and the
//! "stable for K consecutive reads" gate that terminates grid accumulation.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use super::{AutomationError, AutomationResult};

/// Deadline and poll cadence for a bounded wait.
#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            poll: Duration::from_millis(250),
        }
    }
}

/// Polls `probe` until it yields a value or the deadline passes.
///
/// A probe returning `Ok(None)` or a transient error keeps the wait alive;
/// any other error aborts it immediately.
pub async fn wait_until<T, F, Fut>(
    policy: WaitPolicy,
    what: &str,
    mut probe: F,
) -> AutomationResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AutomationResult<Option<T>>>,
{
    let started = Instant::now();
    loop {
        match probe().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e) if e.is_transient() => {
                debug!("transient error while waiting for {what}: {e}");
            }
            Err(e) => return Err(e),
        }

        if started.elapsed() >= policy.timeout {
            return Err(AutomationError::Timeout {
                what: what.to_string(),
                waited: started.elapsed(),
            });
        }
        sleep(policy.poll).await;
    }
}

/// Re-runs `op` on a stale-element error, re-fetching fresh handles each
/// attempt. Any other error is returned as-is.
pub async fn with_stale_retry<T, F, Fut>(max_attempts: u32, mut op: F) -> AutomationResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AutomationResult<T>>,
{
    let mut remaining = max_attempts.max(1);
    loop {
        match op().await {
            Err(AutomationError::Stale(detail)) => {
                remaining -= 1;
                if remaining == 0 {
                    return Err(AutomationError::Stale(detail));
                }
                debug!("stale read, {remaining} attempts left");
            }
            other => return other,
        }
    }
}

/// Termination gate for "no progress across K consecutive observations".
///
/// Every observation that makes progress refills the budget; every
/// observation that does not spends one unit of it. The owner stops once
/// the budget is exhausted.
#[derive(Debug, Clone)]
pub struct StabilityGate {
    budget: u32,
    remaining: u32,
}

impl StabilityGate {
    pub fn new(budget: u32) -> Self {
        let budget = budget.max(1);
        Self {
            budget,
            remaining: budget,
        }
    }

    pub fn observe(&mut self, progressed: bool) {
        if progressed {
            self.remaining = self.budget;
        } else {
            self.remaining = self.remaining.saturating_sub(1);
        }
    }

    pub fn exhausted(&self) -> bool {
        self.remaining == 0
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn wait_until_returns_first_hit() {
        let calls = AtomicU32::new(0);
        let policy = WaitPolicy {
            timeout: Duration::from_millis(200),
            poll: Duration::from_millis(1),
        };
        let value = wait_until(policy, "thing", || async {
            if calls.fetch_add(1, Ordering::SeqCst) >= 2 {
                Ok(Some(42))
            } else {
                Ok(None)
            }
        })
        .await
        .unwrap();
        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn wait_until_times_out_when_nothing_appears() {
        let policy = WaitPolicy {
            timeout: Duration::from_millis(10),
            poll: Duration::from_millis(2),
        };
        let result: AutomationResult<()> =
            wait_until(policy, "missing option", || async { Ok(None) }).await;
        assert!(matches!(result, Err(AutomationError::Timeout { .. })));
    }

    #[tokio::test]
    async fn wait_until_survives_transient_errors() {
        let calls = AtomicU32::new(0);
        let policy = WaitPolicy {
            timeout: Duration::from_millis(200),
            poll: Duration::from_millis(1),
        };
        let value = wait_until(policy, "thing", || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(AutomationError::Stale("row".into()))
            } else {
                Ok(Some("ok"))
            }
        })
        .await
        .unwrap();
        assert_eq!(value, "ok");
    }

    #[tokio::test]
    async fn wait_until_propagates_fatal_errors() {
        let policy = WaitPolicy {
            timeout: Duration::from_millis(50),
            poll: Duration::from_millis(1),
        };
        let result: AutomationResult<()> = wait_until(policy, "thing", || async {
            Err(AutomationError::Driver("session died".into()))
        })
        .await;
        assert!(matches!(result, Err(AutomationError::Driver(_))));
    }

    #[tokio::test]
    async fn stale_retry_gives_up_after_budget() {
        let calls = AtomicU32::new(0);
        let result: AutomationResult<()> = with_stale_retry(5, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AutomationError::Stale("grid rebuilt".into()))
        })
        .await;
        assert!(matches!(result, Err(AutomationError::Stale(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn stale_retry_recovers_mid_budget() {
        let calls = AtomicU32::new(0);
        let value = with_stale_retry(5, || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(AutomationError::Stale("grid rebuilt".into()))
            } else {
                Ok("rows")
            }
        })
        .await
        .unwrap();
        assert_eq!(value, "rows");
    }

    #[test]
    fn stability_gate_exhausts_after_budget_without_progress() {
        let mut gate = StabilityGate::new(5);
        for _ in 0..4 {
            gate.observe(false);
            assert!(!gate.exhausted());
        }
        gate.observe(false);
        assert!(gate.exhausted());
    }

    #[test]
    fn stability_gate_refills_on_progress() {
        let mut gate = StabilityGate::new(3);
        gate.observe(false);
        gate.observe(false);
        gate.observe(true);
        assert_eq!(gate.remaining(), 3);
        gate.observe(false);
        gate.observe(false);
        gate.observe(false);
        assert!(gate.exhausted());
    }
}
