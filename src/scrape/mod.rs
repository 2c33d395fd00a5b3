//! Task scheduling and the per-target run entry points.

pub mod discovery;
pub mod progress;
pub mod scheduler;
pub mod targets;
pub mod unit;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use crate::automation::SessionProvider;
use crate::domain::WorkUnit;
use crate::infrastructure::config::AppConfig;
use crate::output;

pub use progress::{CompletionGuard, ProgressBoard};
pub use scheduler::{run_pool, PoolConfig, RunReport};
pub use targets::ScrapeTarget;

fn pool_config(cfg: &AppConfig, target_workers: usize) -> PoolConfig {
    PoolConfig {
        workers: cfg.scheduler.workers.unwrap_or(target_workers),
        monitor_interval: Duration::from_millis(cfg.scheduler.monitor_interval_ms),
    }
}

/// Runs a scrape target to completion: one isolated session per unit,
/// bounded by the target's pool size, with progress rendered throughout.
pub async fn run_target<P>(
    provider: P,
    target: ScrapeTarget,
    cfg: AppConfig,
    out_root: PathBuf,
    units: Vec<WorkUnit>,
) -> Result<RunReport>
where
    P: SessionProvider + 'static,
{
    info!("target {}: {} units", target.name, units.len());
    let pool = pool_config(&cfg, target.workers);
    let provider = Arc::new(provider);
    let target = Arc::new(target);
    let cfg = Arc::new(cfg);
    let out_root = Arc::new(out_root);

    let report = run_pool(units, pool, move |work_unit| {
        let provider = Arc::clone(&provider);
        let target = Arc::clone(&target);
        let cfg = Arc::clone(&cfg);
        let out_root = Arc::clone(&out_root);
        async move {
            unit::run_unit(
                provider.as_ref(),
                target.as_ref(),
                cfg.as_ref(),
                out_root.as_ref(),
                &work_unit,
            )
            .await
        }
    })
    .await;
    Ok(report)
}

/// Runs district discovery across all states and persists the merged
/// mapping as the JSON artifact downstream targets enumerate from.
pub async fn run_discovery<P>(provider: P, cfg: AppConfig, out_root: &Path) -> Result<RunReport>
where
    P: SessionProvider + 'static,
{
    let units = discovery::discovery_units();
    info!("district discovery: {} states", units.len());

    let collector: discovery::DistrictCollector = Arc::new(Mutex::new(Default::default()));
    let pool = pool_config(&cfg, 5);
    let provider = Arc::new(provider);
    let cfg_arc = Arc::new(cfg);

    let worker_collector = Arc::clone(&collector);
    let report = run_pool(units, pool, move |work_unit| {
        let provider = Arc::clone(&provider);
        let cfg = Arc::clone(&cfg_arc);
        let collector = Arc::clone(&worker_collector);
        async move {
            discovery::run_discovery_unit(provider.as_ref(), cfg.as_ref(), &work_unit, collector)
                .await
        }
    })
    .await;

    let map = match collector.lock() {
        Ok(map) => map.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    };
    output::write_district_map(&out_root.join(output::DISTRICT_MAP_FILE), &map)?;
    Ok(report)
}
