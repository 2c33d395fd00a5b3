//! Application configuration.
//!
//! Every knob ships with a default tuned against the live dashboards; a
//! JSON file (path from `NCVT_SCRAPER_CONFIG`, falling back to
//! `scraper-config.json` in the working directory) overrides any subset of
//! them. Timing values deserve care: the dashboards re-render
//! asynchronously with no completion signal, so shrinking the settle
//! delays trades reliability for speed.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::automation::retry::WaitPolicy;
use crate::dashboard::filters::InteractionTiming;
use crate::dashboard::grid::GridBudgets;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "NCVT_SCRAPER_CONFIG";

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "scraper-config.json";

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub webdriver: WebDriverConfig,
    pub timing: TimingConfig,
    pub grid: GridConfig,
    pub scheduler: SchedulerConfig,
}

/// Browser session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebDriverConfig {
    /// chromedriver endpoint sessions are created against.
    pub server_url: String,
    pub headless: bool,
    /// Extra Chrome arguments, applied to every session.
    pub chrome_args: Vec<String>,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:9515".to_string(),
            headless: true,
            chrome_args: vec![
                "--disable-extensions".to_string(),
                "--disable-gpu".to_string(),
                "--no-sandbox".to_string(),
                "--disable-dev-shm-usage".to_string(),
            ],
        }
    }
}

/// UI interaction timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Bounded-wait deadline for clickability and option waits.
    pub wait_timeout_secs: u64,
    pub poll_interval_ms: u64,
    /// Settle between actions on the enrollment view.
    pub settle_ms: u64,
    /// Settle used by the instructor view's search inputs.
    pub long_settle_ms: u64,
    /// Extra settle after the report canvas first renders.
    pub page_ready_settle_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            wait_timeout_secs: 10,
            poll_interval_ms: 250,
            settle_ms: 1_000,
            long_settle_ms: 2_000,
            page_ready_settle_ms: 5_000,
        }
    }
}

impl TimingConfig {
    pub fn interaction(&self) -> InteractionTiming {
        InteractionTiming {
            wait: WaitPolicy {
                timeout: Duration::from_secs(self.wait_timeout_secs),
                poll: Duration::from_millis(self.poll_interval_ms),
            },
            settle: Duration::from_millis(self.settle_ms),
            long_settle: Duration::from_millis(self.long_settle_ms),
            page_ready: Duration::from_millis(self.page_ready_settle_ms),
        }
    }
}

/// Grid accumulation budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub stall_budget: u32,
    pub read_retries: u32,
    pub scroll_settle_ms: u64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            stall_budget: 5,
            read_retries: 5,
            scroll_settle_ms: 500,
        }
    }
}

impl GridConfig {
    pub fn budgets(&self) -> GridBudgets {
        GridBudgets {
            stall_budget: self.stall_budget,
            read_retries: self.read_retries,
            scroll_settle: Duration::from_millis(self.scroll_settle_ms),
        }
    }
}

/// Scheduler overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub monitor_interval_ms: u64,
    /// Overrides the per-target pool size when set.
    pub workers: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            monitor_interval_ms: 500,
            workers: None,
        }
    }
}

impl AppConfig {
    /// Loads configuration, preferring the file named by
    /// [`CONFIG_PATH_ENV`], then [`DEFAULT_CONFIG_FILE`], then defaults.
    pub async fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let config = if path.exists() {
            let raw = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("reading config {}", path.display()))?;
            let parsed: AppConfig = serde_json::from_str(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?;
            info!("loaded configuration from {}", path.display());
            parsed
        } else {
            info!("no config file at {}, using defaults", path.display());
            AppConfig::default()
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.webdriver.server_url).with_context(|| {
            format!("webdriver.server_url '{}'", self.webdriver.server_url)
        })?;
        if let Some(workers) = self.scheduler.workers {
            anyhow::ensure!(workers > 0, "scheduler.workers must be at least 1");
        }
        anyhow::ensure!(self.grid.stall_budget > 0, "grid.stall_budget must be at least 1");
        anyhow::ensure!(self.grid.read_retries > 0, "grid.read_retries must be at least 1");
        Ok(())
    }
}
