//! Logging initialization.
//!
//! Console output always, with an optional daily-rotated file log when
//! `NCVT_SCRAPER_LOG_DIR` points at a directory. Timestamps render in IST,
//! the dashboards' home timezone, so log lines line up with what the
//! source system shows.

use std::sync::Mutex;

use anyhow::{anyhow, Result};
use chrono::{FixedOffset, Utc};
use once_cell::sync::Lazy;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Environment variable enabling the file log.
pub const LOG_DIR_ENV: &str = "NCVT_SCRAPER_LOG_DIR";

// Keeps the non-blocking writers alive for the process lifetime.
static LOG_GUARDS: Lazy<Mutex<Vec<WorkerGuard>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// IST (UTC+5:30) timestamp formatter.
struct IstTime;

impl FormatTime for IstTime {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        let offset = FixedOffset::east_opt(5 * 3600 + 1800).ok_or(std::fmt::Error)?;
        let now = Utc::now().with_timezone(&offset);
        write!(w, "{}", now.format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Initializes the tracing subscriber. Safe to call once per process.
pub fn init() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console = fmt::layer().with_timer(IstTime);

    let file = std::env::var(LOG_DIR_ENV).ok().map(|dir| {
        let appender = tracing_appender::rolling::daily(dir, "scraper.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        if let Ok(mut guards) = LOG_GUARDS.lock() {
            guards.push(guard);
        }
        fmt::layer()
            .with_timer(IstTime)
            .with_ansi(false)
            .with_writer(writer)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| anyhow!("initializing logging: {e}"))
}
