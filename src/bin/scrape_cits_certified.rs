//! Instructor certification status by state.

use std::path::PathBuf;

use anyhow::Result;
use ncvt_mis_scraper::automation::webdriver::ChromeSessionProvider;
use ncvt_mis_scraper::infrastructure::{config::AppConfig, logging};
use ncvt_mis_scraper::scrape::{self, targets};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <output_folder>", env!("CARGO_BIN_NAME"));
        std::process::exit(1);
    }
    let out_root = PathBuf::from(&args[1]);

    logging::init()?;
    let cfg = AppConfig::load().await?;
    let provider = ChromeSessionProvider::new(cfg.webdriver.clone());

    let target = targets::cits_certified();
    let units = target.cartesian_units();
    scrape::run_target(provider, target, cfg, out_root, units).await?;
    Ok(())
}
