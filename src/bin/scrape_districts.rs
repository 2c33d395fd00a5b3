//! Trainee enrollment by year, state, and district. Consumes the district
//! map produced by `discover_districts` from the same output folder.

use std::path::PathBuf;

use anyhow::Result;
use ncvt_mis_scraper::automation::webdriver::ChromeSessionProvider;
use ncvt_mis_scraper::infrastructure::{config::AppConfig, logging};
use ncvt_mis_scraper::output;
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

    let map = output::read_district_map(&out_root.join(output::DISTRICT_MAP_FILE))?;
    let target = targets::districts();
    let units = targets::district_units(&target, &map);
    scrape::run_target(provider, target, cfg, out_root, units).await?;
    Ok(())
}
