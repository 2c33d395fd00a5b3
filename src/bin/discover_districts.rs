//! District discovery: produces the state-to-districts JSON artifact the
//! district scrape enumerates from.

use std::path::PathBuf;

use anyhow::Result;
use ncvt_mis_scraper::automation::webdriver::ChromeSessionProvider;
use ncvt_mis_scraper::infrastructure::{config::AppConfig, logging};
use ncvt_mis_scraper::scrape;

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

    scrape::run_discovery(provider, cfg, &out_root).await?;
    Ok(())
}
