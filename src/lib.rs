//! NCVT MIS dashboard scraper
//!
//! Drives isolated headless-browser sessions against the public NCVT MIS
//! Power BI dashboards, applies slicer filters one work unit at a time,
//! drains the virtualized detail grid with scroll-and-dedupe accumulation,
//! cross-checks the result against the dashboard's own displayed totals,
//! and persists partitioned CSV output.

pub mod automation;
pub mod dashboard;
pub mod domain;
pub mod infrastructure;
pub mod output;
pub mod scrape;
