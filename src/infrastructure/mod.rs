//! Configuration and logging infrastructure.

pub mod config;
pub mod logging;
