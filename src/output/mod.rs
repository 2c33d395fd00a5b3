//! Partitioned CSV persistence.
//!
//! Every work unit lands in a file path that encodes its filter-dimension
//! values, with completeness-check failures written to a parallel
//! `improper_data` tree for manual follow-up. The district-discovery run
//! additionally produces a JSON artifact mapping each state to its
//! districts, consumed by the district scrape as its enumeration source.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::dimension::names;
use crate::domain::{Row, WorkUnit};

/// Cross-run artifact produced by district discovery.
pub const DISTRICT_MAP_FILE: &str = "districts.json";

/// Subtree holding flagged output for completeness mismatches.
pub const IMPROPER_DIR: &str = "improper_data";

/// File-naming scheme of one scrape target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    /// `{root}/{year}/{state}_{year}_{category}.csv`
    StateYearCategory,
    /// `{root}/{year}/{year}_{state}_{district}.csv`
    YearStateDistrict,
    /// `{root}/{year}/{year}_{state}_{duration}.csv`
    YearStateCourseDuration,
    /// `{root}/cits_certified_{state}.csv`
    CitsByState,
}

fn assigned<'a>(unit: &'a WorkUnit, dimension: &str) -> Result<&'a str> {
    unit.value_of(dimension)
        .with_context(|| format!("unit {} carries no {dimension} value", unit.key()))
}

impl OutputLayout {
    /// Destination of the unit's accumulated table.
    pub fn data_path(&self, root: &Path, unit: &WorkUnit) -> Result<PathBuf> {
        Ok(match self {
            OutputLayout::StateYearCategory => {
                let state = assigned(unit, names::STATE)?;
                let year = assigned(unit, names::SESSION)?;
                let category = assigned(unit, names::CATEGORY)?;
                root.join(year).join(format!("{state}_{year}_{category}.csv"))
            }
            OutputLayout::YearStateDistrict => {
                let year = assigned(unit, names::SESSION)?;
                let state = assigned(unit, names::STATE)?;
                let district = assigned(unit, names::DISTRICT)?;
                root.join(year).join(format!("{year}_{state}_{district}.csv"))
            }
            OutputLayout::YearStateCourseDuration => {
                let year = assigned(unit, names::SESSION)?;
                let state = assigned(unit, names::STATE)?;
                let duration = assigned(unit, names::COURSE_DURATION)?;
                root.join(year).join(format!("{year}_{state}_{duration}.csv"))
            }
            OutputLayout::CitsByState => {
                let state = assigned(unit, names::STATE)?;
                root.join(format!("cits_certified_{state}.csv"))
            }
        })
    }

    /// Destination of the row-count mismatch log, on layouts that keep one.
    pub fn mismatch_log_path(&self, root: &Path, unit: &WorkUnit) -> Result<Option<PathBuf>> {
        let data = match self {
            OutputLayout::StateYearCategory | OutputLayout::CitsByState => return Ok(None),
            _ => self.data_path(root, unit)?,
        };
        let year = assigned(unit, names::SESSION)?;
        let file = data
            .file_name()
            .with_context(|| format!("no file name in {}", data.display()))?;
        Ok(Some(root.join(IMPROPER_DIR).join(year).join(file)))
    }
}

/// Flagged copy of the full table for one divergent instructor column.
pub fn column_mismatch_path(root: &Path, column_label: &str, state: &str) -> PathBuf {
    root.join(IMPROPER_DIR)
        .join(format!("{}_{state}.csv", column_label.to_lowercase()))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating folder {}", parent.display()))?;
            info!("created folder {}", parent.display());
        }
    }
    Ok(())
}

/// Writes one table with its header record.
pub fn write_rows(path: &Path, header: &[String], rows: &[Row]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("opening {}", path.display()))?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Three-row mismatch log: combination key, actual count, expected count.
pub fn write_mismatch_log(path: &Path, key: &str, actual: usize, expected: i64) -> Result<()> {
    ensure_parent(path)?;
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("opening {}", path.display()))?;
    writer.write_record([key])?;
    writer.write_record([actual.to_string()])?;
    writer.write_record([expected.to_string()])?;
    writer.flush()?;
    Ok(())
}

/// Persists the state to districts mapping.
pub fn write_district_map(path: &Path, map: &BTreeMap<String, Vec<String>>) -> Result<()> {
    ensure_parent(path)?;
    let rendered = serde_json::to_string_pretty(map)?;
    fs::write(path, rendered).with_context(|| format!("writing {}", path.display()))?;
    info!("saved district map with {} states to {}", map.len(), path.display());
    Ok(())
}

/// Loads the state to districts mapping produced by a discovery run.
pub fn read_district_map(path: &Path) -> Result<BTreeMap<String, Vec<String>>> {
    let raw = fs::read_to_string(path).with_context(|| {
        format!(
            "reading district map {} (run discover_districts first)",
            path.display()
        )
    })?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}
