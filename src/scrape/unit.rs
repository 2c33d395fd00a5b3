//! Per-unit scrape pipeline.
//!
//! One worker drives exactly one filter combination through one isolated
//! browser session: set the view up, apply the selections in declared
//! order, short-circuit on legitimately empty combinations, drain the grid,
//! cross-check completeness, persist. Every error is caught at this level
//! and turned into a unit outcome; nothing propagates to sibling units, and
//! the session is torn down on every path.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::automation::retry::wait_until;
use crate::automation::{SessionProvider, UiDriver};
use crate::dashboard::filters::{best_effort_click, FilterController, InteractionTiming};
use crate::dashboard::grid::RowAccumulator;
use crate::dashboard::locator::{resolve_widgets, WidgetMap};
use crate::dashboard::summary::{self, CompletenessPolicy};
use crate::dashboard::view::ViewConfig;
use crate::domain::dimension::names;
use crate::domain::{UnitOutcome, WorkUnit};
use crate::infrastructure::config::AppConfig;
use crate::output;

use super::targets::ScrapeTarget;

/// Runs one unit inside a fresh session, reporting the terminal outcome.
/// The session is closed whatever happens in between.
pub async fn run_unit<P: SessionProvider>(
    provider: &P,
    target: &ScrapeTarget,
    cfg: &AppConfig,
    out_root: &Path,
    unit: &WorkUnit,
) -> UnitOutcome {
    let key = unit.key();
    let driver = match provider.open().await {
        Ok(driver) => driver,
        Err(e) => {
            error!("[{key}] could not open a browser session: {e}");
            return UnitOutcome::Failed;
        }
    };

    let outcome = match drive_unit(&driver, target, cfg, out_root, unit).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("[{key}] unit failed: {e:#}");
            UnitOutcome::Failed
        }
    };

    if let Err(e) = provider.close(driver).await {
        warn!("[{key}] session teardown failed: {e}");
    }
    outcome
}

/// Navigates to the view, waits for the canvas, performs the view-level
/// clicks, and resolves the widget table against a fresh markup snapshot.
pub(crate) async fn setup_view<D: UiDriver>(
    driver: &D,
    view: &ViewConfig,
    timing: &InteractionTiming,
) -> Result<WidgetMap> {
    driver.navigate(view.url).await?;
    wait_until(timing.wait, "report canvas", || driver.find(&view.ready)).await?;
    sleep(timing.page_ready).await;

    if let Some(locator) = &view.clear_filters {
        best_effort_click(driver, timing, locator, "Clear All Filter").await;
    }
    if let Some(locator) = &view.detail_report {
        best_effort_click(driver, timing, locator, "Detail Report").await;
    }

    let markup = driver.page_markup().await?;
    let widgets = resolve_widgets(&markup, view)?;

    // clearing again leaves the slicers pristine for this unit's selections
    if let Some(locator) = &view.clear_filters {
        best_effort_click(driver, timing, locator, "Clear All Filter").await;
    }
    sleep(timing.settle).await;

    Ok(widgets)
}

async fn drive_unit<D: UiDriver>(
    driver: &D,
    target: &ScrapeTarget,
    cfg: &AppConfig,
    out_root: &Path,
    unit: &WorkUnit,
) -> Result<UnitOutcome> {
    let key = unit.key();
    let timing = cfg.timing.interaction();
    let widgets = setup_view(driver, &target.view, &timing).await?;
    let controller = FilterController::new(driver, &widgets, timing);

    for dimension in &target.dimensions {
        let value = unit
            .value_of(dimension.name)
            .with_context(|| format!("unit {key} carries no {} value", dimension.name))?;
        match controller.apply(dimension.name, dimension.mode, value).await {
            Ok(()) => {}
            Err(e) if e.is_timeout() => {
                // the value does not exist under the selections so far
                info!("[{key}] {} option '{value}' never appeared, no data here", dimension.name);
                return Ok(UnitOutcome::EmptySkipped);
            }
            Err(e) if e.is_transient() => {
                warn!("[{key}] selecting {} = {value} left the widget unsettled: {e}", dimension.name);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("selecting {} = {value}", dimension.name))
            }
        }
        sleep(timing.settle).await;
    }
    info!("[{key}] all filters applied");

    let accumulator = RowAccumulator::new(driver, cfg.grid.budgets(), target.footer_totals);
    if accumulator.visible_rows().await?.is_empty() {
        warn!("[{key}] no data available for this combination");
        return Ok(UnitOutcome::EmptySkipped);
    }

    let expected = match target.completeness {
        Some(CompletenessPolicy::RowCount) => {
            let markup = driver.page_markup().await?;
            let total = summary::expected_total(&markup, target.view.summary_card_index)
                .context("reading the expected-total card")?;
            info!("[{key}] dashboard reports {total} expected records");
            Some(total)
        }
        _ => None,
    };

    let harvest = accumulator.drain().await?;
    let mut rows = harvest.rows.into_rows();
    summary::coerce_numeric_columns(&mut rows, target.numeric_columns, target.percent_columns);

    let data_path = target.layout.data_path(out_root, unit)?;
    match target.completeness {
        Some(CompletenessPolicy::RowCount) => {
            if let Some(expected) = expected {
                if let Some(mismatch) = summary::check_row_count(expected, rows.len()) {
                    warn!(
                        "[{key}] accumulated {} rows but the dashboard reports {}",
                        mismatch.actual, mismatch.expected
                    );
                    if let Some(log_path) = target.layout.mismatch_log_path(out_root, unit)? {
                        let label = data_path
                            .file_stem()
                            .and_then(|stem| stem.to_str())
                            .unwrap_or("unit")
                            .to_string();
                        output::write_mismatch_log(
                            &log_path,
                            &label,
                            mismatch.actual,
                            mismatch.expected,
                        )?;
                    }
                }
            }
        }
        Some(CompletenessPolicy::ColumnSums { pairs }) => match &harvest.footer {
            Some(footer) => {
                for mismatch in summary::check_column_sums(&rows, footer, pairs) {
                    warn!(
                        "[{key}] {} sums to {} but the footer shows {:?}",
                        mismatch.label, mismatch.actual, mismatch.expected
                    );
                    let state = unit.value_of(names::STATE).unwrap_or("unknown");
                    let flagged = output::column_mismatch_path(out_root, mismatch.label, state);
                    let schema_header: Vec<String> =
                        target.schema.iter().map(|c| (*c).to_string()).collect();
                    output::write_rows(&flagged, &schema_header, &rows)?;
                }
            }
            None => warn!("[{key}] grid produced no totals row to check against"),
        },
        None => {}
    }

    for row in &mut rows {
        for column in target.appended {
            let value = unit
                .value_of(column.dimension)
                .with_context(|| format!("unit {key} carries no {} value", column.dimension))?;
            row.push(value.to_string());
        }
    }

    output::write_rows(&data_path, &target.header(), &rows)?;
    info!("[{key}] saved {} rows to {}", rows.len(), data_path.display());
    Ok(UnitOutcome::Succeeded)
}
