//! District discovery.
//!
//! One unit per state: select the year and the state, then drain the
//! district slicer's virtualized option list the same way the detail grid
//! is drained. The merged state-to-districts mapping becomes the
//! enumeration source for the district scrape, persisted as a JSON
//! artifact alongside the output.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::automation::{AutomationError, SessionProvider, UiDriver, UiElement};
use crate::dashboard::filters::{enumerate_options, FilterController};
use crate::dashboard::locator::nth_match_path;
use crate::dashboard::view::{ViewConfig, WidgetMatcher, WidgetSlot};
use crate::domain::dimension::names;
use crate::domain::{SelectionMode, UnitOutcome, WorkUnit};
use crate::infrastructure::config::AppConfig;

/// Session the district lists are discovered under.
pub const DISCOVERY_YEAR: &str = "2022";

/// Option lists render inside dedicated scroll regions, one per slicer,
/// in the same order as the slicers themselves.
const SCROLL_REGION_CSS: &str = "div.scrollRegion";

/// Shared collector the discovery workers merge their results into.
pub type DistrictCollector = Arc<Mutex<BTreeMap<String, Vec<String>>>>;

/// Enrollment view as the discovery run drives it.
pub fn discovery_view() -> ViewConfig {
    ViewConfig::new(
        super::targets::ENROLLMENT_DASHBOARD_URL,
        WidgetMatcher::SlicerDropdowns,
        vec![
            WidgetSlot::new(names::STATE, 0),
            WidgetSlot::new(names::SESSION, 1),
            WidgetSlot::new(names::DISTRICT, 2),
        ],
    )
    .with_clear_filters()
}

/// One discovery unit per state.
pub fn discovery_units() -> Vec<WorkUnit> {
    super::targets::STATES
        .iter()
        .map(|state| WorkUnit::new(vec![(names::STATE, (*state).to_string())]))
        .collect()
}

/// Discovers the district list for one state. A failed state still lands
/// in the collector with an empty list so downstream enumeration sees it.
pub async fn run_discovery_unit<P: SessionProvider>(
    provider: &P,
    cfg: &AppConfig,
    unit: &WorkUnit,
    collector: DistrictCollector,
) -> UnitOutcome {
    let key = unit.key();
    let state = match unit.value_of(names::STATE) {
        Some(state) => state.to_string(),
        None => {
            error!("[{key}] discovery unit carries no state");
            return UnitOutcome::Failed;
        }
    };

    let driver = match provider.open().await {
        Ok(driver) => driver,
        Err(e) => {
            error!("[{key}] could not open a browser session: {e}");
            record(&collector, &state, Vec::new());
            return UnitOutcome::Failed;
        }
    };

    let outcome = match discover_districts(&driver, cfg, &state).await {
        Ok(districts) => {
            info!("[{key}] found {} districts", districts.len());
            record(&collector, &state, districts);
            UnitOutcome::Succeeded
        }
        Err(e) => {
            error!("[{key}] discovery failed: {e:#}");
            record(&collector, &state, Vec::new());
            UnitOutcome::Failed
        }
    };

    if let Err(e) = provider.close(driver).await {
        warn!("[{key}] session teardown failed: {e}");
    }
    outcome
}

fn record(collector: &DistrictCollector, state: &str, districts: Vec<String>) {
    let mut map = match collector.lock() {
        Ok(map) => map,
        Err(poisoned) => poisoned.into_inner(),
    };
    map.insert(state.to_string(), districts);
}

async fn discover_districts<D: UiDriver>(
    driver: &D,
    cfg: &AppConfig,
    state: &str,
) -> Result<Vec<String>> {
    let view = discovery_view();
    let timing = cfg.timing.interaction();
    let widgets = super::unit::setup_view(driver, &view, &timing).await?;
    let controller = FilterController::new(driver, &widgets, timing);

    // open and close each slicer once so every scroll region is rendered
    // before the snapshot that resolves them
    for slot in &view.widgets {
        let dropdown = controller.open_widget(slot.logical).await?;
        dropdown.click().await?;
        sleep(timing.settle).await;
    }

    let markup = driver.page_markup().await?;
    let position = view
        .widget_position(names::DISTRICT)
        .context("district slicer missing from the view table")?;
    let region = nth_match_path(&markup, SCROLL_REGION_CSS, position)?
        .ok_or_else(|| {
            AutomationError::NotFound(format!("scroll region {position} not present"))
        })
        .context("resolving the district option list")?;

    controller
        .apply(names::SESSION, SelectionMode::Direct, DISCOVERY_YEAR)
        .await
        .context("selecting the discovery session")?;
    sleep(timing.settle).await;

    controller
        .apply(names::STATE, SelectionMode::Search, state)
        .await
        .with_context(|| format!("selecting state {state}"))?;
    sleep(timing.settle).await;

    let districts = enumerate_options(
        driver,
        &controller,
        names::DISTRICT,
        &region,
        cfg.grid.stall_budget,
    )
    .await
    .context("draining the district option list")?;
    Ok(districts)
}
