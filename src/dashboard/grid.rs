//! Virtualized-grid row accumulation.
//!
//! The detail grid renders only a window of rows and replaces it on scroll,
//! so the full table is reconstructed by repeatedly reading the visible
//! window, merging it into a deduplicated set, and scrolling the last
//! visible row into view to make the grid render the next window.
//! Accumulation terminates when repeated reads stop yielding new data for
//! a bounded number of consecutive attempts.

use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::automation::retry::{with_stale_retry, StabilityGate};
use crate::automation::{AutomationResult, Locator, UiDriver, UiElement};
use crate::domain::{Row, RowSet};

/// Grid rows, including the sentinel header row at visible index 0.
pub const ROWS_SELECTOR: &str = "div[role='row'][class*='row']";

/// Cells within a row; the first cell is the grid's own row index.
pub const CELLS_SELECTOR: &str = "div[role='gridcell']";

/// Budgets governing one accumulation run.
#[derive(Debug, Clone, Copy)]
pub struct GridBudgets {
    /// Consecutive no-progress reads tolerated before the grid is
    /// considered fully drained.
    pub stall_budget: u32,
    /// Attempts per read when the grid re-creates its nodes mid-read.
    pub read_retries: u32,
    /// Settle after each scroll, giving the grid time to render.
    pub scroll_settle: Duration,
}

impl Default for GridBudgets {
    fn default() -> Self {
        Self {
            stall_budget: 5,
            read_retries: 5,
            scroll_settle: Duration::from_millis(500),
        }
    }
}

/// Result of draining one grid.
#[derive(Debug)]
pub struct Harvest {
    pub rows: RowSet,
    /// Latest snapshot of the totals row, on grids that render one.
    pub footer: Option<Row>,
}

/// Scroll-and-dedupe accumulator over one session's grid.
pub struct RowAccumulator<'a, D: UiDriver> {
    driver: &'a D,
    budgets: GridBudgets,
    /// The instructor grid pins a totals row at the end of every window;
    /// it is split off each read and never enters the row set.
    footer_totals: bool,
}

impl<'a, D: UiDriver> RowAccumulator<'a, D> {
    pub fn new(driver: &'a D, budgets: GridBudgets, footer_totals: bool) -> Self {
        Self {
            driver,
            budgets,
            footer_totals,
        }
    }

    /// Reads the currently rendered rows, excluding the sentinel at index 0
    /// and each row's leading index cell. Retries on stale handles with
    /// fresh lookups.
    pub async fn visible_rows(&self) -> AutomationResult<Vec<Row>> {
        with_stale_retry(self.budgets.read_retries, || self.read_once()).await
    }

    async fn read_once(&self) -> AutomationResult<Vec<Row>> {
        let rows = self.driver.find_all(&Locator::css(ROWS_SELECTOR)).await?;
        let mut extracted = Vec::with_capacity(rows.len());
        for row in &rows {
            let cells = row.find_all(&Locator::css(CELLS_SELECTOR)).await?;
            let mut record = Vec::with_capacity(cells.len().saturating_sub(1));
            for cell in cells.iter().skip(1) {
                record.push(cell.text().await?);
            }
            extracted.push(record);
        }
        if !extracted.is_empty() {
            extracted.remove(0);
        }
        Ok(extracted)
    }

    /// Scrolls the last visible data row into view to trigger the next
    /// window. On grids with a totals footer the anchor is the row above it.
    async fn scroll_to_reveal(&self) -> AutomationResult<()> {
        let rows = self.driver.find_all(&Locator::css(ROWS_SELECTOR)).await?;
        let back = if self.footer_totals { 2 } else { 1 };
        if rows.len() > back {
            if let Some(anchor) = rows.get(rows.len() - back) {
                anchor.scroll_into_view().await?;
            }
        }
        Ok(())
    }

    /// Drains the grid to completion.
    pub async fn drain(&self) -> AutomationResult<Harvest> {
        let mut set = RowSet::new();
        let mut footer = None;
        let mut gate = StabilityGate::new(self.budgets.stall_budget);

        loop {
            let mut batch = self.visible_rows().await?;
            if self.footer_totals && !batch.is_empty() {
                footer = batch.pop();
            }

            let stalled = batch.is_empty() || (!set.is_empty() && set.tail_equals(&batch));
            gate.observe(!stalled);

            let added = set.absorb(&batch);
            debug!(
                "grid read: {} visible, {} new, {} total, stall budget {}",
                batch.len(),
                added,
                set.len(),
                gate.remaining()
            );

            if gate.exhausted() {
                break;
            }

            self.scroll_to_reveal().await?;
            sleep(self.budgets.scroll_settle).await;
        }

        Ok(Harvest { rows: set, footer })
    }
}
