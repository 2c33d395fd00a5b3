//! In-memory automation driver used by the crate's tests.
//!
//! Simulates just enough of the dashboard: a virtualized grid that renders a
//! sliding window of rows (with the sentinel header row the real grid emits
//! at visible index 0), registered clickable widgets, and page markup for
//! the structural resolver. Failure injection covers the stale-read and
//! dead-session paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{AutomationError, AutomationResult, Locator, SessionProvider, UiDriver, UiElement};
use crate::dashboard::grid::{CELLS_SELECTOR, ROWS_SELECTOR};

/// Virtualized grid simulation: only `window` rows are rendered at a time,
/// scrolling advances the window by `scroll_step` until the end.
#[derive(Debug, Clone)]
pub struct GridSim {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub footer: Option<Vec<String>>,
    pub window: usize,
    pub scroll_step: usize,
    pos: usize,
}

impl GridSim {
    pub fn new(rows: Vec<Vec<String>>, window: usize, scroll_step: usize) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        Self {
            header: (0..width).map(|i| format!("Column {i}")).collect(),
            rows,
            footer: None,
            window: window.max(1),
            scroll_step: scroll_step.max(1),
            pos: 0,
        }
    }

    pub fn with_footer(mut self, footer: Vec<String>) -> Self {
        self.footer = Some(footer);
        self
    }

    fn visible(&self) -> Vec<Vec<String>> {
        let end = (self.pos + self.window).min(self.rows.len());
        self.rows[self.pos..end].to_vec()
    }

    fn scroll(&mut self) {
        let max_pos = self.rows.len().saturating_sub(self.window);
        self.pos = (self.pos + self.scroll_step).min(max_pos);
    }
}

#[derive(Clone)]
enum Kind {
    Row {
        cells: Vec<String>,
        grid: Arc<Mutex<GridSim>>,
    },
    Cell {
        text: String,
    },
    Button {
        label: String,
        clicks: Arc<AtomicUsize>,
        interactable: bool,
    },
}

/// Element handle served by [`FakeDriver`].
#[derive(Clone)]
pub struct FakeElement {
    kind: Kind,
}

impl FakeElement {
    pub fn button(label: &str) -> (Self, Arc<AtomicUsize>) {
        let clicks = Arc::new(AtomicUsize::new(0));
        let element = Self {
            kind: Kind::Button {
                label: label.to_string(),
                clicks: clicks.clone(),
                interactable: true,
            },
        };
        (element, clicks)
    }
}

#[async_trait]
impl UiElement for FakeElement {
    async fn click(&self) -> AutomationResult<()> {
        match &self.kind {
            Kind::Button {
                clicks,
                interactable,
                label,
            } => {
                if !interactable {
                    return Err(AutomationError::NotInteractable(label.clone()));
                }
                clicks.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn send_keys(&self, _text: &str) -> AutomationResult<()> {
        Ok(())
    }

    async fn text(&self) -> AutomationResult<String> {
        match &self.kind {
            Kind::Cell { text } => Ok(text.clone()),
            Kind::Row { cells, .. } => Ok(cells.join("\n")),
            Kind::Button { label, .. } => Ok(label.clone()),
        }
    }

    async fn attr(&self, name: &str) -> AutomationResult<Option<String>> {
        match (&self.kind, name) {
            (Kind::Button { label, .. }, "title") => Ok(Some(label.clone())),
            _ => Ok(None),
        }
    }

    async fn scroll_into_view(&self) -> AutomationResult<()> {
        if let Kind::Row { grid, .. } = &self.kind {
            if let Ok(mut sim) = grid.lock() {
                sim.scroll();
            }
        }
        Ok(())
    }

    async fn is_interactable(&self) -> AutomationResult<bool> {
        match &self.kind {
            Kind::Button { interactable, .. } => Ok(*interactable),
            _ => Ok(true),
        }
    }

    async fn find_all(&self, locator: &Locator) -> AutomationResult<Vec<Self>> {
        if *locator != Locator::css(CELLS_SELECTOR) {
            return Ok(Vec::new());
        }
        match &self.kind {
            Kind::Row { cells, .. } => Ok(cells
                .iter()
                .map(|text| FakeElement {
                    kind: Kind::Cell { text: text.clone() },
                })
                .collect()),
            _ => Ok(Vec::new()),
        }
    }
}

struct DriverInner {
    grid: Option<Arc<Mutex<GridSim>>>,
    markup: Mutex<String>,
    elements: Mutex<HashMap<String, FakeElement>>,
    stale_reads: AtomicU32,
    fail_navigation: bool,
    typed: Mutex<Vec<String>>,
    grid_reads: AtomicUsize,
}

/// Test driver over the simulated dashboard.
#[derive(Clone)]
pub struct FakeDriver {
    inner: Arc<DriverInner>,
}

impl FakeDriver {
    fn build(grid: Option<GridSim>, fail_navigation: bool) -> Self {
        Self {
            inner: Arc::new(DriverInner {
                grid: grid.map(|g| Arc::new(Mutex::new(g))),
                markup: Mutex::new(String::new()),
                elements: Mutex::new(HashMap::new()),
                stale_reads: AtomicU32::new(0),
                fail_navigation,
                typed: Mutex::new(Vec::new()),
                grid_reads: AtomicUsize::new(0),
            }),
        }
    }

    pub fn new() -> Self {
        Self::build(None, false)
    }

    pub fn with_grid(grid: GridSim) -> Self {
        Self::build(Some(grid), false)
    }

    pub fn failing_navigation() -> Self {
        Self::build(None, true)
    }

    pub fn set_markup(&self, markup: &str) {
        if let Ok(mut stored) = self.inner.markup.lock() {
            *stored = markup.to_string();
        }
    }

    pub fn register(&self, locator: Locator, element: FakeElement) {
        if let Ok(mut elements) = self.inner.elements.lock() {
            elements.insert(locator.to_string(), element);
        }
    }

    /// The next `count` grid reads fail with a stale-element error.
    pub fn inject_stale_reads(&self, count: u32) {
        self.inner.stale_reads.store(count, Ordering::SeqCst);
    }

    pub fn typed_text(&self) -> Vec<String> {
        self.inner
            .typed
            .lock()
            .map(|t| t.clone())
            .unwrap_or_default()
    }

    /// How many times the grid's row collection was read.
    pub fn grid_reads(&self) -> usize {
        self.inner.grid_reads.load(Ordering::SeqCst)
    }

    fn grid_rows(&self) -> AutomationResult<Vec<FakeElement>> {
        self.inner.grid_reads.fetch_add(1, Ordering::SeqCst);
        if self.inner.stale_reads.load(Ordering::SeqCst) > 0 {
            self.inner.stale_reads.fetch_sub(1, Ordering::SeqCst);
            return Err(AutomationError::Stale("grid rebuilt mid-read".into()));
        }
        let Some(grid) = &self.inner.grid else {
            return Ok(Vec::new());
        };
        let sim = grid
            .lock()
            .map_err(|_| AutomationError::Driver("grid lock poisoned".into()))?;

        let mut rows = Vec::new();
        let mut header = vec!["#".to_string()];
        header.extend(sim.header.clone());
        rows.push(FakeElement {
            kind: Kind::Row {
                cells: header,
                grid: grid.clone(),
            },
        });
        for (offset, data) in sim.visible().into_iter().enumerate() {
            let mut cells = vec![(sim.pos + offset + 1).to_string()];
            cells.extend(data);
            rows.push(FakeElement {
                kind: Kind::Row {
                    cells,
                    grid: grid.clone(),
                },
            });
        }
        if let Some(footer) = &sim.footer {
            let mut cells = vec![String::new()];
            cells.extend(footer.clone());
            rows.push(FakeElement {
                kind: Kind::Row {
                    cells,
                    grid: grid.clone(),
                },
            });
        }
        Ok(rows)
    }
}

impl Default for FakeDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UiDriver for FakeDriver {
    type Elem = FakeElement;

    async fn navigate(&self, url: &str) -> AutomationResult<()> {
        if self.inner.fail_navigation {
            return Err(AutomationError::Driver(format!(
                "connection refused while loading {url}"
            )));
        }
        Ok(())
    }

    async fn find(&self, locator: &Locator) -> AutomationResult<Option<Self::Elem>> {
        let elements = self
            .inner
            .elements
            .lock()
            .map_err(|_| AutomationError::Driver("element registry poisoned".into()))?;
        Ok(elements.get(&locator.to_string()).cloned())
    }

    async fn find_all(&self, locator: &Locator) -> AutomationResult<Vec<Self::Elem>> {
        if *locator == Locator::css(ROWS_SELECTOR) {
            return self.grid_rows();
        }
        Ok(self.find(locator).await?.into_iter().collect())
    }

    async fn type_active(&self, text: &str) -> AutomationResult<()> {
        if let Ok(mut typed) = self.inner.typed.lock() {
            typed.push(text.to_string());
        }
        Ok(())
    }

    async fn page_markup(&self) -> AutomationResult<String> {
        self.inner
            .markup
            .lock()
            .map(|m| m.clone())
            .map_err(|_| AutomationError::Driver("markup lock poisoned".into()))
    }
}

/// Session provider handing out [`FakeDriver`] clones, with open/close
/// accounting for teardown assertions.
pub struct FakeProvider {
    factory: Box<dyn Fn() -> FakeDriver + Send + Sync>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

impl FakeProvider {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> FakeDriver + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            opened: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for FakeProvider {
    type Driver = FakeDriver;

    async fn open(&self) -> AutomationResult<Self::Driver> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok((self.factory)())
    }

    async fn close(&self, _driver: Self::Driver) -> AutomationResult<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
