//! Declarative per-view dashboard configuration.
//!
//! The dashboards expose no semantic identifiers for their slicer widgets,
//! only a stable rendering order within one view. Each view therefore
//! declares which ordinal position of the matched widget collection carries
//! which logical filter, and the resolver turns that table into structural
//! addresses once per session.

use crate::automation::Locator;

/// Marker that the report canvas has finished its initial render.
pub const READY_MARKER_CSS: &str = "transform.bringToFront";

/// Bookmark button that resets every slicer on the enrollment view.
pub const CLEAR_FILTERS_XPATH: &str = r#"//div[@aria-label="Bookmark . Clear All Filter"]"#;

/// Page-navigation button that switches the enrollment view to the
/// trainee-level detail report.
pub const DETAIL_REPORT_XPATH: &str =
    r#"//div[@aria-label="Page navigation . Click to View Detail Report"]"#;

/// Detail-report button on the instructor view, addressed positionally
/// because it carries no label of its own.
pub const INSTRUCTOR_DETAIL_REPORT_XPATH: &str = r#"//*[@id="pvExplorationHost"]/div/div/exploration/div/explore-canvas/div/div[2]/div/div[2]/div[2]/visual-container-repeat/visual-container[4]/transform/div"#;

/// How a view's filter widgets are found in the markup snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetMatcher {
    /// Slicer dropdown menus, matched by their widget class.
    SlicerDropdowns,
    /// Standalone slicer search inputs, matched by the full attribute set
    /// the dashboard stamps on them.
    SearchInputs,
}

impl WidgetMatcher {
    pub fn selector(&self) -> &'static str {
        match self {
            WidgetMatcher::SlicerDropdowns => "div.slicer-dropdown-menu",
            WidgetMatcher::SearchInputs => {
                "input.searchInput[type='text'][aria-label='Search'][placeholder='Search']"
            }
        }
    }
}

/// One entry of the widget-configuration table: the Nth matched widget is
/// the named logical filter.
#[derive(Debug, Clone, Copy)]
pub struct WidgetSlot {
    pub logical: &'static str,
    pub ordinal: usize,
}

impl WidgetSlot {
    pub const fn new(logical: &'static str, ordinal: usize) -> Self {
        Self { logical, ordinal }
    }
}

/// Everything the session setup needs to know about one dashboard view.
#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub url: &'static str,
    pub ready: Locator,
    pub widget_matcher: WidgetMatcher,
    pub widgets: Vec<WidgetSlot>,
    pub clear_filters: Option<Locator>,
    pub detail_report: Option<Locator>,
    /// Which `svg.card` on the page carries the expected-total figure.
    pub summary_card_index: usize,
}

impl ViewConfig {
    pub fn new(url: &'static str, matcher: WidgetMatcher, widgets: Vec<WidgetSlot>) -> Self {
        Self {
            url,
            ready: Locator::css(READY_MARKER_CSS),
            widget_matcher: matcher,
            widgets,
            clear_filters: None,
            detail_report: None,
            summary_card_index: 1,
        }
    }

    pub fn with_clear_filters(mut self) -> Self {
        self.clear_filters = Some(Locator::xpath(CLEAR_FILTERS_XPATH));
        self
    }

    pub fn with_detail_report(mut self, xpath: &'static str) -> Self {
        self.detail_report = Some(Locator::xpath(xpath));
        self
    }

    /// Ordinal of the named widget within this view's declaration table.
    /// The scroll-region collection renders in the same order, so this also
    /// addresses the widget's option list.
    pub fn widget_position(&self, logical: &str) -> Option<usize> {
        self.widgets.iter().position(|slot| slot.logical == logical)
    }
}
