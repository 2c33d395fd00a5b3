//! Filter dimensions: the named axes of dashboard filtering.
//!
//! A dimension is declared once per scrape target together with its legal
//! values and the interaction protocol its slicer widget requires. The
//! declaration order of dimensions on a target IS the order in which they
//! are applied to the dashboard; later selections operate on option sets
//! narrowed by earlier ones.

/// Logical widget names used across the dashboard views.
pub mod names {
    pub const STATE: &str = "STATE_NAME";
    pub const SESSION: &str = "ACADEMIC_SESSION";
    pub const CATEGORY: &str = "CATEGORY";
    pub const DISTRICT: &str = "DISTRICT_NAME";
    pub const COURSE_DURATION: &str = "COURSE_DURATION";
    pub const ITI: &str = "ITI";
    pub const ITI_CATEGORY: &str = "ITI_CATEGORY";
    pub const CITS_CERTIFIED: &str = "CITS_CERTIFIED";
}

/// How a filter value is selected inside its widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// All options are pre-rendered: open the dropdown, activate the option
    /// whose title matches, close the dropdown.
    Direct,
    /// The dropdown carries a search box: open, type the value to narrow the
    /// option list, activate the exact match, close.
    Search,
    /// A standalone search input outside any dropdown: click it, type the
    /// value, activate the exact match. The input has nothing to close.
    SearchBox,
    /// The options are always rendered on the page: activate the option
    /// whose title matches without touching any widget.
    TitleClick,
}

/// One named axis of dashboard filtering with its legal values.
#[derive(Debug, Clone)]
pub struct FilterDimension {
    /// Logical widget name, resolved to a structural address per session.
    pub name: &'static str,
    /// Interaction protocol for this widget.
    pub mode: SelectionMode,
    /// Legal values in declaration order.
    pub values: Vec<String>,
}

impl FilterDimension {
    pub fn new(name: &'static str, mode: SelectionMode, values: Vec<String>) -> Self {
        Self { name, mode, values }
    }

    /// Dimension selected by clicking a pre-rendered option.
    pub fn direct(name: &'static str, values: Vec<String>) -> Self {
        Self::new(name, SelectionMode::Direct, values)
    }

    /// Dimension selected through the dropdown's search box.
    pub fn search(name: &'static str, values: Vec<String>) -> Self {
        Self::new(name, SelectionMode::Search, values)
    }

    /// Dimension selected through a standalone search input.
    pub fn search_box(name: &'static str, values: Vec<String>) -> Self {
        Self::new(name, SelectionMode::SearchBox, values)
    }

    /// Dimension selected by bare title click, no widget involved.
    pub fn title_click(name: &'static str, values: Vec<String>) -> Self {
        Self::new(name, SelectionMode::TitleClick, values)
    }
}

/// Convenience for building owned value lists from static slices.
pub fn values_of(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|v| (*v).to_string()).collect()
}
