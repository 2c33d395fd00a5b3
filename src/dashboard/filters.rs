//! Slicer filter interaction protocols.
//!
//! Four selection protocols cover the widgets the views expose: plain
//! dropdowns with pre-rendered options, dropdowns that filter through a
//! search box, standalone search inputs, and always-rendered option tiles
//! activated by bare title click. Fixed settle delays between actions
//! absorb the dashboard's asynchronous re-render; there is no render
//! signal to wait on, so latency is traded for reliability.

use std::collections::BTreeSet;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::automation::retry::{wait_until, StabilityGate, WaitPolicy};
use crate::automation::{AutomationError, AutomationResult, Locator, UiDriver, UiElement};
use crate::domain::SelectionMode;

use super::locator::{WidgetAddress, WidgetMap};

/// Delays inserted between UI actions.
#[derive(Debug, Clone, Copy)]
pub struct InteractionTiming {
    pub wait: WaitPolicy,
    /// Standard settle between actions on the enrollment view.
    pub settle: Duration,
    /// Longer settle used by the instructor view's search inputs.
    pub long_settle: Duration,
    /// Extra settle after the report canvas first renders.
    pub page_ready: Duration,
}

impl Default for InteractionTiming {
    fn default() -> Self {
        Self {
            wait: WaitPolicy::default(),
            settle: Duration::from_secs(1),
            long_settle: Duration::from_secs(2),
            page_ready: Duration::from_secs(5),
        }
    }
}

/// Option element carrying the target value in its title attribute.
pub fn option_locator(value: &str) -> Locator {
    Locator::xpath(format!(r#"//div[@title="{value}"]"#))
}

/// Waits until the element at `locator` exists and a click would land.
pub async fn wait_clickable<D: UiDriver>(
    driver: &D,
    wait: WaitPolicy,
    locator: &Locator,
    what: &str,
) -> AutomationResult<D::Elem> {
    wait_until(wait, what, || async move {
        match driver.find(locator).await? {
            Some(element) => {
                if element.is_interactable().await? {
                    Ok(Some(element))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    })
    .await
}

/// Clicks a page-level control, absorbing every failure. Used for the
/// clear-filters bookmark and the detail-report navigation, where a missed
/// click surfaces downstream as missing data rather than here.
pub async fn best_effort_click<D: UiDriver>(
    driver: &D,
    timing: &InteractionTiming,
    locator: &Locator,
    what: &str,
) {
    match wait_clickable(driver, timing.wait, locator, what).await {
        Ok(element) => match element.click().await {
            Ok(()) => {
                debug!("clicked {what}");
                sleep(timing.settle).await;
            }
            Err(e) => warn!("could not click {what}: {e}"),
        },
        Err(e) => warn!("timed out waiting for {what}: {e}"),
    }
}

/// Applies filter selections against one session's resolved widgets.
pub struct FilterController<'a, D: UiDriver> {
    driver: &'a D,
    widgets: &'a WidgetMap,
    timing: InteractionTiming,
}

impl<'a, D: UiDriver> FilterController<'a, D> {
    pub fn new(driver: &'a D, widgets: &'a WidgetMap, timing: InteractionTiming) -> Self {
        Self {
            driver,
            widgets,
            timing,
        }
    }

    pub fn timing(&self) -> &InteractionTiming {
        &self.timing
    }

    fn address(&self, widget: &str) -> AutomationResult<&WidgetAddress> {
        self.widgets.get(widget).ok_or_else(|| {
            AutomationError::NotFound(format!("no resolved address for widget {widget}"))
        })
    }

    /// Waits until the element at `locator` exists and a click would land.
    pub async fn wait_clickable(&self, locator: &Locator, what: &str) -> AutomationResult<D::Elem> {
        wait_clickable(self.driver, self.timing.wait, locator, what).await
    }

    /// Opens the named widget's dropdown and returns its handle so the
    /// caller can close it again.
    pub async fn open_widget(&self, widget: &str) -> AutomationResult<D::Elem> {
        let locator = self.address(widget)?.locator();
        let dropdown = self.wait_clickable(&locator, widget).await?;
        dropdown.click().await?;
        sleep(self.timing.settle).await;
        Ok(dropdown)
    }

    /// Applies one filter selection with the protocol declared for it.
    pub async fn apply(
        &self,
        widget: &'static str,
        mode: SelectionMode,
        value: &str,
    ) -> AutomationResult<()> {
        info!("selecting {widget} = {value}");
        match mode {
            SelectionMode::Direct => self.select_direct(widget, value).await,
            SelectionMode::Search => self.select_search(widget, value).await,
            SelectionMode::SearchBox => self.select_search_box(widget, value).await,
            SelectionMode::TitleClick => self.select_title(value).await,
        }
    }

    /// Direct-select: open, activate the pre-rendered option, close.
    async fn select_direct(&self, widget: &'static str, value: &str) -> AutomationResult<()> {
        let dropdown = self.open_widget(widget).await?;

        let option = self
            .wait_clickable(&option_locator(value), &format!("{widget} option {value}"))
            .await?;
        option.click().await?;
        sleep(self.timing.settle).await;

        dropdown.click().await?;
        Ok(())
    }

    /// Search-select: open, inject keystrokes to narrow the option list,
    /// activate the exact match, close.
    async fn select_search(&self, widget: &'static str, value: &str) -> AutomationResult<()> {
        sleep(self.timing.settle).await;
        let dropdown = self.open_widget(widget).await?;

        self.driver.type_active(value).await?;
        sleep(self.timing.settle).await;

        let option = self
            .wait_clickable(&option_locator(value), &format!("{widget} option {value}"))
            .await?;
        option.click().await?;
        sleep(self.timing.settle).await;

        dropdown.click().await?;
        Ok(())
    }

    /// Standalone search input: click it, type, activate the match. The
    /// input sits outside any dropdown, so there is nothing to close.
    async fn select_search_box(&self, widget: &'static str, value: &str) -> AutomationResult<()> {
        sleep(self.timing.long_settle).await;
        let locator = self.address(widget)?.locator();
        let search_box = self.wait_clickable(&locator, widget).await?;
        search_box.click().await?;
        sleep(self.timing.long_settle).await;

        self.driver.type_active(value).await?;
        sleep(self.timing.long_settle).await;

        let option = self
            .wait_clickable(&option_locator(value), &format!("{widget} option {value}"))
            .await?;
        option.click().await?;
        Ok(())
    }

    /// Always-rendered option tiles: activate by title, no widget involved.
    async fn select_title(&self, value: &str) -> AutomationResult<()> {
        sleep(self.timing.long_settle).await;
        let option = self
            .wait_clickable(&option_locator(value), &format!("option {value}"))
            .await?;
        option.click().await?;
        Ok(())
    }
}

/// Drains a widget's virtualized option list.
///
/// The option list renders the same way the detail grid does, a visible
/// window that moves on scroll, so the same stability policy terminates the
/// enumeration: stop once repeated reads yield nothing new. Used by the
/// district-discovery unit.
pub async fn enumerate_options<D: UiDriver>(
    driver: &D,
    controller: &FilterController<'_, D>,
    widget: &'static str,
    region: &WidgetAddress,
    stall_budget: u32,
) -> AutomationResult<Vec<String>> {
    let dropdown = controller.open_widget(widget).await?;

    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut gate = StabilityGate::new(stall_budget);
    loop {
        let options = driver.find_all(&region.descendants("//div[@title]")).await?;
        let before = seen.len();
        for option in &options {
            if let Some(title) = option.attr("title").await? {
                if title != "Select all" {
                    seen.insert(title);
                }
            }
        }
        gate.observe(seen.len() > before);
        if gate.exhausted() {
            break;
        }

        // scroll an option near the tail into view to advance the window
        let anchor = seen.iter().nth(seen.len().saturating_sub(3)).cloned();
        if let Some(anchor) = anchor {
            if let Some(element) = driver.find(&option_locator(&anchor)).await? {
                element.scroll_into_view().await?;
            }
        }
        sleep(controller.timing().settle).await;
    }

    dropdown.click().await?;
    Ok(seen.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::fake::{FakeDriver, FakeElement};
    use crate::dashboard::locator::resolve_widgets;
    use crate::dashboard::view::{ViewConfig, WidgetMatcher, WidgetSlot};

    fn fast_timing() -> InteractionTiming {
        InteractionTiming {
            wait: WaitPolicy {
                timeout: Duration::from_millis(40),
                poll: Duration::from_millis(2),
            },
            settle: Duration::from_millis(1),
            long_settle: Duration::from_millis(1),
            page_ready: Duration::from_millis(1),
        }
    }

    fn widgets_for(driver: &FakeDriver) -> WidgetMap {
        driver.set_markup(
            r#"<html><body><div class="slicer-dropdown-menu">S</div></body></html>"#,
        );
        let view = ViewConfig::new(
            "about:blank",
            WidgetMatcher::SlicerDropdowns,
            vec![WidgetSlot::new("STATE_NAME", 0)],
        );
        resolve_widgets(
            r#"<html><body><div class="slicer-dropdown-menu">S</div></body></html>"#,
            &view,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn direct_select_opens_activates_and_closes() {
        let driver = FakeDriver::new();
        let widgets = widgets_for(&driver);

        let (dropdown, dropdown_clicks) = FakeElement::button("dropdown");
        driver.register(widgets["STATE_NAME"].locator(), dropdown);
        let (option, option_clicks) = FakeElement::button("GEN");
        driver.register(option_locator("GEN"), option);

        let controller = FilterController::new(&driver, &widgets, fast_timing());
        controller
            .apply("STATE_NAME", SelectionMode::Direct, "GEN")
            .await
            .unwrap();

        assert_eq!(dropdown_clicks.load(std::sync::atomic::Ordering::SeqCst), 2);
        assert_eq!(option_clicks.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn search_select_injects_keystrokes_before_activating() {
        let driver = FakeDriver::new();
        let widgets = widgets_for(&driver);

        let (dropdown, _) = FakeElement::button("dropdown");
        driver.register(widgets["STATE_NAME"].locator(), dropdown);
        let (option, option_clicks) = FakeElement::button("BIHAR");
        driver.register(option_locator("BIHAR"), option);

        let controller = FilterController::new(&driver, &widgets, fast_timing());
        controller
            .apply("STATE_NAME", SelectionMode::Search, "BIHAR")
            .await
            .unwrap();

        assert_eq!(driver.typed_text(), vec!["BIHAR".to_string()]);
        assert_eq!(option_clicks.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unresolved_widget_is_an_error() {
        let driver = FakeDriver::new();
        let widgets = widgets_for(&driver);

        let controller = FilterController::new(&driver, &widgets, fast_timing());
        let result = controller
            .apply("ACADEMIC_SESSION", SelectionMode::Direct, "2013")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn timeout_while_selecting_is_a_timeout_error() {
        let driver = FakeDriver::new();
        let widgets = widgets_for(&driver);

        let (dropdown, _) = FakeElement::button("dropdown");
        driver.register(widgets["STATE_NAME"].locator(), dropdown);

        let controller = FilterController::new(&driver, &widgets, fast_timing());
        let result = controller
            .apply("STATE_NAME", SelectionMode::Direct, "NOWHERE")
            .await;
        match result {
            Err(e) => assert!(e.is_timeout(), "expected timeout, got {e}"),
            Ok(()) => panic!("selection should not succeed"),
        }
    }

    #[tokio::test]
    async fn title_click_needs_no_widget_address() {
        let driver = FakeDriver::new();
        let widgets = WidgetMap::new();

        let (option, option_clicks) = FakeElement::button("Yes");
        driver.register(option_locator("Yes"), option);

        let controller = FilterController::new(&driver, &widgets, fast_timing());
        controller
            .apply("CITS_CERTIFIED", SelectionMode::TitleClick, "Yes")
            .await
            .unwrap();
        assert_eq!(option_clicks.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn option_enumeration_stops_once_the_list_is_stable() {
        let driver = FakeDriver::new();
        let markup = r#"<html><body>
            <div class="slicer-dropdown-menu">D</div>
            <div class="scrollRegion"></div>
        </body></html>"#;
        driver.set_markup(markup);
        let view = ViewConfig::new(
            "about:blank",
            WidgetMatcher::SlicerDropdowns,
            vec![WidgetSlot::new("DISTRICT_NAME", 0)],
        );
        let widgets = resolve_widgets(markup, &view).unwrap();

        let (dropdown, dropdown_clicks) = FakeElement::button("dropdown");
        driver.register(widgets["DISTRICT_NAME"].locator(), dropdown);

        let region = crate::dashboard::locator::nth_match_path(markup, "div.scrollRegion", 0)
            .unwrap()
            .unwrap();
        let (options, _) = FakeElement::button("KAMRUP\nNAGAON");
        driver.register(region.descendants("//div[@title]"), options);

        let controller = FilterController::new(&driver, &widgets, fast_timing());
        let found = enumerate_options(&driver, &controller, "DISTRICT_NAME", &region, 2)
            .await
            .unwrap();

        // the fake serves one static option element whose title never grows
        assert_eq!(found, vec!["KAMRUP\nNAGAON".to_string()]);
        // dropdown opened once and closed once
        assert_eq!(dropdown_clicks.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
