//! Browser automation seam.
//!
//! The scrape core only ever talks to the dashboard through the small
//! [`UiDriver`] / [`UiElement`] traits declared here. The production
//! implementation sits on top of a WebDriver session
//! ([`webdriver::WebDriverSession`]); tests drive the same code against an
//! in-memory simulation of the virtualized grid.

pub mod retry;
pub mod webdriver;

#[cfg(test)]
pub(crate) mod fake;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Element address understood by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn xpath(path: impl Into<String>) -> Self {
        Locator::XPath(path.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css={s}"),
            Locator::XPath(s) => write!(f, "xpath={s}"),
        }
    }
}

/// Error taxonomy for UI interactions.
///
/// The transient variants map onto the W3C WebDriver error codes the
/// dashboard produces while it re-renders; they are retried or absorbed at
/// the interaction site rather than failing the unit.
#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("element went stale: {0}")]
    Stale(String),

    #[error("element not interactable: {0}")]
    NotInteractable(String),

    #[error("click intercepted by an overlay: {0}")]
    ClickIntercepted(String),

    #[error("element not found: {0}")]
    NotFound(String),

    #[error("timed out after {waited:?} waiting for {what}")]
    Timeout { what: String, waited: Duration },

    #[error("webdriver failure: {0}")]
    Driver(String),
}

impl AutomationError {
    /// Errors the dashboard produces transiently during re-render.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AutomationError::Stale(_)
                | AutomationError::NotInteractable(_)
                | AutomationError::ClickIntercepted(_)
                | AutomationError::NotFound(_)
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AutomationError::Timeout { .. })
    }
}

pub type AutomationResult<T> = Result<T, AutomationError>;

/// Handle to a rendered element.
#[async_trait]
pub trait UiElement: Clone + Send + Sync {
    async fn click(&self) -> AutomationResult<()>;

    async fn send_keys(&self, text: &str) -> AutomationResult<()>;

    async fn text(&self) -> AutomationResult<String>;

    async fn attr(&self, name: &str) -> AutomationResult<Option<String>>;

    async fn scroll_into_view(&self) -> AutomationResult<()>;

    /// Displayed and enabled, i.e. a click would land.
    async fn is_interactable(&self) -> AutomationResult<bool>;

    /// Descendant lookup, used for grid cells inside a row.
    async fn find_all(&self, locator: &Locator) -> AutomationResult<Vec<Self>>;
}

/// One owned browser session.
#[async_trait]
pub trait UiDriver: Send + Sync {
    type Elem: UiElement;

    async fn navigate(&self, url: &str) -> AutomationResult<()>;

    /// First match, `None` when absent.
    async fn find(&self, locator: &Locator) -> AutomationResult<Option<Self::Elem>>;

    /// All matches in document order.
    async fn find_all(&self, locator: &Locator) -> AutomationResult<Vec<Self::Elem>>;

    /// Injects keystrokes at the page level, wherever focus currently is.
    /// The slicer search boxes grab focus when their dropdown opens.
    async fn type_active(&self, text: &str) -> AutomationResult<()>;

    /// Static snapshot of the rendered markup for structural parsing.
    async fn page_markup(&self) -> AutomationResult<String>;
}

/// Creates and tears down isolated sessions, one per work unit.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    type Driver: UiDriver + Send + Sync + 'static;

    async fn open(&self) -> AutomationResult<Self::Driver>;

    async fn close(&self, driver: Self::Driver) -> AutomationResult<()>;
}
