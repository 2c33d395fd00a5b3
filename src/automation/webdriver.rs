//! WebDriver-backed implementation of the automation seam.
//!
//! Sessions are created against an external chromedriver endpoint, one
//! isolated headless-Chrome session per work unit, and destroyed when the
//! unit finishes. Nothing here is shared across sessions.

use async_trait::async_trait;
use thirtyfour::error::WebDriverError;
use thirtyfour::{By, ChromiumLikeCapabilities, DesiredCapabilities, WebDriver, WebElement};
use tracing::{debug, info};
use uuid::Uuid;

use crate::infrastructure::config::WebDriverConfig;

use super::{AutomationError, AutomationResult, Locator, SessionProvider, UiDriver, UiElement};

/// Maps a WebDriver failure onto the scrape core's error taxonomy.
///
/// Classification goes through the W3C error strings ("stale element
/// reference", "element click intercepted", ...) carried in the payload,
/// which are stable across protocol implementations.
fn classify(err: WebDriverError) -> AutomationError {
    let message = err.to_string();
    let lower = message.to_lowercase();
    if lower.contains("stale element") {
        AutomationError::Stale(message)
    } else if lower.contains("click intercepted") {
        AutomationError::ClickIntercepted(message)
    } else if lower.contains("not interactable") {
        AutomationError::NotInteractable(message)
    } else if lower.contains("no such element") || lower.contains("unable to locate element") {
        AutomationError::NotFound(message)
    } else {
        AutomationError::Driver(message)
    }
}

fn to_by(locator: &Locator) -> By {
    match locator {
        Locator::Css(s) => By::Css(s.as_str()),
        Locator::XPath(s) => By::XPath(s.as_str()),
    }
}

/// Element handle bound to one session.
#[derive(Clone)]
pub struct WebDriverHandle {
    inner: WebElement,
}

#[async_trait]
impl UiElement for WebDriverHandle {
    async fn click(&self) -> AutomationResult<()> {
        self.inner.click().await.map_err(classify)
    }

    async fn send_keys(&self, text: &str) -> AutomationResult<()> {
        self.inner.send_keys(text).await.map_err(classify)
    }

    async fn text(&self) -> AutomationResult<String> {
        self.inner.text().await.map_err(classify)
    }

    async fn attr(&self, name: &str) -> AutomationResult<Option<String>> {
        self.inner.attr(name).await.map_err(classify)
    }

    async fn scroll_into_view(&self) -> AutomationResult<()> {
        self.inner.scroll_into_view().await.map_err(classify)
    }

    async fn is_interactable(&self) -> AutomationResult<bool> {
        self.inner.is_clickable().await.map_err(classify)
    }

    async fn find_all(&self, locator: &Locator) -> AutomationResult<Vec<Self>> {
        let found = self
            .inner
            .find_all(to_by(locator))
            .await
            .map_err(classify)?;
        Ok(found.into_iter().map(|inner| Self { inner }).collect())
    }
}

/// One exclusive browser session.
pub struct WebDriverSession {
    driver: WebDriver,
    session_id: Uuid,
}

impl WebDriverSession {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }
}

#[async_trait]
impl UiDriver for WebDriverSession {
    type Elem = WebDriverHandle;

    async fn navigate(&self, url: &str) -> AutomationResult<()> {
        debug!("[{}] navigating to {url}", self.session_id);
        self.driver.goto(url).await.map_err(classify)
    }

    async fn find(&self, locator: &Locator) -> AutomationResult<Option<Self::Elem>> {
        match self.driver.find(to_by(locator)).await {
            Ok(inner) => Ok(Some(WebDriverHandle { inner })),
            Err(err) => match classify(err) {
                AutomationError::NotFound(_) => Ok(None),
                other => Err(other),
            },
        }
    }

    async fn find_all(&self, locator: &Locator) -> AutomationResult<Vec<Self::Elem>> {
        let found = self
            .driver
            .find_all(to_by(locator))
            .await
            .map_err(classify)?;
        Ok(found
            .into_iter()
            .map(|inner| WebDriverHandle { inner })
            .collect())
    }

    async fn type_active(&self, text: &str) -> AutomationResult<()> {
        self.driver
            .action_chain()
            .send_keys(text)
            .perform()
            .await
            .map_err(classify)
    }

    async fn page_markup(&self) -> AutomationResult<String> {
        self.driver.source().await.map_err(classify)
    }
}

/// Opens isolated headless-Chrome sessions against a chromedriver endpoint.
#[derive(Debug, Clone)]
pub struct ChromeSessionProvider {
    config: WebDriverConfig,
}

impl ChromeSessionProvider {
    pub fn new(config: WebDriverConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionProvider for ChromeSessionProvider {
    type Driver = WebDriverSession;

    async fn open(&self) -> AutomationResult<Self::Driver> {
        let mut caps = DesiredCapabilities::chrome();
        if self.config.headless {
            caps.add_arg("--headless").map_err(classify)?;
        }
        for arg in &self.config.chrome_args {
            caps.add_arg(arg).map_err(classify)?;
        }

        let driver = WebDriver::new(&self.config.server_url, caps)
            .await
            .map_err(classify)?;
        let session_id = Uuid::new_v4();
        info!("[{session_id}] opened browser session");
        Ok(WebDriverSession { driver, session_id })
    }

    async fn close(&self, session: Self::Driver) -> AutomationResult<()> {
        let id = session.session_id;
        session.driver.quit().await.map_err(classify)?;
        info!("[{id}] closed browser session");
        Ok(())
    }
}
