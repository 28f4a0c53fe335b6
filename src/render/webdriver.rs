//! [`RenderContext`] backed by a headless Chrome through WebDriver.
//!
//! Expects a chromedriver (or Selenium) endpoint already listening; this crate
//! does not install or spawn drivers.

use super::RenderContext;
use crate::auth::SessionCookie;
use crate::error::{CapabilityError, RenderError};
use thirtyfour::error::WebDriverError;
use thirtyfour::prelude::*;
use tracing::{debug, info, instrument};

impl From<WebDriverError> for RenderError {
    fn from(e: WebDriverError) -> Self {
        RenderError::Driver(e.to_string())
    }
}

/// A live WebDriver session.
pub struct WebDriverContext {
    driver: WebDriver,
}

impl WebDriverContext {
    /// Start a headless Chrome session on the WebDriver server at `server_url`.
    #[instrument(level = "info")]
    pub async fn connect(server_url: &str) -> Result<Self, CapabilityError> {
        let mut caps = DesiredCapabilities::chrome();
        caps.add_chrome_option(
            "args",
            vec![
                "--headless=new",
                "--no-sandbox",
                "--disable-dev-shm-usage",
                "--disable-gpu",
                "--window-size=1920,1080",
            ],
        )
        .map_err(|e| CapabilityError(format!("invalid chrome options: {e}")))?;

        let driver = WebDriver::new(server_url, caps)
            .await
            .map_err(|e| CapabilityError(format!("cannot reach WebDriver at {server_url}: {e}")))?;
        info!("Browser session started");
        Ok(Self { driver })
    }
}

impl RenderContext for WebDriverContext {
    type Element = WebElement;

    async fn navigate(&self, url: &str) -> Result<(), RenderError> {
        debug!(%url, "navigate");
        self.driver
            .goto(url)
            .await
            .map_err(|e| RenderError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn add_cookie(&self, cookie: &SessionCookie) -> Result<(), RenderError> {
        let mut c = Cookie::new(cookie.name.clone(), cookie.value.clone());
        if let Some(domain) = &cookie.domain {
            c.set_domain(domain.clone());
        }
        c.set_path(cookie.path.clone().unwrap_or_else(|| "/".to_string()));
        self.driver.add_cookie(c).await?;
        Ok(())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<WebElement>, RenderError> {
        Ok(self.driver.find_all(By::Css(selector)).await?)
    }

    async fn query_within(
        &self,
        scope: &WebElement,
        selector: &str,
    ) -> Result<Vec<WebElement>, RenderError> {
        Ok(scope.find_all(By::Css(selector)).await?)
    }

    async fn parent(&self, element: &WebElement) -> Result<WebElement, RenderError> {
        Ok(element.find(By::XPath("..")).await?)
    }

    async fn read_text(&self, element: &WebElement) -> Result<String, RenderError> {
        Ok(element.text().await?)
    }

    async fn attribute(
        &self,
        element: &WebElement,
        name: &str,
    ) -> Result<Option<String>, RenderError> {
        Ok(element.attr(name).await?)
    }

    async fn click(&self, element: &WebElement) -> Result<(), RenderError> {
        Ok(element.click().await?)
    }

    async fn close(self) -> Result<(), RenderError> {
        self.driver.quit().await?;
        info!("Browser session closed");
        Ok(())
    }
}
