use async_trait::async_trait;
use thirtyfour::{By, ChromiumLikeCapabilities, DesiredCapabilities, WebDriver, WebElement};

use crate::configuration::WebDriverSettings;

use super::{RenderSurface, SurfaceError};

const CHROME_SIZE_SCRIPT: &str =
    "return [window.outerWidth - window.innerWidth, window.outerHeight - window.innerHeight];";

/// Chrome session driven through a WebDriver endpoint.
pub struct Droid {
    pub driver: WebDriver,
}

impl Droid {
    pub async fn new(settings: &WebDriverSettings) -> Result<Self, SurfaceError> {
        let mut caps = DesiredCapabilities::chrome();
        if settings.headless {
            caps.set_headless()?;
        }

        // http://chrome:4444/wd/hub
        // http://localhost:9515
        let driver = WebDriver::new(settings.server_url.as_str(), caps).await?;
        log::info!("Connected to webdriver at {}", settings.server_url);

        Ok(Droid { driver })
    }
}

#[async_trait]
impl RenderSurface for Droid {
    type Element = WebElement;

    async fn navigate(&self, url: &str) -> Result<(), SurfaceError> {
        self.driver.goto(url).await?;
        Ok(())
    }

    /// WebDriver sizes the outer window, so the browser chrome measured from
    /// the page is added on top to land the requested inner viewport.
    async fn set_viewport(&self, width: u32, height: u32) -> Result<(), SurfaceError> {
        let chrome = self
            .driver
            .execute(CHROME_SIZE_SCRIPT, Vec::new())
            .await?
            .json()
            .clone();
        let (outer_width, outer_height) = outer_window_size(width, height, &chrome);
        self.driver
            .set_window_rect(0, 0, outer_width, outer_height)
            .await?;
        log::debug!(
            "Viewport {}x{} needs a {}x{} window",
            width,
            height,
            outer_width,
            outer_height
        );
        Ok(())
    }

    async fn query(&self, selector: &str) -> Result<Option<WebElement>, SurfaceError> {
        Ok(self.query_all(selector).await?.into_iter().next())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<WebElement>, SurfaceError> {
        Ok(self.driver.find_all(By::Css(selector)).await?)
    }

    async fn click(&self, element: &WebElement) -> Result<(), SurfaceError> {
        // Styled checkboxes hide their <input>, which a native click refuses.
        if let Err(e) = element.click().await {
            log::debug!("Native click failed, falling back to script click: {:?}", e);
            self.driver
                .execute("arguments[0].click();", vec![element.to_json()?])
                .await?;
        }
        Ok(())
    }

    async fn clear(&self, element: &WebElement) -> Result<(), SurfaceError> {
        element.clear().await?;
        Ok(())
    }

    async fn type_text(&self, element: &WebElement, text: &str) -> Result<(), SurfaceError> {
        element.send_keys(text).await?;
        Ok(())
    }

    async fn read_property(
        &self,
        element: &WebElement,
        name: &str,
    ) -> Result<Option<String>, SurfaceError> {
        Ok(element.prop(name).await?)
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, SurfaceError> {
        let ret = self.driver.execute(script, Vec::new()).await?;
        Ok(ret.json().clone())
    }

    async fn scroll_into_view(&self, element: &WebElement) -> Result<(), SurfaceError> {
        element.scroll_into_view().await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), SurfaceError> {
        self.driver.clone().quit().await?;
        Ok(())
    }
}

/// Window size that yields a `width`x`height` viewport given the measured
/// `[dw, dh]` chrome. Anything unreadable or negative counts as no chrome,
/// which is what headless Chrome reports.
fn outer_window_size(width: u32, height: u32, chrome: &serde_json::Value) -> (u32, u32) {
    let extra = |i: usize| {
        chrome
            .get(i)
            .and_then(serde_json::Value::as_i64)
            .and_then(|d| u32::try_from(d).ok())
            .unwrap_or(0)
    };
    (width + extra(0), height + extra(1))
}
