use std::{future::Future, time::Duration};

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::{self, Instant};

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("webdriver error: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),

    #[error("render surface error: {0}")]
    Other(String),
}

/// A scriptable view of one live document. Everything the extraction code
/// does to the page goes through here.
#[async_trait]
pub trait RenderSurface: Send + Sync {
    type Element: Clone + Send + Sync;

    async fn navigate(&self, url: &str) -> Result<(), SurfaceError>;

    async fn set_viewport(&self, width: u32, height: u32) -> Result<(), SurfaceError>;

    async fn query(&self, selector: &str) -> Result<Option<Self::Element>, SurfaceError>;

    async fn query_all(&self, selector: &str) -> Result<Vec<Self::Element>, SurfaceError>;

    async fn click(&self, element: &Self::Element) -> Result<(), SurfaceError>;

    async fn clear(&self, element: &Self::Element) -> Result<(), SurfaceError>;

    async fn type_text(&self, element: &Self::Element, text: &str) -> Result<(), SurfaceError>;

    async fn read_property(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, SurfaceError>;

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, SurfaceError>;

    async fn scroll_into_view(&self, element: &Self::Element) -> Result<(), SurfaceError>;

    async fn close(&self) -> Result<(), SurfaceError>;

    /// Polls `query` until the selector resolves or `timeout` elapses.
    /// `Ok(None)` means the deadline passed.
    async fn wait_for_element(
        &self,
        selector: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Option<Self::Element>, SurfaceError> {
        poll_until(timeout, poll_interval, || self.query(selector)).await
    }
}

/// Runs `check` until it yields `Some`, an error, or the deadline passes.
/// The check always runs at least once, even with a zero timeout.
pub async fn poll_until<T, E, F, Fut>(
    timeout: Duration,
    poll_interval: Duration,
    mut check: F,
) -> Result<Option<T>, E>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<Option<T>, E>> + Send,
    T: Send,
{
    let deadline = Instant::now() + timeout;

    loop {
        if let Some(found) = check().await? {
            return Ok(Some(found));
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        time::sleep(poll_interval.min(deadline - now)).await;
    }
}

/// Reads a boolean DOM property such as `checked`. Missing counts as false.
pub async fn read_flag<S: RenderSurface + ?Sized>(
    surface: &S,
    element: &S::Element,
    name: &str,
) -> Result<bool, SurfaceError> {
    let value = surface.read_property(element, name).await?;
    Ok(matches!(value.as_deref(), Some("true")))
}
