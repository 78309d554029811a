use itertools::Itertools;

use crate::domain::{
    catalog::{CatalogEntry, HarvestResult},
    extraction::HarvestError,
    harvest_plan::{FailurePolicy, HarvestPlan},
    page_layout,
};

use super::{poll_until, RenderSurface, RowExtractor, SurfaceError};

const READY_STATE_SCRIPT: &str = "return document.readyState;";

pub struct CatalogHarvester<'a, S: RenderSurface + ?Sized> {
    surface: &'a S,
    plan: HarvestPlan,
}

impl<'a, S: RenderSurface + ?Sized> CatalogHarvester<'a, S> {
    pub fn new(surface: &'a S, plan: HarvestPlan) -> Self {
        CatalogHarvester { surface, plan }
    }

    /// Loads the catalog and extracts one locator per row, rows `1..=entry_count`
    /// strictly in order.
    pub async fn harvest(&self, entry_count: usize) -> Result<HarvestResult, HarvestError> {
        self.open_catalog().await?;

        let extractor = RowExtractor::new(
            self.surface,
            self.plan.timeouts,
            &self.plan.placeholder_email,
        );
        let mut result = HarvestResult::default();

        for entry in CatalogEntry::all(entry_count) {
            log::info!("Harvesting {} of {}", entry, entry_count);

            match extractor.extract(entry).await {
                Ok(locator) => {
                    log::info!(
                        "Captured locator for {}: {}",
                        entry,
                        locator.file_name().unwrap_or_else(|| locator.to_string())
                    );
                    result.push(entry, locator);
                }
                Err(failure) => match self.plan.failure_policy {
                    FailurePolicy::Abort => {
                        log::error!("Aborting harvest: {}", failure);
                        return Err(failure.into());
                    }
                    FailurePolicy::Skip => {
                        log::warn!("Skipping {}: {}", entry, failure);
                        result.record_skip(failure);
                    }
                },
            }
        }

        if result.is_complete() {
            log::info!("Harvested {} locators", result.len());
        } else {
            log::warn!(
                "Harvested {} of {} locators, skipped rows: {}",
                result.len(),
                entry_count,
                result.skipped().iter().map(|f| f.index).join(", ")
            );
        }

        Ok(result)
    }

    async fn open_catalog(&self) -> Result<(), HarvestError> {
        log::info!("Opening catalog at {}", self.plan.catalog_url);

        self.surface.navigate(&self.plan.catalog_url).await?;
        self.surface
            .set_viewport(self.plan.viewport.width, self.plan.viewport.height)
            .await?;

        self.await_document_ready().await?;
        let locale_select = self.setup_wait(page_layout::LOCALE_SELECT).await?;
        self.surface.click(&locale_select).await?;
        self.setup_wait(page_layout::BUNDLE_LOCALE).await?;

        Ok(())
    }

    async fn await_document_ready(&self) -> Result<(), HarvestError> {
        let timeouts = self.plan.timeouts;
        let ready = poll_until(timeouts.element, timeouts.poll_interval, || async {
            let state = self.surface.evaluate(READY_STATE_SCRIPT).await?;
            Ok::<_, SurfaceError>((state.as_str() == Some("complete")).then_some(()))
        })
        .await?;

        ready.ok_or_else(|| HarvestError::SetupTimeout {
            selector: "document.readyState".to_string(),
            timeout: timeouts.element,
        })
    }

    async fn setup_wait(&self, selector: &str) -> Result<S::Element, HarvestError> {
        let timeouts = self.plan.timeouts;
        self.surface
            .wait_for_element(selector, timeouts.element, timeouts.poll_interval)
            .await?
            .ok_or_else(|| HarvestError::SetupTimeout {
                selector: selector.to_string(),
                timeout: timeouts.element,
            })
    }
}
