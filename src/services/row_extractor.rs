use crate::domain::{
    catalog::{CatalogEntry, DownloadLocator},
    extraction::{ExtractionError, ExtractionStep, RowFailure},
    gating::GatingState,
    harvest_plan::Timeouts,
    page_layout,
};

use super::{poll_until, RenderSurface, SurfaceError, ToggleNormalizer};

/// Walks one catalog row from selection to a captured download locator.
pub struct RowExtractor<'a, S: RenderSurface + ?Sized> {
    surface: &'a S,
    timeouts: Timeouts,
    placeholder_email: &'a str,
}

impl<'a, S: RenderSurface + ?Sized> RowExtractor<'a, S> {
    pub fn new(surface: &'a S, timeouts: Timeouts, placeholder_email: &'a str) -> Self {
        RowExtractor {
            surface,
            timeouts,
            placeholder_email,
        }
    }

    pub async fn extract(&self, entry: CatalogEntry) -> Result<DownloadLocator, RowFailure> {
        let mut reached = ExtractionStep::Idle;

        match self.run(entry, &mut reached).await {
            Ok(locator) => Ok(locator),
            Err(source) => Err(RowFailure {
                index: entry.index(),
                step: reached.next().unwrap_or(reached),
                source,
            }),
        }
    }

    async fn run(
        &self,
        entry: CatalogEntry,
        reached: &mut ExtractionStep,
    ) -> Result<DownloadLocator, ExtractionError> {
        self.select_row(entry).await?;
        *reached = ExtractionStep::RowSelected;

        self.await_form().await?;
        *reached = ExtractionStep::FormPresented;

        let gating = self.satisfy_gating().await?;
        if let Some((control, actual)) = gating.unmet(self.placeholder_email) {
            log::error!("Gating form for {} incomplete: {:?}", entry, gating);
            return Err(ExtractionError::GatingIncomplete {
                control: control.to_string(),
                actual,
            });
        }
        *reached = ExtractionStep::GatingSatisfied;

        self.await_locator().await?;
        *reached = ExtractionStep::LocatorAvailable;

        let locator = self.read_locator().await?;
        *reached = ExtractionStep::Extracted;

        Ok(locator)
    }

    async fn select_row(&self, entry: CatalogEntry) -> Result<(), ExtractionError> {
        self.wait_for(page_layout::FIRST_ROW_MARKER, ExtractionStep::RowSelected)
            .await?;

        // Resolved fresh every time, the panel re-render invalidates old handles.
        let target = page_layout::row_target(entry.index());
        let row = self.wait_for(&target, ExtractionStep::RowSelected).await?;

        self.surface.scroll_into_view(&row).await?;
        self.surface.click(&row).await?;
        log::debug!("Selected {}", entry);
        Ok(())
    }

    async fn await_form(&self) -> Result<(), ExtractionError> {
        self.wait_for(page_layout::PANEL_ROOT, ExtractionStep::FormPresented)
            .await?;
        self.wait_for(&page_layout::confirm_size(), ExtractionStep::FormPresented)
            .await?;
        Ok(())
    }

    /// Sets every control on the shared panel, so nothing left over from the
    /// previous row carries into this one.
    async fn satisfy_gating(&self) -> Result<GatingState, ExtractionError> {
        let toggles = ToggleNormalizer::new(self.surface, self.timeouts);
        let mut gating = GatingState::default();

        gating.size_acknowledged = toggles
            .ensure(&page_layout::confirm_size(), true)
            .await?
            .state;
        gating.confirmed = toggles
            .ensure(&page_layout::secondary_confirmation(), true)
            .await?
            .state;

        gating.email = Some(self.fill_email().await?);

        gating.mailing_list_opt_in = toggles
            .ensure_unchecked_with_correction(&page_layout::mailing_list_opt_in())
            .await?
            .state;

        Ok(gating)
    }

    async fn fill_email(&self) -> Result<String, ExtractionError> {
        let selector = page_layout::enabled_email_field();
        let field = self
            .surface
            .wait_for_element(&selector, self.timeouts.element, self.timeouts.poll_interval)
            .await?
            .ok_or_else(|| ExtractionError::ControlNotFound {
                selector: selector.clone(),
                timeout: self.timeouts.element,
            })?;

        self.surface.clear(&field).await?;
        self.surface.type_text(&field, self.placeholder_email).await?;

        let value = self
            .surface
            .read_property(&field, "value")
            .await?
            .unwrap_or_else(|| self.placeholder_email.to_string());

        if value != self.placeholder_email {
            return Err(ExtractionError::GatingIncomplete {
                control: selector,
                actual: value,
            });
        }
        Ok(value)
    }

    async fn await_locator(&self) -> Result<(), ExtractionError> {
        let links = poll_until(self.timeouts.locator, self.timeouts.poll_interval, || {
            self.labelled_download_links()
        })
        .await?;

        links.map(|_| ()).ok_or_else(|| ExtractionError::SelectorTimeout {
            step: ExtractionStep::LocatorAvailable,
            selector: page_layout::DOWNLOAD_LINK.to_string(),
            timeout: self.timeouts.locator,
        })
    }

    async fn read_locator(&self) -> Result<DownloadLocator, ExtractionError> {
        let empty = || ExtractionError::ExtractionEmpty {
            label: page_layout::DOWNLOAD_LABEL.to_string(),
        };

        let links = self.labelled_download_links().await?.ok_or_else(empty)?;
        let first = links.first().ok_or_else(empty)?;

        let href = self
            .surface
            .read_property(first, "href")
            .await?
            .filter(|href| !href.trim().is_empty())
            .ok_or_else(empty)?;

        DownloadLocator::parse(&href)
            .map_err(|source| ExtractionError::MalformedLocator { href, source })
    }

    /// Download links whose text is exactly the bundle label. `None` when
    /// there are none yet.
    async fn labelled_download_links(&self) -> Result<Option<Vec<S::Element>>, SurfaceError> {
        let mut matching = vec![];

        for link in self.surface.query_all(page_layout::DOWNLOAD_LINK).await? {
            let text = self.surface.read_property(&link, "textContent").await?;
            if text.as_deref().map(str::trim) == Some(page_layout::DOWNLOAD_LABEL) {
                matching.push(link);
            }
        }

        Ok((!matching.is_empty()).then_some(matching))
    }

    async fn wait_for(
        &self,
        selector: &str,
        step: ExtractionStep,
    ) -> Result<S::Element, ExtractionError> {
        self.surface
            .wait_for_element(selector, self.timeouts.element, self.timeouts.poll_interval)
            .await?
            .ok_or_else(|| ExtractionError::SelectorTimeout {
                step,
                selector: selector.to_string(),
                timeout: self.timeouts.element,
            })
    }
}
