use crate::domain::{extraction::ExtractionError, harvest_plan::Timeouts};

use super::{read_flag, RenderSurface};

/// Activations the mailing-list correction may spend before giving up. The
/// first read of that checkbox is not trusted, so one corrective click is
/// allowed on top of the normal one.
const CORRECTION_ACTIVATIONS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub activations: usize,
    pub state: bool,
}

/// Drives checkbox-like controls to a wanted state without assuming what
/// state they start in.
pub struct ToggleNormalizer<'a, S: RenderSurface + ?Sized> {
    surface: &'a S,
    timeouts: Timeouts,
}

impl<'a, S: RenderSurface + ?Sized> ToggleNormalizer<'a, S> {
    pub fn new(surface: &'a S, timeouts: Timeouts) -> Self {
        ToggleNormalizer { surface, timeouts }
    }

    /// One activation at most. No-op when the control already reads `desired`.
    pub async fn ensure(
        &self,
        selector: &str,
        desired: bool,
    ) -> Result<ToggleOutcome, ExtractionError> {
        self.drive(selector, desired, 1).await
    }

    /// Leaves the control unchecked whatever it started as.
    pub async fn ensure_unchecked_with_correction(
        &self,
        selector: &str,
    ) -> Result<ToggleOutcome, ExtractionError> {
        self.drive(selector, false, CORRECTION_ACTIVATIONS).await
    }

    async fn drive(
        &self,
        selector: &str,
        desired: bool,
        max_activations: usize,
    ) -> Result<ToggleOutcome, ExtractionError> {
        let control = self
            .surface
            .wait_for_element(selector, self.timeouts.element, self.timeouts.poll_interval)
            .await?
            .ok_or_else(|| ExtractionError::ControlNotFound {
                selector: selector.to_string(),
                timeout: self.timeouts.element,
            })?;

        let mut state = read_flag(self.surface, &control, "checked").await?;
        let mut activations = 0;

        while state != desired && activations < max_activations {
            self.surface.click(&control).await?;
            activations += 1;
            state = read_flag(self.surface, &control, "checked").await?;
        }

        if state != desired {
            log::error!(
                "Control {} still reads {} after {} activation(s)",
                selector,
                state,
                activations
            );
            return Err(ExtractionError::ToggleUnresponsive {
                selector: selector.to_string(),
                actual: state,
            });
        }

        log::debug!(
            "Control {} set to {} with {} activation(s)",
            selector,
            desired,
            activations
        );
        Ok(ToggleOutcome { activations, state })
    }
}
