use std::{fmt, time::Duration};

use thiserror::Error;

use crate::services::SurfaceError;

/// States of the per-row extraction protocol, in the order they are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStep {
    Idle,
    RowSelected,
    FormPresented,
    GatingSatisfied,
    LocatorAvailable,
    Extracted,
}

impl ExtractionStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStep::Idle => "Idle",
            ExtractionStep::RowSelected => "RowSelected",
            ExtractionStep::FormPresented => "FormPresented",
            ExtractionStep::GatingSatisfied => "GatingSatisfied",
            ExtractionStep::LocatorAvailable => "LocatorAvailable",
            ExtractionStep::Extracted => "Extracted",
        }
    }

    pub fn next(&self) -> Option<ExtractionStep> {
        match self {
            ExtractionStep::Idle => Some(ExtractionStep::RowSelected),
            ExtractionStep::RowSelected => Some(ExtractionStep::FormPresented),
            ExtractionStep::FormPresented => Some(ExtractionStep::GatingSatisfied),
            ExtractionStep::GatingSatisfied => Some(ExtractionStep::LocatorAvailable),
            ExtractionStep::LocatorAvailable => Some(ExtractionStep::Extracted),
            ExtractionStep::Extracted => None,
        }
    }
}

impl fmt::Display for ExtractionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("control `{selector}` did not resolve within {timeout:?}")]
    ControlNotFound { selector: String, timeout: Duration },

    #[error("timed out after {timeout:?} at {step} waiting for `{selector}`")]
    SelectorTimeout {
        step: ExtractionStep,
        selector: String,
        timeout: Duration,
    },

    #[error("`{label}` link was present but yielded no locator")]
    ExtractionEmpty { label: String },

    #[error("`{href}` is not a fully-qualified locator")]
    MalformedLocator {
        href: String,
        #[source]
        source: url::ParseError,
    },

    #[error("gating control `{control}` holds `{actual}` after being set")]
    GatingIncomplete { control: String, actual: String },

    #[error("control `{selector}` stayed {actual} after activation")]
    ToggleUnresponsive { selector: String, actual: bool },

    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// An extraction failure pinned to the row and the step it was trying to reach.
#[derive(Debug, Error)]
#[error("row {index} failed at step {step}: {source}")]
pub struct RowFailure {
    pub index: usize,
    pub step: ExtractionStep,
    #[source]
    pub source: ExtractionError,
}

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("catalog page never became interactive: `{selector}` missing after {timeout:?}")]
    SetupTimeout { selector: String, timeout: Duration },

    #[error(transparent)]
    Row(#[from] RowFailure),

    #[error(transparent)]
    Surface(#[from] SurfaceError),
}
