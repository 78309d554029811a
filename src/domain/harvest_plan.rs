use std::time::Duration;

use serde::Deserialize;

/// What to do when one row's extraction fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run on the first failing row. Nothing is written.
    #[default]
    Abort,
    /// Record the failure, leave the row out of the result and keep going.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Budget for any single element to appear.
    pub element: Duration,
    /// Budget for the download link to materialize after the gating form.
    pub locator: Duration,
    pub poll_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct HarvestPlan {
    pub catalog_url: String,
    pub entry_count: usize,
    pub viewport: Viewport,
    pub placeholder_email: String,
    pub failure_policy: FailurePolicy,
    pub timeouts: Timeouts,
}
