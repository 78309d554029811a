use std::fmt;

use serde::Serialize;
use url::Url;

use super::extraction::RowFailure;

/// A catalog row, addressed by its 1-based position in the rendered table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CatalogEntry {
    index: usize,
}

impl CatalogEntry {
    pub fn new(index: usize) -> Option<Self> {
        match index {
            0 => None,
            index => Some(CatalogEntry { index }),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Entries `1..=count` in table order.
    pub fn all(count: usize) -> impl Iterator<Item = CatalogEntry> {
        (1..=count).map(|index| CatalogEntry { index })
    }
}

impl fmt::Display for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}", self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DownloadLocator(String);

impl DownloadLocator {
    pub fn parse(href: &str) -> Result<Self, url::ParseError> {
        let href = href.trim();
        Url::parse(href)?;
        Ok(DownloadLocator(href.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment without the query string, e.g. `cv-corpus-18.0-ta.tar.gz`.
    pub fn file_name(&self) -> Option<String> {
        Url::parse(&self.0).ok().and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back().map(|s| s.to_string()))
                .filter(|s| !s.is_empty())
        })
    }
}

impl fmt::Display for DownloadLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Locators in catalog order, plus the rows that were skipped on the way.
#[derive(Debug, Default)]
pub struct HarvestResult {
    entries: Vec<(CatalogEntry, DownloadLocator)>,
    skipped: Vec<RowFailure>,
}

impl HarvestResult {
    pub fn push(&mut self, entry: CatalogEntry, locator: DownloadLocator) {
        self.entries.push((entry, locator));
    }

    pub fn record_skip(&mut self, failure: RowFailure) {
        self.skipped.push(failure);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(CatalogEntry, DownloadLocator)] {
        &self.entries
    }

    pub fn locators(&self) -> Vec<&DownloadLocator> {
        self.entries.iter().map(|(_, locator)| locator).collect()
    }

    pub fn skipped(&self) -> &[RowFailure] {
        &self.skipped
    }

    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}
