pub mod catalog_harvester;
pub mod droid;
pub mod render_surface;
pub mod row_extractor;
pub mod toggle_normalizer;

#[cfg(test)]
pub(crate) mod fake_surface;

pub use catalog_harvester::*;
pub use droid::*;
pub use render_surface::*;
pub use row_extractor::*;
pub use toggle_normalizer::*;
