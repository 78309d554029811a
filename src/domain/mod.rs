pub mod catalog;
pub mod extraction;
pub mod gating;
pub mod harvest_plan;
pub mod page_layout;
