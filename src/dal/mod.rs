pub mod bundle_transfer;
pub mod result_sink;

pub use bundle_transfer::*;
pub use result_sink::*;
