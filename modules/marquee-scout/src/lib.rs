pub mod adapters;
pub mod aggregator;
pub mod awards;
pub mod fetch;
pub mod scout;
pub mod sources;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use scout::{Scout, ScoutReport, ScoutStats};
