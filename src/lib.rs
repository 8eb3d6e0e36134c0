pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::HttpWorld;
pub use config::toml_config::TomlConfig;
pub use crate::core::{
    allocator::GreedyAllocator, cache::AvailabilityCache, locations::LocationIndex,
    processor::CallProcessor, refresher::CacheRefresher, simulation::SimulationEngine,
};
pub use utils::error::{DispatchError, Result};
