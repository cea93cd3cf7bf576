// Tue Jan 15 2026 - Alex

pub mod config;
pub mod engine;
pub mod features;
pub mod orchestrator;
pub mod output;
pub mod stats;
pub mod table;
pub mod ui;
pub mod utils;

pub use config::Config;
pub use engine::TaskScheduler;
pub use features::{FeatureSource, MemoryFeatureSource};
pub use orchestrator::{RunConfig, RunController, RunObserver, RunOutcome};
pub use output::{OutputFormat, SinkRegistry};
pub use stats::{MemorySampler, StatRegistry};
pub use table::ResultTable;
