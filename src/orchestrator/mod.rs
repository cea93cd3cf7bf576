// Tue Jan 13 2026 - Alex

pub mod collector;
pub mod controller;
pub mod coordinator;
pub mod error;
pub mod partition;
pub mod run_config;
pub mod unit;

pub use collector::{CollectorSlot, PartialResult, ResultCollector};
pub use controller::{RunContext, RunController, RunHandle, RunObserver, RunOutcome, RunPlan};
pub use coordinator::{FailurePolicy, MergeCoordinator, MergeOutcome};
pub use error::{RunError, UnitError, ValidationError};
pub use partition::{batch_size, partition, Batch};
pub use run_config::{RunConfig, RunConfigBuilder};
pub use unit::{ComputeUnit, UnitInputs};
