// Sat Jan 17 2026 - Alex

pub mod builtins;
pub mod error;
pub mod kernel;
pub mod plugins;
pub mod registry;
pub mod sample;
pub mod sampler;

pub use error::StatError;
pub use kernel::{column_names, BatchInput, SampledKernel, StatisticsKernel};
pub use registry::{CustomStatFn, StatRegistry};
pub use sample::CellSample;
pub use sampler::{MemorySampler, RasterSampler};

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    /// One scalar per feature.
    Aggregate,
    /// Several values per feature.
    Array,
    /// User-registered `(values, coverage) -> scalar`.
    Custom,
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatKind::Aggregate => write!(f, "aggregate"),
            StatKind::Array => write!(f, "array"),
            StatKind::Custom => write!(f, "custom"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatSpec {
    pub name: String,
    pub kind: StatKind,
}

impl StatSpec {
    pub fn new(name: &str, kind: StatKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }

    pub fn aggregate(name: &str) -> Self {
        Self::new(name, StatKind::Aggregate)
    }

    pub fn array(name: &str) -> Self {
        Self::new(name, StatKind::Array)
    }

    pub fn custom(name: &str) -> Self {
        Self::new(name, StatKind::Custom)
    }
}
