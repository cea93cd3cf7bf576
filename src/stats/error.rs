// Sat Jan 17 2026 - Alex

use crate::features::{FeatureError, FeatureId};
use crate::table::TableError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatError {
    #[error("Unknown statistic: {0}")]
    UnknownStatistic(String),
    #[error("Statistic {0} requires a weighting raster")]
    WeightsRequired(String),
    #[error("Statistic name already registered: {0}")]
    AlreadyRegistered(String),
    #[error("No sample for feature {feature} on raster {raster}")]
    MissingSample { raster: String, feature: FeatureId },
    #[error("Malformed sample for feature {feature}: {reason}")]
    SampleShape { feature: FeatureId, reason: String },
    #[error("Feature error: {0}")]
    Feature(#[from] FeatureError),
    #[error("Table error: {0}")]
    Table(#[from] TableError),
    #[error("Failed to parse samples: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
