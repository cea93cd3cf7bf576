// Fri Jan 16 2026 - Alex

use crate::features::FeatureId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("Unknown feature: {0}")]
    UnknownFeature(FeatureId),
    #[error("Field not found: {0}")]
    FieldNotFound(String),
    #[error("Field {field} of feature {feature} is not an integer")]
    NotInteger { feature: FeatureId, field: String },
    #[error("Field {field} of feature {feature} is empty")]
    MissingValue { feature: FeatureId, field: String },
    #[error("Duplicate feature id: {0}")]
    DuplicateFeature(FeatureId),
    #[error("Failed to parse feature collection: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
