// Tue Jan 13 2026 - Alex

use crate::config::ConfigError;
use crate::engine::{JobError, SchedulerError, TaskError};
use crate::features::FeatureError;
use crate::stats::{StatError, StatKind};
use crate::table::MergeError;
use thiserror::Error;

/// Rejections raised before any task is scheduled. The first failing rule
/// is reported.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Raster layer(s) and vector layer must be set")]
    MissingLayers,
    #[error("Missing ID field")]
    MissingIdField,
    #[error("Missing output path")]
    MissingOutputPath,
    #[error("Unsupported output extension {0:?}: expected .csv or .parquet")]
    UnsupportedExtension(String),
    #[error("Parquet output needs a columnar writer and none is available")]
    ParquetUnavailable,
    #[error("No statistics selected")]
    NoStatistics,
    #[error("Parquet output cannot hold array statistics: {}", .0.join(", "))]
    ArraysWithParquet(Vec<String>),
    #[error("Parallelism must be at least 1")]
    InvalidParallelism,
    #[error("ID field {field} not found on layer {layer}")]
    IdFieldNotFound { layer: String, field: String },
    #[error("ID field {0} is not an integer field")]
    IdFieldNotInteger(String),
    #[error("Unknown {kind} statistic: {name}")]
    UnknownStatistic { name: String, kind: StatKind },
    #[error("Statistic {0} requires a weighting raster")]
    WeightsRequired(String),
    #[error("Output column {0} would be written more than once")]
    DuplicateColumn(String),
}

/// Why a compute unit stopped without appending.
#[derive(Error, Debug)]
pub enum UnitError {
    #[error("Unit was cancelled")]
    Cancelled,
    #[error("Failed to materialize batch: {0}")]
    Features(#[from] FeatureError),
    #[error("Statistics failed: {0}")]
    Stats(#[from] StatError),
    #[error("Result collector closed before batch {0} could append")]
    CollectorClosed(usize),
}

impl From<UnitError> for TaskError {
    fn from(err: UnitError) -> Self {
        match err {
            UnitError::Cancelled => TaskError::Cancelled,
            other => TaskError::failed(other),
        }
    }
}

#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("Feature source error: {0}")]
    Features(#[from] FeatureError),
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
    #[error("Merge failed: {0}")]
    Merge(#[from] MergeError),
    #[error("Run was cancelled")]
    Cancelled,
    #[error("Merge panicked: {0}")]
    Panicked(String),
    #[error("Run ended without a result")]
    Disconnected,
}

impl From<JobError<MergeError>> for RunError {
    fn from(err: JobError<MergeError>) -> Self {
        match err {
            JobError::Cancelled => RunError::Cancelled,
            JobError::Panicked(message) => RunError::Panicked(message),
            JobError::Failed(merge) => RunError::Merge(merge),
            JobError::Disconnected => RunError::Disconnected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_error_maps_to_task_state() {
        let cancelled: TaskError = UnitError::Cancelled.into();
        assert_eq!(cancelled, TaskError::Cancelled);

        let failed: TaskError = UnitError::CollectorClosed(3).into();
        assert!(matches!(failed, TaskError::Failed(ref m) if m.contains("batch 3")));
    }

    #[test]
    fn test_messages() {
        assert_eq!(ValidationError::MissingIdField.to_string(), "Missing ID field");
        assert_eq!(
            ValidationError::ArraysWithParquet(vec!["values".into(), "unique".into()]).to_string(),
            "Parquet output cannot hold array statistics: values, unique"
        );
        assert_eq!(
            ValidationError::DuplicateColumn("dem_mean".into()).to_string(),
            "Output column dem_mean would be written more than once"
        );
    }
}
