// Sat Jan 17 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("Row {id} has {found} values, expected {expected}")]
    RowWidth { id: i64, expected: usize, found: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MergeError {
    #[error("Identity column mismatch: expected {expected}, found {found}")]
    SchemaMismatch { expected: String, found: String },
    #[error("Duplicate value for identity {id} in column {column}")]
    KeyConflict { id: i64, column: String },
    #[error("Row {id} has no value for column {column}")]
    IncompleteRow { id: i64, column: String },
    #[error("{} compute unit(s) did not complete: {}", .units.len(), .units.join(", "))]
    UnitsFailed { units: Vec<String> },
    #[error(transparent)]
    Table(#[from] TableError),
}
