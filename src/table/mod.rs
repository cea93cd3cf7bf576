// Sat Jan 17 2026 - Alex

pub mod error;
pub mod merge;
pub mod result;

pub use error::{MergeError, TableError};
pub use merge::{KeyConflictPolicy, TableMerger};
pub use result::{CellValue, ResultRow, ResultTable};
