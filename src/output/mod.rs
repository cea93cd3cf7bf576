// Tue Jan 13 2026 - Alex

pub mod csv_sink;
pub mod error;

pub use csv_sink::CsvSink;
pub use error::OutputError;

use crate::table::ResultTable;
use indexmap::IndexMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(OutputFormat::Csv),
            "parquet" => Some(OutputFormat::Parquet),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }

    /// Columnar formats have no cell type for variable-length arrays.
    pub fn supports_arrays(&self) -> bool {
        matches!(self, OutputFormat::Csv)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.extension())
    }
}

/// Writes a merged table to disk in one format.
pub trait OutputSink: Send + Sync {
    fn format(&self) -> OutputFormat;

    fn write(&self, table: &ResultTable, path: &Path) -> Result<(), OutputError>;
}

/// Writers available at runtime, by format.
pub struct SinkRegistry {
    sinks: IndexMap<OutputFormat, Arc<dyn OutputSink>>,
}

impl SinkRegistry {
    pub fn empty() -> Self {
        Self {
            sinks: IndexMap::new(),
        }
    }

    pub fn register(&mut self, sink: Arc<dyn OutputSink>) {
        log::debug!("Registered {} writer", sink.format());
        self.sinks.insert(sink.format(), sink);
    }

    pub fn with_sink(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.register(sink);
        self
    }

    pub fn supports(&self, format: OutputFormat) -> bool {
        self.sinks.contains_key(&format)
    }

    pub fn formats(&self) -> Vec<OutputFormat> {
        self.sinks.keys().copied().collect()
    }

    pub fn write(&self, table: &ResultTable, path: &Path) -> Result<OutputFormat, OutputError> {
        let format = OutputFormat::from_path(path).ok_or_else(|| {
            OutputError::UnsupportedFormat(path.display().to_string())
        })?;
        let sink = self.sinks.get(&format).ok_or(OutputError::NoSink(format))?;

        sink.write(table, path)?;
        log::info!("Wrote {} rows to {}", table.row_count(), path.display());
        Ok(format)
    }
}

impl Default for SinkRegistry {
    fn default() -> Self {
        Self::empty().with_sink(Arc::new(CsvSink::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_from_path() {
        assert_eq!(OutputFormat::from_path(Path::new("out/stats.csv")), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::from_path(Path::new("stats.PARQUET")), Some(OutputFormat::Parquet));
        assert_eq!(OutputFormat::from_path(Path::new("stats.xlsx")), None);
        assert_eq!(OutputFormat::from_path(Path::new("stats")), None);
    }

    #[test]
    fn test_default_registry_has_csv_only() {
        let registry = SinkRegistry::default();
        assert!(registry.supports(OutputFormat::Csv));
        assert!(!registry.supports(OutputFormat::Parquet));

        let table = ResultTable::new("id", vec![]);
        let err = registry.write(&table, &PathBuf::from("out.parquet")).unwrap_err();
        assert!(matches!(err, OutputError::NoSink(OutputFormat::Parquet)));
    }

    #[test]
    fn test_write_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        let table = ResultTable::new("id", vec!["count".to_string()]);

        assert_eq!(SinkRegistry::default().write(&table, &path).unwrap(), OutputFormat::Csv);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "id,count\n");
    }
}
