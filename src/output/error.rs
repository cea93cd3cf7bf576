// Tue Jan 13 2026 - Alex

use crate::output::OutputFormat;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Unsupported output extension: {0}")]
    UnsupportedFormat(String),
    #[error("No writer registered for {0} output")]
    NoSink(OutputFormat),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
