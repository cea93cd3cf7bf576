// Tue Jan 13 2026 - Alex

use crate::output::error::OutputError;
use crate::output::{OutputFormat, OutputSink};
use crate::table::ResultTable;
use std::io::Write;
use std::path::Path;

/// Identity column first, then statistic columns. Array cells are written as
/// `[a,b,...]` and null cells as empty fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvSink;

impl CsvSink {
    pub fn new() -> Self {
        Self
    }

    pub fn write_to<W: Write>(&self, table: &ResultTable, out: W) -> Result<(), OutputError> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(table.header())?;

        for row in table.rows() {
            let mut record = Vec::with_capacity(row.values.len() + 1);
            record.push(row.id.to_string());
            record.extend(row.values.iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl OutputSink for CsvSink {
    fn format(&self) -> OutputFormat {
        OutputFormat::Csv
    }

    fn write(&self, table: &ResultTable, path: &Path) -> Result<(), OutputError> {
        let file = std::fs::File::create(path)?;
        self.write_to(table, std::io::BufWriter::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CellValue;

    #[test]
    fn test_csv_layout() {
        let mut table = ResultTable::new("plot_id", vec!["mean".to_string(), "values".to_string()]);
        table.push_row(1, vec![CellValue::Float(2.5), CellValue::Array(vec![1.0, 4.0])]).unwrap();
        table.push_row(2, vec![CellValue::Null, CellValue::Array(vec![])]).unwrap();

        let mut out = Vec::new();
        CsvSink::new().write_to(&table, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "plot_id,mean,values\n1,2.5,\"[1,4]\"\n2,,[]\n");
    }
}
