// Sat Jan 17 2026 - Alex

use crate::table::error::TableError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Int(i64),
    Float(f64),
    Array(Vec<f64>),
    Null,
}

impl CellValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(v) => Some(*v as f64),
            CellValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[f64]> {
        match self {
            CellValue::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, CellValue::Array(_))
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Int(v) => write!(f, "{}", v),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Array(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            CellValue::Null => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub id: i64,
    pub values: Vec<CellValue>,
}

/// Rows keyed by identity value, one value per statistic column.
///
/// `columns` lists statistic columns only; the identity column is implicit
/// and always rendered first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    id_column: String,
    columns: Vec<String>,
    rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn new(id_column: &str, columns: Vec<String>) -> Self {
        Self {
            id_column: id_column.to_string(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, id: i64, values: Vec<CellValue>) -> Result<(), TableError> {
        if values.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                id,
                expected: self.columns.len(),
                found: values.len(),
            });
        }
        self.rows.push(ResultRow { id, values });
        Ok(())
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Identity column followed by the statistic columns.
    pub fn header(&self) -> Vec<String> {
        std::iter::once(self.id_column.clone())
            .chain(self.columns.iter().cloned())
            .collect()
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<ResultRow> {
        self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn row(&self, id: i64) -> Option<&ResultRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn value(&self, id: i64, column: &str) -> Option<&CellValue> {
        let idx = self.column_index(column)?;
        self.row(id).map(|r| &r.values[idx])
    }

    pub fn ids(&self) -> Vec<i64> {
        self.rows.iter().map(|r| r.id).collect()
    }

    pub fn has_array_columns(&self) -> bool {
        self.rows.iter().any(|r| r.values.iter().any(CellValue::is_array))
    }

    /// (rows, columns including identity)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len() + 1)
    }
}
