// Sat Jan 17 2026 - Alex

use crate::table::error::MergeError;
use crate::table::result::{CellValue, ResultTable};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What to do when two partials carry a value for the same identity and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyConflictPolicy {
    #[default]
    Reject,
    FirstWins,
    /// Later in merge order wins. Partials are merged in batch order, so
    /// the survivor is the same on every run.
    LastWins,
}

pub struct TableMerger {
    id_column: String,
    columns: Vec<String>,
    prefix: String,
    conflict_policy: KeyConflictPolicy,
    fill_missing: bool,
}

impl TableMerger {
    pub fn new(id_column: &str) -> Self {
        Self {
            id_column: id_column.to_string(),
            columns: Vec::new(),
            prefix: String::new(),
            conflict_policy: KeyConflictPolicy::Reject,
            fill_missing: false,
        }
    }

    /// Columns the merged header starts with, in order. Keeps the schema
    /// when no partial arrives.
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    pub fn with_conflict_policy(mut self, policy: KeyConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    pub fn fill_missing(mut self, fill: bool) -> Self {
        self.fill_missing = fill;
        self
    }

    /// Joins partial tables on the identity value. Positions inside each
    /// partial are ignored; output rows are ordered by identity value.
    pub fn merge<I>(&self, partials: I) -> Result<ResultTable, MergeError>
    where
        I: IntoIterator<Item = ResultTable>,
    {
        let mut columns: IndexSet<String> = self.columns.iter().cloned().collect();
        let mut rows: BTreeMap<i64, IndexMap<String, CellValue>> = BTreeMap::new();

        for partial in partials {
            if partial.id_column() != self.id_column {
                return Err(MergeError::SchemaMismatch {
                    expected: self.id_column.clone(),
                    found: partial.id_column().to_string(),
                });
            }

            let names: Vec<String> = partial.columns().to_vec();
            columns.extend(names.iter().cloned());

            for row in partial.into_rows() {
                let cells = rows.entry(row.id).or_default();
                for (name, value) in names.iter().zip(row.values) {
                    self.place(cells, row.id, name, value)?;
                }
            }
        }

        let header = columns.iter()
            .map(|c| format!("{}{}", self.prefix, c))
            .collect();
        let mut merged = ResultTable::new(&self.id_column, header);

        for (id, mut cells) in rows {
            let mut values = Vec::with_capacity(columns.len());
            for column in &columns {
                match cells.swap_remove(column) {
                    Some(value) => values.push(value),
                    None if self.fill_missing => values.push(CellValue::Null),
                    None => {
                        return Err(MergeError::IncompleteRow {
                            id,
                            column: column.clone(),
                        })
                    }
                }
            }
            merged.push_row(id, values)?;
        }

        Ok(merged)
    }

    fn place(
        &self,
        cells: &mut IndexMap<String, CellValue>,
        id: i64,
        column: &str,
        value: CellValue,
    ) -> Result<(), MergeError> {
        if !cells.contains_key(column) {
            cells.insert(column.to_string(), value);
            return Ok(());
        }

        match self.conflict_policy {
            KeyConflictPolicy::Reject => Err(MergeError::KeyConflict {
                id,
                column: column.to_string(),
            }),
            KeyConflictPolicy::FirstWins => Ok(()),
            KeyConflictPolicy::LastWins => {
                cells.insert(column.to_string(), value);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[(i64, Vec<CellValue>)]) -> ResultTable {
        let mut t = ResultTable::new("plot_id", columns.iter().map(|c| c.to_string()).collect());
        for (id, values) in rows {
            t.push_row(*id, values.clone()).unwrap();
        }
        t
    }

    #[test]
    fn test_concatenates_out_of_order_partials() {
        let second = table(&["mean"], &[(4, vec![CellValue::Float(4.0)]), (3, vec![CellValue::Float(3.0)])]);
        let first = table(&["mean"], &[(1, vec![CellValue::Float(1.0)]), (2, vec![CellValue::Float(2.0)])]);

        let merged = TableMerger::new("plot_id").merge(vec![second, first]).unwrap();

        assert_eq!(merged.ids(), vec![1, 2, 3, 4]);
        assert_eq!(merged.value(3, "mean"), Some(&CellValue::Float(3.0)));
    }

    #[test]
    fn test_joins_statistic_families_by_identity() {
        let aggregates = table(&["mean"], &[(1, vec![CellValue::Float(1.0)]), (2, vec![CellValue::Float(2.0)])]);
        let arrays = table(&["values"], &[
            (2, vec![CellValue::Array(vec![2.0, 2.0])]),
            (1, vec![CellValue::Array(vec![1.0])]),
        ]);

        let merged = TableMerger::new("plot_id").merge(vec![aggregates, arrays]).unwrap();

        assert_eq!(merged.columns(), &["mean".to_string(), "values".to_string()]);
        assert_eq!(merged.value(2, "values"), Some(&CellValue::Array(vec![2.0, 2.0])));
        assert_eq!(merged.row_count(), 2);
    }

    #[test]
    fn test_prefix_applies_to_statistics_only() {
        let t = table(&["sum"], &[(1, vec![CellValue::Float(5.0)])]);
        let merged = TableMerger::new("plot_id").with_prefix("dem_").merge(vec![t]).unwrap();

        assert_eq!(merged.header(), vec!["plot_id", "dem_sum"]);
    }

    #[test]
    fn test_conflict_policies() {
        let a = table(&["mean"], &[(1, vec![CellValue::Float(1.0)])]);
        let b = table(&["mean"], &[(1, vec![CellValue::Float(9.0)])]);

        let err = TableMerger::new("plot_id").merge(vec![a.clone(), b.clone()]).unwrap_err();
        assert_eq!(err, MergeError::KeyConflict { id: 1, column: "mean".to_string() });

        let first = TableMerger::new("plot_id")
            .with_conflict_policy(KeyConflictPolicy::FirstWins)
            .merge(vec![a.clone(), b.clone()])
            .unwrap();
        assert_eq!(first.value(1, "mean"), Some(&CellValue::Float(1.0)));

        let last = TableMerger::new("plot_id")
            .with_conflict_policy(KeyConflictPolicy::LastWins)
            .merge(vec![a, b])
            .unwrap();
        assert_eq!(last.value(1, "mean"), Some(&CellValue::Float(9.0)));
    }

    #[test]
    fn test_identity_column_mismatch() {
        let other = ResultTable::new("fid", vec!["mean".to_string()]);
        let err = TableMerger::new("plot_id").merge(vec![other]).unwrap_err();
        assert!(matches!(err, MergeError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_incomplete_rows() {
        let aggregates = table(&["mean"], &[(1, vec![CellValue::Float(1.0)]), (2, vec![CellValue::Float(2.0)])]);
        let arrays = table(&["values"], &[(1, vec![CellValue::Array(vec![1.0])])]);

        let err = TableMerger::new("plot_id")
            .merge(vec![aggregates.clone(), arrays.clone()])
            .unwrap_err();
        assert_eq!(err, MergeError::IncompleteRow { id: 2, column: "values".to_string() });

        let filled = TableMerger::new("plot_id")
            .fill_missing(true)
            .merge(vec![aggregates, arrays])
            .unwrap();
        assert_eq!(filled.value(2, "values"), Some(&CellValue::Null));
    }

    #[test]
    fn test_empty_input() {
        let merged = TableMerger::new("plot_id").merge(Vec::<ResultTable>::new()).unwrap();
        assert!(merged.is_empty());
        assert_eq!(merged.header(), vec!["plot_id"]);
    }

    #[test]
    fn test_seeded_columns_survive_empty_input() {
        let merger = TableMerger::new("plot_id")
            .with_columns(vec!["mean".to_string(), "values".to_string()])
            .with_prefix("z_");

        let empty = merger.merge(Vec::<ResultTable>::new()).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.header(), vec!["plot_id", "z_mean", "z_values"]);

        let t = table(&["mean", "values"], &[(1, vec![CellValue::Float(1.0), CellValue::Array(vec![1.0])])]);
        let merged = merger.merge(vec![t]).unwrap();
        assert_eq!(merged.header(), vec!["plot_id", "z_mean", "z_values"]);
        assert_eq!(merged.value(1, "z_mean"), Some(&CellValue::Float(1.0)));
    }
}
