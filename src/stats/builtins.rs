// Sat Jan 17 2026 - Alex

use crate::stats::sample::{Cell, CellSample};
use crate::stats::StatKind;
use crate::table::CellValue;
use indexmap::IndexMap;
use itertools::Itertools;
use once_cell::sync::Lazy;

pub type BuiltinFn = fn(&CellSample) -> CellValue;

#[derive(Clone, Copy)]
pub struct Builtin {
    pub kind: StatKind,
    pub needs_weights: bool,
    pub func: BuiltinFn,
}

impl Builtin {
    const fn aggregate(func: BuiltinFn) -> Self {
        Self { kind: StatKind::Aggregate, needs_weights: false, func }
    }

    const fn weighted(func: BuiltinFn) -> Self {
        Self { kind: StatKind::Aggregate, needs_weights: true, func }
    }

    const fn array(func: BuiltinFn) -> Self {
        Self { kind: StatKind::Array, needs_weights: false, func }
    }
}

pub static BUILTINS: Lazy<IndexMap<&'static str, Builtin>> = Lazy::new(|| {
    let mut table = IndexMap::new();
    table.insert("count", Builtin::aggregate(count));
    table.insert("sum", Builtin::aggregate(sum));
    table.insert("mean", Builtin::aggregate(mean));
    table.insert("median", Builtin::aggregate(median));
    table.insert("min", Builtin::aggregate(min));
    table.insert("max", Builtin::aggregate(max));
    table.insert("stdev", Builtin::aggregate(stdev));
    table.insert("variance", Builtin::aggregate(variance));
    table.insert("majority", Builtin::aggregate(majority));
    table.insert("minority", Builtin::aggregate(minority));
    table.insert("variety", Builtin::aggregate(variety));
    table.insert("weighted_mean", Builtin::weighted(weighted_mean));
    table.insert("weighted_sum", Builtin::weighted(weighted_sum));
    table.insert("values", Builtin::array(values));
    table.insert("coverage", Builtin::array(coverage));
    table.insert("weights", Builtin { kind: StatKind::Array, needs_weights: true, func: weights });
    table.insert("unique", Builtin::array(unique));
    table
});

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.get(name)
}

pub fn names(kind: StatKind) -> Vec<&'static str> {
    BUILTINS.iter()
        .filter(|(_, b)| b.kind == kind)
        .map(|(name, _)| *name)
        .collect()
}

fn total_coverage(sample: &CellSample) -> f64 {
    sample.valid_cells().map(|c| c.coverage).sum()
}

fn count(sample: &CellSample) -> CellValue {
    CellValue::Float(total_coverage(sample))
}

fn sum(sample: &CellSample) -> CellValue {
    CellValue::Float(sample.valid_cells().map(|c| c.value * c.coverage).sum())
}

fn mean_of(sample: &CellSample) -> f64 {
    let total = total_coverage(sample);
    if total <= 0.0 {
        return f64::NAN;
    }
    sample.valid_cells().map(|c| c.value * c.coverage).sum::<f64>() / total
}

fn mean(sample: &CellSample) -> CellValue {
    CellValue::Float(mean_of(sample))
}

fn median(sample: &CellSample) -> CellValue {
    let cells: Vec<Cell> = sample.valid_cells()
        .sorted_by(|a, b| a.value.total_cmp(&b.value))
        .collect();
    let half = cells.iter().map(|c| c.coverage).sum::<f64>() / 2.0;

    let mut acc = 0.0;
    for cell in &cells {
        acc += cell.coverage;
        if acc >= half {
            return CellValue::Float(cell.value);
        }
    }
    CellValue::Float(f64::NAN)
}

fn min(sample: &CellSample) -> CellValue {
    let v = sample.valid_cells().map(|c| c.value).fold(f64::NAN, f64::min);
    CellValue::Float(v)
}

fn max(sample: &CellSample) -> CellValue {
    let v = sample.valid_cells().map(|c| c.value).fold(f64::NAN, f64::max);
    CellValue::Float(v)
}

fn variance_of(sample: &CellSample) -> f64 {
    let total = total_coverage(sample);
    if total <= 0.0 {
        return f64::NAN;
    }
    let m = mean_of(sample);
    sample.valid_cells()
        .map(|c| c.coverage * (c.value - m).powi(2))
        .sum::<f64>() / total
}

fn variance(sample: &CellSample) -> CellValue {
    CellValue::Float(variance_of(sample))
}

fn stdev(sample: &CellSample) -> CellValue {
    CellValue::Float(variance_of(sample).sqrt())
}

/// Distinct values with their summed coverage, ascending by value.
fn coverage_by_value(sample: &CellSample) -> Vec<(f64, f64)> {
    sample.valid_cells()
        .map(|c| (c.value, c.coverage))
        .sorted_by(|a, b| a.0.total_cmp(&b.0))
        .coalesce(|a, b| {
            if a.0 == b.0 {
                Ok((a.0, a.1 + b.1))
            } else {
                Err((a, b))
            }
        })
        .collect()
}

// Ties go to the smaller value.
fn majority(sample: &CellSample) -> CellValue {
    let best = coverage_by_value(sample)
        .into_iter()
        .fold(None, |best: Option<(f64, f64)>, cur| match best {
            Some(b) if b.1 >= cur.1 => Some(b),
            _ => Some(cur),
        });
    CellValue::Float(best.map(|b| b.0).unwrap_or(f64::NAN))
}

fn minority(sample: &CellSample) -> CellValue {
    let best = coverage_by_value(sample)
        .into_iter()
        .fold(None, |best: Option<(f64, f64)>, cur| match best {
            Some(b) if b.1 <= cur.1 => Some(b),
            _ => Some(cur),
        });
    CellValue::Float(best.map(|b| b.0).unwrap_or(f64::NAN))
}

fn variety(sample: &CellSample) -> CellValue {
    CellValue::Int(coverage_by_value(sample).len() as i64)
}

fn weighted_cells(sample: &CellSample) -> impl Iterator<Item = (f64, f64)> + '_ {
    sample.valid_cells()
        .filter_map(|c| c.weight.filter(|w| w.is_finite()).map(|w| (c.value, c.coverage * w)))
}

fn weighted_sum(sample: &CellSample) -> CellValue {
    CellValue::Float(weighted_cells(sample).map(|(v, w)| v * w).sum())
}

fn weighted_mean(sample: &CellSample) -> CellValue {
    let total: f64 = weighted_cells(sample).map(|(_, w)| w).sum();
    if total == 0.0 {
        return CellValue::Float(f64::NAN);
    }
    let sum: f64 = weighted_cells(sample).map(|(v, w)| v * w).sum();
    CellValue::Float(sum / total)
}

fn values(sample: &CellSample) -> CellValue {
    CellValue::Array(sample.valid_cells().map(|c| c.value).collect())
}

fn coverage(sample: &CellSample) -> CellValue {
    CellValue::Array(sample.valid_cells().map(|c| c.coverage).collect())
}

fn weights(sample: &CellSample) -> CellValue {
    CellValue::Array(sample.valid_cells().filter_map(|c| c.weight).collect())
}

fn unique(sample: &CellSample) -> CellValue {
    CellValue::Array(coverage_by_value(sample).into_iter().map(|(v, _)| v).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(name: &str, sample: &CellSample) -> CellValue {
        (lookup(name).unwrap().func)(sample)
    }

    fn float(name: &str, sample: &CellSample) -> f64 {
        eval(name, sample).as_f64().unwrap()
    }

    #[test]
    fn test_coverage_weighted_aggregates() {
        let sample = CellSample::new(vec![1.0, 2.0, 4.0], vec![1.0, 0.5, 0.5]);

        assert_eq!(float("count", &sample), 2.0);
        assert_eq!(float("sum", &sample), 4.0);
        assert_eq!(float("mean", &sample), 2.0);
        assert_eq!(float("min", &sample), 1.0);
        assert_eq!(float("max", &sample), 4.0);
        assert_eq!(float("median", &sample), 1.0);
        assert!((float("variance", &sample) - 1.5).abs() < 1e-12);
        assert!((float("stdev", &sample) - 1.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_categorical_aggregates() {
        let sample = CellSample::new(vec![3.0, 3.0, 5.0, 7.0], vec![0.5, 0.5, 0.9, 0.2]);

        assert_eq!(float("majority", &sample), 3.0);
        assert_eq!(float("minority", &sample), 7.0);
        assert_eq!(eval("variety", &sample), CellValue::Int(3));
        assert_eq!(eval("unique", &sample), CellValue::Array(vec![3.0, 5.0, 7.0]));
    }

    #[test]
    fn test_weighted() {
        let sample = CellSample::new(vec![2.0, 4.0], vec![1.0, 1.0]).with_weights(vec![1.0, 3.0]);

        assert_eq!(float("weighted_sum", &sample), 14.0);
        assert_eq!(float("weighted_mean", &sample), 3.5);
        assert_eq!(eval("weights", &sample), CellValue::Array(vec![1.0, 3.0]));
        assert!(lookup("weighted_mean").unwrap().needs_weights);
    }

    #[test]
    fn test_empty_sample() {
        let sample = CellSample::new(vec![f64::NAN], vec![1.0]);

        assert_eq!(float("count", &sample), 0.0);
        assert!(float("mean", &sample).is_nan());
        assert!(float("min", &sample).is_nan());
        assert!(float("majority", &sample).is_nan());
        assert_eq!(eval("values", &sample), CellValue::Array(vec![]));
    }

    #[test]
    fn test_kinds() {
        assert!(names(StatKind::Array).contains(&"values"));
        assert!(!names(StatKind::Aggregate).contains(&"values"));
        assert!(names(StatKind::Custom).is_empty());
    }
}
