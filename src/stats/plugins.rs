// Wed Jan 21 2026 - Alex

use indexmap::IndexMap;
use once_cell::sync::Lazy;

pub type PluginFn = fn(&[f64], &[f64]) -> f64;

/// Named `(values, coverage) -> scalar` functions that can be registered as
/// custom statistics by name, e.g. from the command line.
pub static PLUGINS: Lazy<IndexMap<&'static str, PluginFn>> = Lazy::new(|| {
    let mut table: IndexMap<&'static str, PluginFn> = IndexMap::new();
    table.insert("range", range);
    table.insert("cv", coefficient_of_variation);
    table.insert("max_coverage", max_coverage);
    table
});

pub fn lookup(name: &str) -> Option<PluginFn> {
    PLUGINS.get(name).copied()
}

pub fn names() -> Vec<&'static str> {
    PLUGINS.keys().copied().collect()
}

fn range(values: &[f64], _coverage: &[f64]) -> f64 {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if values.is_empty() { f64::NAN } else { max - min }
}

/// Coverage-weighted standard deviation over the weighted mean.
fn coefficient_of_variation(values: &[f64], coverage: &[f64]) -> f64 {
    let total: f64 = coverage.iter().sum();
    if total <= 0.0 {
        return f64::NAN;
    }

    let mean = values.iter().zip(coverage).map(|(v, c)| v * c).sum::<f64>() / total;
    if mean == 0.0 {
        return f64::NAN;
    }

    let variance = values.iter()
        .zip(coverage)
        .map(|(v, c)| c * (v - mean).powi(2))
        .sum::<f64>() / total;
    variance.sqrt() / mean
}

fn max_coverage(_values: &[f64], coverage: &[f64]) -> f64 {
    coverage.iter().copied().fold(f64::NAN, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range() {
        assert_eq!(range(&[3.0, 1.0, 7.0], &[1.0, 1.0, 1.0]), 6.0);
        assert!(range(&[], &[]).is_nan());
    }

    #[test]
    fn test_coefficient_of_variation() {
        assert_eq!(coefficient_of_variation(&[2.0, 2.0], &[1.0, 0.5]), 0.0);
        assert_eq!(coefficient_of_variation(&[1.0, 3.0], &[1.0, 1.0]), 0.5);
        assert!(coefficient_of_variation(&[1.0], &[0.0]).is_nan());
    }

    #[test]
    fn test_max_coverage() {
        assert_eq!(max_coverage(&[1.0, 2.0], &[0.25, 0.75]), 0.75);
        assert!(max_coverage(&[], &[]).is_nan());
    }

    #[test]
    fn test_names_do_not_shadow_builtins() {
        for name in names() {
            assert!(crate::stats::builtins::lookup(name).is_none(), "{}", name);
        }
    }
}
