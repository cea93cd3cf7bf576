// Sat Jan 17 2026 - Alex

use crate::features::FeatureId;
use crate::stats::error::StatError;
use serde::{Deserialize, Serialize};

/// Raster cells intersecting one polygon: cell value, fraction of the cell
/// covered by the polygon, and optionally the weighting raster's value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellSample {
    pub values: Vec<f64>,
    pub coverage: Vec<f64>,
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
}

impl CellSample {
    pub fn new(values: Vec<f64>, coverage: Vec<f64>) -> Self {
        Self {
            values,
            coverage,
            weights: None,
        }
    }

    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn check(&self, feature: FeatureId) -> Result<(), StatError> {
        if self.values.len() != self.coverage.len() {
            return Err(StatError::SampleShape {
                feature,
                reason: format!("{} values but {} coverage fractions", self.values.len(), self.coverage.len()),
            });
        }
        if let Some(weights) = &self.weights {
            if weights.len() != self.values.len() {
                return Err(StatError::SampleShape {
                    feature,
                    reason: format!("{} values but {} weights", self.values.len(), weights.len()),
                });
            }
        }
        Ok(())
    }

    /// Cells that count: finite value and positive coverage.
    pub fn valid_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.values.iter()
            .zip(self.coverage.iter())
            .enumerate()
            .filter(|(_, (v, c))| v.is_finite() && **c > 0.0)
            .map(move |(i, (v, c))| Cell {
                value: *v,
                coverage: *c,
                weight: self.weights.as_ref().and_then(|w| w.get(i).copied()),
            })
    }

    pub fn is_empty(&self) -> bool {
        self.valid_cells().next().is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub value: f64,
    pub coverage: f64,
    pub weight: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_cells_skip_nodata() {
        let sample = CellSample::new(vec![1.0, f64::NAN, 3.0, 4.0], vec![1.0, 1.0, 0.0, 0.5]);
        let cells: Vec<Cell> = sample.valid_cells().collect();

        assert_eq!(cells.len(), 2);
        assert_eq!(cells[1].value, 4.0);
        assert_eq!(cells[1].coverage, 0.5);
    }

    #[test]
    fn test_shape_check() {
        let bad = CellSample::new(vec![1.0, 2.0], vec![1.0]);
        assert!(bad.check(FeatureId(1)).is_err());

        let bad_weights = CellSample::new(vec![1.0], vec![1.0]).with_weights(vec![]);
        assert!(bad_weights.check(FeatureId(1)).is_err());

        assert!(CellSample::new(vec![1.0], vec![1.0]).check(FeatureId(1)).is_ok());
    }
}
