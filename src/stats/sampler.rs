// Sun Jan 18 2026 - Alex

use crate::features::{Feature, FeatureId};
use crate::stats::error::StatError;
use crate::stats::sample::CellSample;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Raster/polygon overlay: the cells of `raster` touched by `feature`.
pub trait RasterSampler: Send + Sync {
    fn sample(&self, raster: &str, feature: &Feature) -> Result<CellSample, StatError>;
}

/// Precomputed overlays keyed by raster reference then feature id.
#[derive(Debug, Clone, Default)]
pub struct MemorySampler {
    samples: HashMap<String, HashMap<FeatureId, CellSample>>,
}

impl MemorySampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, raster: &str, feature: FeatureId, sample: CellSample) {
        self.samples.entry(raster.to_string())
            .or_default()
            .insert(feature, sample);
    }

    pub fn with_sample(mut self, raster: &str, feature: FeatureId, sample: CellSample) -> Self {
        self.insert(raster, feature, sample);
        self
    }

    pub fn rasters(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.samples.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn from_json(json: &str) -> Result<Self, StatError> {
        let samples = serde_json::from_str(json)?;
        Ok(Self { samples })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StatError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

impl RasterSampler for MemorySampler {
    fn sample(&self, raster: &str, feature: &Feature) -> Result<CellSample, StatError> {
        self.samples.get(raster)
            .and_then(|by_feature| by_feature.get(&feature.id))
            .cloned()
            .ok_or_else(|| StatError::MissingSample {
                raster: raster.to_string(),
                feature: feature.id,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let json = r#"{
            "dem.tif": {
                "1": {"values": [10.0, 12.0], "coverage": [1.0, 0.25]},
                "2": {"values": [], "coverage": []}
            },
            "slope.tif": {
                "1": {"values": [3.0], "coverage": [1.0]}
            }
        }"#;

        let sampler = MemorySampler::from_json(json).unwrap();
        assert_eq!(sampler.rasters(), vec!["dem.tif", "slope.tif"]);

        let sample = sampler.sample("dem.tif", &Feature::new(FeatureId(1))).unwrap();
        assert_eq!(sample.coverage, vec![1.0, 0.25]);
        assert!(sample.weights.is_none());
    }

    #[test]
    fn test_missing_sample() {
        let sampler = MemorySampler::new()
            .with_sample("dem.tif", FeatureId(1), CellSample::new(vec![1.0], vec![1.0]));

        let err = sampler.sample("slope.tif", &Feature::new(FeatureId(1))).unwrap_err();
        assert!(matches!(err, StatError::MissingSample { .. }));
        assert!(sampler.sample("dem.tif", &Feature::new(FeatureId(2))).is_err());
    }
}
