// Sun Jan 18 2026 - Alex

use crate::features::{identity_value, FeatureSource};
use crate::stats::error::StatError;
use crate::stats::registry::StatRegistry;
use crate::stats::sampler::RasterSampler;
use crate::stats::StatSpec;
use crate::table::ResultTable;
use std::path::Path;
use std::sync::Arc;

/// Everything one compute unit hands to the kernel.
#[derive(Clone)]
pub struct BatchInput {
    pub features: Arc<dyn FeatureSource>,
    pub rasters: Vec<String>,
    pub weights: Option<String>,
    pub stats: Vec<StatSpec>,
    pub id_column: String,
}

/// Computes one partial table for a batch of features.
pub trait StatisticsKernel: Send + Sync {
    fn compute(&self, input: &BatchInput) -> Result<ResultTable, StatError>;
}

pub struct SampledKernel {
    sampler: Arc<dyn RasterSampler>,
    registry: Arc<StatRegistry>,
}

impl SampledKernel {
    pub fn new(sampler: Arc<dyn RasterSampler>, registry: Arc<StatRegistry>) -> Self {
        Self { sampler, registry }
    }

    pub fn registry(&self) -> &Arc<StatRegistry> {
        &self.registry
    }
}

impl StatisticsKernel for SampledKernel {
    fn compute(&self, input: &BatchInput) -> Result<ResultTable, StatError> {
        let mut table = ResultTable::new(&input.id_column, column_names(&input.rasters, &input.stats));

        for feature in input.features.all_features()? {
            let id = identity_value(&feature, &input.id_column)?;
            let weights = match &input.weights {
                Some(raster) => Some(self.sampler.sample(raster, &feature)?),
                None => None,
            };

            let mut row = Vec::with_capacity(input.rasters.len() * input.stats.len());
            for raster in &input.rasters {
                let mut sample = self.sampler.sample(raster, &feature)?;
                if let Some(w) = &weights {
                    sample.weights = Some(w.values.clone());
                }
                sample.check(feature.id)?;

                for spec in &input.stats {
                    row.push(self.registry.evaluate(spec, &sample)?);
                }
            }
            table.push_row(id, row)?;
        }

        Ok(table)
    }
}

/// One raster: the statistic name. Several: `<raster stem>_<statistic>`.
pub fn column_names(rasters: &[String], stats: &[StatSpec]) -> Vec<String> {
    if rasters.len() == 1 {
        return stats.iter().map(|s| s.name.clone()).collect();
    }

    rasters.iter()
        .flat_map(move |raster| {
            let stem = raster_stem(raster);
            stats.iter().map(move |s| format!("{}_{}", stem, s.name))
        })
        .collect()
}

fn raster_stem(raster: &str) -> String {
    Path::new(raster)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(raster)
        .to_string()
}
