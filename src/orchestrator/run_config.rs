// Tue Jan 13 2026 - Alex

use crate::features::FeatureSource;
use crate::stats::StatSpec;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One computation request. Built once through [`RunConfigBuilder`] and not
/// changed afterwards; the controller validates it before scheduling.
#[derive(Clone)]
pub struct RunConfig {
    rasters: Vec<String>,
    weights: Option<String>,
    features: Option<Arc<dyn FeatureSource>>,
    id_field: Option<String>,
    parallelism: usize,
    output: Option<PathBuf>,
    aggregates: Vec<String>,
    arrays: Vec<String>,
    custom: Vec<String>,
    prefix: String,
}

impl RunConfig {
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::new()
    }

    pub fn rasters(&self) -> &[String] {
        &self.rasters
    }

    pub fn weights(&self) -> Option<&str> {
        self.weights.as_deref()
    }

    pub fn features(&self) -> Option<&Arc<dyn FeatureSource>> {
        self.features.as_ref()
    }

    pub fn id_field(&self) -> Option<&str> {
        self.id_field.as_deref()
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    pub fn aggregates(&self) -> &[String] {
        &self.aggregates
    }

    pub fn arrays(&self) -> &[String] {
        &self.arrays
    }

    pub fn custom(&self) -> &[String] {
        &self.custom
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn has_statistics(&self) -> bool {
        !(self.aggregates.is_empty() && self.arrays.is_empty() && self.custom.is_empty())
    }

    /// Aggregates, then arrays, then custom statistics.
    pub fn stat_specs(&self) -> Vec<StatSpec> {
        self.aggregates.iter().map(|n| StatSpec::aggregate(n))
            .chain(self.arrays.iter().map(|n| StatSpec::array(n)))
            .chain(self.custom.iter().map(|n| StatSpec::custom(n)))
            .collect()
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("rasters", &self.rasters)
            .field("weights", &self.weights)
            .field("features", &self.features.as_ref().map(|s| s.name().to_string()))
            .field("id_field", &self.id_field)
            .field("parallelism", &self.parallelism)
            .field("output", &self.output)
            .field("aggregates", &self.aggregates)
            .field("arrays", &self.arrays)
            .field("custom", &self.custom)
            .field("prefix", &self.prefix)
            .finish()
    }
}

pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RunConfig {
                rasters: Vec::new(),
                weights: None,
                features: None,
                id_field: None,
                parallelism: 1,
                output: None,
                aggregates: Vec::new(),
                arrays: Vec::new(),
                custom: Vec::new(),
                prefix: String::new(),
            },
        }
    }

    pub fn with_raster(mut self, raster: &str) -> Self {
        self.config.rasters.push(raster.to_string());
        self
    }

    pub fn with_rasters<I, S>(mut self, rasters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.rasters.extend(rasters.into_iter().map(Into::into));
        self
    }

    pub fn with_weights(mut self, raster: &str) -> Self {
        self.config.weights = Some(raster.to_string());
        self
    }

    pub fn with_features(mut self, source: Arc<dyn FeatureSource>) -> Self {
        self.config.features = Some(source);
        self
    }

    pub fn with_id_field(mut self, field: &str) -> Self {
        self.config.id_field = Some(field.to_string());
        self
    }

    pub fn with_parallelism(mut self, jobs: usize) -> Self {
        self.config.parallelism = jobs;
        self
    }

    pub fn with_output<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.output = Some(path.into());
        self
    }

    pub fn with_aggregates<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.aggregates.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_arrays<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.arrays.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_custom<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.custom.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.config.prefix = prefix.to_string();
        self
    }

    pub fn build(self) -> RunConfig {
        self.config
    }
}

impl Default for RunConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
