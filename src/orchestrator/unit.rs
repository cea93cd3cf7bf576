// Tue Jan 13 2026 - Alex

use crate::engine::{CancelToken, Subtask, TaskError};
use crate::features::FeatureSource;
use crate::orchestrator::collector::CollectorSlot;
use crate::orchestrator::error::UnitError;
use crate::orchestrator::partition::Batch;
use crate::stats::{BatchInput, StatSpec, StatisticsKernel};
use std::sync::Arc;

/// Inputs every unit of a run shares.
pub struct UnitInputs {
    pub source: Arc<dyn FeatureSource>,
    pub kernel: Arc<dyn StatisticsKernel>,
    pub rasters: Vec<String>,
    pub weights: Option<String>,
    pub stats: Vec<StatSpec>,
    pub id_column: String,
}

/// Computes the partial table for one batch and appends it once.
pub struct ComputeUnit {
    batch: Batch,
    inputs: Arc<UnitInputs>,
    share_source: bool,
    slot: CollectorSlot,
}

impl ComputeUnit {
    pub fn new(batch: Batch, inputs: Arc<UnitInputs>, slot: CollectorSlot) -> Self {
        Self {
            batch,
            inputs,
            share_source: false,
            slot,
        }
    }

    /// Run straight against the full source instead of a private copy.
    /// Only valid when this unit's batch is the whole source.
    pub fn sharing_source(mut self, share: bool) -> Self {
        self.share_source = share;
        self
    }

    pub fn name(&self) -> String {
        format!("batch-{}", self.batch.index())
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    /// Returns the number of rows appended.
    pub fn run(self, token: &CancelToken) -> Result<usize, UnitError> {
        let Self { batch, inputs, share_source, slot } = self;
        check(token)?;

        let features = if share_source {
            inputs.source.clone()
        } else {
            inputs.source.materialize(batch.ids())?
        };
        check(token)?;

        let input = BatchInput {
            features,
            rasters: inputs.rasters.clone(),
            weights: inputs.weights.clone(),
            stats: inputs.stats.clone(),
            id_column: inputs.id_column.clone(),
        };
        let table = inputs.kernel.compute(&input)?;
        let rows = table.row_count();

        // A unit cancelled mid-computation must not publish its rows.
        check(token)?;
        slot.append(table)
            .map_err(|_| UnitError::CollectorClosed(batch.index()))?;

        log::debug!("batch-{} appended {} rows", batch.index(), rows);
        Ok(rows)
    }

    pub fn into_subtask(self) -> Subtask {
        let name = self.name();
        Subtask::new(&name, move |token: &CancelToken| {
            self.run(token).map(|_| ()).map_err(TaskError::from)
        })
    }
}

fn check(token: &CancelToken) -> Result<(), UnitError> {
    if token.is_cancelled() {
        Err(UnitError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{AttributeValue, Feature, FeatureId, Field, FieldKind, MemoryFeatureSource, Schema};
    use crate::orchestrator::collector::ResultCollector;
    use crate::stats::{CellSample, MemorySampler, SampledKernel, StatRegistry};

    fn inputs() -> Arc<UnitInputs> {
        let schema = Schema::new(vec![Field::new("fid", FieldKind::Integer)]);
        let mut sampler = MemorySampler::new();
        let features: Vec<Feature> = (0..4)
            .map(|i| {
                sampler.insert("dem.tif", FeatureId(i), CellSample::new(vec![i as f64], vec![1.0]));
                Feature::new(FeatureId(i)).with_attribute("fid", AttributeValue::Integer(100 + i as i64))
            })
            .collect();
        let source = MemoryFeatureSource::new("plots", schema).with_features(features).unwrap();

        Arc::new(UnitInputs {
            source: Arc::new(source),
            kernel: Arc::new(SampledKernel::new(Arc::new(sampler), Arc::new(StatRegistry::new()))),
            rasters: vec!["dem.tif".to_string()],
            weights: None,
            stats: vec![StatSpec::aggregate("max")],
            id_column: "fid".to_string(),
        })
    }

    #[test]
    fn test_unit_appends_only_its_batch() {
        let mut collector = ResultCollector::new();
        let batch = Batch::new(1, vec![FeatureId(2), FeatureId(3)]);
        let unit = ComputeUnit::new(batch, inputs(), collector.slot(1));

        assert_eq!(unit.run(&CancelToken::new()).unwrap(), 2);
        let partials = collector.drain();
        assert_eq!(partials.len(), 1);
        assert_eq!(partials[0].batch, 1);
        assert_eq!(partials[0].table.ids(), vec![102, 103]);
    }

    #[test]
    fn test_shared_source_covers_everything() {
        let mut collector = ResultCollector::new();
        let batch = Batch::new(0, (0..4).map(FeatureId).collect());
        let unit = ComputeUnit::new(batch, inputs(), collector.slot(0)).sharing_source(true);

        assert_eq!(unit.run(&CancelToken::new()).unwrap(), 4);
    }

    #[test]
    fn test_cancelled_unit_appends_nothing() {
        let mut collector = ResultCollector::new();
        let unit = ComputeUnit::new(Batch::new(0, vec![FeatureId(0)]), inputs(), collector.slot(0));
        let token = CancelToken::new();
        token.cancel();

        assert!(matches!(unit.run(&token), Err(UnitError::Cancelled)));
        assert!(collector.drain().is_empty());
    }

    #[test]
    fn test_unknown_feature_fails() {
        let mut collector = ResultCollector::new();
        let unit = ComputeUnit::new(Batch::new(0, vec![FeatureId(99)]), inputs(), collector.slot(0));

        assert!(matches!(unit.run(&CancelToken::new()), Err(UnitError::Features(_))));
    }
}
