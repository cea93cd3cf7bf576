// Fri Jan 16 2026 - Alex

use crate::features::error::FeatureError;
use crate::features::source::{Feature, FeatureId, FeatureSource, Field, Schema};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct MemoryFeatureSource {
    name: String,
    schema: Schema,
    features: IndexMap<FeatureId, Feature>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FeatureCollection {
    name: String,
    fields: Vec<Field>,
    features: Vec<Feature>,
}

impl MemoryFeatureSource {
    pub fn new(name: &str, schema: Schema) -> Self {
        Self {
            name: name.to_string(),
            schema,
            features: IndexMap::new(),
        }
    }

    pub fn with_features(mut self, features: Vec<Feature>) -> Result<Self, FeatureError> {
        for feature in features {
            self.insert(feature)?;
        }
        Ok(self)
    }

    pub fn insert(&mut self, feature: Feature) -> Result<(), FeatureError> {
        if self.features.contains_key(&feature.id) {
            return Err(FeatureError::DuplicateFeature(feature.id));
        }
        self.features.insert(feature.id, feature);
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, FeatureError> {
        let collection: FeatureCollection = serde_json::from_str(json)?;
        Self::new(&collection.name, Schema::new(collection.fields))
            .with_features(collection.features)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FeatureError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

impl FeatureSource for MemoryFeatureSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn feature_count(&self) -> usize {
        self.features.len()
    }

    fn feature_ids(&self) -> Vec<FeatureId> {
        self.features.keys().copied().collect()
    }

    fn features(&self, ids: &[FeatureId]) -> Result<Vec<Feature>, FeatureError> {
        ids.iter()
            .map(|id| {
                self.features.get(id)
                    .cloned()
                    .ok_or(FeatureError::UnknownFeature(*id))
            })
            .collect()
    }

    fn materialize(&self, ids: &[FeatureId]) -> Result<Arc<dyn FeatureSource>, FeatureError> {
        let copy = MemoryFeatureSource::new(&format!("{} (subset)", self.name), self.schema.clone())
            .with_features(self.features(ids)?)?;
        Ok(Arc::new(copy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::source::{AttributeValue, FieldKind};

    fn sample_source() -> MemoryFeatureSource {
        let schema = Schema::new(vec![Field::new("plot_id", FieldKind::Integer)]);
        let features = (0..5)
            .map(|i| Feature::new(FeatureId(i)).with_attribute("plot_id", AttributeValue::Integer(100 + i as i64)))
            .collect();
        MemoryFeatureSource::new("plots", schema).with_features(features).unwrap()
    }

    #[test]
    fn test_materialize_is_isolated_subset() {
        let source = sample_source();
        let subset = source.materialize(&[FeatureId(3), FeatureId(1)]).unwrap();

        assert_eq!(subset.feature_count(), 2);
        assert_eq!(subset.feature_ids(), vec![FeatureId(3), FeatureId(1)]);
        assert_eq!(subset.schema(), source.schema());
        assert_eq!(source.feature_count(), 5);
    }

    #[test]
    fn test_materialize_unknown_id() {
        let source = sample_source();
        let err = source.materialize(&[FeatureId(99)]).err().unwrap();
        assert!(matches!(err, FeatureError::UnknownFeature(FeatureId(99))));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut source = sample_source();
        assert!(source.insert(Feature::new(FeatureId(0))).is_err());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "name": "parcels",
            "fields": [{"name": "plot_id", "kind": "integer"}, {"name": "owner", "kind": "text"}],
            "features": [
                {"id": 7, "attributes": {"plot_id": 70, "owner": "A"}, "geometry": "POLYGON((0 0,1 0,1 1,0 0))"},
                {"id": 8, "attributes": {"plot_id": 80, "owner": null}}
            ]
        }"#;

        let source = MemoryFeatureSource::from_json(json).unwrap();
        assert_eq!(source.name(), "parcels");
        assert_eq!(source.feature_ids(), vec![FeatureId(7), FeatureId(8)]);

        let features = source.features(&[FeatureId(8)]).unwrap();
        assert_eq!(features[0].attribute("plot_id"), Some(&AttributeValue::Integer(80)));
        assert!(features[0].attribute("owner").unwrap().is_null());
    }
}
