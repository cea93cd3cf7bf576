// Fri Jan 16 2026 - Alex

use crate::features::error::FeatureError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(pub u64);

impl FeatureId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for FeatureId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Integer,
    Float,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
}

impl Field {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn is_integer(&self, name: &str) -> bool {
        matches!(self.field(name), Some(f) if f.kind == FieldKind::Integer)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Null,
}

impl AttributeValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

/// One polygon feature. The geometry is kept opaque (WKT or any encoding the
/// sampler understands); the engine never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    #[serde(default)]
    pub attributes: IndexMap<String, AttributeValue>,
    #[serde(default)]
    pub geometry: Option<String>,
}

impl Feature {
    pub fn new(id: FeatureId) -> Self {
        Self {
            id,
            attributes: IndexMap::new(),
            geometry: None,
        }
    }

    pub fn with_attribute(mut self, name: &str, value: AttributeValue) -> Self {
        self.attributes.insert(name.to_string(), value);
        self
    }

    pub fn with_geometry(mut self, geometry: &str) -> Self {
        self.geometry = Some(geometry.to_string());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }
}

/// Read access to a vector layer of polygon features.
///
/// `materialize` must return an isolated copy: later changes to `self` are
/// not visible through it and it shares the same schema.
pub trait FeatureSource: Send + Sync {
    fn name(&self) -> &str;

    fn schema(&self) -> &Schema;

    fn feature_count(&self) -> usize;

    /// Identifiers in the source's natural order.
    fn feature_ids(&self) -> Vec<FeatureId>;

    fn features(&self, ids: &[FeatureId]) -> Result<Vec<Feature>, FeatureError>;

    fn all_features(&self) -> Result<Vec<Feature>, FeatureError> {
        self.features(&self.feature_ids())
    }

    fn materialize(&self, ids: &[FeatureId]) -> Result<Arc<dyn FeatureSource>, FeatureError>;
}

/// Identity-column value of a feature. Only integer attributes qualify.
pub fn identity_value(feature: &Feature, column: &str) -> Result<i64, FeatureError> {
    match feature.attribute(column) {
        Some(AttributeValue::Integer(v)) => Ok(*v),
        Some(AttributeValue::Null) => Err(FeatureError::MissingValue {
            feature: feature.id,
            field: column.to_string(),
        }),
        Some(_) => Err(FeatureError::NotInteger {
            feature: feature.id,
            field: column.to_string(),
        }),
        None => Err(FeatureError::FieldNotFound(column.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_value() {
        let feature = Feature::new(FeatureId(3))
            .with_attribute("plot_id", AttributeValue::Integer(42))
            .with_attribute("label", AttributeValue::Text("north".to_string()))
            .with_attribute("area", AttributeValue::Null);

        assert_eq!(identity_value(&feature, "plot_id").unwrap(), 42);
        assert!(matches!(identity_value(&feature, "label"), Err(FeatureError::NotInteger { .. })));
        assert!(matches!(identity_value(&feature, "area"), Err(FeatureError::MissingValue { .. })));
        assert!(matches!(identity_value(&feature, "nope"), Err(FeatureError::FieldNotFound(_))));
    }

    #[test]
    fn test_schema_lookup() {
        let schema = Schema::new(vec![
            Field::new("plot_id", FieldKind::Integer),
            Field::new("name", FieldKind::Text),
        ]);

        assert!(schema.contains("name"));
        assert!(schema.is_integer("plot_id"));
        assert!(!schema.is_integer("name"));
        assert!(!schema.is_integer("missing"));
    }
}
