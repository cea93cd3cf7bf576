// Fri Jan 16 2026 - Alex

pub mod error;
pub mod memory;
pub mod source;

pub use error::FeatureError;
pub use memory::MemoryFeatureSource;
pub use source::{identity_value, AttributeValue, Feature, FeatureId, FeatureSource, Field, FieldKind, Schema};
