// Sat Jan 17 2026 - Alex

use crate::stats::builtins::{self, Builtin};
use crate::stats::plugins;
use crate::stats::error::StatError;
use crate::stats::sample::CellSample;
use crate::stats::{StatKind, StatSpec};
use crate::table::CellValue;
use indexmap::IndexMap;
use std::sync::Arc;

/// User-defined statistic: `(values, coverage) -> scalar` over the valid
/// cells of one feature.
pub type CustomStatFn = Arc<dyn Fn(&[f64], &[f64]) -> f64 + Send + Sync>;

/// Name to implementation table. Built-ins are always present; custom
/// statistics are added at runtime and may not shadow a built-in.
#[derive(Clone)]
pub struct StatRegistry {
    custom: IndexMap<String, CustomStatFn>,
}

impl StatRegistry {
    pub fn new() -> Self {
        Self {
            custom: IndexMap::new(),
        }
    }

    pub fn register<F>(&mut self, name: &str, func: F) -> Result<(), StatError>
    where
        F: Fn(&[f64], &[f64]) -> f64 + Send + Sync + 'static,
    {
        if builtins::lookup(name).is_some() || self.custom.contains_key(name) {
            return Err(StatError::AlreadyRegistered(name.to_string()));
        }
        self.custom.insert(name.to_string(), Arc::new(func));
        log::debug!("Registered custom statistic {}", name);
        Ok(())
    }

    pub fn with_custom<F>(mut self, name: &str, func: F) -> Result<Self, StatError>
    where
        F: Fn(&[f64], &[f64]) -> f64 + Send + Sync + 'static,
    {
        self.register(name, func)?;
        Ok(self)
    }

    /// Registers each named function from the plugin table. Names already
    /// registered are skipped.
    pub fn with_plugins<I, S>(mut self, names: I) -> Result<Self, StatError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref();
            if self.custom.contains_key(name) {
                continue;
            }
            let func = plugins::lookup(name)
                .ok_or_else(|| StatError::UnknownStatistic(name.to_string()))?;
            self.register(name, func)?;
        }
        Ok(self)
    }

    pub fn kind_of(&self, name: &str) -> Option<StatKind> {
        if let Some(b) = builtins::lookup(name) {
            return Some(b.kind);
        }
        self.custom.get(name).map(|_| StatKind::Custom)
    }

    /// True when `name` is registered under exactly `kind`.
    pub fn supports(&self, spec: &StatSpec) -> bool {
        self.kind_of(&spec.name) == Some(spec.kind)
    }

    pub fn requires_weights(&self, name: &str) -> bool {
        builtins::lookup(name).map(|b| b.needs_weights).unwrap_or(false)
    }

    pub fn custom_names(&self) -> Vec<&str> {
        self.custom.keys().map(|k| k.as_str()).collect()
    }

    pub fn evaluate(&self, spec: &StatSpec, sample: &CellSample) -> Result<CellValue, StatError> {
        match spec.kind {
            StatKind::Aggregate | StatKind::Array => {
                let builtin: &Builtin = builtins::lookup(&spec.name)
                    .filter(|b| b.kind == spec.kind)
                    .ok_or_else(|| StatError::UnknownStatistic(spec.name.clone()))?;
                if builtin.needs_weights && sample.weights.is_none() {
                    return Err(StatError::WeightsRequired(spec.name.clone()));
                }
                Ok((builtin.func)(sample))
            }
            StatKind::Custom => {
                let func = self.custom.get(&spec.name)
                    .ok_or_else(|| StatError::UnknownStatistic(spec.name.clone()))?;
                let (values, coverage): (Vec<f64>, Vec<f64>) = sample.valid_cells()
                    .map(|c| (c.value, c.coverage))
                    .unzip();
                Ok(CellValue::Float(func(&values, &coverage)))
            }
        }
    }
}

impl Default for StatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatRegistry")
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}
