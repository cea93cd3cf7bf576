// Tue Jan 13 2026 - Alex

use crate::features::FeatureId;

/// A contiguous slice of the feature-identifier sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    index: usize,
    ids: Vec<FeatureId>,
}

impl Batch {
    pub fn new(index: usize, ids: Vec<FeatureId>) -> Self {
        Self { index, ids }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn ids(&self) -> &[FeatureId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Stride used to slice `total` features for `parallelism` jobs:
/// `total / parallelism` rounded half-to-even, never below 1.
///
/// This is a stride, not a batch count. 10 features at parallelism 3 give a
/// stride of 3 and therefore four batches.
pub fn batch_size(total: usize, parallelism: usize) -> usize {
    if parallelism == 0 {
        return total.max(1);
    }
    let stride = (total as f64 / parallelism as f64).round_ties_even() as usize;
    stride.max(1)
}

pub fn partition(ids: &[FeatureId], parallelism: usize) -> Vec<Batch> {
    let stride = batch_size(ids.len(), parallelism);

    ids.chunks(stride)
        .enumerate()
        .map(|(index, chunk)| Batch::new(index, chunk.to_vec()))
        .collect()
}
