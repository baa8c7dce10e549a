//! Per-run memo of target evaluation results.

use std::collections::HashMap;

use crate::core::target::TargetId;

/// Maps each evaluated target to whether it was already up to date.
///
/// Lives for one run only; never persisted.
#[derive(Debug, Clone, Default)]
pub struct EvaluationCache {
    results: HashMap<TargetId, bool>,
}

impl EvaluationCache {
    pub fn new() -> Self {
        EvaluationCache::default()
    }

    /// The cached result for `id`, if it was evaluated this run.
    pub fn get(&self, id: TargetId) -> Option<bool> {
        self.results.get(&id).copied()
    }

    /// Record the result for `id`.
    pub fn insert(&mut self, id: TargetId, fresh: bool) {
        self.results.insert(id, fresh);
    }

    /// Forget every result.
    pub fn reset(&mut self) {
        self.results.clear();
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
