//! Run context - watermark and per-step results for one run

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A set of consultation identifiers handed between steps
pub type RecordSet = BTreeSet<i64>;

/// Run-scoped mapping from step kind to its last produced result
///
/// Written only through the engine's relay; single-threaded execution, so
/// no locking. Discarded at run end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultStore {
    results: HashMap<String, RecordSet>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a step's result, replacing any earlier one for the same kind
    pub fn put(&mut self, kind: &str, result: RecordSet) {
        self.results.insert(kind.to_string(), result);
    }

    /// Look up the result of a step kind, if one was produced
    pub fn get(&self, kind: &str) -> Option<&RecordSet> {
        self.results.get(kind)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.results.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Execution context for a single pipeline run
///
/// Holds the watermark resolved at run start, the accumulated step
/// results, and the step count. One context per run; steps receive it by
/// reference and never mutate it directly.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Newest comment id seen before this run started; immutable mid-run
    pub watermark: i64,

    /// Results of completed steps, keyed by step kind
    pub results: ResultStore,

    /// Total number of configured steps
    pub total_steps: usize,
}

impl RunContext {
    pub fn new(watermark: i64, total_steps: usize) -> Self {
        Self {
            watermark,
            results: ResultStore::new(),
            total_steps,
        }
    }
}
