//! Scoring collaborators consulted by inlining policies

use crate::invocation::{CallSiteId, CalleeDescriptor};
use ahash::{AHashMap, AHashSet};

/// Size and frequency estimates for a candidate callee
pub trait InliningScorer: Send + Sync {
    /// Multiplier applied to every size threshold, always `> 0`
    fn inlining_bonus(&self, callee: &CalleeDescriptor) -> f64;

    /// Size of the callee's previous standalone compilation, `None` if it was
    /// never compiled on its own
    fn previous_low_level_graph_size(&self, callee: &CalleeDescriptor) -> Option<u64>;

    /// Summed probability of the calls nested inside the callee
    fn invoke_probability(&self, callee: &CalleeDescriptor) -> f64;

    /// Node bound for a call site of the given relevance. Non-decreasing in
    /// `relevance`.
    fn compute_maximum_size(&self, relevance: f64, base_bound: f64) -> f64;
}

/// Recognizes callees that have a compiler-provided substitution
pub trait IntrinsicProvider: Send + Sync {
    fn is_intrinsic(&self, callee: &CalleeDescriptor) -> bool;
}

/// Scorer backed by profile data recorded on the callee descriptor and
/// per-call-site bonus hints supplied by the driver
#[derive(Debug, Clone)]
pub struct ProfileScorer {
    hints: AHashMap<CallSiteId, f64>,
    relevance_cap: f64,
}

impl ProfileScorer {
    pub const DEFAULT_RELEVANCE_CAP: f64 = 1.0;

    pub fn new() -> Self {
        Self {
            hints: AHashMap::new(),
            relevance_cap: Self::DEFAULT_RELEVANCE_CAP,
        }
    }

    pub fn with_hints(hints: impl IntoIterator<Item = (CallSiteId, f64)>) -> Self {
        Self {
            hints: hints.into_iter().collect(),
            ..Self::new()
        }
    }

    pub fn with_relevance_cap(mut self, cap: f64) -> Self {
        self.relevance_cap = cap;
        self
    }

    pub fn hint(&self, call_site: CallSiteId) -> Option<f64> {
        self.hints.get(&call_site).copied()
    }
}

impl Default for ProfileScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl InliningScorer for ProfileScorer {
    fn inlining_bonus(&self, callee: &CalleeDescriptor) -> f64 {
        self.hint(callee.call_site).unwrap_or(1.0)
    }

    fn previous_low_level_graph_size(&self, callee: &CalleeDescriptor) -> Option<u64> {
        callee
            .targets
            .iter()
            .filter_map(|target| target.compiled_ir_size)
            .filter(|size| *size > 0)
            .reduce(u64::saturating_add)
    }

    fn invoke_probability(&self, callee: &CalleeDescriptor) -> f64 {
        callee
            .targets
            .iter()
            .flat_map(|target| target.nested_invoke_probabilities.iter())
            .sum()
    }

    fn compute_maximum_size(&self, relevance: f64, base_bound: f64) -> f64 {
        base_bound * relevance.min(self.relevance_cap)
    }
}

/// Set of methods that have a compiler substitution
#[derive(Debug, Clone, Default)]
pub struct IntrinsicRegistry {
    substitutions: AHashSet<String>,
}

impl IntrinsicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, method: impl Into<String>) -> bool {
        self.substitutions.insert(method.into())
    }

    pub fn has_substitution(&self, method: &str) -> bool {
        self.substitutions.contains(method)
    }

    pub fn len(&self) -> usize {
        self.substitutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.substitutions.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for IntrinsicRegistry {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            substitutions: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl IntrinsicProvider for IntrinsicRegistry {
    /// Every dispatch target must be substitutable, otherwise some receiver
    /// would still reach a real call.
    fn is_intrinsic(&self, callee: &CalleeDescriptor) -> bool {
        !callee.targets.is_empty()
            && callee
                .targets
                .iter()
                .all(|target| self.has_substitution(&target.method))
    }
}
