//! Telemetry sink for inlining decisions

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};

use otterc_inline::{DecisionReason, DecisionTrace, InliningTelemetry};

use crate::counters::DebugCounters;

/// Accept/reject tallies for one decision reason
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReasonStats {
    pub accepted: u64,
    pub rejected: u64,
}

impl ReasonStats {
    pub fn total(&self) -> u64 {
        self.accepted + self.rejected
    }
}

/// Snapshot of everything the sink has seen
#[derive(Debug, Clone, Default, Serialize)]
pub struct InliningStats {
    pub per_reason: BTreeMap<DecisionReason, ReasonStats>,
    pub counters: BTreeMap<&'static str, u64>,
}

impl InliningStats {
    pub fn total_decisions(&self) -> u64 {
        self.per_reason.values().map(ReasonStats::total).sum()
    }

    pub fn accepted(&self) -> u64 {
        self.per_reason.values().map(|stats| stats.accepted).sum()
    }

    pub fn rejected(&self) -> u64 {
        self.per_reason.values().map(|stats| stats.rejected).sum()
    }

    /// Fraction of decisions that accepted, 0 when nothing was decided
    pub fn acceptance_rate(&self) -> f64 {
        let total = self.total_decisions();
        if total == 0 {
            0.0
        } else {
            self.accepted() as f64 / total as f64
        }
    }
}

/// Inlining telemetry sink shared by all compilation workers
pub struct InliningMetrics {
    counters: DebugCounters,
    reason_stats: RwLock<HashMap<DecisionReason, ReasonStats>>,
    history: RwLock<VecDeque<DecisionTrace>>,
    max_history_size: usize,
}

impl InliningMetrics {
    pub const DEFAULT_HISTORY_SIZE: usize = 1000;

    pub fn new() -> Self {
        Self::with_history_size(Self::DEFAULT_HISTORY_SIZE)
    }

    pub fn with_history_size(max_history_size: usize) -> Self {
        Self {
            counters: DebugCounters::new(),
            reason_stats: RwLock::new(HashMap::new()),
            history: RwLock::new(VecDeque::with_capacity(max_history_size.min(1024))),
            max_history_size,
        }
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name)
    }

    /// Most recent traces, oldest first
    pub fn history(&self) -> Vec<DecisionTrace> {
        self.history.read().iter().cloned().collect()
    }

    pub fn reason_stats(&self, reason: DecisionReason) -> ReasonStats {
        self.reason_stats
            .read()
            .get(&reason)
            .copied()
            .unwrap_or_default()
    }

    pub fn stats(&self) -> InliningStats {
        InliningStats {
            per_reason: self
                .reason_stats
                .read()
                .iter()
                .map(|(reason, stats)| (*reason, *stats))
                .collect(),
            counters: self.counters.snapshot(),
        }
    }

    /// Clear all statistics
    pub fn clear(&self) {
        self.counters.clear();
        self.reason_stats.write().clear();
        self.history.write().clear();
    }
}

impl Default for InliningMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl InliningTelemetry for InliningMetrics {
    fn increment_counter(&self, name: &'static str) {
        self.counters.increment(name);
    }

    fn record_decision(&self, trace: &DecisionTrace) {
        let decision = &trace.decision;
        if decision.reason == DecisionReason::MaximumDesiredSize {
            tracing::info!(
                graph_nodes = decision.context.graph_nodes,
                limit = decision.context.maximum_desired_size,
                "inlining is cut off by maximum desired size"
            );
        } else {
            tracing::debug!(
                callee = trace.callee.as_deref().unwrap_or("<unit>"),
                depth = trace.depth,
                accepted = decision.accepted,
                reason = decision.reason.tag(),
                "{trace}"
            );
        }

        {
            let mut stats = self.reason_stats.write();
            let entry = stats.entry(decision.reason).or_default();
            if decision.accepted {
                entry.accepted += 1;
            } else {
                entry.rejected += 1;
            }
        }

        if self.max_history_size == 0 {
            return;
        }
        let mut history = self.history.write();
        if history.len() >= self.max_history_size {
            history.pop_front();
        }
        history.push_back(trace.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use otterc_config::InliningConfig;
    use otterc_inline::{
        CallSiteId, CallSiteInvocation, CalleeDescriptor, CallerGraph, Decision, DecisionContext,
        GreedyInliningPolicy, INLINING_STOPPED_BY_MAX_DESIRED_SIZE, InliningContext,
        InliningPolicy, evaluate_candidates,
    };
    use rayon::prelude::*;

    struct Graph(usize);

    impl CallerGraph for Graph {
        fn node_count(&self) -> usize {
            self.0
        }
    }

    fn trace(name: &str, accepted: bool, reason: DecisionReason) -> DecisionTrace {
        let decision = if accepted {
            Decision::accept(reason, DecisionContext::default())
        } else {
            Decision::reject(reason, DecisionContext::default())
        };
        DecisionTrace {
            callee: Some(name.to_string()),
            call_site: Some(CallSiteId(0)),
            depth: 0,
            fully_processed: false,
            decision,
        }
    }

    #[test]
    fn test_reason_stats() {
        let metrics = InliningMetrics::new();
        metrics.record_decision(&trace("a", true, DecisionReason::Trivial));
        metrics.record_decision(&trace("b", true, DecisionReason::RelevanceBased));
        metrics.record_decision(&trace("c", false, DecisionReason::RelevanceBased));

        assert_eq!(
            metrics.reason_stats(DecisionReason::RelevanceBased),
            ReasonStats {
                accepted: 1,
                rejected: 1
            }
        );
        assert_eq!(metrics.reason_stats(DecisionReason::Intrinsic).total(), 0);

        let stats = metrics.stats();
        assert_eq!(stats.total_decisions(), 3);
        assert_eq!(stats.accepted(), 2);
        assert_eq!(stats.rejected(), 1);
        assert!((stats.acceptance_rate() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_stats() {
        let stats = InliningMetrics::new().stats();
        assert_eq!(stats.total_decisions(), 0);
        assert_eq!(stats.acceptance_rate(), 0.0);
    }

    #[test]
    fn test_history_is_bounded() {
        let metrics = InliningMetrics::with_history_size(3);
        for name in ["a", "b", "c", "d", "e"] {
            metrics.record_decision(&trace(name, true, DecisionReason::Trivial));
        }

        let names: Vec<_> = metrics
            .history()
            .into_iter()
            .filter_map(|trace| trace.callee)
            .collect();
        assert_eq!(names, vec!["c", "d", "e"]);
        assert_eq!(metrics.reason_stats(DecisionReason::Trivial).accepted, 5);
    }

    #[test]
    fn test_history_disabled() {
        let metrics = InliningMetrics::with_history_size(0);
        metrics.record_decision(&trace("a", true, DecisionReason::Trivial));
        assert!(metrics.history().is_empty());
        assert_eq!(metrics.stats().total_decisions(), 1);
    }

    #[test]
    fn test_clear() {
        let metrics = InliningMetrics::new();
        metrics.increment_counter(INLINING_STOPPED_BY_MAX_DESIRED_SIZE);
        metrics.record_decision(&trace("a", false, DecisionReason::InvokeProbabilityTooHigh));
        metrics.clear();

        assert_eq!(metrics.counter(INLINING_STOPPED_BY_MAX_DESIRED_SIZE), 0);
        assert!(metrics.history().is_empty());
        assert_eq!(metrics.stats().total_decisions(), 0);
    }

    #[test]
    fn test_budget_gate_from_many_units() {
        let metrics = InliningMetrics::new();
        let policy = GreedyInliningPolicy::default();
        let configs: Vec<InliningConfig> = (1..=64)
            .map(|limit| InliningConfig {
                maximum_desired_size: limit * 10,
                ..InliningConfig::default()
            })
            .collect();

        // every unit sits exactly on its ceiling
        configs.par_iter().for_each(|config| {
            let cx = InliningContext::new(config, &metrics);
            assert!(!policy.continue_inlining(&cx, &Graph(config.maximum_desired_size)));
            assert!(policy.continue_inlining(&cx, &Graph(config.maximum_desired_size - 1)));
        });

        assert_eq!(metrics.counter(INLINING_STOPPED_BY_MAX_DESIRED_SIZE), 64);
        assert_eq!(
            metrics.reason_stats(DecisionReason::MaximumDesiredSize).rejected,
            64
        );
    }

    #[test]
    fn test_batch_evaluation_feeds_stats() {
        let metrics = InliningMetrics::new();
        let config = InliningConfig::default();
        let cx = InliningContext::new(&config, &metrics);
        let policy = GreedyInliningPolicy::default();

        let candidates = vec![
            CallSiteInvocation::root(CalleeDescriptor::new("tiny", CallSiteId(1), 3), 1.0, 1.0),
            CallSiteInvocation::root(CalleeDescriptor::new("huge", CallSiteId(2), 5_000), 1.0, 1.0),
        ];
        let decisions = evaluate_candidates(&policy, &cx, &candidates, false);

        assert!(decisions[0].accepted);
        assert!(!decisions[1].accepted);
        assert_eq!(metrics.reason_stats(DecisionReason::Trivial).accepted, 1);
        assert_eq!(metrics.reason_stats(DecisionReason::RelevanceBased).rejected, 1);
        assert_eq!(metrics.history().len(), 2);
    }
}
