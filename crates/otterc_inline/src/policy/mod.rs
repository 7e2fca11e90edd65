// Inlining policies
pub mod greedy;

pub use greedy::GreedyInliningPolicy;

use crate::decision::{Decision, DecisionTrace};
use crate::invocation::CallSiteInvocation;
use otterc_config::InliningConfig;
use rayon::prelude::*;

/// Caller graph as seen by the budget gate
pub trait CallerGraph {
    /// Current total node count, including everything inlined so far
    fn node_count(&self) -> usize;
}

/// Receiver for counters and decision traces.
///
/// Implementations are shared by every worker compiling in parallel, so
/// increments must not be lost under contention.
pub trait InliningTelemetry: Send + Sync {
    fn increment_counter(&self, name: &'static str);
    fn record_decision(&self, trace: &DecisionTrace);
}

/// Telemetry sink that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl InliningTelemetry for NoopTelemetry {
    fn increment_counter(&self, _name: &'static str) {}
    fn record_decision(&self, _trace: &DecisionTrace) {}
}

static NOOP_TELEMETRY: NoopTelemetry = NoopTelemetry;

/// Per-unit inputs handed to every policy query
#[derive(Clone, Copy)]
pub struct InliningContext<'a> {
    pub config: &'a InliningConfig,
    pub telemetry: &'a dyn InliningTelemetry,
}

impl<'a> InliningContext<'a> {
    pub fn new(config: &'a InliningConfig, telemetry: &'a dyn InliningTelemetry) -> Self {
        Self { config, telemetry }
    }

    /// Context that discards telemetry
    pub fn untraced(config: &'a InliningConfig) -> Self {
        Self::new(config, &NOOP_TELEMETRY)
    }
}

/// Profitability policy queried by the inlining driver
pub trait InliningPolicy: Send + Sync {
    /// Whether the driver should keep considering candidates for this unit
    fn continue_inlining(&self, cx: &InliningContext<'_>, graph: &dyn CallerGraph) -> bool;

    /// Whether `invocation` should be inlined now
    fn is_worth_inlining(
        &self,
        cx: &InliningContext<'_>,
        invocation: &CallSiteInvocation,
        depth: usize,
        fully_processed: bool,
    ) -> Decision;
}

/// Evaluate independent candidates of one unit in parallel.
///
/// Decisions come back in the order of `candidates`.
pub fn evaluate_candidates<P>(
    policy: &P,
    cx: &InliningContext<'_>,
    candidates: &[CallSiteInvocation],
    fully_processed: bool,
) -> Vec<Decision>
where
    P: InliningPolicy + ?Sized,
{
    candidates
        .par_iter()
        .map(|candidate| {
            policy.is_worth_inlining(cx, candidate, candidate.inlining_depth, fully_processed)
        })
        .collect()
}
