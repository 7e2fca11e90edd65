//! Greedy inlining policy
//!
//! Accepts a candidate as soon as one rule in a fixed priority order says it
//! is profitable, without weighing it against the other candidates of the
//! unit. The order matters: earlier rules short-circuit later ones.
//!
//! 1. `inline_everything` accepts unconditionally.
//! 2. Intrinsics accept unconditionally.
//! 3. Must-inline callees accept unconditionally.
//! 4. A previous standalone compilation larger than the scaled cap rejects.
//! 5. Callees below the scaled trivial size accept.
//! 6. Fully processed callees whose nested calls are too probable reject.
//! 7. Otherwise the relevance-scaled size bound decides.
//!
//! Every size threshold from rule 4 on is multiplied by the callee's bonus.

use std::sync::Arc;

use otterc_config::InliningConfig;

use super::{CallerGraph, InliningContext, InliningPolicy};
use crate::INLINING_STOPPED_BY_MAX_DESIRED_SIZE;
use crate::decision::{Decision, DecisionContext, DecisionReason, DecisionTrace};
use crate::invocation::CallSiteInvocation;
use crate::scoring::{InliningScorer, IntrinsicProvider, IntrinsicRegistry, ProfileScorer};

pub struct GreedyInliningPolicy {
    scorer: Arc<dyn InliningScorer>,
    intrinsics: Arc<dyn IntrinsicProvider>,
}

impl GreedyInliningPolicy {
    pub fn new(scorer: Arc<dyn InliningScorer>, intrinsics: Arc<dyn IntrinsicProvider>) -> Self {
        Self { scorer, intrinsics }
    }

    /// Rejection for a caller graph that has outgrown the unit's budget
    pub fn check_budget(&self, config: &InliningConfig, graph_nodes: usize) -> Option<Decision> {
        (graph_nodes >= config.maximum_desired_size).then(|| {
            Decision::reject(
                DecisionReason::MaximumDesiredSize,
                DecisionContext {
                    graph_nodes: Some(graph_nodes),
                    maximum_desired_size: Some(config.maximum_desired_size),
                    ..DecisionContext::default()
                },
            )
        })
    }

    /// Run the rule chain without reporting anything
    pub fn evaluate(
        &self,
        config: &InliningConfig,
        invocation: &CallSiteInvocation,
        fully_processed: bool,
    ) -> Decision {
        let callee = &invocation.callee;

        if config.inline_everything {
            return Decision::accept(DecisionReason::InlineEverything, DecisionContext::default());
        }

        if self.intrinsics.is_intrinsic(callee) {
            return Decision::accept(DecisionReason::Intrinsic, DecisionContext::default());
        }

        if callee.force_inline {
            return Decision::accept(DecisionReason::ForcedInlining, DecisionContext::default());
        }

        let bonus = self.scorer.inlining_bonus(callee);
        let nodes = callee.node_count;
        let context = DecisionContext {
            relevance: Some(invocation.relevance),
            probability: Some(invocation.probability),
            bonus: Some(bonus),
            nodes: Some(nodes),
            ..DecisionContext::default()
        };

        let oversized_previous = config.previous_size_limit().and_then(|limit| {
            self.scorer
                .previous_low_level_graph_size(callee)
                .filter(|size| *size as f64 > limit * bonus)
        });
        if let Some(size) = oversized_previous {
            return Decision::reject(
                DecisionReason::TooLargePreviousLowLevelGraph,
                DecisionContext {
                    low_level_graph_size: Some(size),
                    ..context
                },
            );
        }

        if (nodes as f64) < config.trivial_inlining_size as f64 * bonus {
            return Decision::accept(DecisionReason::Trivial, context);
        }

        if fully_processed {
            if let Some(limit) = config.invoke_probability_limit() {
                let invokes = self.scorer.invoke_probability(callee);
                if invokes > limit * bonus {
                    return Decision::reject(
                        DecisionReason::InvokeProbabilityTooHigh,
                        DecisionContext {
                            invoke_probability: Some(invokes),
                            ..context
                        },
                    );
                }
            }
        }

        // the scaled base bound is a whole number of nodes
        let base_bound = (config.maximum_inlining_size as f64 * bonus).trunc();
        let maximum_nodes = self
            .scorer
            .compute_maximum_size(invocation.relevance, base_bound);
        let context = DecisionContext {
            maximum_nodes: Some(maximum_nodes),
            ..context
        };

        if nodes as f64 <= maximum_nodes {
            Decision::accept(DecisionReason::RelevanceBased, context)
        } else {
            Decision::reject(DecisionReason::RelevanceBased, context)
        }
    }
}

impl Default for GreedyInliningPolicy {
    fn default() -> Self {
        Self::new(
            Arc::new(ProfileScorer::new()),
            Arc::new(IntrinsicRegistry::new()),
        )
    }
}

impl InliningPolicy for GreedyInliningPolicy {
    fn continue_inlining(&self, cx: &InliningContext<'_>, graph: &dyn CallerGraph) -> bool {
        match self.check_budget(cx.config, graph.node_count()) {
            Some(decision) => {
                cx.telemetry.record_decision(&DecisionTrace::unit(decision));
                cx.telemetry
                    .increment_counter(INLINING_STOPPED_BY_MAX_DESIRED_SIZE);
                false
            }
            None => true,
        }
    }

    fn is_worth_inlining(
        &self,
        cx: &InliningContext<'_>,
        invocation: &CallSiteInvocation,
        depth: usize,
        fully_processed: bool,
    ) -> Decision {
        let decision = self.evaluate(cx.config, invocation, fully_processed);
        cx.telemetry.record_decision(&DecisionTrace {
            callee: Some(invocation.callee.name.clone()),
            call_site: Some(invocation.callee.call_site),
            depth,
            fully_processed,
            decision: decision.clone(),
        });
        decision
    }
}
