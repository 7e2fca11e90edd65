//! Inlining profitability policy
//!
//! Decides whether the inlining phase should keep growing a compilation unit
//! and whether an individual call site is worth expanding. The policy never
//! splices graphs itself; the driver asks it, then acts on the answer.

pub mod decision;
pub mod invocation;
pub mod policy;
pub mod scoring;

pub use decision::{Decision, DecisionContext, DecisionReason, DecisionTrace};
pub use invocation::{CallSiteId, CallSiteInvocation, CalleeDescriptor, InlineTarget};
pub use policy::{
    CallerGraph, GreedyInliningPolicy, InliningContext, InliningPolicy, InliningTelemetry,
    NoopTelemetry, evaluate_candidates,
};
pub use scoring::{InliningScorer, IntrinsicProvider, IntrinsicRegistry, ProfileScorer};

/// Counter bumped every time the budget gate stops inlining for a unit
pub const INLINING_STOPPED_BY_MAX_DESIRED_SIZE: &str = "InliningStoppedByMaxDesiredSize";
