//! Structured inlining decisions
//!
//! A `Decision` carries the verdict, the rule that produced it, and the
//! numbers that rule looked at. The numbers are for reporting only; callers
//! branch on `accepted` alone.

use crate::invocation::CallSiteId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rule that settled a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    MaximumDesiredSize,
    InlineEverything,
    Intrinsic,
    ForcedInlining,
    TooLargePreviousLowLevelGraph,
    Trivial,
    InvokeProbabilityTooHigh,
    RelevanceBased,
}

impl DecisionReason {
    pub const ALL: [Self; 8] = [
        Self::MaximumDesiredSize,
        Self::InlineEverything,
        Self::Intrinsic,
        Self::ForcedInlining,
        Self::TooLargePreviousLowLevelGraph,
        Self::Trivial,
        Self::InvokeProbabilityTooHigh,
        Self::RelevanceBased,
    ];

    /// Human readable tag
    pub fn tag(self) -> &'static str {
        match self {
            Self::MaximumDesiredSize => "cut off by maximum desired size",
            Self::InlineEverything => "inline everything",
            Self::Intrinsic => "intrinsic",
            Self::ForcedInlining => "forced inlining",
            Self::TooLargePreviousLowLevelGraph => "too large previous low-level graph",
            Self::Trivial => "trivial",
            Self::InvokeProbabilityTooHigh => "callee invoke probability too high",
            Self::RelevanceBased => "relevance-based",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Numeric inputs a rule looked at
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_level_graph_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoke_probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_nodes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_nodes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_desired_size: Option<usize>,
}

impl DecisionContext {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for DecisionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(size) = self.low_level_graph_size {
            parts.push(format!("low-level-nodes={size}"));
        }
        if let Some(invokes) = self.invoke_probability {
            parts.push(format!("invokeP={invokes:.6}"));
        }
        if let Some(relevance) = self.relevance {
            parts.push(format!("relevance={relevance:.6}"));
        }
        if let Some(probability) = self.probability {
            parts.push(format!("probability={probability:.6}"));
        }
        if let Some(bonus) = self.bonus {
            parts.push(format!("bonus={bonus:.6}"));
        }
        match (self.nodes, self.maximum_nodes) {
            (Some(nodes), Some(max)) => {
                let cmp = if nodes as f64 <= max { "<=" } else { ">" };
                parts.push(format!("nodes={nodes} {cmp} {max:.6}"));
            }
            (Some(nodes), None) => parts.push(format!("nodes={nodes}")),
            _ => {}
        }
        if let (Some(nodes), Some(limit)) = (self.graph_nodes, self.maximum_desired_size) {
            parts.push(format!("graph-nodes={nodes} >= {limit}"));
        }
        f.write_str(&parts.join(", "))
    }
}

/// Outcome of one policy query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub accepted: bool,
    pub reason: DecisionReason,
    pub context: DecisionContext,
}

impl Decision {
    pub fn accept(reason: DecisionReason, context: DecisionContext) -> Self {
        Self {
            accepted: true,
            reason,
            context,
        }
    }

    pub fn reject(reason: DecisionReason, context: DecisionContext) -> Self {
        Self {
            accepted: false,
            reason,
            context,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.accepted { "inlining" } else { "not inlining" };
        write!(f, "{verdict}: {}", self.reason)?;
        if !self.context.is_empty() {
            write!(f, " ({})", self.context)?;
        }
        Ok(())
    }
}

/// A decision plus where it was made, handed to telemetry sinks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTrace {
    /// Callee name, absent for unit-wide budget decisions
    pub callee: Option<String>,
    pub call_site: Option<CallSiteId>,
    pub depth: usize,
    pub fully_processed: bool,
    pub decision: Decision,
}

impl DecisionTrace {
    pub fn unit(decision: Decision) -> Self {
        Self {
            callee: None,
            call_site: None,
            depth: 0,
            fully_processed: false,
            decision,
        }
    }
}

impl fmt::Display for DecisionTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.callee, self.call_site) {
            (Some(callee), Some(site)) => write!(
                f,
                "{}{callee} {site} [depth {}]: {}",
                "  ".repeat(self.depth),
                self.depth,
                self.decision
            ),
            (Some(callee), None) => write!(f, "{callee} [depth {}]: {}", self.depth, self.decision),
            _ => write!(f, "{}", self.decision),
        }
    }
}
