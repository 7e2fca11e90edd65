//! Rendering of evaluation results

use colored::Colorize;
use serde::Serialize;
use std::fmt;

use otterc_inline::{CallSiteInvocation, Decision, INLINING_STOPPED_BY_MAX_DESIRED_SIZE};
use otterc_metrics::InliningStats;

/// Result of running one scenario through the policy
#[derive(Debug, Serialize)]
pub struct Evaluation {
    pub graph_nodes: usize,
    pub continued: bool,
    pub decisions: Vec<CandidateDecision>,
    pub stats: InliningStats,
}

#[derive(Debug, Serialize)]
pub struct CandidateDecision {
    pub callee: String,
    pub depth: usize,
    #[serde(flatten)]
    pub decision: Decision,
}

impl CandidateDecision {
    pub fn new(candidate: &CallSiteInvocation, decision: Decision) -> Self {
        Self {
            callee: candidate.callee.name.clone(),
            depth: candidate.inlining_depth,
            decision,
        }
    }
}

pub fn render_json(evaluation: &Evaluation) -> serde_json::Result<String> {
    serde_json::to_string_pretty(evaluation)
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.continued {
            writeln!(
                f,
                "{} caller graph has {} nodes, inlining is cut off",
                "stopped:".red().bold(),
                self.graph_nodes
            )?;
        }

        for entry in &self.decisions {
            let verdict = if entry.decision.accepted {
                "inline".green().bold()
            } else {
                "skip".yellow().bold()
            };
            writeln!(
                f,
                "{:>6}  {}{}  {}",
                verdict,
                "  ".repeat(entry.depth),
                entry.callee.bold(),
                entry.decision.reason.tag().dimmed()
            )?;
            writeln!(f, "        {}", entry.decision.context)?;
        }

        let stats = &self.stats;
        writeln!(
            f,
            "\n{} {} decisions, {} inlined, {} rejected ({:.1}% accepted)",
            "summary:".bold(),
            stats.total_decisions(),
            stats.accepted(),
            stats.rejected(),
            stats.acceptance_rate() * 100.0
        )?;
        for (reason, reason_stats) in &stats.per_reason {
            writeln!(
                f,
                "  {:<36} {:>5} accepted {:>5} rejected",
                reason.tag(),
                reason_stats.accepted,
                reason_stats.rejected
            )?;
        }
        let stopped = stats
            .counters
            .get(INLINING_STOPPED_BY_MAX_DESIRED_SIZE)
            .copied()
            .unwrap_or(0);
        if stopped > 0 {
            writeln!(f, "  {INLINING_STOPPED_BY_MAX_DESIRED_SIZE}: {stopped}")?;
        }
        Ok(())
    }
}
