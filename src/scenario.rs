//! Candidate scenarios fed to `otter-inline evaluate`

use ahash::AHashMap;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use otterc_inline::{
    CallSiteId, CallSiteInvocation, CallerGraph, IntrinsicRegistry, ProfileScorer,
};

/// Bonus hint for one call site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BonusHint {
    pub call_site: CallSiteId,
    pub bonus: f64,
}

/// One compilation unit's worth of inlining candidates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Current node count of the caller graph
    pub graph_nodes: Option<usize>,
    pub hints: Vec<BonusHint>,
    /// Methods with a compiler substitution
    pub intrinsics: Vec<String>,
    pub candidates: Vec<CallSiteInvocation>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("failed to parse scenario {}", path.display()))
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let scenario: Self = serde_json::from_str(contents)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Reject inputs the policy assumes were validated upstream
    fn validate(&self) -> Result<()> {
        let mut seen = AHashMap::new();
        for (index, candidate) in self.candidates.iter().enumerate() {
            let callee = &candidate.callee;
            if !(0.0..=1.0).contains(&candidate.probability) {
                anyhow::bail!(
                    "candidate {} ({}): probability {} is outside [0, 1]",
                    index,
                    callee.name,
                    candidate.probability
                );
            }
            if candidate.relevance.is_nan() || candidate.relevance < 0.0 {
                anyhow::bail!(
                    "candidate {} ({}): relevance {} is negative",
                    index,
                    callee.name,
                    candidate.relevance
                );
            }
            if let Some(previous) = seen.insert(callee.call_site, index) {
                tracing::warn!(
                    call_site = %callee.call_site,
                    first = previous,
                    second = index,
                    "call site listed twice"
                );
            }
        }

        for hint in &self.hints {
            if !(hint.bonus > 0.0) {
                anyhow::bail!("bonus for call site {} must be positive", hint.call_site);
            }
        }
        Ok(())
    }

    pub fn scorer(&self) -> ProfileScorer {
        ProfileScorer::with_hints(self.hints.iter().map(|hint| (hint.call_site, hint.bonus)))
    }

    pub fn intrinsics(&self) -> IntrinsicRegistry {
        self.intrinsics.iter().cloned().collect()
    }
}

/// Caller graph described only by its size
#[derive(Debug, Clone, Copy)]
pub struct UnitGraph {
    pub nodes: usize,
}

impl CallerGraph for UnitGraph {
    fn node_count(&self) -> usize {
        self.nodes
    }
}
