use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a call site inside the caller's graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallSiteId(pub u64);

impl fmt::Display for CallSiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One method a call site may dispatch to.
///
/// Monomorphic sites have a single target; type-switching sites carry one per
/// receiver type that will be inlined.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InlineTarget {
    /// Fully qualified method name
    pub method: String,

    /// IR size of a previous standalone compilation, if one exists
    pub compiled_ir_size: Option<u64>,

    /// Probability of each call site nested in this target's body, relative
    /// to the target's entry
    pub nested_invoke_probabilities: Vec<f64>,
}

impl InlineTarget {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    pub fn with_compiled_ir_size(mut self, size: u64) -> Self {
        self.compiled_ir_size = Some(size);
        self
    }

    pub fn with_nested_invoke(mut self, probability: f64) -> Self {
        self.nested_invoke_probabilities.push(probability);
        self
    }
}

/// Static and dynamic facts about a candidate callee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CalleeRecord")]
pub struct CalleeDescriptor {
    /// Display name of the callee
    pub name: String,

    /// Call site the callee would be inlined into
    pub call_site: CallSiteId,

    /// Static IR size of the callee graph
    pub node_count: usize,

    /// Callee is annotated as must-inline
    pub force_inline: bool,

    /// Methods this call site resolves to
    pub targets: Vec<InlineTarget>,
}

/// Serialized form of a callee; `targets` may be omitted for monomorphic
/// sites
#[derive(Deserialize)]
struct CalleeRecord {
    name: String,
    call_site: CallSiteId,
    node_count: usize,
    #[serde(default)]
    force_inline: bool,
    #[serde(default)]
    targets: Vec<InlineTarget>,
}

impl From<CalleeRecord> for CalleeDescriptor {
    fn from(record: CalleeRecord) -> Self {
        let mut callee = Self::new(record.name, record.call_site, record.node_count);
        callee.force_inline = record.force_inline;
        if !record.targets.is_empty() {
            callee.targets = record.targets;
        }
        callee
    }
}

impl CalleeDescriptor {
    /// Monomorphic callee whose single target shares the callee's name
    pub fn new(name: impl Into<String>, call_site: CallSiteId, node_count: usize) -> Self {
        let name = name.into();
        Self {
            targets: vec![InlineTarget::new(name.clone())],
            name,
            call_site,
            node_count,
            force_inline: false,
        }
    }

    pub fn forced(mut self) -> Self {
        self.force_inline = true;
        self
    }

    pub fn with_targets(mut self, targets: Vec<InlineTarget>) -> Self {
        self.targets = targets;
        self
    }

    pub fn is_polymorphic(&self) -> bool {
        self.targets.len() > 1
    }
}

/// A call site under evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSiteInvocation {
    pub callee: CalleeDescriptor,

    /// Fraction of caller-entry executions that reach this call, in `[0, 1]`
    pub probability: f64,

    /// Probability composed along the chain of enclosing inlined frames
    pub relevance: f64,

    /// Number of inlined frames between the root method and this call
    #[serde(default)]
    pub inlining_depth: usize,
}

impl CallSiteInvocation {
    /// Call site directly in the root method being compiled
    pub fn root(callee: CalleeDescriptor, probability: f64, relevance: f64) -> Self {
        debug_assert!((0.0..=1.0).contains(&probability), "probability out of range");
        debug_assert!(relevance >= 0.0, "negative relevance");
        Self {
            callee,
            probability,
            relevance,
            inlining_depth: 0,
        }
    }

    /// Call site found in the body of `parent`'s callee once it is inlined.
    ///
    /// Probabilities multiply along the chain; the inherited relevance is
    /// capped at 1 so hot parents cannot inflate their children.
    pub fn nested_in(
        parent: &Self,
        callee: CalleeDescriptor,
        local_probability: f64,
        local_relevance: f64,
    ) -> Self {
        debug_assert!((0.0..=1.0).contains(&local_probability), "probability out of range");
        debug_assert!(local_relevance >= 0.0, "negative relevance");
        Self {
            callee,
            probability: parent.probability * local_probability,
            relevance: parent.relevance.min(1.0) * local_relevance,
            inlining_depth: parent.inlining_depth + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_descriptor_is_monomorphic() {
        let callee = CalleeDescriptor::new("List.size", CallSiteId(3), 12);
        assert_eq!(callee.targets.len(), 1);
        assert_eq!(callee.targets[0].method, "List.size");
        assert!(!callee.is_polymorphic());
        assert!(!callee.force_inline);
    }

    #[test]
    fn test_nested_relevance_decays() {
        let outer = CallSiteInvocation::root(
            CalleeDescriptor::new("outer", CallSiteId(1), 40),
            0.5,
            0.8,
        );
        let inner = CallSiteInvocation::nested_in(
            &outer,
            CalleeDescriptor::new("inner", CallSiteId(2), 20),
            0.5,
            0.5,
        );

        assert_eq!(inner.inlining_depth, 1);
        assert!((inner.probability - 0.25).abs() < f64::EPSILON);
        assert!((inner.relevance - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_nested_relevance_caps_parent() {
        let outer = CallSiteInvocation::root(
            CalleeDescriptor::new("loop_body", CallSiteId(1), 40),
            1.0,
            8.0,
        );
        let inner = CallSiteInvocation::nested_in(
            &outer,
            CalleeDescriptor::new("leaf", CallSiteId(2), 5),
            1.0,
            0.3,
        );
        assert!((inner.relevance - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_deserialize_defaults() {
        let invocation: CallSiteInvocation = serde_json::from_str(
            r#"{
                "callee": {"name": "Map.get", "call_site": 7, "node_count": 64},
                "probability": 0.9,
                "relevance": 0.7
            }"#,
        )
        .unwrap();

        assert_eq!(invocation.callee.call_site, CallSiteId(7));
        assert_eq!(invocation.inlining_depth, 0);
        assert_eq!(invocation.callee.targets, vec![InlineTarget::new("Map.get")]);
        assert!(!invocation.callee.force_inline);
    }

    #[test]
    fn test_parsed_callee_matches_constructed() {
        let parsed: CalleeDescriptor =
            serde_json::from_str(r#"{"name": "Math.sqrt", "call_site": 1, "node_count": 5000}"#)
                .unwrap();
        assert_eq!(parsed, CalleeDescriptor::new("Math.sqrt", CallSiteId(1), 5000));

        let empty: CalleeDescriptor = serde_json::from_str(
            r#"{"name": "Math.sqrt", "call_site": 1, "node_count": 5000, "targets": []}"#,
        )
        .unwrap();
        assert_eq!(empty.targets, parsed.targets);
    }

    #[test]
    fn test_explicit_targets_are_kept() {
        let callee: CalleeDescriptor = serde_json::from_str(
            r#"{
                "name": "Shape.area",
                "call_site": 4,
                "node_count": 30,
                "force_inline": true,
                "targets": [{"method": "Circle.area"}, {"method": "Square.area"}]
            }"#,
        )
        .unwrap();

        assert!(callee.force_inline);
        assert!(callee.is_polymorphic());
        assert_eq!(callee.targets[1].method, "Square.area");
    }
}
