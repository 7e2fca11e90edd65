//! Reporting for the inlining phase: named debug counters and a telemetry
//! sink that keeps per-reason statistics and a bounded decision history.

pub mod counters;
pub mod inlining;

pub use counters::DebugCounters;
pub use inlining::{InliningMetrics, InliningStats, ReasonStats};
