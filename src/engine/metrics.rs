//! Expansion run metrics.
//!
//! A small set of counters used to observe and debug what one top-level
//! invocation did. Collection is cheap; the per-application trace is opt-in
//! (`Options::collect_trace`) because it allocates per rule call.

use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExpansionMetrics {
    /// Wall time of the whole top-level invocation.
    pub total: Duration,
    /// Number of rule applications (invocations substituted).
    pub rewrites: usize,
    /// Deepest nesting the expander reached.
    pub max_depth: usize,
    /// Applications per rule id.
    pub per_rule: BTreeMap<String, usize>,
    /// Whether the output was wrapped in an early-exit guard.
    pub guarded: bool,
    /// Rule applications in the order they happened, with their depth.
    /// Empty unless tracing was requested.
    pub trace: Vec<(String, usize)>,
}

impl ExpansionMetrics {
    pub(crate) fn record(&mut self, rule: &str, depth: usize, keep_trace: bool) {
        self.rewrites += 1;
        *self.per_rule.entry(rule.to_string()).or_default() += 1;
        if keep_trace {
            self.trace.push((rule.to_string(), depth));
        }
    }

    pub(crate) fn reached(&mut self, depth: usize) {
        self.max_depth = self.max_depth.max(depth);
    }

    pub fn applications_of(&self, rule: &str) -> usize {
        self.per_rule.get(rule).copied().unwrap_or(0)
    }
}
