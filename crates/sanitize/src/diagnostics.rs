use dom::NodeId;

use crate::RuleError;

/// Receives rule failures. Purely observational.
pub trait Diagnostics {
    fn rule_failed(&mut self, rule: &'static str, node: NodeId, error: &RuleError);
}

/// Forwards failures to the `log` facade at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn rule_failed(&mut self, rule: &'static str, node: NodeId, error: &RuleError) {
        log::warn!(target: "sanitize", "rule {rule:?} failed on {node}: {error}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFailure {
    pub rule: &'static str,
    pub node: NodeId,
    pub message: String,
}

/// Keeps every failure for later inspection.
#[derive(Debug, Default)]
pub struct CollectDiagnostics {
    pub failures: Vec<RuleFailure>,
}

impl Diagnostics for CollectDiagnostics {
    fn rule_failed(&mut self, rule: &'static str, node: NodeId, error: &RuleError) {
        self.failures.push(RuleFailure {
            rule,
            node,
            message: error.to_string(),
        });
    }
}
