//! engine::health
//!
//! Health report for a loaded workspace.
//!
//! # Architecture
//!
//! [`check`] runs the opt-in verification passes that loading does not
//! enforce and collects their findings as issues:
//!
//! - Missing dependency targets (blocking)
//! - Dependency cycles (blocking)
//! - `usedBy` entries that disagree with `dependsOn` (warning)
//!
//! Issues have stable, deterministic IDs derived from their evidence, so the
//! same problem has the same ID across runs.
//!
//! # Example
//!
//! ```
//! use modgraph::engine::health::{Issue, Severity};
//!
//! let issue = Issue::new("dependency-cycle", Severity::Blocking, "cycle among: x, y")
//!     .with_key("x,y");
//!
//! assert!(issue.is_blocking());
//! assert!(issue.id.as_str().starts_with("dependency-cycle:"));
//! ```

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::core::plan::{plan_all, PlanError};
use crate::core::registry::Registry;
use crate::core::types::Moniker;
use crate::core::verify::{verify_dependencies, verify_used_by};

/// Severity of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Planning or reconciliation cannot be trusted until fixed.
    Blocking,
    /// Worth fixing, but nothing downstream depends on it.
    Warning,
}

impl Severity {
    /// Check if this severity blocks.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Severity::Blocking)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Blocking => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A stable, deterministic issue identifier.
///
/// Formatted as `type:hash(key)` where the hash is a truncated SHA-256 of
/// the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct IssueId(String);

impl IssueId {
    /// Create an issue ID from a type and key.
    pub fn new(issue_type: &str, key: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        let hash = hasher.finalize();
        Self(format!("{}:{}", issue_type, hex::encode(&hash[..4])))
    }

    /// Get the string representation of the ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IssueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub id: IssueId,
    #[serde(skip)]
    issue_type: String,
    pub severity: Severity,
    pub message: String,
}

impl Issue {
    /// Create an issue whose ID is just its type.
    pub fn new(issue_type: &str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            id: IssueId(issue_type.to_string()),
            issue_type: issue_type.to_string(),
            severity,
            message: message.into(),
        }
    }

    /// Derive the ID from an evidence key.
    pub fn with_key(mut self, key: &str) -> Self {
        self.id = IssueId::new(&self.issue_type, key);
        self
    }

    /// Check if this is a blocking issue.
    pub fn is_blocking(&self) -> bool {
        self.severity.is_blocking()
    }
}

/// Collected issues of one check.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthReport {
    pub issues: Vec<Issue>,
}

impl HealthReport {
    /// Whether no issues were found.
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }

    /// Whether any issue blocks.
    pub fn has_blocking(&self) -> bool {
        self.issues.iter().any(Issue::is_blocking)
    }

    /// Blocking issues.
    pub fn blocking(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.is_blocking())
    }

    /// Non-blocking issues.
    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| !i.is_blocking())
    }
}

/// Run the opt-in verification passes over a registry.
pub fn check(registry: &Registry) -> HealthReport {
    let mut issues = Vec::new();

    let deps = verify_dependencies(registry);
    for err in &deps.errors {
        issues.push(
            Issue::new("missing-dependency", Severity::Blocking, err.to_string())
                .with_key(&err.to_string()),
        );
    }

    // Dangling edges already fail planning; only look for cycles once they
    // are gone.
    if deps.ok {
        if let Err(err) = plan_all(registry) {
            if let PlanError::CircularDependency { remaining } = &err {
                let key = remaining
                    .iter()
                    .map(Moniker::as_str)
                    .collect::<Vec<_>>()
                    .join(",");
                issues.push(
                    Issue::new("dependency-cycle", Severity::Blocking, err.to_string())
                        .with_key(&key),
                );
            }
        }
    }

    for warning in verify_used_by(registry) {
        let message = warning.to_string();
        issues.push(Issue::new("used-by-mismatch", Severity::Warning, &message).with_key(&message));
    }

    HealthReport { issues }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::contract::ModuleContract;

    fn m(name: &str) -> Moniker {
        Moniker::new(name).unwrap()
    }

    #[test]
    fn issue_ids_are_stable() {
        let a = Issue::new("dependency-cycle", Severity::Blocking, "one").with_key("x,y");
        let b = Issue::new("dependency-cycle", Severity::Blocking, "two").with_key("x,y");
        let c = Issue::new("dependency-cycle", Severity::Blocking, "one").with_key("x,z");
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!(a.id.as_str().len(), "dependency-cycle:".len() + 8);
    }

    #[test]
    fn clean_registry_is_healthy() {
        let mut registry = Registry::new("v1", "/repo");
        registry.add(ModuleContract::new(m("a"))).unwrap();
        registry
            .add(ModuleContract::new(m("b")).with_depends_on([m("a")]))
            .unwrap();
        let report = check(&registry);
        assert!(report.is_healthy());
        assert!(!report.has_blocking());
    }

    #[test]
    fn reports_cycle() {
        let mut registry = Registry::new("v1", "/repo");
        registry
            .add(ModuleContract::new(m("x")).with_depends_on([m("y")]))
            .unwrap();
        registry
            .add(ModuleContract::new(m("y")).with_depends_on([m("x")]))
            .unwrap();

        let report = check(&registry);
        assert!(report.has_blocking());
        let issue = report.blocking().next().unwrap();
        assert!(issue.message.contains('x') && issue.message.contains('y'));
    }

    #[test]
    fn reports_missing_dependency_and_used_by() {
        let mut registry = Registry::new("v1", "/repo");
        registry
            .add(
                ModuleContract::new(m("a"))
                    .with_depends_on([m("ghost")])
                    .with_used_by([m("nobody")]),
            )
            .unwrap();

        let report = check(&registry);
        assert_eq!(report.blocking().count(), 1);
        assert_eq!(report.warnings().count(), 1);
    }
}
