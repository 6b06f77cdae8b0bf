//! core::verify
//!
//! Structural verification of a loaded registry.
//!
//! # Passes
//!
//! - **Structure** (always, at load time)
//!   - At most one catch-all singleton
//!   - Every parent chain resolves (no dangling parents, no cycles)
//!
//! - **Dependencies** (opt-in)
//!   - Every `dependsOn` target is registered
//!   - Dependency cycles are left to the planner
//!
//! - **usedBy consistency** (opt-in, warnings only)
//!   - Every `usedBy` entry is registered and lists the module in its
//!     `dependsOn`
//!   - A module with a non-empty `usedBy` lists every registered module
//!     that depends on it; an empty `usedBy` is not checked
//!
//! # Invariants
//!
//! - Never mutates the registry
//! - Must be deterministic (errors in moniker order)

use serde::Serialize;
use thiserror::Error;

use super::registry::Registry;
use super::tree::{ParentTree, TreeError};
use super::types::Moniker;

/// Errors from verification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("multiple catch-all singletons: {}", join(.0))]
    MultipleCatchAll(Vec<Moniker>),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("dependency target '{to}' missing (declared by '{from}')")]
    MissingDependency { from: Moniker, to: Moniker },
}

fn join(monikers: &[Moniker]) -> String {
    monikers
        .iter()
        .map(Moniker::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result of a verification pass.
#[derive(Debug)]
pub struct VerifyResult {
    /// Whether verification passed
    pub ok: bool,
    /// Errors found during verification
    pub errors: Vec<VerifyError>,
}

impl VerifyResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            ok: true,
            errors: vec![],
        }
    }

    /// Create a failed result with errors.
    pub fn failure(errors: Vec<VerifyError>) -> Self {
        Self { ok: false, errors }
    }

    fn from_errors(errors: Vec<VerifyError>) -> Self {
        if errors.is_empty() {
            Self::success()
        } else {
            Self::failure(errors)
        }
    }

    /// Convert into a `Result`, keeping the first error.
    pub fn into_result(self) -> Result<(), VerifyError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// A `usedBy` entry that does not agree with the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UsedByWarning {
    /// The declared dependent is not registered.
    UnknownDependent { module: Moniker, dependent: Moniker },
    /// The declared dependent does not list the module in `dependsOn`.
    NotADependent { module: Moniker, dependent: Moniker },
    /// A registered module depends on the module but is missing from its
    /// non-empty `usedBy`.
    UndeclaredDependent { module: Moniker, dependent: Moniker },
}

impl std::fmt::Display for UsedByWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UsedByWarning::UnknownDependent { module, dependent } => write!(
                f,
                "'{module}' declares usedBy '{dependent}', which is not registered"
            ),
            UsedByWarning::NotADependent { module, dependent } => write!(
                f,
                "'{module}' declares usedBy '{dependent}', but '{dependent}' does not depend on it"
            ),
            UsedByWarning::UndeclaredDependent { module, dependent } => write!(
                f,
                "'{module}' is used by '{dependent}', which its usedBy list omits"
            ),
        }
    }
}

/// Verify the load-time structural invariants.
pub fn verify_structure(registry: &Registry) -> VerifyResult {
    let mut errors = Vec::new();

    let catch_all: Vec<Moniker> = registry
        .catch_all_modules()
        .into_iter()
        .map(|c| c.moniker.clone())
        .collect();
    if catch_all.len() > 1 {
        errors.push(VerifyError::MultipleCatchAll(catch_all));
    }

    let tree = ParentTree::from_registry(registry);
    errors.extend(tree.verify_all().into_iter().map(VerifyError::Tree));

    VerifyResult::from_errors(errors)
}

/// Verify that every `dependsOn` target is registered.
pub fn verify_dependencies(registry: &Registry) -> VerifyResult {
    let errors = registry
        .all()
        .flat_map(|contract| {
            contract
                .depends_on
                .iter()
                .filter(|dep| !registry.has(dep.as_str()))
                .map(|dep| VerifyError::MissingDependency {
                    from: contract.moniker.clone(),
                    to: dep.clone(),
                })
        })
        .collect();

    VerifyResult::from_errors(errors)
}

/// Check `usedBy` declarations against `dependsOn`.
///
/// Per module, declared entries are checked first, then the registered
/// dependents the declaration leaves out, each in moniker order.
pub fn verify_used_by(registry: &Registry) -> Vec<UsedByWarning> {
    let mut warnings = Vec::new();
    let reverse = registry.reverse_dependency_graph();

    for contract in registry.all() {
        for dependent in &contract.used_by {
            match registry.get(dependent.as_str()) {
                None => warnings.push(UsedByWarning::UnknownDependent {
                    module: contract.moniker.clone(),
                    dependent: dependent.clone(),
                }),
                Some(other) if !other.depends_on.contains(&contract.moniker) => {
                    warnings.push(UsedByWarning::NotADependent {
                        module: contract.moniker.clone(),
                        dependent: dependent.clone(),
                    })
                }
                Some(_) => {}
            }
        }

        if contract.used_by.is_empty() {
            continue;
        }
        let dependents = reverse.get(&contract.moniker).into_iter().flatten();
        for dependent in dependents.filter(|d| !contract.used_by.contains(*d)) {
            warnings.push(UsedByWarning::UndeclaredDependent {
                module: contract.moniker.clone(),
                dependent: dependent.clone(),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::contract::ModuleContract;

    fn m(name: &str) -> Moniker {
        Moniker::new(name).unwrap()
    }

    #[test]
    fn clean_registry_passes() {
        let mut registry = Registry::new("v1", "/repo");
        registry.add(ModuleContract::new(m("a"))).unwrap();
        registry
            .add(ModuleContract::new(m("b")).with_parent(m("a")))
            .unwrap();

        let result = verify_structure(&registry);
        assert!(result.ok);
        assert!(result.into_result().is_ok());
    }

    #[test]
    fn multiple_catch_all_names_all_offenders() {
        let mut registry = Registry::new("v1", "/repo");
        registry.add(ModuleContract::new(m("x")).as_catch_all()).unwrap();
        registry.add(ModuleContract::new(m("y")).as_catch_all()).unwrap();
        registry.add(ModuleContract::new(m("z"))).unwrap();

        let result = verify_structure(&registry);
        assert!(!result.ok);
        let err = result.into_result().unwrap_err();
        assert_eq!(err, VerifyError::MultipleCatchAll(vec![m("x"), m("y")]));
        assert_eq!(err.to_string(), "multiple catch-all singletons: x, y");
    }

    #[test]
    fn single_catch_all_allowed() {
        let mut registry = Registry::new("v1", "/repo");
        registry.add(ModuleContract::new(m("x")).as_catch_all()).unwrap();
        assert!(verify_structure(&registry).ok);
    }

    #[test]
    fn parent_problems_surface() {
        let mut registry = Registry::new("v1", "/repo");
        registry
            .add(ModuleContract::new(m("a")).with_parent(m("b")))
            .unwrap();
        registry
            .add(ModuleContract::new(m("b")).with_parent(m("a")))
            .unwrap();
        registry
            .add(ModuleContract::new(m("c")).with_parent(m("ghost")))
            .unwrap();

        let result = verify_structure(&registry);
        assert_eq!(result.errors.len(), 3);
        assert!(result
            .errors
            .iter()
            .any(|e| matches!(e, VerifyError::Tree(TreeError::MissingParent { .. }))));
    }

    #[test]
    fn missing_dependency_target() {
        let mut registry = Registry::new("v1", "/repo");
        registry
            .add(ModuleContract::new(m("a")).with_depends_on([m("ghost")]))
            .unwrap();

        let err = verify_dependencies(&registry).into_result().unwrap_err();
        assert_eq!(
            err,
            VerifyError::MissingDependency {
                from: m("a"),
                to: m("ghost"),
            }
        );
    }

    #[test]
    fn dependency_cycles_pass_dependency_verification() {
        let mut registry = Registry::new("v1", "/repo");
        registry
            .add(ModuleContract::new(m("x")).with_depends_on([m("y")]))
            .unwrap();
        registry
            .add(ModuleContract::new(m("y")).with_depends_on([m("x")]))
            .unwrap();
        assert!(verify_dependencies(&registry).ok);
    }

    #[test]
    fn used_by_consistency() {
        let mut registry = Registry::new("v1", "/repo");
        registry
            .add(ModuleContract::new(m("shared")).with_used_by([m("web"), m("api"), m("ghost")]))
            .unwrap();
        registry
            .add(ModuleContract::new(m("web")).with_depends_on([m("shared")]))
            .unwrap();
        registry.add(ModuleContract::new(m("api"))).unwrap();

        let warnings = verify_used_by(&registry);
        assert_eq!(
            warnings,
            vec![
                UsedByWarning::NotADependent {
                    module: m("shared"),
                    dependent: m("api"),
                },
                UsedByWarning::UnknownDependent {
                    module: m("shared"),
                    dependent: m("ghost"),
                },
            ]
        );
    }

    #[test]
    fn dependent_missing_from_used_by() {
        let mut registry = Registry::new("v1", "/repo");
        registry
            .add(ModuleContract::new(m("a")).with_depends_on([m("b")]))
            .unwrap();
        registry
            .add(ModuleContract::new(m("b")).with_used_by([m("a")]))
            .unwrap();
        registry
            .add(ModuleContract::new(m("c")).with_depends_on([m("b")]))
            .unwrap();
        registry
            .add(ModuleContract::new(m("d")).with_depends_on([m("e")]))
            .unwrap();
        registry.add(ModuleContract::new(m("e"))).unwrap();

        let warnings = verify_used_by(&registry);
        assert_eq!(
            warnings,
            vec![UsedByWarning::UndeclaredDependent {
                module: m("b"),
                dependent: m("c"),
            }]
        );
        assert_eq!(
            warnings[0].to_string(),
            "'b' is used by 'c', which its usedBy list omits"
        );
    }
}
