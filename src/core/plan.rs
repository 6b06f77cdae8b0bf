//! core::plan
//!
//! Execution planning over the declared dependency graph.
//!
//! # Architecture
//!
//! Planning is two phases:
//!
//! 1. **Closure**: an iterative depth-first walk from the requested monikers
//!    through `dependsOn`, failing on the first edge whose target is not
//!    registered.
//! 2. **Layering**: Kahn's algorithm with in-degrees counted over the closure
//!    only. Each round takes every remaining zero-in-degree module as one
//!    layer, sorted.
//!
//! # Invariants
//!
//! - Layers partition the planned set
//! - For every edge `a -> b` inside the set, `layer(b) < layer(a)`
//! - Modules on or behind a dependency cycle never appear in any layer
//!
//! # Example
//!
//! ```
//! use modgraph::core::contract::ModuleContract;
//! use modgraph::core::plan::plan;
//! use modgraph::core::registry::Registry;
//! use modgraph::core::types::Moniker;
//!
//! let a = Moniker::new("a").unwrap();
//! let b = Moniker::new("b").unwrap();
//! let c = Moniker::new("c").unwrap();
//!
//! let mut registry = Registry::new("v1", "/repo");
//! registry.add(ModuleContract::new(a.clone())).unwrap();
//! registry.add(ModuleContract::new(b.clone()).with_depends_on([a.clone()])).unwrap();
//! registry.add(ModuleContract::new(c.clone()).with_depends_on([a.clone(), b.clone()])).unwrap();
//!
//! let plan = plan(&registry, &[c.clone()]).unwrap();
//! assert_eq!(plan.layers, vec![vec![a.clone()], vec![b.clone()], vec![c.clone()]]);
//! assert_eq!(plan.execution_order, vec![a, b, c]);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use thiserror::Error;

use super::registry::Registry;
use super::types::Moniker;

/// Errors from planning.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("module '{0}' is not registered")]
    UnknownModule(Moniker),

    #[error("dependency target missing: {from}->{to}")]
    MissingDependency { from: Moniker, to: Moniker },

    #[error("circular dependency detected among: {}", join(.remaining))]
    CircularDependency { remaining: Vec<Moniker> },
}

fn join(monikers: &[Moniker]) -> String {
    monikers
        .iter()
        .map(Moniker::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Layered execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    /// Each layer may run in parallel once all earlier layers finished.
    pub layers: Vec<Vec<Moniker>>,
    /// Concatenation of `layers`.
    pub execution_order: Vec<Moniker>,
}

impl ExecutionPlan {
    fn from_layers(layers: Vec<Vec<Moniker>>) -> Self {
        let execution_order = layers.iter().flatten().cloned().collect();
        Self {
            layers,
            execution_order,
        }
    }

    /// Number of planned modules.
    pub fn len(&self) -> usize {
        self.execution_order.len()
    }

    /// Whether nothing was planned.
    pub fn is_empty(&self) -> bool {
        self.execution_order.is_empty()
    }

    /// Index of the layer containing `moniker`.
    pub fn layer_of(&self, moniker: &Moniker) -> Option<usize> {
        self.layers.iter().position(|layer| layer.contains(moniker))
    }

    /// Whether `moniker` is planned.
    pub fn contains(&self, moniker: &Moniker) -> bool {
        self.layer_of(moniker).is_some()
    }
}

/// Plan `requested` plus its transitive dependencies.
///
/// # Errors
///
/// - `UnknownModule` if a requested moniker is not registered
/// - `MissingDependency` naming the first dangling edge
/// - `CircularDependency` naming every module left unplaced
pub fn plan(registry: &Registry, requested: &[Moniker]) -> Result<ExecutionPlan, PlanError> {
    let closure = dependency_closure(registry, requested)?;
    layer(registry, &closure)
}

/// Plan every registered module.
pub fn plan_all(registry: &Registry) -> Result<ExecutionPlan, PlanError> {
    let all: Vec<Moniker> = registry.monikers().cloned().collect();
    plan(registry, &all)
}

/// Transitive dependency closure of `requested`, including itself.
pub fn dependency_closure(
    registry: &Registry,
    requested: &[Moniker],
) -> Result<BTreeSet<Moniker>, PlanError> {
    let mut visited = BTreeSet::new();
    let mut stack = Vec::new();

    for moniker in requested {
        if !registry.has(moniker.as_str()) {
            return Err(PlanError::UnknownModule(moniker.clone()));
        }
        if visited.insert(moniker.clone()) {
            stack.push(moniker.clone());
        }
    }

    while let Some(current) = stack.pop() {
        let Some(contract) = registry.get(current.as_str()) else {
            continue;
        };
        for dep in &contract.depends_on {
            if !registry.has(dep.as_str()) {
                return Err(PlanError::MissingDependency {
                    from: current.clone(),
                    to: dep.clone(),
                });
            }
            if visited.insert(dep.clone()) {
                stack.push(dep.clone());
            }
        }
    }

    Ok(visited)
}

/// Modules impacted by a change to `changed`: the changed modules and
/// everything that transitively depends on them.
pub fn affected_modules(
    registry: &Registry,
    changed: &[Moniker],
) -> Result<BTreeSet<Moniker>, PlanError> {
    let reverse = registry.reverse_dependency_graph();
    let mut affected = BTreeSet::new();
    let mut stack = Vec::new();

    for moniker in changed {
        if !registry.has(moniker.as_str()) {
            return Err(PlanError::UnknownModule(moniker.clone()));
        }
        if affected.insert(moniker.clone()) {
            stack.push(moniker.clone());
        }
    }

    while let Some(current) = stack.pop() {
        for dependent in reverse.get(&current).into_iter().flatten() {
            if affected.insert(dependent.clone()) {
                stack.push(dependent.clone());
            }
        }
    }

    Ok(affected)
}

/// Plan exactly the modules affected by `changed`.
///
/// Dependencies outside the affected set are assumed already built and do
/// not appear in the plan.
pub fn plan_affected(registry: &Registry, changed: &[Moniker]) -> Result<ExecutionPlan, PlanError> {
    let affected = affected_modules(registry, changed)?;
    layer(registry, &affected)
}

/// Kahn layering restricted to `set`; edges leaving the set are ignored.
fn layer(registry: &Registry, set: &BTreeSet<Moniker>) -> Result<ExecutionPlan, PlanError> {
    let mut in_degree: BTreeMap<&Moniker, usize> = BTreeMap::new();
    let mut dependents: BTreeMap<&Moniker, BTreeSet<&Moniker>> = BTreeMap::new();

    for moniker in set {
        let deps: BTreeSet<&Moniker> = registry
            .get(moniker.as_str())
            .map(|c| c.depends_on.iter().filter(|d| set.contains(*d)).collect())
            .unwrap_or_default();
        in_degree.insert(moniker, deps.len());
        for dep in deps {
            dependents.entry(dep).or_default().insert(moniker);
        }
    }

    let mut layers: Vec<Vec<Moniker>> = Vec::new();
    let mut remaining: BTreeSet<&Moniker> = set.iter().collect();

    while !remaining.is_empty() {
        // BTreeSet iteration keeps each layer sorted
        let ready: Vec<&Moniker> = remaining
            .iter()
            .copied()
            .filter(|m| in_degree.get(m).copied().unwrap_or(0) == 0)
            .collect();

        if ready.is_empty() {
            return Err(PlanError::CircularDependency {
                remaining: remaining.into_iter().cloned().collect(),
            });
        }

        for moniker in &ready {
            remaining.remove(*moniker);
            for dependent in dependents.get(*moniker).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(*dependent) {
                    *degree = degree.saturating_sub(1);
                }
            }
        }
        layers.push(ready.into_iter().cloned().collect());
    }

    Ok(ExecutionPlan::from_layers(layers))
}
