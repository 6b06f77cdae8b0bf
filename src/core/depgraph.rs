//! core::depgraph
//!
//! The declared dependency graph as a reportable value.
//!
//! # Architecture
//!
//! Built in one pass over the registry: forward adjacency is each module's
//! `dependsOn` list as declared (duplicates kept), reverse adjacency is
//! accumulated by appending the module to each target's dependents.
//!
//! The summary statistics are for reporting only. Nothing downstream trusts
//! them for correctness.
//!
//! # Example
//!
//! ```
//! use modgraph::core::contract::ModuleContract;
//! use modgraph::core::depgraph::DependencyGraph;
//! use modgraph::core::registry::Registry;
//! use modgraph::core::types::Moniker;
//!
//! let a = Moniker::new("a").unwrap();
//! let b = Moniker::new("b").unwrap();
//!
//! let mut registry = Registry::new("v1", "/repo");
//! registry.add(ModuleContract::new(a.clone())).unwrap();
//! registry.add(ModuleContract::new(b.clone()).with_depends_on([a.clone()])).unwrap();
//!
//! let graph = DependencyGraph::build(&registry);
//! assert_eq!(graph.stats.edge_count, 1);
//! assert_eq!(graph.dependents_of(&a), &[b]);
//! ```

use std::collections::BTreeMap;

use serde::Serialize;

use super::registry::Registry;
use super::types::Moniker;

/// One declared edge: `from` depends on `to`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DependencyEdge {
    pub from: Moniker,
    pub to: Moniker,
}

/// Summary statistics over the declared graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub module_count: usize,
    pub edge_count: usize,
    /// Modules with no outgoing dependencies.
    pub roots: usize,
    /// Modules nobody depends on.
    pub leaves: usize,
    pub max_fan_in: usize,
    pub max_fan_out: usize,
}

/// Forward and reverse adjacency of the declared graph.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyGraph {
    /// Registered modules, sorted.
    pub modules: Vec<Moniker>,
    pub forward: BTreeMap<Moniker, Vec<Moniker>>,
    pub reverse: BTreeMap<Moniker, Vec<Moniker>>,
    /// Every declared edge, in module order then declaration order.
    pub edges: Vec<DependencyEdge>,
    pub stats: GraphStats,
}

impl DependencyGraph {
    /// Build the graph from a registry.
    pub fn build(registry: &Registry) -> Self {
        let modules: Vec<Moniker> = registry.monikers().cloned().collect();
        let forward = registry.dependency_graph();
        let reverse = registry.reverse_dependency_graph();

        let edges: Vec<DependencyEdge> = forward
            .iter()
            .flat_map(|(from, deps)| {
                deps.iter().map(move |to| DependencyEdge {
                    from: from.clone(),
                    to: to.clone(),
                })
            })
            .collect();

        let fan_out = |m: &Moniker| forward.get(m).map_or(0, Vec::len);
        let fan_in = |m: &Moniker| reverse.get(m).map_or(0, Vec::len);

        let stats = GraphStats {
            module_count: modules.len(),
            edge_count: edges.len(),
            roots: modules.iter().filter(|m| fan_out(m) == 0).count(),
            leaves: modules.iter().filter(|m| fan_in(m) == 0).count(),
            max_fan_in: modules.iter().map(fan_in).max().unwrap_or(0),
            max_fan_out: modules.iter().map(fan_out).max().unwrap_or(0),
        };

        Self {
            modules,
            forward,
            reverse,
            edges,
            stats,
        }
    }

    /// Declared dependencies of a module.
    pub fn dependencies_of(&self, moniker: &Moniker) -> &[Moniker] {
        self.forward.get(moniker).map(Vec::as_slice).unwrap_or_default()
    }

    /// Modules that declare a dependency on `moniker`.
    pub fn dependents_of(&self, moniker: &Moniker) -> &[Moniker] {
        self.reverse.get(moniker).map(Vec::as_slice).unwrap_or_default()
    }

    /// Edges whose target is not a registered module.
    pub fn dangling_edges(&self) -> Vec<&DependencyEdge> {
        self.edges
            .iter()
            .filter(|e| self.modules.binary_search(&e.to).is_err())
            .collect()
    }
}
