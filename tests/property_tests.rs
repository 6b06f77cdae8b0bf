//! Property-based tests for the graph algorithms.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated registries and file sets.

use std::collections::BTreeSet;

use proptest::prelude::*;

use modgraph::core::contract::ModuleContract;
use modgraph::core::ownership::OwnershipResolver;
use modgraph::core::plan::{dependency_closure, plan, plan_all, PlanError};
use modgraph::core::reconcile::{compare, DiscrepancyStatus};
use modgraph::core::registry::Registry;
use modgraph::core::tree::{ParentTree, TreeError};
use modgraph::core::types::{Moniker, Parent};

fn m(name: &str) -> Moniker {
    Moniker::new(name).unwrap()
}

fn name(i: usize) -> String {
    format!("mod-{}", i)
}

/// Parent tree: module `i` is top-level or picks a parent among `0..i`.
fn tree_strategy() -> impl Strategy<Value = Vec<Option<usize>>> {
    (1usize..15).prop_flat_map(|n| {
        let parents: Vec<BoxedStrategy<Option<usize>>> = (0..n)
            .map(|i| {
                if i == 0 {
                    Just(None).boxed()
                } else {
                    prop::option::of(0..i).boxed()
                }
            })
            .collect();
        parents
    })
}

fn build_tree(parents: &[Option<usize>]) -> Registry {
    let mut registry = Registry::new("v1", "/repo");
    for (i, parent) in parents.iter().enumerate() {
        let mut contract = ModuleContract::new(m(&name(i)));
        if let Some(p) = parent {
            contract = contract.with_parent(m(&name(*p)));
        }
        registry.add(contract).unwrap();
    }
    registry
}

/// Dependency DAG: module `i` depends on a subset of `0..i`.
fn dag_strategy() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1usize..15).prop_flat_map(|n| {
        let deps: Vec<BoxedStrategy<Vec<usize>>> = (0..n)
            .map(|i| {
                prop::collection::vec(any::<bool>(), i)
                    .prop_map(|picks| {
                        picks
                            .into_iter()
                            .enumerate()
                            .filter_map(|(j, picked)| picked.then_some(j))
                            .collect()
                    })
                    .boxed()
            })
            .collect();
        deps
    })
}

fn build_dag(deps: &[Vec<usize>]) -> Registry {
    let mut registry = Registry::new("v1", "/repo");
    for (i, targets) in deps.iter().enumerate() {
        registry
            .add(
                ModuleContract::new(m(&name(i)))
                    .with_depends_on(targets.iter().map(|j| m(&name(*j)))),
            )
            .unwrap();
    }
    registry
}

proptest! {
    /// Parent chains start at the root sentinel and end at the module.
    #[test]
    fn parent_chain_root_to_module(parents in tree_strategy()) {
        let registry = build_tree(&parents);
        let tree = ParentTree::from_registry(&registry);

        for moniker in registry.monikers() {
            let chain = tree.parent_chain(moniker).unwrap();
            prop_assert_eq!(chain.nodes().first(), Some(&Parent::Root));
            prop_assert_eq!(chain.module(), Some(moniker));
            prop_assert_eq!(tree.depth(moniker).unwrap(), chain.len());
        }
    }

    /// Closing any chain into a loop is reported, naming a loop member.
    #[test]
    fn parent_cycle_detected(parents in tree_strategy(), pick in any::<prop::sample::Index>()) {
        prop_assume!(parents.len() >= 2);

        // Re-parent the chain's top-level ancestor under the picked module
        let mut parents = parents;
        let leaf = pick.index(parents.len());
        let mut top = leaf;
        let mut cycle = vec![leaf];
        while let Some(p) = parents[top] {
            top = p;
            cycle.push(p);
        }
        prop_assume!(top != leaf);
        parents[top] = Some(leaf);

        let registry = build_tree(&parents);
        let tree = ParentTree::from_registry(&registry);
        let members: BTreeSet<Moniker> = cycle.iter().map(|i| m(&name(*i))).collect();

        match tree.parent_chain(&m(&name(leaf))) {
            Err(TreeError::CircularParent { moniker }) => {
                prop_assert!(members.contains(&moniker));
            }
            other => prop_assert!(false, "expected cycle, got {:?}", other),
        }
        prop_assert!(tree.find_cycle().is_some());
    }

    /// Layers partition the closure and every dependency comes earlier.
    #[test]
    fn plan_layers_respect_edges(deps in dag_strategy(), pick in any::<prop::sample::Index>()) {
        let registry = build_dag(&deps);
        let requested = m(&name(pick.index(deps.len())));

        let plan = plan(&registry, &[requested.clone()]).unwrap();
        let closure = dependency_closure(&registry, &[requested]).unwrap();

        let planned: BTreeSet<Moniker> = plan.execution_order.iter().cloned().collect();
        prop_assert_eq!(planned.len(), plan.execution_order.len());
        prop_assert_eq!(&planned, &closure);

        for moniker in &closure {
            let layer = plan.layer_of(moniker).unwrap();
            for dep in &registry.get(moniker.as_str()).unwrap().depends_on {
                prop_assert!(plan.layer_of(dep).unwrap() < layer);
            }
        }

        for layer in &plan.layers {
            let mut sorted = layer.clone();
            sorted.sort();
            prop_assert_eq!(&sorted, layer);
        }
    }

    /// A two-module cycle is reported with both members and never layered.
    #[test]
    fn dependency_cycle_reported(deps in dag_strategy()) {
        let mut registry = build_dag(&deps);
        registry
            .add(ModuleContract::new(m("cyc-x")).with_depends_on([m("cyc-y")]))
            .unwrap();
        registry
            .add(ModuleContract::new(m("cyc-y")).with_depends_on([m("cyc-x")]))
            .unwrap();

        match plan_all(&registry) {
            Err(PlanError::CircularDependency { remaining }) => {
                prop_assert!(remaining.contains(&m("cyc-x")));
                prop_assert!(remaining.contains(&m("cyc-y")));
            }
            other => prop_assert!(false, "expected cycle, got {:?}", other),
        }
    }
}

/// Paths drawn from a small vocabulary so overlaps actually happen.
fn file_strategy() -> impl Strategy<Value = Vec<String>> {
    let segment = prop::sample::select(vec!["sales", "orders", "shared", "docs", "api", "x"]);
    let leaf = prop::sample::select(vec!["a.go", "b_test.go", "README.md", "c.proto"]);
    let path = (prop::collection::vec(segment, 0..4), leaf).prop_map(|(dirs, leaf)| {
        let mut parts: Vec<&str> = dirs;
        parts.push(leaf);
        parts.join("/")
    });
    prop::collection::vec(path, 0..40)
}

fn ownership_registry(exclude_children: bool) -> Registry {
    let mut registry = Registry::new("v1", "/repo");
    registry
        .add(
            ModuleContract::new(m("sales"))
                .with_root("sales")
                .with_includes(["**/*"])
                .with_exclude_children(exclude_children),
        )
        .unwrap();
    registry
        .add(
            ModuleContract::new(m("sales-orders"))
                .with_parent(m("sales"))
                .with_root("sales/orders")
                .with_includes(["**/*.go"])
                .with_excludes(["**/*_test.go"]),
        )
        .unwrap();
    registry
        .add(ModuleContract::new(m("protos")).with_includes(["**/*.proto"]))
        .unwrap();
    registry
        .add(ModuleContract::new(m("docs")).with_root("docs").with_includes(["*.md"]))
        .unwrap();
    registry
}

proptest! {
    /// Every input file is classified exactly once.
    #[test]
    fn ownership_partitions_input(files in file_strategy(), exclude_children in any::<bool>()) {
        let registry = ownership_registry(exclude_children);
        let report = OwnershipResolver::new(&registry).unwrap().resolve(&files);

        let input: BTreeSet<&str> = files.iter().map(String::as_str).collect();
        prop_assert_eq!(report.counts.total, input.len());
        prop_assert_eq!(
            report.counts.single_owned + report.counts.multi_owned + report.counts.orphaned,
            input.len()
        );

        let orphans: BTreeSet<&str> = report.orphans.iter().map(String::as_str).collect();
        let multi: BTreeSet<&str> = report.multi_owned.iter().map(String::as_str).collect();
        let single: BTreeSet<&str> = report
            .files
            .iter()
            .filter(|f| f.owning_modules.len() == 1)
            .map(|f| f.path.as_str())
            .collect();

        prop_assert!(orphans.is_disjoint(&multi));
        prop_assert!(orphans.is_disjoint(&single));
        prop_assert!(multi.is_disjoint(&single));
        let union: BTreeSet<&str> = orphans.union(&multi).chain(single.iter()).copied().collect();
        prop_assert_eq!(union, input);
    }

    /// A parent with excludeChildrenOwnedSource never keeps a file its
    /// descendant also claims.
    #[test]
    fn descendant_claim_removes_parent(files in file_strategy()) {
        let registry = ownership_registry(true);
        let resolver = OwnershipResolver::new(&registry).unwrap();

        for file in &files {
            let candidates = resolver.candidates(file);
            if candidates.contains(&m("sales")) && candidates.contains(&m("sales-orders")) {
                let owners = resolver.owners_of(file);
                prop_assert!(!owners.contains(&m("sales")));
                prop_assert!(owners.contains(&m("sales-orders")));
            }
        }
    }

    /// Identical lists match; dropping one manifest entry is MISSING exactly it.
    #[test]
    fn reconcile_drop_one(
        deps in prop::collection::btree_set("[a-z]{1,8}", 1..10),
        pick in any::<prop::sample::Index>(),
    ) {
        let declared: Vec<String> = deps.into_iter().collect();

        let (missing, extra, status) = compare(&declared, &declared);
        prop_assert!(missing.is_empty() && extra.is_empty());
        prop_assert_eq!(status, DiscrepancyStatus::Match);

        let mut actual = declared.clone();
        let dropped = actual.remove(pick.index(actual.len()));
        let (missing, extra, status) = compare(&declared, &actual);
        prop_assert_eq!(missing, vec![dropped]);
        prop_assert!(extra.is_empty());
        prop_assert_eq!(status, DiscrepancyStatus::Missing);
    }
}
