//! core::tree
//!
//! Parent tree representation and parent-chain resolution.
//!
//! # Architecture
//!
//! The parent tree is derived from the `parent` field of every contract:
//! - Nodes are registered modules
//! - Edges point from child to parent (stored as a parent pointer)
//! - The synthetic root (`.`) is the parent of every top-level module
//!
//! # Invariants
//!
//! - Every walk is iterative and carries its own visited set, so a cyclic
//!   or dangling tree produces an error instead of looping
//! - A resolved chain starts at the root sentinel and ends at the module

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use serde::Serialize;
use thiserror::Error;

use super::registry::Registry;
use super::types::{Moniker, Parent};

/// Errors from parent-chain resolution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("parent module '{parent}' missing (referenced by '{child}')")]
    MissingParent { parent: Moniker, child: Moniker },

    #[error("circular parent chain detected at module '{moniker}'")]
    CircularParent { moniker: Moniker },

    #[error("module '{0}' is not registered")]
    UnknownModule(String),
}

/// A resolved parent chain, root sentinel first and the module last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParentChain(Vec<Parent>);

impl ParentChain {
    /// The chain nodes, root first.
    pub fn nodes(&self) -> &[Parent] {
        &self.0
    }

    /// Number of nodes, including the root sentinel.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a resolved chain; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The module the chain was resolved for.
    pub fn module(&self) -> Option<&Moniker> {
        self.0.last().and_then(Parent::moniker)
    }

    /// Chain as strings, e.g. `[".", "sales", "sales-orders"]`.
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|p| p.as_str().to_string()).collect()
    }
}

impl std::fmt::Display for ParentChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_strings().join(" > "))
    }
}

/// The parent tree derived from a registry.
///
/// # Example
///
/// ```
/// use modgraph::core::contract::ModuleContract;
/// use modgraph::core::registry::Registry;
/// use modgraph::core::tree::ParentTree;
/// use modgraph::core::types::Moniker;
///
/// let sales = Moniker::new("sales").unwrap();
/// let orders = Moniker::new("sales-orders").unwrap();
///
/// let mut registry = Registry::new("v1", "/repo");
/// registry.add(ModuleContract::new(sales.clone())).unwrap();
/// registry.add(ModuleContract::new(orders.clone()).with_parent(sales.clone())).unwrap();
///
/// let tree = ParentTree::from_registry(&registry);
/// let chain = tree.parent_chain(&orders).unwrap();
/// assert_eq!(chain.to_strings(), vec![".", "sales", "sales-orders"]);
/// assert_eq!(tree.depth(&orders).unwrap(), 3);
/// assert!(tree.is_descendant(&orders, &sales));
/// ```
#[derive(Debug, Default, Clone)]
pub struct ParentTree {
    /// Parent pointer for each registered module
    parents: HashMap<Moniker, Parent>,
    /// Children sets (derived from parents); top-level modules are under `None`
    children: HashMap<Option<Moniker>, BTreeSet<Moniker>>,
}

impl ParentTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the tree from every contract in a registry.
    pub fn from_registry(registry: &Registry) -> Self {
        let mut tree = Self::new();
        for contract in registry.all() {
            tree.insert(contract.moniker.clone(), contract.parent.clone());
        }
        tree
    }

    /// Record a module and its parent.
    pub fn insert(&mut self, module: Moniker, parent: Parent) {
        self.children
            .entry(parent.moniker().cloned())
            .or_default()
            .insert(module.clone());
        self.parents.insert(module, parent);
    }

    /// The parent of a module, if the module is known.
    pub fn parent(&self, module: &Moniker) -> Option<&Parent> {
        self.parents.get(module)
    }

    /// Direct children of a module.
    pub fn children(&self, module: &Moniker) -> Option<&BTreeSet<Moniker>> {
        self.children.get(&Some(module.clone()))
    }

    /// Modules whose parent is the root sentinel.
    pub fn top_level(&self) -> Vec<&Moniker> {
        self.children
            .get(&None)
            .map(|set| set.iter().collect())
            .unwrap_or_default()
    }

    /// Resolve the chain from the root sentinel down to `module`.
    ///
    /// # Errors
    ///
    /// - `TreeError::UnknownModule` if `module` is not in the tree
    /// - `TreeError::MissingParent` if an ancestor references an unknown parent
    /// - `TreeError::CircularParent` if the walk revisits a module
    pub fn parent_chain(&self, module: &Moniker) -> Result<ParentChain, TreeError> {
        if !self.parents.contains_key(module) {
            return Err(TreeError::UnknownModule(module.to_string()));
        }

        let mut visited: HashSet<&Moniker> = HashSet::new();
        let mut chain: VecDeque<Parent> = VecDeque::new();
        let mut current = module;

        loop {
            if !visited.insert(current) {
                return Err(TreeError::CircularParent {
                    moniker: current.clone(),
                });
            }
            chain.push_front(Parent::Module(current.clone()));

            match self.parents.get(current) {
                Some(Parent::Root) => {
                    chain.push_front(Parent::Root);
                    break;
                }
                Some(Parent::Module(parent)) => {
                    if !self.parents.contains_key(parent) {
                        return Err(TreeError::MissingParent {
                            parent: parent.clone(),
                            child: current.clone(),
                        });
                    }
                    current = parent;
                }
                None => return Err(TreeError::UnknownModule(current.to_string())),
            }
        }

        Ok(ParentChain(chain.into()))
    }

    /// Depth of a module: the length of its parent chain.
    pub fn depth(&self, module: &Moniker) -> Result<usize, TreeError> {
        self.parent_chain(module).map(|chain| chain.len())
    }

    /// Resolve every module's chain, collecting all failures.
    ///
    /// Errors are reported in moniker order, one per failing module.
    pub fn verify_all(&self) -> Vec<TreeError> {
        let mut modules: Vec<&Moniker> = self.parents.keys().collect();
        modules.sort();
        modules
            .into_iter()
            .filter_map(|m| self.parent_chain(m).err())
            .collect()
    }

    /// Check if the tree contains a parent cycle.
    ///
    /// Returns `Some(module)` for a module on the first cycle found.
    pub fn find_cycle(&self) -> Option<Moniker> {
        self.verify_all().into_iter().find_map(|e| match e {
            TreeError::CircularParent { moniker } => Some(moniker),
            _ => None,
        })
    }

    /// Ancestors of a module, from its parent up to the top-level module.
    ///
    /// Stops silently at a missing parent or a revisited module.
    pub fn ancestors(&self, module: &Moniker) -> Vec<Moniker> {
        let mut result = Vec::new();
        let mut seen: HashSet<&Moniker> = HashSet::from([module]);
        let mut current = self.parents.get(module).and_then(Parent::moniker);

        while let Some(parent) = current {
            if !seen.insert(parent) || !self.parents.contains_key(parent) {
                break;
            }
            result.push(parent.clone());
            current = self.parents.get(parent).and_then(Parent::moniker);
        }

        result
    }

    /// All descendants of a module (children, grandchildren, etc.).
    pub fn descendants(&self, module: &Moniker) -> BTreeSet<Moniker> {
        let mut result = BTreeSet::new();
        let mut queue = VecDeque::new();

        if let Some(children) = self.children(module) {
            queue.extend(children.iter().cloned());
        }

        while let Some(current) = queue.pop_front() {
            if current != *module && result.insert(current.clone()) {
                if let Some(children) = self.children(&current) {
                    queue.extend(children.iter().cloned());
                }
            }
        }

        result
    }

    /// Whether `candidate` is a strict descendant of `ancestor`.
    pub fn is_descendant(&self, candidate: &Moniker, ancestor: &Moniker) -> bool {
        candidate != ancestor && self.ancestors(candidate).iter().any(|a| a == ancestor)
    }
}
