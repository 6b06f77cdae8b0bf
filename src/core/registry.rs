//! core::registry
//!
//! Moniker-indexed store of the module contracts of one workspace version.
//!
//! # Invariants
//!
//! - Monikers are unique
//! - Iteration is always in moniker order
//! - Contracts are never mutated once added
//!
//! Reference checks (parents, dependency targets, catch-all uniqueness) are
//! not enforced by `add`; they run as a separate pass in [`crate::core::verify`]
//! once every contract is in.
//!
//! # Example
//!
//! ```
//! use modgraph::core::contract::ModuleContract;
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
//! assert!(registry.has("a"));
//! assert_eq!(registry.dependency_graph()[&b], vec![a.clone()]);
//! assert_eq!(registry.reverse_dependency_graph()[&a], vec![b]);
//! assert!(registry.add(ModuleContract::new(a)).is_err());
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::contract::ModuleContract;
use super::paths::normalize_rel_path;
use super::types::{Fingerprint, Moniker};

/// Errors from registry operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate moniker '{0}'")]
    DuplicateMoniker(Moniker),
}

/// All module contracts of one workspace version.
#[derive(Debug, Clone)]
pub struct Registry {
    version: String,
    workspace_root: PathBuf,
    modules: BTreeMap<Moniker, ModuleContract>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new(version: impl Into<String>, workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            version: version.into(),
            workspace_root: workspace_root.into(),
            modules: BTreeMap::new(),
        }
    }

    /// The contract version this registry was loaded for.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The workspace root the contracts describe.
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Add a contract.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateMoniker` if the moniker is taken.
    pub fn add(&mut self, contract: ModuleContract) -> Result<(), RegistryError> {
        if self.modules.contains_key(&contract.moniker) {
            return Err(RegistryError::DuplicateMoniker(contract.moniker));
        }
        self.modules.insert(contract.moniker.clone(), contract);
        Ok(())
    }

    /// Look up a contract by moniker.
    pub fn get(&self, moniker: &str) -> Option<&ModuleContract> {
        self.modules.get(moniker)
    }

    /// Check whether a moniker is registered.
    pub fn has(&self, moniker: &str) -> bool {
        self.modules.contains_key(moniker)
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// All contracts in moniker order.
    pub fn all(&self) -> impl Iterator<Item = &ModuleContract> {
        self.modules.values()
    }

    /// All monikers in order.
    pub fn monikers(&self) -> impl Iterator<Item = &Moniker> {
        self.modules.keys()
    }

    /// Contracts of the given module type.
    pub fn filter_by_type(&self, module_type: &str) -> Vec<&ModuleContract> {
        self.all()
            .filter(|c| c.module_type == module_type)
            .collect()
    }

    /// Contracts whose source root is `root`, preferred first.
    ///
    /// Regular modules precede the catch-all singleton, each group in
    /// moniker order. `root` is normalized before comparison.
    pub fn contracts_with_root(&self, root: &str) -> Vec<&ModuleContract> {
        let root = normalize_rel_path(root);
        let (mut regular, catch_all): (Vec<_>, Vec<_>) = self
            .all()
            .filter(|c| c.source.root == root)
            .partition(|c| !c.source.is_catch_all_singleton);
        regular.extend(catch_all);
        regular
    }

    /// The preferred contract whose source root is `root`.
    ///
    /// See [`Registry::contracts_with_root`] for the preference order.
    pub fn find_by_root(&self, root: &str) -> Option<&ModuleContract> {
        self.contracts_with_root(root).into_iter().next()
    }

    /// Contracts that declare themselves the catch-all singleton.
    pub fn catch_all_modules(&self) -> Vec<&ModuleContract> {
        self.all()
            .filter(|c| c.source.is_catch_all_singleton)
            .collect()
    }

    /// Forward adjacency: each module to its declared dependencies.
    ///
    /// Every registered module has an entry, possibly empty.
    pub fn dependency_graph(&self) -> BTreeMap<Moniker, Vec<Moniker>> {
        self.all()
            .map(|c| (c.moniker.clone(), c.depends_on.clone()))
            .collect()
    }

    /// Reverse adjacency: each module to the modules that depend on it.
    ///
    /// Every registered module has an entry; dependency targets that are not
    /// registered get one too.
    pub fn reverse_dependency_graph(&self) -> BTreeMap<Moniker, Vec<Moniker>> {
        let mut reverse: BTreeMap<Moniker, Vec<Moniker>> = self
            .monikers()
            .map(|m| (m.clone(), Vec::new()))
            .collect();

        for contract in self.all() {
            for dep in &contract.depends_on {
                reverse
                    .entry(dep.clone())
                    .or_default()
                    .push(contract.moniker.clone());
            }
        }
        reverse
    }

    /// Deterministic hash over every contract.
    pub fn fingerprint(&self) -> Fingerprint {
        let entries: Vec<(String, String)> = self
            .all()
            .map(|c| {
                (
                    c.moniker.to_string(),
                    serde_json::to_string(c).unwrap_or_default(),
                )
            })
            .collect();
        Fingerprint::compute(&entries)
    }
}
