//! core::contract
//!
//! Module contracts: the declarative ownership records a workspace is built
//! from.
//!
//! # Modules
//!
//! - [`schema`] - Strict on-disk record and default application
//! - [`loader`] - Directory scan that turns contract files into a registry
//!
//! # Structural vs Informational
//!
//! - **Structural**: moniker, parent, source patterns, dependsOn (drive the
//!   tree, ownership and the dependency graph)
//! - **Informational**: name, description, type, usedBy, versioning,
//!   changelogPath (reported, never used for correctness)
//!
//! # Example
//!
//! ```
//! use modgraph::core::contract::ModuleContract;
//! use modgraph::core::types::Moniker;
//!
//! let contract = ModuleContract::new(Moniker::new("shared").unwrap())
//!     .with_root("libs/shared")
//!     .with_includes(["**/*.go"]);
//!
//! assert_eq!(contract.module_type, "no-module-type");
//! assert_eq!(contract.changelog_path, "libs/shared/CHANGELOG.md");
//! assert!(contract.source.exclude_children_owned_source);
//! ```

pub mod loader;
pub mod schema;

pub use loader::{
    load_contract, load_registry, load_registry_from, LoadError, DEFAULT_CONTRACTS_DIR,
};
pub use schema::{parse_contract, RawContract, SchemaError};

use serde::Serialize;

use crate::core::paths::normalize_rel_path;
use crate::core::types::{Moniker, Parent};

/// Module type used when a contract does not declare one.
pub const NO_MODULE_TYPE: &str = "no-module-type";

/// Version scheme used when a contract does not declare one.
pub const DEFAULT_VERSION_SCHEME: &str = "semver";

/// Extension of contract files (without the dot).
pub const CONTRACT_EXTENSION: &str = "toml";

/// Include pattern given to the catch-all singleton when it declares none.
pub const CATCH_ALL_INCLUDE: &str = "**/*";

/// A fully-defaulted module contract.
///
/// Contracts are immutable once inserted into a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleContract {
    /// Unique identifier.
    pub moniker: Moniker,
    /// Human-readable name (defaults to the moniker).
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Module type (defaults to [`NO_MODULE_TYPE`]).
    #[serde(rename = "type")]
    pub module_type: String,
    /// Owning module or the root sentinel.
    pub parent: Parent,
    /// Source ownership declaration.
    pub source: Source,
    /// Declared dependencies.
    pub depends_on: Vec<Moniker>,
    /// Declared dependents (informational).
    pub used_by: Vec<Moniker>,
    /// Versioning policy.
    pub versioning: Versioning,
    /// Changelog location, relative to the workspace root.
    pub changelog_path: String,
}

/// Which files a module claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    /// Normalized path prefix (`.` for the workspace root).
    pub root: String,
    /// Glob patterns relative to `root`; empty claims nothing.
    pub includes: Vec<String>,
    /// Glob patterns relative to `root`; exclude wins over include.
    pub excludes: Vec<String>,
    /// Yield files also claimed by a descendant module.
    pub exclude_children_owned_source: bool,
    /// Claim whatever no other module owns.
    pub is_catch_all_singleton: bool,
}

/// Versioning policy of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Versioning {
    pub version_scheme: String,
}

impl Default for Versioning {
    fn default() -> Self {
        Self {
            version_scheme: DEFAULT_VERSION_SCHEME.to_string(),
        }
    }
}

impl ModuleContract {
    /// Create a contract with every default applied and the workspace root
    /// as source root.
    pub fn new(moniker: Moniker) -> Self {
        Self {
            name: moniker.to_string(),
            moniker,
            description: String::new(),
            module_type: NO_MODULE_TYPE.to_string(),
            parent: Parent::Root,
            source: Source {
                root: ".".to_string(),
                includes: Vec::new(),
                excludes: Vec::new(),
                exclude_children_owned_source: true,
                is_catch_all_singleton: false,
            },
            depends_on: Vec::new(),
            used_by: Vec::new(),
            versioning: Versioning::default(),
            changelog_path: default_changelog_path("."),
        }
    }

    /// Set the parent module.
    pub fn with_parent(mut self, parent: Moniker) -> Self {
        self.parent = Parent::Module(parent);
        self
    }

    /// Set the source root; the default changelog path follows it.
    pub fn with_root(mut self, root: &str) -> Self {
        let root = normalize_rel_path(root);
        self.changelog_path = default_changelog_path(&root);
        self.source.root = root;
        self
    }

    /// Set the include patterns.
    pub fn with_includes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source.includes = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the exclude patterns.
    pub fn with_excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source.excludes = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the declared dependencies.
    pub fn with_depends_on<I>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = Moniker>,
    {
        self.depends_on = deps.into_iter().collect();
        self
    }

    /// Set the declared dependents.
    pub fn with_used_by<I>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = Moniker>,
    {
        self.used_by = deps.into_iter().collect();
        self
    }

    /// Set the module type.
    pub fn with_type(mut self, module_type: &str) -> Self {
        self.module_type = module_type.to_string();
        self
    }

    /// Toggle `excludeChildrenOwnedSource`.
    pub fn with_exclude_children(mut self, exclude: bool) -> Self {
        self.source.exclude_children_owned_source = exclude;
        self
    }

    /// Mark this module as the catch-all singleton.
    ///
    /// Gives it the catch-all include pattern if it declares none.
    pub fn as_catch_all(mut self) -> Self {
        self.source.is_catch_all_singleton = true;
        if self.source.includes.is_empty() {
            self.source.includes = vec![CATCH_ALL_INCLUDE.to_string()];
        }
        self
    }
}

/// Default changelog location for a source root.
pub fn default_changelog_path(root: &str) -> String {
    if root == "." || root.is_empty() {
        "CHANGELOG.md".to_string()
    } else {
        format!("{root}/CHANGELOG.md")
    }
}
