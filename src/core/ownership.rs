//! core::ownership
//!
//! File-to-module ownership resolution.
//!
//! # Matching
//!
//! A module claims a file when the file lies strictly below the module's
//! `source.root` and its root-relative path matches at least one include
//! pattern and no exclude pattern. `*` stays within one path segment, `**`
//! crosses segments.
//!
//! # Precedence
//!
//! 1. Exclude wins over include (per module)
//! 2. A module with `excludeChildrenOwnedSource` yields any file that one of
//!    its strict descendants also claims
//! 3. The catch-all singleton only claims files nobody else owns
//!
//! Modules that are not in an ancestor/descendant relation and claim the
//! same file all keep it: that is reported as multi-ownership.
//!
//! # Invariants
//!
//! - Pure: no filesystem access
//! - Every input file lands in exactly one of single-owned, multi-owned,
//!   orphan

use std::collections::{BTreeMap, BTreeSet};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::Serialize;
use thiserror::Error;

use super::paths::{normalize_rel_path, strip_root};
use super::registry::Registry;
use super::tree::ParentTree;
use super::types::Moniker;

/// Errors from building ownership matchers.
#[derive(Debug, Error)]
pub enum OwnershipError {
    #[error("invalid glob pattern '{pattern}'{}: {message}", .moniker.as_ref().map(|m| format!(" in module '{m}'")).unwrap_or_default())]
    InvalidPattern {
        moniker: Option<Moniker>,
        pattern: String,
        message: String,
    },
}

/// Compile patterns into a glob set with `*` confined to one segment.
pub fn compile_patterns(patterns: &[String]) -> Result<GlobSet, OwnershipError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| OwnershipError::InvalidPattern {
                moniker: None,
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| OwnershipError::InvalidPattern {
        moniker: None,
        pattern: patterns.join(", "),
        message: e.to_string(),
    })
}

/// Compiled include/exclude pair.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    includes: GlobSet,
    excludes: GlobSet,
}

impl PatternMatcher {
    /// Compile include and exclude patterns.
    pub fn new(includes: &[String], excludes: &[String]) -> Result<Self, OwnershipError> {
        Ok(Self {
            includes: compile_patterns(includes)?,
            excludes: compile_patterns(excludes)?,
        })
    }

    /// Whether `path` matches an include and no exclude.
    pub fn is_match(&self, path: &str) -> bool {
        self.includes.is_match(path) && !self.excludes.is_match(path)
    }
}

/// Match one path against include/exclude patterns.
///
/// # Example
///
/// ```
/// use modgraph::core::ownership::matches;
///
/// let includes = vec!["**/*.go".to_string()];
/// let excludes = vec!["**/*_test.go".to_string()];
///
/// assert!(matches("orders/order.go", &includes, &excludes).unwrap());
/// assert!(!matches("orders/order_test.go", &includes, &excludes).unwrap());
/// assert!(!matches("orders/README.md", &includes, &excludes).unwrap());
/// ```
pub fn matches(path: &str, includes: &[String], excludes: &[String]) -> Result<bool, OwnershipError> {
    Ok(PatternMatcher::new(includes, excludes)?.is_match(path))
}

/// How many modules own a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipClass {
    Orphan,
    Single,
    Multi,
}

/// A repository file and the modules that own it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryFile {
    pub path: String,
    pub owning_modules: Vec<Moniker>,
}

impl RepositoryFile {
    /// Classify by owner count.
    pub fn classification(&self) -> OwnershipClass {
        match self.owning_modules.len() {
            0 => OwnershipClass::Orphan,
            1 => OwnershipClass::Single,
            _ => OwnershipClass::Multi,
        }
    }
}

/// Aggregate counts of an ownership report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OwnershipCounts {
    pub total: usize,
    pub single_owned: usize,
    pub multi_owned: usize,
    pub orphaned: usize,
}

/// Result of resolving ownership for a set of files.
#[derive(Debug, Clone, Serialize)]
pub struct OwnershipReport {
    /// Every input file with its owners, sorted by path.
    pub files: Vec<RepositoryFile>,
    /// Files with no owner.
    pub orphans: Vec<String>,
    /// Files with more than one owner.
    pub multi_owned: Vec<String>,
    /// Files owned by each module; every registered module has an entry.
    pub by_module: BTreeMap<Moniker, Vec<String>>,
    pub counts: OwnershipCounts,
}

impl OwnershipReport {
    /// Owners of a file, if it was part of the input.
    pub fn owners_of(&self, path: &str) -> Option<&[Moniker]> {
        let path = normalize_rel_path(path);
        self.files
            .binary_search_by(|f| f.path.as_str().cmp(path.as_str()))
            .ok()
            .map(|i| self.files[i].owning_modules.as_slice())
    }

    /// Files owned by a module.
    pub fn files_of(&self, moniker: &str) -> &[String] {
        self.by_module
            .get(moniker)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether the report carries orphan or multi-owner warnings.
    pub fn has_warnings(&self) -> bool {
        !self.orphans.is_empty() || !self.multi_owned.is_empty()
    }
}

#[derive(Debug, Clone)]
struct ModuleMatcher {
    moniker: Moniker,
    root: String,
    patterns: PatternMatcher,
    exclude_children: bool,
}

impl ModuleMatcher {
    fn claims(&self, path: &str) -> bool {
        strip_root(path, &self.root).is_some_and(|rel| self.patterns.is_match(rel))
    }
}

/// Resolves file ownership against one registry.
///
/// # Example
///
/// ```
/// use modgraph::core::contract::ModuleContract;
/// use modgraph::core::ownership::OwnershipResolver;
/// use modgraph::core::registry::Registry;
/// use modgraph::core::types::Moniker;
///
/// let sales = Moniker::new("sales").unwrap();
/// let orders = Moniker::new("sales-orders").unwrap();
///
/// let mut registry = Registry::new("v1", "/repo");
/// registry.add(ModuleContract::new(sales.clone()).with_root("sales").with_includes(["**/*"])).unwrap();
/// registry.add(
///     ModuleContract::new(orders.clone())
///         .with_parent(sales.clone())
///         .with_root("sales/orders")
///         .with_includes(["**/*"]),
/// ).unwrap();
///
/// let resolver = OwnershipResolver::new(&registry).unwrap();
/// assert_eq!(resolver.owners_of("sales/orders/order.go"), vec![orders]);
/// assert_eq!(resolver.owners_of("sales/api.go"), vec![sales]);
/// ```
#[derive(Debug, Clone)]
pub struct OwnershipResolver {
    tree: ParentTree,
    matchers: Vec<ModuleMatcher>,
    catch_all: Option<ModuleMatcher>,
}

impl OwnershipResolver {
    /// Compile matchers for every module in the registry.
    ///
    /// # Errors
    ///
    /// Returns `OwnershipError::InvalidPattern` naming the module whose glob
    /// does not compile.
    pub fn new(registry: &Registry) -> Result<Self, OwnershipError> {
        let mut matchers = Vec::new();
        let mut catch_all = None;

        for contract in registry.all() {
            let patterns = PatternMatcher::new(&contract.source.includes, &contract.source.excludes)
                .map_err(|e| match e {
                    OwnershipError::InvalidPattern {
                        pattern, message, ..
                    } => OwnershipError::InvalidPattern {
                        moniker: Some(contract.moniker.clone()),
                        pattern,
                        message,
                    },
                })?;

            let matcher = ModuleMatcher {
                moniker: contract.moniker.clone(),
                root: contract.source.root.clone(),
                patterns,
                exclude_children: contract.source.exclude_children_owned_source,
            };

            if contract.source.is_catch_all_singleton && catch_all.is_none() {
                catch_all = Some(matcher);
            } else {
                matchers.push(matcher);
            }
        }

        Ok(Self {
            tree: ParentTree::from_registry(registry),
            matchers,
            catch_all,
        })
    }

    /// Modules whose patterns claim `path`, before precedence is applied.
    ///
    /// The catch-all singleton is never a candidate.
    pub fn candidates(&self, path: &str) -> Vec<Moniker> {
        let path = normalize_rel_path(path);
        self.matchers
            .iter()
            .filter(|m| m.claims(&path))
            .map(|m| m.moniker.clone())
            .collect()
    }

    /// Final owners of `path`, in moniker order.
    pub fn owners_of(&self, path: &str) -> Vec<Moniker> {
        let path = normalize_rel_path(path);
        let candidates: Vec<&ModuleMatcher> =
            self.matchers.iter().filter(|m| m.claims(&path)).collect();

        let owners: Vec<Moniker> = candidates
            .iter()
            .filter(|owner| {
                !(owner.exclude_children
                    && candidates
                        .iter()
                        .any(|other| self.tree.is_descendant(&other.moniker, &owner.moniker)))
            })
            .map(|owner| owner.moniker.clone())
            .collect();

        if owners.is_empty() {
            if let Some(catch_all) = &self.catch_all {
                if catch_all.claims(&path) {
                    return vec![catch_all.moniker.clone()];
                }
            }
        }
        owners
    }

    /// Resolve ownership for a set of files.
    ///
    /// Paths are normalized and de-duplicated first.
    pub fn resolve<I, S>(&self, files: I) -> OwnershipReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: BTreeSet<String> = files
            .into_iter()
            .map(|f| normalize_rel_path(f.as_ref()))
            .collect();

        let mut by_module: BTreeMap<Moniker, Vec<String>> = self
            .matchers
            .iter()
            .chain(self.catch_all.iter())
            .map(|m| (m.moniker.clone(), Vec::new()))
            .collect();
        let mut report_files = Vec::with_capacity(unique.len());
        let mut orphans = Vec::new();
        let mut multi_owned = Vec::new();
        let mut counts = OwnershipCounts::default();

        for path in unique {
            let owners = self.owners_of(&path);
            for owner in &owners {
                by_module.entry(owner.clone()).or_default().push(path.clone());
            }

            let file = RepositoryFile {
                path,
                owning_modules: owners,
            };
            counts.total += 1;
            match file.classification() {
                OwnershipClass::Orphan => {
                    counts.orphaned += 1;
                    orphans.push(file.path.clone());
                }
                OwnershipClass::Single => counts.single_owned += 1,
                OwnershipClass::Multi => {
                    counts.multi_owned += 1;
                    multi_owned.push(file.path.clone());
                }
            }
            report_files.push(file);
        }

        OwnershipReport {
            files: report_files,
            orphans,
            multi_owned,
            by_module,
            counts,
        }
    }
}
