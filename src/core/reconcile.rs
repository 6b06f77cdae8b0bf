//! core::reconcile
//!
//! Cross-check of declared `dependsOn` against discovered manifests.
//!
//! # Mapping
//!
//! A manifest maps to a moniker by its module path first: the canonical
//! identity of a contract is `<base>/<source.root>` (just `<base>` for the
//! workspace root). If that misses, the manifest's directory is matched
//! against `source.root`.
//!
//! When several contracts share the mapped root, regular modules win over
//! the catch-all singleton, then moniker order decides. Every such manifest
//! is listed in [`ReconcileReport::shared_roots`].
//!
//! The base is the source's configured base path, else the module path of a
//! manifest at the workspace root.
//!
//! A requirement is internal when it lies under the base or is the module
//! path of another discovered manifest. Internal requirements are translated
//! to monikers; those that map to none are kept verbatim and surface as
//! `extra`. External requirements are ignored.
//!
//! # Invariants
//!
//! - Findings are data: reconciliation never fails on a discrepancy
//! - Reports are deterministic (moniker order, sorted lists)

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use super::manifest::{DiscoveredManifest, ManifestError, ManifestSource};
use super::registry::Registry;
use super::types::Moniker;

/// Outcome of comparing one module's declared and actual dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscrepancyStatus {
    Match,
    /// Declared in the contract, absent from the manifest.
    Missing,
    /// Present in the manifest, not declared.
    Extra,
    /// Both missing and extra entries.
    Mismatch,
}

impl DiscrepancyStatus {
    fn from_diff(missing: &[String], extra: &[String]) -> Self {
        match (missing.is_empty(), extra.is_empty()) {
            (true, true) => DiscrepancyStatus::Match,
            (false, true) => DiscrepancyStatus::Missing,
            (true, false) => DiscrepancyStatus::Extra,
            (false, false) => DiscrepancyStatus::Mismatch,
        }
    }
}

impl fmt::Display for DiscrepancyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiscrepancyStatus::Match => "MATCH",
            DiscrepancyStatus::Missing => "MISSING",
            DiscrepancyStatus::Extra => "EXTRA",
            DiscrepancyStatus::Mismatch => "MISMATCH",
        };
        f.write_str(s)
    }
}

/// Comparison record for one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    pub moniker: Moniker,
    pub manifest_path: PathBuf,
    pub declared_deps: Vec<String>,
    pub actual_deps: Vec<String>,
    pub missing: Vec<String>,
    pub extra: Vec<String>,
    pub status: DiscrepancyStatus,
}

/// Compare two dependency lists.
///
/// Both are sorted and de-duplicated before the set difference.
///
/// # Example
///
/// ```
/// use modgraph::core::reconcile::{compare, DiscrepancyStatus};
///
/// let (missing, extra, status) = compare(&["shared".into()], &[]);
/// assert_eq!(missing, vec!["shared"]);
/// assert!(extra.is_empty());
/// assert_eq!(status, DiscrepancyStatus::Missing);
/// ```
pub fn compare(declared: &[String], actual: &[String]) -> (Vec<String>, Vec<String>, DiscrepancyStatus) {
    let declared: BTreeSet<&String> = declared.iter().collect();
    let actual: BTreeSet<&String> = actual.iter().collect();

    let missing: Vec<String> = declared.difference(&actual).map(|s| s.to_string()).collect();
    let extra: Vec<String> = actual.difference(&declared).map(|s| s.to_string()).collect();
    let status = DiscrepancyStatus::from_diff(&missing, &extra);
    (missing, extra, status)
}

/// Summary counts of a reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub compared: usize,
    pub matched: usize,
    pub missing: usize,
    pub extra: usize,
    pub mismatched: usize,
    pub modules_without_manifest: usize,
    pub manifests_without_contract: usize,
}

/// Full reconciliation report.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    /// Base path used for the canonical mapping, if any.
    pub base_path: Option<String>,
    /// One record per module present in both graphs, in moniker order.
    pub discrepancies: Vec<Discrepancy>,
    pub modules_without_manifest: Vec<Moniker>,
    /// Module paths of manifests that map to no contract.
    pub manifests_without_contract: Vec<String>,
    /// Manifests whose source root more than one contract claims.
    pub shared_roots: Vec<SharedRoot>,
    pub summary: ReconcileSummary,
}

/// A manifest mapped to a source root that several contracts share.
///
/// The first claimant is the one compared; regular modules are preferred
/// over the catch-all singleton, then moniker order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedRoot {
    pub module_path: String,
    pub root: String,
    pub claimants: Vec<Moniker>,
}

impl ReconcileReport {
    /// Whether any compared module is not a MATCH.
    pub fn has_discrepancies(&self) -> bool {
        self.discrepancies
            .iter()
            .any(|d| d.status != DiscrepancyStatus::Match)
    }

    /// Record for one module.
    pub fn get(&self, moniker: &str) -> Option<&Discrepancy> {
        self.discrepancies.iter().find(|d| d.moniker.as_str() == moniker)
    }
}

/// Canonical manifest identity of a source root.
pub fn canonical_module_path(base: &str, root: &str) -> String {
    if root == "." {
        base.to_string()
    } else {
        format!("{base}/{root}")
    }
}

/// Discover manifests through `source` and reconcile them.
///
/// # Errors
///
/// Only discovery failures; findings are in the report.
pub fn reconcile_with(
    registry: &Registry,
    source: &dyn ManifestSource,
) -> Result<ReconcileReport, ManifestError> {
    let manifests = source.discover(registry.workspace_root())?;
    Ok(reconcile(registry, &manifests, source.base_path()))
}

/// Reconcile the registry against already discovered manifests.
pub fn reconcile(
    registry: &Registry,
    manifests: &[DiscoveredManifest],
    base_path: Option<&str>,
) -> ReconcileReport {
    let base: Option<String> = base_path
        .map(|b| b.trim_end_matches('/').to_string())
        .or_else(|| {
            manifests
                .iter()
                .find(|m| m.dir == ".")
                .map(|m| m.module_path.clone())
        });

    // Canonical module path -> source root
    let canonical: BTreeMap<String, &str> = match &base {
        Some(base) => registry
            .all()
            .map(|c| (canonical_module_path(base, &c.source.root), c.source.root.as_str()))
            .collect(),
        None => BTreeMap::new(),
    };

    // Manifest module path -> moniker, first manifest wins per moniker
    let mut by_module_path: BTreeMap<&str, Moniker> = BTreeMap::new();
    let mut manifest_for: BTreeMap<Moniker, &DiscoveredManifest> = BTreeMap::new();
    let mut manifests_without_contract = Vec::new();
    let mut shared_roots = Vec::new();

    for manifest in manifests {
        let root = canonical
            .get(&manifest.module_path)
            .copied()
            .unwrap_or(manifest.dir.as_str());
        let claimants = registry.contracts_with_root(root);

        let Some(chosen) = claimants.first() else {
            manifests_without_contract.push(manifest.module_path.clone());
            continue;
        };
        if claimants.len() > 1 {
            shared_roots.push(SharedRoot {
                module_path: manifest.module_path.clone(),
                root: root.to_string(),
                claimants: claimants.iter().map(|c| c.moniker.clone()).collect(),
            });
        }

        by_module_path.insert(&manifest.module_path, chosen.moniker.clone());
        manifest_for.entry(chosen.moniker.clone()).or_insert(manifest);
    }

    let is_internal = |req: &str| {
        by_module_path.contains_key(req)
            || base
                .as_deref()
                .is_some_and(|b| req == b || req.starts_with(&format!("{b}/")))
    };
    let translate = |req: &str| -> String {
        canonical
            .get(req)
            .and_then(|root| registry.find_by_root(root))
            .map(|c| &c.moniker)
            .or_else(|| by_module_path.get(req))
            .map(|m| m.to_string())
            .unwrap_or_else(|| req.to_string())
    };

    let mut discrepancies = Vec::new();
    let mut modules_without_manifest = Vec::new();
    let mut summary = ReconcileSummary::default();

    for contract in registry.all() {
        let Some(manifest) = manifest_for.get(&contract.moniker) else {
            modules_without_manifest.push(contract.moniker.clone());
            continue;
        };

        let declared: Vec<String> = contract
            .depends_on
            .iter()
            .map(|d| d.to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let actual: Vec<String> = manifest
            .requires
            .iter()
            .filter(|r| is_internal(r.as_str()))
            .map(|r| translate(r.as_str()))
            .filter(|r| r != contract.moniker.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let (missing, extra, status) = compare(&declared, &actual);
        summary.compared += 1;
        match status {
            DiscrepancyStatus::Match => summary.matched += 1,
            DiscrepancyStatus::Missing => summary.missing += 1,
            DiscrepancyStatus::Extra => summary.extra += 1,
            DiscrepancyStatus::Mismatch => summary.mismatched += 1,
        }

        discrepancies.push(Discrepancy {
            moniker: contract.moniker.clone(),
            manifest_path: manifest.path.clone(),
            declared_deps: declared,
            actual_deps: actual,
            missing,
            extra,
            status,
        });
    }

    manifests_without_contract.sort();
    summary.modules_without_manifest = modules_without_manifest.len();
    summary.manifests_without_contract = manifests_without_contract.len();

    ReconcileReport {
        base_path: base,
        discrepancies,
        modules_without_manifest,
        manifests_without_contract,
        shared_roots,
        summary,
    }
}
