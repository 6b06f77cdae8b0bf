//! engine::workspace
//!
//! The [`Workspace`] facade: one loaded registry plus its configuration.
//!
//! # Lifecycle
//!
//! ```text
//! Config -> Load contracts -> Verify structure -> (query)*
//! ```
//!
//! Opening a workspace loads and verifies the registry once. Every query
//! afterwards borrows it immutably. Load failures abort with the operation,
//! path, and cause attached; query results are typed reports.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context as _, Result};
use serde::Serialize;

use super::health::{self, HealthReport};
use super::Context;
use crate::core::config::Config;
use crate::core::contract::load_registry_from;
use crate::core::depgraph::DependencyGraph;
use crate::core::manifest::{create_source, ManifestSource};
use crate::core::ownership::{OwnershipReport, OwnershipResolver};
use crate::core::paths::{normalize_rel_path, WorkspacePaths};
use crate::core::plan::{self, ExecutionPlan};
use crate::core::reconcile::{reconcile_with, DiscrepancyStatus, ReconcileReport};
use crate::core::registry::Registry;
use crate::core::types::Moniker;
use crate::ui::output::{self, Verbosity};
use crate::ui::render::{self, DiagramFormat, ReportFormat, ReportHeader};

/// Modules touched by a set of changed files and the plan to rebuild them.
#[derive(Debug, Clone, Serialize)]
pub struct ImpactReport {
    /// Modules owning at least one changed file.
    pub changed_modules: Vec<Moniker>,
    /// Changed files no module owns, normalized and sorted.
    pub unowned_files: Vec<String>,
    /// Changed modules plus everything depending on them.
    pub affected: Vec<Moniker>,
    /// Plan over exactly the affected modules.
    pub plan: ExecutionPlan,
}

/// A loaded, structurally verified workspace.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    config: Config,
    registry: Registry,
    verbosity: Verbosity,
}

impl Workspace {
    /// Load configuration from the standard locations and open `root`.
    ///
    /// # Errors
    ///
    /// Fails on unreadable or invalid configuration and on any contract
    /// load or structural error.
    pub fn open(root: &Path, ctx: &Context) -> Result<Self> {
        let loaded = Config::load(Some(root))
            .with_context(|| format!("Failed to load configuration for '{}'", root.display()))?;
        let verbosity = ctx.verbosity(&loaded.config);
        for warning in &loaded.warnings {
            output::warn(
                format!("{} ({})", warning.message, warning.path.display()),
                verbosity,
            );
        }
        Self::open_with_config(root, loaded.config, ctx)
    }

    /// Open `root` with an already loaded configuration.
    pub fn open_with_config(root: &Path, config: Config, ctx: &Context) -> Result<Self> {
        let verbosity = ctx.verbosity(&config);
        let version = ctx
            .version
            .clone()
            .unwrap_or_else(|| config.default_version().to_string());
        let contracts_dir = WorkspacePaths::new(root.to_path_buf())
            .contracts_dir(config.contracts_dir(), &version);

        for (scope, path) in [
            ("global", config.global_config_loaded_from()),
            ("workspace", config.workspace_config_loaded_from()),
        ] {
            if let Some(path) = path {
                output::debug(format!("{scope} config: {}", path.display()), verbosity);
            }
        }
        output::debug(
            format!("loading contracts from {}", contracts_dir.display()),
            verbosity,
        );
        let registry = load_registry_from(root, config.contracts_dir(), &version).with_context(
            || {
                format!(
                    "Failed to load contracts (version '{}') from '{}'",
                    version,
                    contracts_dir.display()
                )
            },
        )?;
        output::debug(
            format!(
                "loaded {} modules, fingerprint {}",
                registry.len(),
                registry.fingerprint().short(12)
            ),
            verbosity,
        );

        Ok(Self {
            root: root.to_path_buf(),
            config,
            registry,
            verbosity,
        })
    }

    /// Workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Effective configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The loaded registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Effective output verbosity.
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Declared dependency graph.
    pub fn dependency_graph(&self) -> DependencyGraph {
        let graph = DependencyGraph::build(&self.registry);
        output::debug(
            format!(
                "dependency graph: {} modules, {} edges",
                graph.stats.module_count, graph.stats.edge_count
            ),
            self.verbosity,
        );
        graph
    }

    /// Plan the named modules and their dependencies.
    pub fn plan(&self, requested: &[&str]) -> Result<ExecutionPlan> {
        let monikers = parse_monikers(requested)?;
        let plan = plan::plan(&self.registry, &monikers)
            .with_context(|| format!("Failed to plan {}", requested.join(", ")))?;
        output::debug(
            format!("planned {} modules in {} layers", plan.len(), plan.layers.len()),
            self.verbosity,
        );
        Ok(plan)
    }

    /// Plan every module.
    pub fn plan_all(&self) -> Result<ExecutionPlan> {
        plan::plan_all(&self.registry).context("Failed to plan all modules")
    }

    /// Resolve ownership of `files` (paths relative to the root).
    ///
    /// Orphan and multi-owner findings are warned about according to the
    /// `[ownership]` configuration.
    pub fn ownership<I, S>(&self, files: I) -> Result<OwnershipReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let report = self.resolver()?.resolve(files);
        output::debug(
            format!("resolved ownership of {} files", report.counts.total),
            self.verbosity,
        );

        if self.config.warn_orphans() {
            output::warn_findings("files with no owning module", &report.orphans, self.verbosity);
        }
        if self.config.warn_multi_owned() {
            output::warn_findings(
                "files owned by more than one module",
                &report.multi_owned,
                self.verbosity,
            );
        }

        Ok(report)
    }

    /// Modules impacted by changes to `files` and the plan to rebuild them.
    pub fn affected_by_files<I, S>(&self, files: I) -> Result<ImpactReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let resolver = self.resolver()?;
        let mut changed = BTreeSet::new();
        let mut unowned = BTreeSet::new();

        for file in files {
            let path = normalize_rel_path(file.as_ref());
            let owners = resolver.owners_of(&path);
            if owners.is_empty() {
                unowned.insert(path);
            }
            changed.extend(owners);
        }
        let unowned_files: Vec<String> = unowned.into_iter().collect();

        let changed_modules: Vec<Moniker> = changed.into_iter().collect();
        let affected = plan::affected_modules(&self.registry, &changed_modules)
            .context("Failed to compute affected modules")?;
        let plan = plan::plan_affected(&self.registry, &changed_modules)
            .context("Failed to plan affected modules")?;

        Ok(ImpactReport {
            changed_modules,
            unowned_files,
            affected: affected.into_iter().collect(),
            plan,
        })
    }

    /// Reconcile against manifests found by the configured source.
    pub fn reconcile(&self) -> Result<ReconcileReport> {
        let source = create_source(
            self.config.manifest_kind(),
            self.config.manifest_base_path().map(str::to_string),
            self.config.manifest_exclude_dirs().to_vec(),
        )
        .context("Failed to configure manifest discovery")?;
        self.reconcile_with(source.as_ref())
    }

    /// Reconcile against manifests found by `source`.
    pub fn reconcile_with(&self, source: &dyn ManifestSource) -> Result<ReconcileReport> {
        output::debug(
            format!("discovering {} manifests under {}", source.kind(), self.root.display()),
            self.verbosity,
        );
        let report = reconcile_with(&self.registry, source).with_context(|| {
            format!("Failed to discover manifests under '{}'", self.root.display())
        })?;

        for shared in &report.shared_roots {
            output::warn(
                format!(
                    "{}: root '{}' is claimed by {}; compared against '{}'",
                    shared.module_path,
                    shared.root,
                    shared
                        .claimants
                        .iter()
                        .map(Moniker::as_str)
                        .collect::<Vec<_>>()
                        .join(", "),
                    shared.claimants[0]
                ),
                self.verbosity,
            );
        }
        for record in &report.discrepancies {
            if record.status != DiscrepancyStatus::Match {
                output::warn(
                    format!("{}: {} declared dependencies", record.moniker, record.status),
                    self.verbosity,
                );
            }
        }
        Ok(report)
    }

    /// Run the opt-in verification passes.
    pub fn check(&self) -> HealthReport {
        let report = health::check(&self.registry);
        for issue in report.warnings() {
            output::warn(&issue.message, self.verbosity);
        }
        report
    }

    /// The dependency diagram in the configured flavor.
    pub fn render_diagram(&self) -> Result<String> {
        let format: DiagramFormat = self.config.diagram().parse().map_err(|e| anyhow!("{e}"))?;
        Ok(render::render_diagram(&self.dependency_graph(), format))
    }

    /// Render `report` in the configured report format.
    ///
    /// `text` renders the text form; JSON wraps the report with its header.
    pub fn render_report<T, F>(&self, report: &T, text: F) -> Result<String>
    where
        T: Serialize,
        F: FnOnce(&ReportHeader, &T) -> String,
    {
        let format: ReportFormat = self.config.format().parse().map_err(|e| anyhow!("{e}"))?;
        let header = ReportHeader::for_registry(&self.registry);
        match format {
            ReportFormat::Text => Ok(text(&header, report)),
            ReportFormat::Json => {
                render::to_json(&header, report).context("Failed to serialize report")
            }
        }
    }

    fn resolver(&self) -> Result<OwnershipResolver> {
        OwnershipResolver::new(&self.registry).context("Failed to compile ownership patterns")
    }
}

fn parse_monikers(names: &[&str]) -> Result<Vec<Moniker>> {
    names
        .iter()
        .map(|name| Moniker::new(*name).with_context(|| format!("Invalid moniker '{name}'")))
        .collect()
}
