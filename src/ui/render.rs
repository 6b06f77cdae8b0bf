//! ui::render
//!
//! Pure functions that turn reports into text.
//!
//! # Design
//!
//! Every function here takes immutable inputs and returns a `String`; none
//! of them print. Text reports start with a [`ReportHeader`] naming the
//! registry version, its fingerprint, and when the report was generated.
//!
//! # Example Output
//!
//! ```text
//! Execution plan
//! version: v1  fingerprint: 3f9a0c12e4b7  generated: 2026-01-01T00:00:00+00:00
//!
//! layer 0: a
//! layer 1: b
//! layer 2: c
//!
//! order: a, b, c
//! ```

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Serialize;

use crate::core::depgraph::DependencyGraph;
use crate::core::ownership::OwnershipReport;
use crate::core::plan::ExecutionPlan;
use crate::core::reconcile::{DiscrepancyStatus, ReconcileReport};
use crate::core::registry::Registry;
use crate::core::types::{Fingerprint, Moniker, UtcTimestamp};
use crate::engine::health::HealthReport;

/// Length of the abbreviated fingerprint shown in text headers.
const SHORT_FINGERPRINT: usize = 12;

/// Diagram flavor for the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagramFormat {
    #[default]
    Mermaid,
    PlantUml,
}

impl FromStr for DiagramFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mermaid" => Ok(DiagramFormat::Mermaid),
            "plantuml" => Ok(DiagramFormat::PlantUml),
            other => Err(format!("unknown diagram format '{other}'")),
        }
    }
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("unknown report format '{other}'")),
        }
    }
}

/// Provenance shared by every report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportHeader {
    pub version: String,
    pub fingerprint: Fingerprint,
    pub generated_at: UtcTimestamp,
}

impl ReportHeader {
    /// Header for a report computed from `registry` now.
    pub fn for_registry(registry: &Registry) -> Self {
        Self {
            version: registry.version().to_string(),
            fingerprint: registry.fingerprint(),
            generated_at: UtcTimestamp::now(),
        }
    }

    fn lines(&self, title: &str) -> Vec<String> {
        vec![
            title.to_string(),
            format!(
                "version: {}  fingerprint: {}  generated: {}",
                self.version,
                self.fingerprint.short(SHORT_FINGERPRINT),
                self.generated_at
            ),
            String::new(),
        ]
    }
}

#[derive(Serialize)]
struct JsonEnvelope<'a, T: Serialize> {
    header: &'a ReportHeader,
    report: &'a T,
}

/// Serialize a report with its header as pretty JSON.
pub fn to_json<T: Serialize>(header: &ReportHeader, report: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonEnvelope { header, report })
}

/// Diagram nodes in id order and their ids, `n0`, `n1`, ...
///
/// Monikers may contain characters the diagram syntaxes reserve, so nodes
/// are keyed by position and labeled with the moniker. Registered modules
/// come first, then edge targets that are not registered.
fn diagram_nodes(graph: &DependencyGraph) -> (Vec<&Moniker>, BTreeMap<&Moniker, String>) {
    let mut order = Vec::new();
    let mut ids = BTreeMap::new();

    let candidates = graph
        .modules
        .iter()
        .chain(graph.edges.iter().map(|edge| &edge.to));
    for moniker in candidates {
        if !ids.contains_key(moniker) {
            ids.insert(moniker, format!("n{}", order.len()));
            order.push(moniker);
        }
    }

    (order, ids)
}

/// Render the dependency graph in the requested flavor.
pub fn render_diagram(graph: &DependencyGraph, format: DiagramFormat) -> String {
    match format {
        DiagramFormat::Mermaid => render_mermaid(graph),
        DiagramFormat::PlantUml => render_plantuml(graph),
    }
}

/// Render the dependency graph as a Mermaid flowchart.
///
/// # Example
///
/// ```
/// use modgraph::core::contract::ModuleContract;
/// use modgraph::core::depgraph::DependencyGraph;
/// use modgraph::core::registry::Registry;
/// use modgraph::core::types::Moniker;
/// use modgraph::ui::render::render_mermaid;
///
/// let shared = Moniker::new("shared").unwrap();
/// let mut registry = Registry::new("v1", "/repo");
/// registry.add(ModuleContract::new(shared.clone())).unwrap();
/// registry.add(ModuleContract::new(Moniker::new("sales-orders").unwrap()).with_depends_on([shared])).unwrap();
///
/// let text = render_mermaid(&DependencyGraph::build(&registry));
/// assert!(text.starts_with("graph TD"));
/// // Nodes are numbered in moniker order: sales-orders is n0, shared is n1
/// assert!(text.contains("n0[\"sales-orders\"]"));
/// assert!(text.contains("n0 --> n1"));
/// ```
pub fn render_mermaid(graph: &DependencyGraph) -> String {
    let (order, ids) = diagram_nodes(graph);
    let mut lines = vec!["graph TD".to_string()];

    for moniker in order {
        lines.push(format!("    {}[\"{}\"]", ids[moniker], moniker));
    }
    for edge in &graph.edges {
        lines.push(format!("    {} --> {}", ids[&edge.from], ids[&edge.to]));
    }

    lines.join("\n")
}

/// Render the dependency graph as a PlantUML component diagram.
pub fn render_plantuml(graph: &DependencyGraph) -> String {
    let (order, ids) = diagram_nodes(graph);
    let mut lines = vec!["@startuml".to_string()];

    for moniker in order {
        lines.push(format!("component \"{}\" as {}", moniker, ids[moniker]));
    }
    for edge in &graph.edges {
        lines.push(format!("{} --> {}", ids[&edge.from], ids[&edge.to]));
    }

    lines.push("@enduml".to_string());
    lines.join("\n")
}

fn join_monikers(monikers: &[Moniker]) -> String {
    monikers
        .iter()
        .map(Moniker::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render the graph summary statistics.
pub fn render_graph_text(header: &ReportHeader, graph: &DependencyGraph) -> String {
    let stats = &graph.stats;
    let mut lines = header.lines("Dependency graph");

    lines.push(format!("{:<14}{}", "modules:", stats.module_count));
    lines.push(format!("{:<14}{}", "edges:", stats.edge_count));
    lines.push(format!("{:<14}{}", "roots:", stats.roots));
    lines.push(format!("{:<14}{}", "leaves:", stats.leaves));
    lines.push(format!("{:<14}{}", "max fan-in:", stats.max_fan_in));
    lines.push(format!("{:<14}{}", "max fan-out:", stats.max_fan_out));

    lines.join("\n")
}

/// Render an execution plan.
pub fn render_plan_text(header: &ReportHeader, plan: &ExecutionPlan) -> String {
    let mut lines = header.lines("Execution plan");

    if plan.is_empty() {
        lines.push("nothing to plan".to_string());
        return lines.join("\n");
    }

    for (index, layer) in plan.layers.iter().enumerate() {
        lines.push(format!("layer {}: {}", index, join_monikers(layer)));
    }
    lines.push(String::new());
    lines.push(format!("order: {}", join_monikers(&plan.execution_order)));

    lines.join("\n")
}

/// Render an ownership report.
pub fn render_ownership_text(header: &ReportHeader, report: &OwnershipReport) -> String {
    let counts = &report.counts;
    let mut lines = header.lines("File ownership");

    lines.push(format!(
        "{} files: {} single-owned, {} multi-owned, {} orphaned",
        counts.total, counts.single_owned, counts.multi_owned, counts.orphaned
    ));
    lines.push(String::new());

    for (moniker, files) in &report.by_module {
        lines.push(format!("{:<32}{:>6}", moniker.as_str(), files.len()));
    }

    if !report.multi_owned.is_empty() {
        lines.push(String::new());
        lines.push("multi-owned:".to_string());
        for path in &report.multi_owned {
            let owners = report.owners_of(path).unwrap_or_default();
            lines.push(format!("  {} ({})", path, join_monikers(owners)));
        }
    }

    if !report.orphans.is_empty() {
        lines.push(String::new());
        lines.push("orphaned:".to_string());
        lines.extend(report.orphans.iter().map(|p| format!("  {p}")));
    }

    lines.join("\n")
}

/// Render a reconciliation report.
pub fn render_reconcile_text(header: &ReportHeader, report: &ReconcileReport) -> String {
    let summary = &report.summary;
    let mut lines = header.lines("Manifest reconciliation");

    if let Some(base) = &report.base_path {
        lines.push(format!("base path: {base}"));
        lines.push(String::new());
    }

    for record in &report.discrepancies {
        lines.push(format!("{:<10}{}", record.status.to_string(), record.moniker));
        if record.status != DiscrepancyStatus::Match {
            for dep in &record.missing {
                lines.push(format!("          - missing: {dep}"));
            }
            for dep in &record.extra {
                lines.push(format!("          + extra:   {dep}"));
            }
        }
    }

    if !report.modules_without_manifest.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "no manifest: {}",
            join_monikers(&report.modules_without_manifest)
        ));
    }
    if !report.manifests_without_contract.is_empty() {
        lines.push(format!(
            "no contract: {}",
            report.manifests_without_contract.join(", ")
        ));
    }
    for shared in &report.shared_roots {
        lines.push(format!(
            "shared root: {} ({}) claimed by {}",
            shared.module_path,
            shared.root,
            join_monikers(&shared.claimants)
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "{} compared: {} match, {} missing, {} extra, {} mismatch",
        summary.compared, summary.matched, summary.missing, summary.extra, summary.mismatched
    ));

    lines.join("\n")
}

/// Render a health report.
pub fn render_health_text(header: &ReportHeader, report: &HealthReport) -> String {
    let mut lines = header.lines("Workspace health");

    if report.is_healthy() {
        lines.push("no issues found".to_string());
        return lines.join("\n");
    }

    for issue in &report.issues {
        lines.push(format!("{}: {} [{}]", issue.severity, issue.message, issue.id));
    }

    lines.join("\n")
}
