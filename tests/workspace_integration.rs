//! Integration tests for the workspace facade.
//!
//! These tests lay out real contract files and go.mod manifests in a
//! temporary directory and drive every query through [`Workspace`].

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use modgraph::core::config::{Config, GlobalConfig};
use modgraph::core::plan::PlanError;
use modgraph::core::reconcile::DiscrepancyStatus;
use modgraph::core::types::Moniker;
use modgraph::engine::{Context, Severity, Workspace};
use modgraph::ui::render::{self, DiagramFormat, ReportHeader};

// =============================================================================
// Test Helpers
// =============================================================================

/// A temporary repository with contracts under `contracts/v1`.
struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, rel: &str, content: &str) {
        let path = self.path().join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
        fs::write(path, content).expect("write file");
    }

    fn contract(&self, moniker: &str, body: &str) {
        self.write(
            &format!("contracts/v1/{moniker}.toml"),
            &format!("moniker = \"{moniker}\"\n{body}"),
        );
    }

    fn open(&self) -> anyhow::Result<Workspace> {
        self.open_with_global(GlobalConfig::default())
    }

    /// Open with the workspace config on disk and the given global config.
    fn open_with_global(&self, global: GlobalConfig) -> anyhow::Result<Workspace> {
        let mut loaded = Config::load_from(None, Some(self.path()))?;
        loaded.config.global = global;
        Workspace::open_with_config(
            self.path(),
            loaded.config,
            &Context {
                quiet: true,
                ..Default::default()
            },
        )
    }
}

fn m(name: &str) -> Moniker {
    Moniker::new(name).unwrap()
}

fn names(monikers: &[Moniker]) -> Vec<&str> {
    monikers.iter().map(Moniker::as_str).collect()
}

/// Three modules, A depends on B and C, B depends on C.
fn abc_repo() -> TestRepo {
    let repo = TestRepo::new();
    repo.contract("a", "dependsOn = [\"b\", \"c\"]\n");
    repo.contract("b", "dependsOn = [\"c\"]\nusedBy = [\"a\"]\n");
    repo.contract("c", "usedBy = [\"a\", \"b\"]\n");
    repo
}

/// The sales tree from the ownership walkthrough.
fn sales_repo() -> TestRepo {
    let repo = TestRepo::new();
    repo.contract(
        "sales",
        r#"
[source]
root = "sales"
includes = ["**/*"]
excludeChildrenOwnedSource = true
"#,
    );
    repo.contract(
        "sales-orders",
        r#"
parent = "sales"
dependsOn = ["shared"]

[source]
root = "sales/orders"
includes = ["**/*"]
"#,
    );
    repo.contract(
        "shared",
        r#"
usedBy = ["sales-orders"]

[source]
root = "shared"
includes = ["**/*.go"]
"#,
    );
    repo
}

// =============================================================================
// Loading
// =============================================================================

mod loading {
    use super::*;

    #[test]
    fn opens_and_fingerprints() {
        let repo = abc_repo();
        let ws = repo.open().expect("open");

        assert_eq!(ws.registry().len(), 3);
        assert_eq!(ws.registry().version(), "v1");

        let again = repo.open().expect("reopen");
        assert_eq!(ws.registry().fingerprint(), again.registry().fingerprint());
    }

    #[test]
    fn missing_contracts_dir_fails() {
        let repo = TestRepo::new();
        let err = repo.open().unwrap_err();
        assert!(format!("{err:#}").contains("contracts"));
    }

    #[test]
    fn missing_parent_fails_to_load() {
        let repo = TestRepo::new();
        repo.contract("child", "parent = \"ghost\"\n");
        let err = repo.open().unwrap_err();
        assert!(format!("{err:#}").contains("ghost"));
    }

    #[test]
    fn version_override_from_context() {
        let repo = abc_repo();
        repo.write("contracts/v2/solo.toml", "moniker = \"solo\"\n");

        let loaded = Config::load_from(None, Some(repo.path())).unwrap();
        let ws = Workspace::open_with_config(repo.path(), loaded.config, &Context::for_version("v2"))
            .expect("open v2");
        assert_eq!(ws.registry().len(), 1);
        assert!(ws.registry().has("solo"));
    }

    #[test]
    fn workspace_config_moves_contracts_dir() {
        let repo = TestRepo::new();
        repo.write(".modgraph/config.toml", "contracts_dir = \"meta/modules\"\n");
        repo.write("meta/modules/v1/only.toml", "moniker = \"only\"\n");

        let ws = repo.open().expect("open");
        assert!(ws.registry().has("only"));
    }
}

// =============================================================================
// Planning
// =============================================================================

mod planning {
    use super::*;

    #[test]
    fn layered_plan_for_abc() {
        let ws = abc_repo().open().unwrap();
        let plan = ws.plan(&["a"]).unwrap();

        assert_eq!(plan.layers.len(), 3);
        assert_eq!(names(&plan.layers[0]), vec!["c"]);
        assert_eq!(names(&plan.layers[1]), vec!["b"]);
        assert_eq!(names(&plan.layers[2]), vec!["a"]);
        assert_eq!(names(&plan.execution_order), vec!["c", "b", "a"]);
    }

    #[test]
    fn plan_of_leaf_is_itself() {
        let ws = abc_repo().open().unwrap();
        let plan = ws.plan(&["c"]).unwrap();
        assert_eq!(names(&plan.execution_order), vec!["c"]);
    }

    #[test]
    fn unknown_module_is_an_error() {
        let ws = abc_repo().open().unwrap();
        assert!(ws.plan(&["nope"]).is_err());
    }

    #[test]
    fn cycle_reported_with_members() {
        let repo = TestRepo::new();
        repo.contract("x", "dependsOn = [\"y\"]\n");
        repo.contract("y", "dependsOn = [\"x\"]\n");
        let ws = repo.open().unwrap();

        let err = ws.plan_all().unwrap_err();
        match err.downcast_ref::<PlanError>() {
            Some(PlanError::CircularDependency { remaining }) => {
                assert_eq!(remaining, &vec![m("x"), m("y")]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn graph_stats() {
        let ws = abc_repo().open().unwrap();
        let graph = ws.dependency_graph();

        assert_eq!(graph.stats.module_count, 3);
        assert_eq!(graph.stats.edge_count, 3);
        assert_eq!(graph.dependents_of(&m("c")), &[m("a"), m("b")]);
    }
}

// =============================================================================
// Ownership and Impact
// =============================================================================

mod ownership {
    use super::*;

    #[test]
    fn nested_module_takes_its_files() {
        let ws = sales_repo().open().unwrap();
        let report = ws
            .ownership(["sales/orders/a.go", "sales/b.go", "docs/readme.md"])
            .unwrap();

        assert_eq!(names(report.owners_of("sales/orders/a.go").unwrap()), vec!["sales-orders"]);
        assert_eq!(names(report.owners_of("sales/b.go").unwrap()), vec!["sales"]);
        assert_eq!(report.orphans, vec!["docs/readme.md".to_string()]);
        assert_eq!(report.counts.single_owned, 2);
        assert_eq!(report.counts.orphaned, 1);
    }

    #[test]
    fn catch_all_takes_orphans() {
        let repo = sales_repo();
        repo.contract(
            "everything-else",
            "[source]\nisCatchAllSingleton = true\n",
        );
        let ws = repo.open().unwrap();
        let report = ws.ownership(["docs/readme.md", "sales/b.go"]).unwrap();

        assert!(report.orphans.is_empty());
        assert_eq!(
            names(report.owners_of("docs/readme.md").unwrap()),
            vec!["everything-else"]
        );
        assert_eq!(names(report.owners_of("sales/b.go").unwrap()), vec!["sales"]);
    }

    #[test]
    fn two_catch_alls_fail_to_load() {
        let repo = sales_repo();
        repo.contract("one", "[source]\nisCatchAllSingleton = true\n");
        repo.contract("two", "[source]\nisCatchAllSingleton = true\n");
        assert!(repo.open().is_err());
    }

    #[test]
    fn changed_shared_file_affects_dependents() {
        let ws = sales_repo().open().unwrap();
        let impact = ws
            .affected_by_files(["shared/util.go", "tools/script.sh"])
            .unwrap();

        assert_eq!(names(&impact.changed_modules), vec!["shared"]);
        assert_eq!(impact.unowned_files, vec!["tools/script.sh".to_string()]);
        assert_eq!(names(&impact.affected), vec!["sales-orders", "shared"]);
        assert_eq!(names(&impact.plan.execution_order), vec!["shared", "sales-orders"]);
    }

    #[test]
    fn unowned_files_are_normalized() {
        let ws = sales_repo().open().unwrap();
        let impact = ws
            .affected_by_files(["./tools/script.sh", "tools//script.sh", "shared/util.go"])
            .unwrap();

        assert_eq!(names(&impact.changed_modules), vec!["shared"]);
        assert_eq!(impact.unowned_files, vec!["tools/script.sh".to_string()]);
    }
}

// =============================================================================
// Reconciliation
// =============================================================================

mod reconciliation {
    use super::*;

    const ROOT_GO_MOD: &str = "module example.com/shop\n\ngo 1.22\n";

    #[test]
    fn missing_manifest_require_is_reported() {
        let repo = sales_repo();
        repo.write("go.mod", ROOT_GO_MOD);
        repo.write(
            "sales/orders/go.mod",
            "module example.com/shop/sales/orders\n\nrequire github.com/pkg/errors v0.9.1\n",
        );
        repo.write("shared/go.mod", "module example.com/shop/shared\n");

        let ws = repo.open().unwrap();
        let report = ws.reconcile().unwrap();

        let orders = report.get("sales-orders").expect("sales-orders compared");
        assert_eq!(orders.status, DiscrepancyStatus::Missing);
        assert_eq!(orders.missing, vec!["shared".to_string()]);
        assert!(orders.extra.is_empty());

        assert_eq!(report.get("shared").unwrap().status, DiscrepancyStatus::Match);
        assert_eq!(names(&report.modules_without_manifest), vec!["sales"]);
        assert!(report.has_discrepancies());
    }

    #[test]
    fn matching_manifests_are_clean() {
        let repo = sales_repo();
        repo.write("go.mod", ROOT_GO_MOD);
        repo.write(
            "sales/orders/go.mod",
            "module example.com/shop/sales/orders\n\nrequire (\n\texample.com/shop/shared v0.0.0\n)\n",
        );
        repo.write("shared/go.mod", "module example.com/shop/shared\n");
        repo.write("vendor/x/go.mod", "module example.com/shop/vendor/x\n");

        let ws = repo.open().unwrap();
        let report = ws.reconcile().unwrap();

        assert!(!report.has_discrepancies());
        assert_eq!(report.summary.matched, 2);
        // The root manifest only supplies the base path
        assert_eq!(report.manifests_without_contract, vec!["example.com/shop".to_string()]);
    }

    #[test]
    fn root_manifest_belongs_to_root_module_not_catch_all() {
        let repo = TestRepo::new();
        repo.contract("app", "dependsOn = [\"shared\"]\n");
        repo.contract("misc", "[source]\nisCatchAllSingleton = true\n");
        repo.contract("shared", "[source]\nroot = \"shared\"\n");
        repo.write(
            "go.mod",
            "module example.com/shop\n\nrequire example.com/shop/shared v0.0.0\n",
        );
        repo.write("shared/go.mod", "module example.com/shop/shared\n");

        let ws = repo.open().unwrap();
        let report = ws.reconcile().unwrap();

        assert_eq!(report.get("app").unwrap().status, DiscrepancyStatus::Match);
        assert!(report.get("misc").is_none());
        assert_eq!(names(&report.modules_without_manifest), vec!["misc"]);
        assert_eq!(report.shared_roots.len(), 1);
        assert_eq!(report.shared_roots[0].root, ".");
        assert_eq!(names(&report.shared_roots[0].claimants), vec!["app", "misc"]);
        assert!(!report.has_discrepancies());
    }

    #[test]
    fn malformed_manifest_fails() {
        let repo = sales_repo();
        repo.write("shared/go.mod", "module example.com/shop/shared\nrequire (\n");
        let ws = repo.open().unwrap();
        assert!(ws.reconcile().is_err());
    }
}

// =============================================================================
// Health and Rendering
// =============================================================================

mod health_and_render {
    use super::*;

    #[test]
    fn consistent_repo_is_healthy() {
        let ws = abc_repo().open().unwrap();
        assert!(ws.check().is_healthy());
    }

    #[test]
    fn used_by_mismatch_is_a_warning() {
        let repo = TestRepo::new();
        repo.contract("a", "dependsOn = [\"b\"]\n");
        repo.contract("b", "usedBy = [\"a\"]\n");
        repo.contract("c", "dependsOn = [\"b\"]\n");
        let ws = repo.open().unwrap();

        let report = ws.check();
        assert!(!report.has_blocking());
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].severity, Severity::Warning);
        assert_eq!(
            report.issues[0].message,
            "'b' is used by 'c', which its usedBy list omits"
        );
    }

    #[test]
    fn undeclared_used_by_is_not_checked() {
        let repo = TestRepo::new();
        repo.contract("a", "dependsOn = [\"b\"]\n");
        repo.contract("b", "");
        let ws = repo.open().unwrap();
        assert!(ws.check().is_healthy());
    }

    #[test]
    fn missing_dependency_is_blocking() {
        let repo = TestRepo::new();
        repo.contract("a", "dependsOn = [\"ghost\"]\n");
        let ws = repo.open().unwrap();
        assert!(ws.check().has_blocking());
    }

    #[test]
    fn mermaid_lists_every_edge() {
        let ws = abc_repo().open().unwrap();
        let diagram = render::render_diagram(&ws.dependency_graph(), DiagramFormat::Mermaid);

        assert!(diagram.starts_with("graph TD"));
        assert!(diagram.contains("n0[\"a\"]"));
        assert!(diagram.contains("n0 --> n1"));
        assert!(diagram.contains("n0 --> n2"));
        assert!(diagram.contains("n1 --> n2"));
    }

    #[test]
    fn configured_diagram_flavor_is_used() {
        let ws = abc_repo().open().unwrap();
        assert!(ws.render_diagram().unwrap().starts_with("graph TD"));

        let ws = abc_repo()
            .open_with_global(GlobalConfig {
                diagram: Some("plantuml".to_string()),
                ..Default::default()
            })
            .unwrap();
        let diagram = ws.render_diagram().unwrap();
        assert!(diagram.starts_with("@startuml"));
        assert!(diagram.contains("n0 --> n1"));
    }

    #[test]
    fn configured_report_format_is_used() {
        let ws = abc_repo().open().unwrap();
        let plan = ws.plan_all().unwrap();
        let text = ws.render_report(&plan, render::render_plan_text).unwrap();
        assert!(text.starts_with("Execution plan"));
        assert!(text.contains("order: c, b, a"));

        let ws = abc_repo()
            .open_with_global(GlobalConfig {
                format: Some("json".to_string()),
                ..Default::default()
            })
            .unwrap();
        let json = ws.render_report(&plan, render::render_plan_text).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["header"]["version"], "v1");
        assert_eq!(value["report"]["execution_order"][2], "a");
    }

    #[test]
    fn json_envelope_carries_fingerprint() {
        let ws = abc_repo().open().unwrap();
        let header = ReportHeader::for_registry(ws.registry());
        let plan = ws.plan_all().unwrap();

        let json = render::to_json(&header, &plan).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["header"]["version"], "v1");
        assert_eq!(
            value["header"]["fingerprint"],
            ws.registry().fingerprint().as_str()
        );
        assert_eq!(value["report"]["execution_order"][0], "c");
    }
}
