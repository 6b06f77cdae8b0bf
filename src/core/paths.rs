//! core::paths
//!
//! Centralized path routing for workspace locations.
//!
//! # Storage Layout
//!
//! modgraph only reads from the workspace; the locations it knows about are:
//! - `<root>/.modgraph/config.toml` - Workspace configuration (canonical)
//! - `<root>/modgraph.toml` - Workspace configuration (compatibility)
//! - `<root>/<contracts_dir>/<version>/` - Contract files for one version
//!
//! Repository-relative paths are always handled in normalized form: forward
//! slashes, no leading `./`, no trailing `/`, and `.` for the root itself.
//!
//! # Example
//!
//! ```
//! use modgraph::core::paths::{normalize_rel_path, WorkspacePaths};
//! use std::path::PathBuf;
//!
//! let paths = WorkspacePaths::new(PathBuf::from("/repo"));
//! assert_eq!(
//!     paths.contracts_dir("contracts", "v1"),
//!     PathBuf::from("/repo/contracts/v1")
//! );
//!
//! assert_eq!(normalize_rel_path("./sales/orders/"), "sales/orders");
//! assert_eq!(normalize_rel_path(""), ".");
//! ```

use std::path::{Path, PathBuf};

/// Name of the per-workspace modgraph directory.
pub const WORKSPACE_DIR: &str = ".modgraph";

/// Centralized path routing for one workspace.
///
/// No code outside this module should compute `*.join(".modgraph")` paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePaths {
    /// The workspace (repository) root.
    pub root: PathBuf,
}

impl WorkspacePaths {
    /// Create paths for a workspace root.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The `.modgraph` directory under the workspace root.
    pub fn workspace_dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    /// Canonical workspace config location.
    pub fn config_path(&self) -> PathBuf {
        self.workspace_dir().join("config.toml")
    }

    /// Compatibility workspace config location.
    pub fn compat_config_path(&self) -> PathBuf {
        self.root.join("modgraph.toml")
    }

    /// Directory holding the contracts of one version.
    pub fn contracts_dir(&self, contracts_dir: &str, version: &str) -> PathBuf {
        self.root.join(contracts_dir).join(version)
    }

    /// Express `path` relative to the workspace root, normalized.
    ///
    /// Returns `None` if `path` is absolute and outside the root.
    pub fn relativize(&self, path: &Path) -> Option<String> {
        if path.is_absolute() {
            let rel = path.strip_prefix(&self.root).ok()?;
            Some(normalize_rel_path(&rel.to_string_lossy()))
        } else {
            Some(normalize_rel_path(&path.to_string_lossy()))
        }
    }
}

/// Normalize a repository-relative path.
///
/// Converts `\` to `/`, drops empty and `.` components, and returns `.` for
/// an empty result.
pub fn normalize_rel_path(path: &str) -> String {
    let path = path.trim().replace('\\', "/");
    let parts: Vec<&str> = path
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect();

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Express `path` relative to `root`, both normalized.
///
/// Returns `None` when `path` is not strictly below `root`. A root of `.`
/// contains every path.
pub fn strip_root<'a>(path: &'a str, root: &str) -> Option<&'a str> {
    if root == "." {
        return if path == "." { None } else { Some(path) };
    }
    path.strip_prefix(root)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|rest| !rest.is_empty())
}
