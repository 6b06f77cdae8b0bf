//! core::manifest
//!
//! Discovery of per-module build manifests.
//!
//! # Architecture
//!
//! The [`ManifestSource`] trait is the seam to the build tool. Reconciliation
//! only sees [`DiscoveredManifest`] values and never parses manifests itself.
//! Use [`create_source`] to pick an implementation from configuration.
//!
//! # Modules
//!
//! - [`gomod`]: `go.mod` discovery and parsing
//! - [`mock`]: In-memory source for deterministic tests
//!
//! # Example
//!
//! ```
//! use modgraph::core::manifest::{mock::MockSource, DiscoveredManifest, ManifestSource};
//! use std::path::Path;
//!
//! let source = MockSource::new().with_manifest(
//!     DiscoveredManifest::new("sales", "example.com/repo/sales")
//!         .with_requires(["example.com/repo/shared"]),
//! );
//!
//! let manifests = source.discover(Path::new("/repo")).unwrap();
//! assert_eq!(manifests[0].requires, vec!["example.com/repo/shared"]);
//! ```

pub mod gomod;
pub mod mock;

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

pub use gomod::GoModSource;

/// Directories never searched for manifests.
pub const EXCLUDED_DIRS: &[&str] = &["vendor", ".git", "node_modules", "target"];

/// Errors from manifest discovery.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to walk '{path}': {message}")]
    WalkError { path: PathBuf, message: String },

    #[error("unparseable manifest '{path}' (line {line}): {message}")]
    ParseError {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("manifest '{0}' declares no module path")]
    MissingModule(PathBuf),

    #[error("unknown manifest kind '{0}' (supported: go)")]
    UnsupportedKind(String),
}

/// One discovered manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredManifest {
    /// Manifest file path.
    pub path: PathBuf,
    /// Directory holding the manifest, relative to the workspace root
    /// (`.` for the root itself).
    pub dir: String,
    /// The module's own identity.
    pub module_path: String,
    /// Internal requirements, sorted and unique.
    pub requires: Vec<String>,
}

impl DiscoveredManifest {
    /// Create a manifest record with no requirements.
    pub fn new(dir: &str, module_path: impl Into<String>) -> Self {
        let dir = crate::core::paths::normalize_rel_path(dir);
        Self {
            path: PathBuf::from(&dir),
            dir,
            module_path: module_path.into(),
            requires: Vec::new(),
        }
    }

    /// Set the requirements (sorted and de-duplicated).
    pub fn with_requires<I, S>(mut self, requires: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut requires: Vec<String> = requires.into_iter().map(Into::into).collect();
        requires.sort();
        requires.dedup();
        self.requires = requires;
        self
    }
}

/// A build tool's view of per-module manifests.
pub trait ManifestSource {
    /// Short kind name (e.g., "go").
    fn kind(&self) -> &'static str;

    /// Base path that internal module identities share, if known.
    fn base_path(&self) -> Option<&str>;

    /// Find and parse every manifest under `root`.
    ///
    /// # Errors
    ///
    /// I/O failures and unparseable manifests.
    fn discover(&self, root: &Path) -> Result<Vec<DiscoveredManifest>, ManifestError>;
}

/// Build a manifest source for a configured kind.
///
/// # Errors
///
/// Returns `UnsupportedKind` for anything but `"go"`.
pub fn create_source(
    kind: &str,
    base_path: Option<String>,
    exclude_dirs: Vec<String>,
) -> Result<Box<dyn ManifestSource>, ManifestError> {
    match kind {
        "go" => Ok(Box::new(
            GoModSource::new(base_path).with_exclude_dirs(exclude_dirs),
        )),
        other => Err(ManifestError::UnsupportedKind(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_sorted_and_unique() {
        let m = DiscoveredManifest::new("./a/", "x/a").with_requires(["x/c", "x/b", "x/c"]);
        assert_eq!(m.dir, "a");
        assert_eq!(m.requires, vec!["x/b", "x/c"]);
    }

    #[test]
    fn factory_knows_go() {
        let source = create_source("go", Some("x".into()), vec![]).unwrap();
        assert_eq!(source.kind(), "go");
        assert_eq!(source.base_path(), Some("x"));
    }

    #[test]
    fn factory_rejects_unknown_kind() {
        assert!(matches!(
            create_source("cargo", None, vec![]),
            Err(ManifestError::UnsupportedKind(k)) if k == "cargo"
        ));
    }
}
