//! core::manifest::mock
//!
//! In-memory manifest source for deterministic tests.

use std::path::Path;

use super::{DiscoveredManifest, ManifestError, ManifestSource};

/// Manifest source that returns a fixed list.
#[derive(Debug, Clone, Default)]
pub struct MockSource {
    base_path: Option<String>,
    manifests: Vec<DiscoveredManifest>,
}

impl MockSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base path reported to reconciliation.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    /// Add a manifest.
    pub fn with_manifest(mut self, manifest: DiscoveredManifest) -> Self {
        self.manifests.push(manifest);
        self
    }
}

impl ManifestSource for MockSource {
    fn kind(&self) -> &'static str {
        "mock"
    }

    fn base_path(&self) -> Option<&str> {
        self.base_path.as_deref()
    }

    fn discover(&self, _root: &Path) -> Result<Vec<DiscoveredManifest>, ManifestError> {
        Ok(self.manifests.clone())
    }
}
