//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! modgraph has two configuration scopes:
//! - **Global**: User-level output preferences
//! - **Workspace**: Per-repository layout and discovery settings
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Workspace config file
//! 4. Explicit arguments from the caller (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$MODGRAPH_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/modgraph/config.toml`
//! 3. `~/.modgraph/config.toml`
//!
//! # Workspace Config Locations
//!
//! Searched in order:
//! 1. `.modgraph/config.toml` (canonical)
//! 2. `modgraph.toml` (compatibility, warns)
//!
//! # Example
//!
//! ```no_run
//! use modgraph::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/repo"))).unwrap();
//! let config = result.config;
//!
//! println!("Contracts: {}/{}", config.contracts_dir(), config.default_version());
//! println!("Manifests: {}", config.manifest_kind());
//! ```

pub mod schema;

pub use schema::{GlobalConfig, ManifestsConfig, OwnershipConfig, WorkspaceConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::contract::DEFAULT_CONTRACTS_DIR;
use crate::core::paths::WorkspacePaths;

/// Environment variable naming an explicit global config file.
pub const CONFIG_ENV: &str = "MODGRAPH_CONFIG";

/// Contract version used when neither caller nor config names one.
pub const DEFAULT_VERSION: &str = "v1";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// Accessor methods apply precedence rules and defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Workspace configuration (if one was found)
    pub workspace: Option<WorkspaceConfig>,
    global_path: Option<PathBuf>,
    workspace_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `workspace_root` is provided, also loads workspace config.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or fail
    /// validation. Missing config files are not an error.
    pub fn load(workspace_root: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        Self::load_from(Self::locate_global().as_deref(), workspace_root)
    }

    /// Load configuration with an explicit global config file.
    pub fn load_from(
        global_path: Option<&Path>,
        workspace_root: Option<&Path>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let global = match global_path {
            Some(path) => read_config::<GlobalConfig>(path)?,
            None => GlobalConfig::default(),
        };

        let (workspace, workspace_path) = match workspace_root {
            Some(root) => Self::load_workspace(root, &mut warnings)?,
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref w) = workspace {
            w.validate()?;
        }

        Ok(ConfigLoadResult {
            config: Config {
                global,
                workspace,
                global_path: global_path.map(Path::to_path_buf),
                workspace_path,
            },
            warnings,
        })
    }

    /// Find the global config file in standard locations.
    pub fn locate_global() -> Option<PathBuf> {
        // 1. Check $MODGRAPH_CONFIG
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/modgraph/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("modgraph/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.modgraph/config.toml
        dirs::home_dir()
            .map(|home| home.join(".modgraph/config.toml"))
            .filter(|path| path.exists())
    }

    /// Load workspace configuration from standard locations.
    fn load_workspace(
        root: &Path,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<(Option<WorkspaceConfig>, Option<PathBuf>), ConfigError> {
        let paths = WorkspacePaths::new(root.to_path_buf());

        // 1. Check .modgraph/config.toml (canonical)
        let canonical = paths.config_path();
        if canonical.exists() {
            let config = read_config(&canonical)?;
            return Ok((Some(config), Some(canonical)));
        }

        // 2. Check modgraph.toml (compatibility)
        let compat = paths.compat_config_path();
        if compat.exists() {
            warnings.push(ConfigWarning {
                message: format!(
                    "Using deprecated config location. Please move to '{}'",
                    canonical.display()
                ),
                path: compat.clone(),
            });
            let config = read_config(&compat)?;
            return Ok((Some(config), Some(compat)));
        }

        Ok((None, None))
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Contracts directory relative to the workspace root.
    ///
    /// Defaults to "contracts".
    pub fn contracts_dir(&self) -> &str {
        self.workspace
            .as_ref()
            .and_then(|w| w.contracts_dir.as_deref())
            .unwrap_or(DEFAULT_CONTRACTS_DIR)
    }

    /// Contract version loaded when none is requested.
    ///
    /// Defaults to "v1".
    pub fn default_version(&self) -> &str {
        self.workspace
            .as_ref()
            .and_then(|w| w.default_version.as_deref())
            .unwrap_or(DEFAULT_VERSION)
    }

    fn manifests(&self) -> Option<&ManifestsConfig> {
        self.workspace.as_ref().and_then(|w| w.manifests.as_ref())
    }

    /// Manifest kind.
    ///
    /// Defaults to "go".
    pub fn manifest_kind(&self) -> &str {
        self.manifests()
            .and_then(|m| m.kind.as_deref())
            .unwrap_or("go")
    }

    /// Shared prefix of internal module paths, if configured.
    pub fn manifest_base_path(&self) -> Option<&str> {
        self.manifests().and_then(|m| m.base_path.as_deref())
    }

    /// Extra directory names skipped during manifest discovery.
    pub fn manifest_exclude_dirs(&self) -> &[String] {
        self.manifests()
            .and_then(|m| m.exclude_dirs.as_deref())
            .unwrap_or_default()
    }

    /// Whether orphan files are reported as warnings.
    ///
    /// Defaults to `true`.
    pub fn warn_orphans(&self) -> bool {
        self.workspace
            .as_ref()
            .and_then(|w| w.ownership.as_ref())
            .and_then(|o| o.warn_orphans)
            .unwrap_or(true)
    }

    /// Whether multi-owned files are reported as warnings.
    ///
    /// Defaults to `true`.
    pub fn warn_multi_owned(&self) -> bool {
        self.workspace
            .as_ref()
            .and_then(|w| w.ownership.as_ref())
            .and_then(|o| o.warn_multi_owned)
            .unwrap_or(true)
    }

    /// Output verbosity.
    ///
    /// Defaults to "normal".
    pub fn verbosity(&self) -> &str {
        self.global.verbosity.as_deref().unwrap_or("normal")
    }

    /// Report format.
    ///
    /// Defaults to "text".
    pub fn format(&self) -> &str {
        self.global.format.as_deref().unwrap_or("text")
    }

    /// Diagram flavor.
    ///
    /// Defaults to "mermaid".
    pub fn diagram(&self) -> &str {
        self.global.diagram.as_deref().unwrap_or("mermaid")
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded workspace config file.
    pub fn workspace_config_loaded_from(&self) -> Option<&Path> {
        self.workspace_path.as_deref()
    }
}

/// Read and parse a config file.
fn read_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
