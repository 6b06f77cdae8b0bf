//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$MODGRAPH_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/modgraph/config.toml`
//! 3. `~/.modgraph/config.toml` (canonical write location)
//!
//! # Workspace Config
//!
//! Located at `<root>/.modgraph/config.toml` (canonical).
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they conform to
//! expected formats (e.g., the contracts directory must stay inside the
//! workspace).

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// verbosity = "normal"
/// format = "text"
/// diagram = "mermaid"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Output verbosity ("quiet", "normal", "debug")
    pub verbosity: Option<String>,

    /// Report format ("text" or "json")
    pub format: Option<String>,

    /// Diagram flavor ("mermaid" or "plantuml")
    pub diagram: Option<String>,
}

impl GlobalConfig {
    /// Valid verbosity levels.
    pub const VALID_VERBOSITY: &'static [&'static str] = &["quiet", "normal", "debug"];

    /// Valid report formats.
    pub const VALID_FORMATS: &'static [&'static str] = &["text", "json"];

    /// Valid diagram flavors.
    pub const VALID_DIAGRAMS: &'static [&'static str] = &["mermaid", "plantuml"];

    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_one_of("verbosity", self.verbosity.as_deref(), Self::VALID_VERBOSITY)?;
        check_one_of("format", self.format.as_deref(), Self::VALID_FORMATS)?;
        check_one_of("diagram", self.diagram.as_deref(), Self::VALID_DIAGRAMS)?;
        Ok(())
    }
}

/// Workspace configuration.
///
/// # Example
///
/// ```toml
/// contracts_dir = "contracts"
/// default_version = "v1"
///
/// [manifests]
/// kind = "go"
/// base_path = "example.com/repo"
/// exclude_dirs = ["third_party"]
///
/// [ownership]
/// warn_orphans = true
/// warn_multi_owned = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WorkspaceConfig {
    /// Contracts directory relative to the workspace root
    pub contracts_dir: Option<String>,

    /// Contract version loaded when none is requested
    pub default_version: Option<String>,

    /// Manifest discovery settings
    pub manifests: Option<ManifestsConfig>,

    /// Ownership report settings
    pub ownership: Option<OwnershipConfig>,
}

impl WorkspaceConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(dir) = &self.contracts_dir {
            let escapes = dir.split(['/', '\\']).any(|c| c == "..");
            if dir.trim().is_empty() || dir.starts_with('/') || escapes {
                return Err(ConfigError::InvalidValue(format!(
                    "contracts_dir '{dir}' must be a relative path inside the workspace"
                )));
            }
        }

        if let Some(version) = &self.default_version {
            if version.trim().is_empty() || version.contains(['/', '\\']) || version == ".." {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid default_version '{version}'"
                )));
            }
        }

        if let Some(manifests) = &self.manifests {
            manifests.validate()?;
        }

        Ok(())
    }
}

/// Manifest discovery settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestsConfig {
    /// Manifest kind (only "go")
    pub kind: Option<String>,

    /// Shared prefix of internal module paths
    pub base_path: Option<String>,

    /// Extra directory names skipped during discovery
    pub exclude_dirs: Option<Vec<String>>,
}

impl ManifestsConfig {
    /// Valid manifest kinds.
    pub const VALID_KINDS: &'static [&'static str] = &["go"];

    /// Validate the manifest settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_one_of("manifests.kind", self.kind.as_deref(), Self::VALID_KINDS)?;

        if let Some(base) = &self.base_path {
            if base.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "manifests.base_path cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Ownership report settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OwnershipConfig {
    /// Warn about files no module owns
    pub warn_orphans: Option<bool>,

    /// Warn about files owned by several modules
    pub warn_multi_owned: Option<bool>,
}

fn check_one_of(key: &str, value: Option<&str>, valid: &[&str]) -> Result<(), ConfigError> {
    match value {
        Some(v) if !valid.contains(&v) => Err(ConfigError::InvalidValue(format!(
            "invalid {key} '{v}', must be one of: {}",
            valid.join(", ")
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod global_config {
        use super::*;

        #[test]
        fn defaults() {
            let config = GlobalConfig::default();
            assert!(config.verbosity.is_none());
            assert!(config.format.is_none());
            assert!(config.validate().is_ok());
        }

        #[test]
        fn invalid_format() {
            let config = GlobalConfig {
                format: Some("yaml".to_string()),
                ..Default::default()
            };
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("text, json"));
        }

        #[test]
        fn invalid_diagram() {
            let config = GlobalConfig {
                diagram: Some("graphviz".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn roundtrip() {
            let config = GlobalConfig {
                verbosity: Some("debug".to_string()),
                format: Some("json".to_string()),
                diagram: Some("plantuml".to_string()),
            };

            let toml = toml::to_string_pretty(&config).unwrap();
            let parsed: GlobalConfig = toml::from_str(&toml).unwrap();
            assert_eq!(config, parsed);
        }
    }

    mod workspace_config {
        use super::*;

        #[test]
        fn contracts_dir_must_stay_inside() {
            for bad in ["", "/abs", "../up", "a/../../b"] {
                let config = WorkspaceConfig {
                    contracts_dir: Some(bad.to_string()),
                    ..Default::default()
                };
                assert!(config.validate().is_err(), "accepted '{bad}'");
            }
        }

        #[test]
        fn version_cannot_be_path() {
            let config = WorkspaceConfig {
                default_version: Some("v1/x".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn unsupported_manifest_kind() {
            let config = WorkspaceConfig {
                manifests: Some(ManifestsConfig {
                    kind: Some("cargo".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn parses_tables() {
            let toml = r#"
                contracts_dir = "meta/contracts"

                [manifests]
                base_path = "example.com/repo"
                exclude_dirs = ["third_party"]

                [ownership]
                warn_orphans = false
            "#;

            let config: WorkspaceConfig = toml::from_str(toml).unwrap();
            assert!(config.validate().is_ok());
            assert_eq!(config.contracts_dir.as_deref(), Some("meta/contracts"));
            assert_eq!(
                config.ownership.unwrap().warn_orphans,
                Some(false)
            );
        }

        #[test]
        fn reject_unknown_fields() {
            let toml = r#"
                contracts_dir = "contracts"
                unknown_field = true
            "#;

            let result: Result<WorkspaceConfig, _> = toml::from_str(toml);
            assert!(result.is_err());
        }
    }
}
