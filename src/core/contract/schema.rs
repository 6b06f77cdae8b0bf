//! core::contract::schema
//!
//! On-disk contract record and default application.
//!
//! # Schema Design
//!
//! - TOML, one file per module, camelCase keys
//! - Strictly parsed (unknown fields rejected)
//! - Every field except `moniker` is optional; defaults are applied by
//!   [`RawContract::into_contract`]
//!
//! # Example
//!
//! ```
//! use modgraph::core::contract::schema::parse_contract;
//!
//! let raw = parse_contract(r#"
//!     moniker = "sales-orders"
//!     parent = "sales"
//!     dependsOn = ["shared"]
//!
//!     [source]
//!     root = "sales/orders"
//!     includes = ["**/*"]
//! "#).unwrap();
//!
//! let contract = raw.into_contract().unwrap();
//! assert_eq!(contract.moniker.as_str(), "sales-orders");
//! assert_eq!(contract.parent.as_str(), "sales");
//! assert_eq!(contract.changelog_path, "sales/orders/CHANGELOG.md");
//! ```

use serde::Deserialize;
use thiserror::Error;

use super::{
    default_changelog_path, ModuleContract, Source, Versioning, CATCH_ALL_INCLUDE,
    DEFAULT_VERSION_SCHEME, NO_MODULE_TYPE,
};
use crate::core::paths::normalize_rel_path;
use crate::core::types::{Moniker, Parent, TypeError};

/// Errors from parsing a single contract record.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to parse contract: {0}")]
    ParseError(String),

    #[error("contract is missing a moniker")]
    EmptyMoniker,

    #[error("invalid moniker: {0}")]
    InvalidMoniker(#[source] TypeError),

    #[error("invalid {field} entry '{value}': {source}")]
    InvalidReference {
        field: &'static str,
        value: String,
        source: TypeError,
    },

    #[error("invalid {field} pattern '{pattern}': pattern cannot be empty or absolute")]
    InvalidPattern { field: &'static str, pattern: String },
}

/// Contract record as written on disk.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct RawContract {
    pub moniker: String,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub module_type: Option<String>,
    pub parent: Option<String>,
    pub source: Option<RawSource>,
    pub depends_on: Option<Vec<String>>,
    pub used_by: Option<Vec<String>>,
    pub versioning: Option<RawVersioning>,
    pub changelog_path: Option<String>,
}

/// `[source]` table as written on disk.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct RawSource {
    pub root: Option<String>,
    pub includes: Option<Vec<String>>,
    pub excludes: Option<Vec<String>>,
    pub exclude_children_owned_source: Option<bool>,
    pub is_catch_all_singleton: Option<bool>,
}

/// `[versioning]` table as written on disk.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct RawVersioning {
    pub version_scheme: Option<String>,
}

/// Parse contract TOML into a raw record.
///
/// # Errors
///
/// Returns `SchemaError::ParseError` for malformed TOML, wrong value types,
/// or unknown fields.
pub fn parse_contract(text: &str) -> Result<RawContract, SchemaError> {
    toml::from_str(text).map_err(|e| SchemaError::ParseError(e.to_string()))
}

impl RawContract {
    /// Apply defaults and validate into a [`ModuleContract`].
    ///
    /// # Errors
    ///
    /// Returns an error if the moniker is missing or invalid, a `parent`,
    /// `dependsOn` or `usedBy` entry is not a valid moniker, or a pattern is
    /// empty or absolute.
    pub fn into_contract(self) -> Result<ModuleContract, SchemaError> {
        let moniker_text = self.moniker.trim();
        if moniker_text.is_empty() {
            return Err(SchemaError::EmptyMoniker);
        }
        let moniker = Moniker::new(moniker_text).map_err(SchemaError::InvalidMoniker)?;

        let parent = match self.parent.as_deref() {
            None => Parent::Root,
            Some(p) => Parent::parse(p).map_err(|source| SchemaError::InvalidReference {
                field: "parent",
                value: p.to_string(),
                source,
            })?,
        };

        let raw_source = self.source.unwrap_or_default();
        let root = normalize_rel_path(raw_source.root.as_deref().unwrap_or("."));
        let is_catch_all = raw_source.is_catch_all_singleton.unwrap_or(false);

        let includes = match raw_source.includes {
            Some(includes) => includes,
            None if is_catch_all => vec![CATCH_ALL_INCLUDE.to_string()],
            None => Vec::new(),
        };
        let excludes = raw_source.excludes.unwrap_or_default();
        validate_patterns("includes", &includes)?;
        validate_patterns("excludes", &excludes)?;

        let depends_on = parse_monikers("dependsOn", self.depends_on.unwrap_or_default())?;
        let used_by = parse_monikers("usedBy", self.used_by.unwrap_or_default())?;

        let version_scheme = self
            .versioning
            .and_then(|v| v.version_scheme)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_VERSION_SCHEME.to_string());

        let changelog_path = self
            .changelog_path
            .filter(|p| !p.trim().is_empty())
            .map(|p| normalize_rel_path(&p))
            .unwrap_or_else(|| default_changelog_path(&root));

        Ok(ModuleContract {
            name: self
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| moniker.to_string()),
            description: self.description.unwrap_or_default(),
            module_type: self
                .module_type
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| NO_MODULE_TYPE.to_string()),
            parent,
            source: Source {
                root,
                includes,
                excludes,
                exclude_children_owned_source: raw_source
                    .exclude_children_owned_source
                    .unwrap_or(true),
                is_catch_all_singleton: is_catch_all,
            },
            depends_on,
            used_by,
            versioning: Versioning { version_scheme },
            changelog_path,
            moniker,
        })
    }
}

fn parse_monikers(field: &'static str, values: Vec<String>) -> Result<Vec<Moniker>, SchemaError> {
    values
        .into_iter()
        .map(|value| {
            Moniker::new(value.trim()).map_err(|source| SchemaError::InvalidReference {
                field,
                value,
                source,
            })
        })
        .collect()
}

fn validate_patterns(field: &'static str, patterns: &[String]) -> Result<(), SchemaError> {
    for pattern in patterns {
        if pattern.trim().is_empty() || pattern.starts_with('/') {
            return Err(SchemaError::InvalidPattern {
                field,
                pattern: pattern.clone(),
            });
        }
    }
    Ok(())
}
