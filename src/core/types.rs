//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Moniker`] - Validated module identifier
//! - [`Parent`] - Parent reference (root sentinel or a module)
//! - [`UtcTimestamp`] - RFC3339 timestamp
//! - [`Fingerprint`] - Registry content hash for report traceability
//!
//! # Validation
//!
//! These types enforce validity at construction time. A moniker doubles as
//! the contract file name, so anything that cannot be a single path
//! component is rejected.
//!
//! # Examples
//!
//! ```
//! use modgraph::core::types::{Moniker, Parent};
//!
//! let moniker = Moniker::new("sales-orders").unwrap();
//! assert_eq!(moniker.as_str(), "sales-orders");
//!
//! assert!(Moniker::new("").is_err());
//! assert!(Moniker::new("sales/orders").is_err());
//!
//! assert_eq!(Parent::parse(".").unwrap(), Parent::Root);
//! assert_eq!(Parent::parse("sales").unwrap(), Parent::Module(Moniker::new("sales").unwrap()));
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// The root sentinel used in `parent` fields for top-level modules.
pub const ROOT_SENTINEL: &str = ".";

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid moniker: {0}")]
    InvalidMoniker(String),
}

/// A validated module moniker.
///
/// Monikers must:
/// - Not be empty
/// - Not be the root sentinel `.`
/// - Not start with `.` or `-`
/// - Not contain `/`, `\`, `"`, whitespace, or ASCII control characters
///
/// # Example
///
/// ```
/// use modgraph::core::types::Moniker;
///
/// let name = Moniker::new("shared").unwrap();
/// assert_eq!(name.as_str(), "shared");
///
/// assert!(Moniker::new(".").is_err());
/// assert!(Moniker::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Moniker(String);

impl Moniker {
    /// Create a new validated moniker.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidMoniker` if the value cannot name a module.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidMoniker("moniker cannot be empty".into()));
        }

        if name == ROOT_SENTINEL {
            return Err(TypeError::InvalidMoniker(format!(
                "moniker cannot be the root sentinel '{ROOT_SENTINEL}'"
            )));
        }

        if name.starts_with('.') {
            return Err(TypeError::InvalidMoniker(format!(
                "moniker '{name}' cannot start with '.'"
            )));
        }
        if name.starts_with('-') {
            return Err(TypeError::InvalidMoniker(format!(
                "moniker '{name}' cannot start with '-'"
            )));
        }

        for c in ['/', '\\', '"'] {
            if name.contains(c) {
                return Err(TypeError::InvalidMoniker(format!(
                    "moniker '{name}' cannot contain '{c}'"
                )));
            }
        }

        if name.chars().any(|c| c.is_whitespace() || c.is_ascii_control()) {
            return Err(TypeError::InvalidMoniker(format!(
                "moniker '{}' cannot contain whitespace or control characters",
                name.escape_debug()
            )));
        }

        Ok(())
    }

    /// Get the moniker as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Moniker {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for Moniker {
    type Error = TypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Moniker> for String {
    fn from(name: Moniker) -> Self {
        name.0
    }
}

impl AsRef<str> for Moniker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for Moniker {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Moniker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The parent of a module: either the synthetic root or another module.
///
/// Serialized as a plain string, with `.` (or an empty string) meaning root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Parent {
    /// Top-level module, owned by the synthetic root.
    #[default]
    Root,
    /// Owned by another module.
    Module(Moniker),
}

impl Parent {
    /// Parse a parent reference.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidMoniker` if the value is neither the root
    /// sentinel nor a valid moniker.
    pub fn parse(value: &str) -> Result<Self, TypeError> {
        let value = value.trim();
        if value.is_empty() || value == ROOT_SENTINEL {
            Ok(Parent::Root)
        } else {
            Moniker::new(value).map(Parent::Module)
        }
    }

    /// The parent moniker, or `None` for root.
    pub fn moniker(&self) -> Option<&Moniker> {
        match self {
            Parent::Root => None,
            Parent::Module(m) => Some(m),
        }
    }

    /// Whether this parent is the synthetic root.
    pub fn is_root(&self) -> bool {
        matches!(self, Parent::Root)
    }

    /// Get the parent as a string slice (`.` for root).
    pub fn as_str(&self) -> &str {
        match self {
            Parent::Root => ROOT_SENTINEL,
            Parent::Module(m) => m.as_str(),
        }
    }
}

impl TryFrom<String> for Parent {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Parent> for String {
    fn from(parent: Parent) -> Self {
        parent.as_str().to_string()
    }
}

impl std::fmt::Display for Parent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A UTC timestamp in RFC3339 format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtcTimestamp(chrono::DateTime<chrono::Utc>);

impl UtcTimestamp {
    /// Create a timestamp for the current moment.
    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }
}

impl std::fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// A stable hash over registry content.
///
/// Entries are `(key, content)` pairs sorted by key before hashing, so the
/// fingerprint does not depend on load order.
///
/// # Example
///
/// ```
/// use modgraph::core::types::Fingerprint;
///
/// let a = vec![("billing".to_string(), "x".to_string()), ("auth".to_string(), "y".to_string())];
/// let b = vec![("auth".to_string(), "y".to_string()), ("billing".to_string(), "x".to_string())];
///
/// assert_eq!(Fingerprint::compute(&a), Fingerprint::compute(&b));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute a fingerprint from a set of `(key, content)` pairs.
    pub fn compute(entries: &[(String, String)]) -> Self {
        let mut sorted: Vec<_> = entries.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        let mut hasher = Sha256::new();
        for (key, content) in sorted {
            hasher.update(key.as_bytes());
            hasher.update(b"\0");
            hasher.update(content.as_bytes());
            hasher.update(b"\n");
        }

        Self(hex::encode(hasher.finalize()))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get an abbreviated form for display.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
