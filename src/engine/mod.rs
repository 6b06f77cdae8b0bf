//! engine
//!
//! Orchestrates the workspace lifecycle: Config -> Load -> Verify -> Query.
//!
//! # Architecture
//!
//! The engine is the only layer that talks to the user. It loads
//! configuration, builds the registry through `core`, and emits diagnostics
//! through [`crate::ui::output`]. Errors from `core` are wrapped with the
//! operation and path that failed.
//!
//! 1. **Config**: Global and workspace configuration, precedence applied
//! 2. **Load**: Contract files for one version become a [`Registry`]
//! 3. **Verify**: Structural invariants are enforced before anything else
//!    trusts the tree
//! 4. **Query**: Graph, plan, ownership, reconciliation, and health reports
//!
//! # Invariants
//!
//! - The registry is loaded once per [`Workspace`] and never mutated
//! - Findings (orphans, discrepancies, `usedBy` mismatches) are warnings,
//!   never errors
//!
//! # Example
//!
//! ```no_run
//! use modgraph::engine::{Context, Workspace};
//! use std::path::Path;
//!
//! let ws = Workspace::open(Path::new("/path/to/repo"), &Context::default())?;
//! let plan = ws.plan(&["sales-orders"])?;
//! for (i, layer) in plan.layers.iter().enumerate() {
//!     println!("layer {i}: {layer:?}");
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! [`Registry`]: crate::core::registry::Registry

pub mod health;
pub mod workspace;

pub use health::{check, HealthReport, Issue, IssueId, Severity};
pub use workspace::{ImpactReport, Workspace};

use crate::core::config::Config;
use crate::ui::output::Verbosity;

/// Execution context for workspace operations.
///
/// Holds settings chosen by the caller that override configuration.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// Contract version to load instead of the configured default.
    pub version: Option<String>,
}

impl Context {
    /// Context for a specific contract version.
    pub fn for_version(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            ..Self::default()
        }
    }

    /// Effective verbosity: explicit flags win over configuration.
    pub fn verbosity(&self, config: &Config) -> Verbosity {
        if self.quiet || self.debug {
            Verbosity::from_flags(self.quiet, self.debug)
        } else {
            Verbosity::parse(config.verbosity()).unwrap_or_default()
        }
    }
}
