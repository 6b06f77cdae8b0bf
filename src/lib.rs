//! modgraph - module contract registry and dependency graph engine
//!
//! modgraph lets a monorepo declare ownership boundaries as module
//! contracts, checks that those boundaries form a consistent parent tree and
//! dependency graph, resolves which files belong to which module, computes a
//! layered build order, and cross-checks declared dependencies against the
//! per-module build manifests.
//!
//! # Architecture
//!
//! - [`core`] - Domain types, contract loading, and the graph algorithms
//! - [`engine`] - Workspace facade: configuration, loading, diagnostics
//! - [`ui`] - Output and report rendering
//!
//! # Correctness Invariants
//!
//! 1. Monikers are unique and every parent chain reaches the root
//! 2. At most one module is the catch-all singleton
//! 3. Every input file is classified exactly once as single-owned,
//!    multi-owned, or orphaned
//! 4. A planned module never shares a layer with, or precedes, one of its
//!    dependencies

pub mod core;
pub mod engine;
pub mod ui;
