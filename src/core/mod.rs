//! core
//!
//! Core domain types, schemas, and graph algorithms for modgraph.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Moniker, Parent, Fingerprint, etc.
//! - [`contract`] - Contract schema and loading
//! - [`registry`] - Immutable moniker-keyed module registry
//! - [`tree`] - Parent tree and parent-chain resolution
//! - [`verify`] - Structural and dependency verification
//! - [`ownership`] - File-to-module ownership resolution
//! - [`depgraph`] - Declared dependency graph and statistics
//! - [`plan`] - Layered execution planning
//! - [`manifest`] - Build manifest discovery
//! - [`reconcile`] - Declared vs. manifest dependency reconciliation
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Centralized workspace path routing
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - The registry is built once and never mutated afterwards
//! - Nothing in `core` prints; findings are returned as data

pub mod config;
pub mod contract;
pub mod depgraph;
pub mod manifest;
pub mod ownership;
pub mod paths;
pub mod plan;
pub mod reconcile;
pub mod registry;
pub mod tree;
pub mod types;
pub mod verify;
