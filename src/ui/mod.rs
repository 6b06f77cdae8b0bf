//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Verbosity-aware printing and diagnostics
//! - [`render`] - Diagrams, text reports, and JSON envelopes
//!
//! # Design
//!
//! All printing goes through [`output`] so that quiet and debug levels are
//! honored consistently. [`render`] only builds strings.

pub mod output;
pub mod render;
