//! ui::output
//!
//! Verbosity-aware diagnostics on stderr.
//!
//! # Design
//!
//! Debug lines appear only at [`Verbosity::Debug`]. Warnings and finding
//! lists are suppressed at [`Verbosity::Quiet`]. Reports themselves are
//! returned as strings by [`crate::ui::render`] and never printed here.

use std::fmt::Display;

/// Output verbosity level, ordered from least to most output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Only errors reach the caller
    Quiet,
    #[default]
    Normal,
    /// Phase-by-phase load and compute tracing
    Debug,
}

impl Verbosity {
    /// Level from command-style flags. Quiet wins over debug.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        match (quiet, debug) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Debug,
            (false, false) => Verbosity::Normal,
        }
    }

    /// Parse a configured level ("quiet", "normal", "debug").
    pub fn parse(level: &str) -> Option<Self> {
        match level {
            "quiet" => Some(Verbosity::Quiet),
            "normal" => Some(Verbosity::Normal),
            "debug" => Some(Verbosity::Debug),
            _ => None,
        }
    }

    fn shows_warnings(self) -> bool {
        self >= Verbosity::Normal
    }
}

/// Trace a load or compute phase (debug only).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Warn about a non-fatal finding.
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity.shows_warnings() {
        eprintln!("warning: {}", message);
    }
}

/// Warn about a group of findings, one item per line under a summary.
///
/// Nothing is printed for an empty group.
pub fn warn_findings<T: Display>(summary: impl Display, items: &[T], verbosity: Verbosity) {
    if items.is_empty() {
        return;
    }
    warn(
        format!("{} ({}):\n{}", summary, items.len(), format_list(items, "  ")),
        verbosity,
    );
}

/// Indent each item with `prefix`, one per line.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}
