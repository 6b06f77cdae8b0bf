//! core::manifest::gomod
//!
//! `go.mod` discovery and parsing.
//!
//! # Parsing
//!
//! Only the directives reconciliation needs are interpreted:
//!
//! - `module <path>`
//! - `require <path> <version>` and `require ( ... )` blocks
//!
//! `go`, `toolchain`, `replace`, `exclude`, `retract`, `tool`, `godebug` and
//! `ignore` (single-line or block form) are accepted and skipped. Trailing
//! `//` comments, including `// indirect`, are dropped. Anything else is a
//! syntax error.
//!
//! # Discovery
//!
//! Walks the workspace in sorted order, never descending into
//! [`EXCLUDED_DIRS`](super::EXCLUDED_DIRS), hidden directories, or the
//! configured extra directories. Requirements are returned as written;
//! deciding which ones are internal is left to reconciliation.

use std::fs;
use std::path::Path;

use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use super::{DiscoveredManifest, ManifestError, ManifestSource, EXCLUDED_DIRS};
use crate::core::paths::normalize_rel_path;

/// File name of a Go module manifest.
pub const GO_MOD: &str = "go.mod";

const SKIPPED_DIRECTIVES: &[&str] = &[
    "go", "toolchain", "replace", "exclude", "retract", "tool", "godebug", "ignore",
];

/// Parsed content of a `go.mod` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoMod {
    pub module: Option<String>,
    pub requires: Vec<String>,
}

/// Syntax error in a `go.mod` file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct GoModSyntaxError {
    /// 1-based line number.
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Require,
    Skipped,
}

/// Parse `go.mod` text.
///
/// # Example
///
/// ```
/// use modgraph::core::manifest::gomod::parse_go_mod;
///
/// let parsed = parse_go_mod(
///     "module example.com/repo/sales\n\
///      \n\
///      require (\n\
///          example.com/repo/shared v0.0.0\n\
///          github.com/pkg/errors v0.9.1 // indirect\n\
///      )\n",
/// ).unwrap();
///
/// assert_eq!(parsed.module.as_deref(), Some("example.com/repo/sales"));
/// assert_eq!(parsed.requires, vec!["example.com/repo/shared", "github.com/pkg/errors"]);
/// ```
pub fn parse_go_mod(text: &str) -> Result<GoMod, GoModSyntaxError> {
    let mut parsed = GoMod::default();
    let mut block: Option<(Block, usize)> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        if let Some((kind, _)) = block {
            if line == ")" {
                block = None;
            } else if kind == Block::Require {
                parsed.requires.push(first_token(line, line_no)?);
            }
            continue;
        }

        let (keyword, rest) = match line.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (line, ""),
        };

        match keyword {
            "module" => {
                let module = unquote(rest);
                if module.is_empty() {
                    return Err(syntax(line_no, "module directive without a path"));
                }
                parsed.module = Some(module.to_string());
            }
            "require" if rest == "(" => block = Some((Block::Require, line_no)),
            "require" => parsed.requires.push(first_token(rest, line_no)?),
            k if SKIPPED_DIRECTIVES.contains(&k) => {
                if rest == "(" {
                    block = Some((Block::Skipped, line_no));
                }
            }
            other => return Err(syntax(line_no, &format!("unknown directive '{other}'"))),
        }
    }

    if let Some((_, opened)) = block {
        return Err(syntax(opened, "unterminated block"));
    }

    Ok(parsed)
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn unquote(value: &str) -> &str {
    value.trim_matches(|c| c == '"' || c == '`')
}

fn first_token(rest: &str, line: usize) -> Result<String, GoModSyntaxError> {
    rest.split_whitespace()
        .next()
        .map(|token| unquote(token).to_string())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| syntax(line, "require directive without a module path"))
}

fn syntax(line: usize, message: &str) -> GoModSyntaxError {
    GoModSyntaxError {
        line,
        message: message.to_string(),
    }
}

/// Discovers `go.mod` files under a workspace.
#[derive(Debug, Clone, Default)]
pub struct GoModSource {
    base_path: Option<String>,
    exclude_dirs: Vec<String>,
}

impl GoModSource {
    /// Create a source; `base_path` is the shared prefix of internal
    /// module paths (e.g., `example.com/repo`).
    pub fn new(base_path: Option<String>) -> Self {
        Self {
            base_path: base_path.map(|b| b.trim_end_matches('/').to_string()),
            exclude_dirs: Vec::new(),
        }
    }

    /// Skip these directory names in addition to the defaults.
    pub fn with_exclude_dirs(mut self, dirs: Vec<String>) -> Self {
        self.exclude_dirs = dirs;
        self
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        name.starts_with('.')
            || EXCLUDED_DIRS.contains(&name.as_ref())
            || self.exclude_dirs.iter().any(|d| d == name.as_ref())
    }
}

impl ManifestSource for GoModSource {
    fn kind(&self) -> &'static str {
        "go"
    }

    fn base_path(&self) -> Option<&str> {
        self.base_path.as_deref()
    }

    fn discover(&self, root: &Path) -> Result<Vec<DiscoveredManifest>, ManifestError> {
        let mut manifests = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_excluded(e));

        for entry in walker {
            let entry = entry.map_err(|e| ManifestError::WalkError {
                path: root.to_path_buf(),
                message: e.to_string(),
            })?;
            if !entry.file_type().is_file() || entry.file_name() != GO_MOD {
                continue;
            }

            let path = entry.into_path();
            let text = fs::read_to_string(&path).map_err(|e| ManifestError::ReadError {
                path: path.clone(),
                source: e,
            })?;
            let parsed = parse_go_mod(&text).map_err(|e| ManifestError::ParseError {
                path: path.clone(),
                line: e.line,
                message: e.message,
            })?;
            let module_path = parsed
                .module
                .ok_or_else(|| ManifestError::MissingModule(path.clone()))?;

            let dir = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| normalize_rel_path(&p.to_string_lossy()))
                .unwrap_or_else(|| ".".to_string());

            manifests.push(DiscoveredManifest {
                path,
                dir,
                module_path,
                requires: Vec::new(),
            }
            .with_requires(parsed.requires));
        }

        Ok(manifests)
    }
}
