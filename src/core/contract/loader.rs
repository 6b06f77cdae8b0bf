//! core::contract::loader
//!
//! Turns a directory of contract files into a verified [`Registry`].
//!
//! # Layout
//!
//! Contracts for version `<version>` live under
//! `<root>/<contracts_dir>/<version>/`, one `<moniker>.toml` per module, in
//! any subdirectory structure. Files are read in sorted path order.
//!
//! # Failure Policy
//!
//! Every failure here is fatal: the first bad file, duplicate moniker, or
//! structural violation aborts the load.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use super::schema::{parse_contract, SchemaError};
use super::{ModuleContract, CONTRACT_EXTENSION};
use crate::core::paths::WorkspacePaths;
use crate::core::registry::{Registry, RegistryError};
use crate::core::verify::{verify_structure, VerifyError};

/// Contracts directory used when configuration does not name one.
pub const DEFAULT_CONTRACTS_DIR: &str = "contracts";

/// Errors from loading contracts.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read contract file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to walk contracts directory '{path}': {message}")]
    WalkError { path: PathBuf, message: String },

    #[error("invalid contract file '{path}': {source}")]
    Contract { path: PathBuf, source: SchemaError },

    #[error("contract file name '{file_name}' does not match moniker '{moniker}' (expected '{moniker}.{CONTRACT_EXTENSION}')")]
    FilenameMismatch {
        path: PathBuf,
        file_name: String,
        moniker: String,
    },

    #[error("no contracts found in '{0}'")]
    NoContracts(PathBuf),

    #[error("failed to register contract from '{path}': {source}")]
    Registry {
        path: PathBuf,
        source: RegistryError,
    },

    #[error("structural validation failed: {0}")]
    Structure(#[from] VerifyError),
}

/// Load and default a single contract file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if its
/// basename is not `<moniker>.toml`.
pub fn load_contract(path: &Path) -> Result<ModuleContract, LoadError> {
    let text = fs::read_to_string(path).map_err(|e| LoadError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let contract = parse_contract(&text)
        .and_then(|raw| raw.into_contract())
        .map_err(|e| LoadError::Contract {
            path: path.to_path_buf(),
            source: e,
        })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let expected = format!("{}.{}", contract.moniker, CONTRACT_EXTENSION);
    if file_name != expected {
        return Err(LoadError::FilenameMismatch {
            path: path.to_path_buf(),
            file_name,
            moniker: contract.moniker.to_string(),
        });
    }

    Ok(contract)
}

/// Load the registry for `version` from the default contracts directory.
pub fn load_registry(workspace_root: &Path, version: &str) -> Result<Registry, LoadError> {
    load_registry_from(workspace_root, DEFAULT_CONTRACTS_DIR, version)
}

/// Load the registry for `version` from `<root>/<contracts_dir>/<version>`.
///
/// Runs the structural verification pass before returning.
///
/// # Errors
///
/// See [`LoadError`].
pub fn load_registry_from(
    workspace_root: &Path,
    contracts_dir: &str,
    version: &str,
) -> Result<Registry, LoadError> {
    let dir = WorkspacePaths::new(workspace_root.to_path_buf()).contracts_dir(contracts_dir, version);
    let files = discover_contract_files(&dir)?;
    if files.is_empty() {
        return Err(LoadError::NoContracts(dir));
    }

    let mut registry = Registry::new(version, workspace_root);
    for path in files {
        let contract = load_contract(&path)?;
        registry
            .add(contract)
            .map_err(|source| LoadError::Registry { path, source })?;
    }

    verify_structure(&registry).into_result()?;
    Ok(registry)
}

/// List contract files under `dir`, sorted by path.
///
/// A missing directory yields an empty list.
pub fn discover_contract_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| LoadError::WalkError {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_contract = entry
            .path()
            .extension()
            .is_some_and(|ext| ext == CONTRACT_EXTENSION);
        let is_hidden = entry.file_name().to_string_lossy().starts_with('.');
        if is_contract && !is_hidden {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}
