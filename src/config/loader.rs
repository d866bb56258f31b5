//! Patch plan loading: TOML text to a validated [`PatchConfig`].

use crate::config::schema::{PatchConfig, ValidationError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read patch plan {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed patch plan{}: {source}", origin(.path))]
    Toml {
        path: Option<PathBuf>,
        #[source]
        source: toml_edit::de::Error,
    },

    #[error("patch plan{} rejected:\n{source}", origin(.path))]
    Validation {
        path: Option<PathBuf>,
        #[source]
        source: ValidationError,
    },
}

impl ConfigError {
    /// Plan file the error came from, when it was loaded from disk.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Io { path, .. } => Some(path),
            ConfigError::Toml { path, .. } | ConfigError::Validation { path, .. } => {
                path.as_deref()
            }
        }
    }
}

fn origin(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|path| format!(" {}", path.display()))
        .unwrap_or_default()
}

/// Parse and validate a plan held in memory.
pub fn load_from_str(input: &str) -> Result<PatchConfig, ConfigError> {
    parse_plan(input, None)
}

/// Read, parse and validate the plan at `path`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<PatchConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_plan(&contents, Some(path))
}

fn parse_plan(input: &str, plan_path: Option<&Path>) -> Result<PatchConfig, ConfigError> {
    let config: PatchConfig = toml_edit::de::from_str(input).map_err(|source| ConfigError::Toml {
        path: plan_path.map(Path::to_path_buf),
        source,
    })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation {
            path: plan_path.map(Path::to_path_buf),
            source,
        })?;
    Ok(config)
}
