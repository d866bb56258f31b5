//! Patch plan runner - applies every patch of a plan, in order
//!
//! This module provides high-level plan application that:
//! - Resolves target files against the project root and guards the boundary
//! - Checks whether each fragment is already present
//! - Applies each fragment against the result of the previous patch
//! - Reports a result per patch without aborting the run

use crate::config::schema::{PatchConfig, PatchDefinition};
use crate::engine::{InsertionOutcome, SourceDocument};
use crate::patch::{read_target, weave, write_target, PatchError};
use crate::report::{near_miss, unified_diff};
use crate::safety::{SafetyError, WorkspaceGuard};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, info_span, warn};

/// Result of applying a single patch
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PatchResult should be checked for applied/already-present/not-found"]
pub enum PatchResult {
    /// Fragment was inserted (or would be, in a dry run)
    Applied { file: PathBuf, diff: String },
    /// Fragment was already present
    AlreadyPresent { file: PathBuf },
    /// No anchor strategy resolved; the file needs a manual edit
    AnchorNotFound { file: PathBuf, hint: Option<String> },
}

impl PatchResult {
    pub fn file(&self) -> &Path {
        match self {
            PatchResult::Applied { file, .. }
            | PatchResult::AlreadyPresent { file }
            | PatchResult::AnchorNotFound { file, .. } => file,
        }
    }
}

impl fmt::Display for PatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchResult::Applied { file, .. } => {
                write!(f, "Applied patch to {}", file.display())
            }
            PatchResult::AlreadyPresent { file } => {
                write!(f, "Already present in {}", file.display())
            }
            PatchResult::AnchorNotFound { file, hint } => {
                write!(f, "No insertion point found in {}", file.display())?;
                if let Some(hint) = hint {
                    write!(f, " ({hint})")?;
                }
                Ok(())
            }
        }
    }
}

/// Errors during plan application
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("patch error: {0}")]
    Patch(#[from] PatchError),

    #[error("unsafe target {file}: {source}")]
    Safety {
        file: PathBuf,
        #[source]
        source: SafetyError,
    },

    /// The project root itself could not be resolved; reported for every patch
    #[error("invalid workspace root {root}: {source}")]
    Workspace {
        root: PathBuf,
        #[source]
        source: Arc<SafetyError>,
    },
}

/// Whether the runner touches the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Write every applied patch back to its file
    #[default]
    Write,
    /// Chain patches in memory only; files are left untouched
    DryRun,
}

/// Apply a patch plan to a project
///
/// # Arguments
///
/// * `config` - The patch plan to apply
/// * `workspace_root` - Root directory of the project
/// * `mode` - Write to disk or only simulate
///
/// # Returns
///
/// One result per patch, in plan order
pub fn apply_plan(
    config: &PatchConfig,
    workspace_root: &Path,
    mode: RunMode,
) -> Vec<(String, Result<PatchResult, ApplicationError>)> {
    let guard = if config.meta.workspace_relative {
        match WorkspaceGuard::new(workspace_root) {
            Ok(guard) => Some(guard),
            Err(source) => {
                warn!(root = %workspace_root.display(), error = %source, "workspace root rejected");
                let source = Arc::new(source);
                return config
                    .patches
                    .iter()
                    .map(|patch| {
                        let error = ApplicationError::Workspace {
                            root: workspace_root.to_path_buf(),
                            source: Arc::clone(&source),
                        };
                        (patch.id.clone(), Err(error))
                    })
                    .collect();
            }
        }
    } else {
        None
    };

    // In a dry run later patches must still observe earlier ones, so the
    // simulated content of each touched file is kept here, keyed by the
    // resolved path.
    let mut pending: HashMap<PathBuf, String> = HashMap::new();

    config
        .patches
        .iter()
        .map(|patch| {
            let _span = info_span!("patch", id = %patch.id).entered();
            let result = resolve_target(guard.as_ref(), patch)
                .and_then(|file| apply_one(patch, file, mode, &mut pending));
            if let Err(e) = &result {
                warn!(error = %e, "patch failed");
            }
            (patch.id.clone(), result)
        })
        .collect()
}

/// Check plan status without mutating the project.
///
/// Mirrors `apply_plan` result semantics (`Applied` means "would apply").
pub fn check_plan(
    config: &PatchConfig,
    workspace_root: &Path,
) -> Vec<(String, Result<PatchResult, ApplicationError>)> {
    apply_plan(config, workspace_root, RunMode::DryRun)
}

/// Path to patch: the guard's canonical path for workspace-relative plans,
/// the declared path otherwise.
fn resolve_target(
    guard: Option<&WorkspaceGuard>,
    patch: &PatchDefinition,
) -> Result<PathBuf, ApplicationError> {
    let file_path = match guard {
        Some(guard) => guard.workspace_root().join(&patch.file),
        None => PathBuf::from(&patch.file),
    };

    if !file_path.exists() {
        return Err(PatchError::MissingFile(file_path).into());
    }

    match guard {
        Some(guard) => guard
            .validate_path(&file_path)
            .map_err(|source| ApplicationError::Safety {
                file: file_path,
                source,
            }),
        None => Ok(file_path),
    }
}

fn apply_one(
    patch: &PatchDefinition,
    file: PathBuf,
    mode: RunMode,
    pending: &mut HashMap<PathBuf, String>,
) -> Result<PatchResult, ApplicationError> {
    let original = match pending.get(&file) {
        Some(content) => content.clone(),
        None => read_target(&file)?,
    };
    let document = SourceDocument::new(original.as_str());

    match weave(&document, &patch.spec, &file) {
        InsertionOutcome::Applied(new_text) => {
            let diff = unified_diff(&file, &original, &new_text);
            match mode {
                RunMode::Write => {
                    write_target(&file, &new_text)?;
                    info!(file = %file.display(), "fragment applied");
                }
                RunMode::DryRun => {
                    debug!(file = %file.display(), "fragment would be applied");
                    pending.insert(file.clone(), new_text);
                }
            }
            Ok(PatchResult::Applied { file, diff })
        }
        InsertionOutcome::AlreadyPresent => {
            debug!(file = %file.display(), identity = %patch.spec.identity, "fragment already present");
            Ok(PatchResult::AlreadyPresent { file })
        }
        InsertionOutcome::AnchorNotFound => {
            let hint = near_miss(&document, &patch.spec).map(|miss| miss.to_string());
            warn!(
                file = %file.display(),
                strategies = patch.spec.anchors.len(),
                hint = hint.as_deref().unwrap_or("none"),
                "no anchor strategy resolved"
            );
            Ok(PatchResult::AnchorNotFound { file, hint })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_plan_has_no_results() {
        let config = PatchConfig::default();
        let results = apply_plan(&config, Path::new("/tmp"), RunMode::Write);
        assert!(results.is_empty());
    }

    #[test]
    fn test_missing_workspace_root_fails_every_patch() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing_root = temp_dir.path().join("gone");
        let config: PatchConfig = crate::config::load_from_str(
            r#"
[meta]
workspace_relative = true

[[patches]]
id = "a"
file = "routes/web.php"
fragment = "a();"
identity = "a();"

[[patches.anchors]]
type = "end-of-document"

[[patches]]
id = "b"
file = "routes/api.php"
fragment = "b();"
identity = "b();"

[[patches.anchors]]
type = "end-of-document"
"#,
        )
        .unwrap();

        let results = apply_plan(&config, &missing_root, RunMode::Write);
        assert_eq!(results.len(), 2);
        for (_, result) in &results {
            assert!(matches!(
                result,
                Err(ApplicationError::Workspace { root, .. }) if root == &missing_root
            ));
        }
    }

    #[test]
    fn test_patch_result_display() {
        let applied = PatchResult::Applied {
            file: PathBuf::from("/tmp/web.php"),
            diff: String::new(),
        };
        assert!(applied.to_string().contains("Applied"));

        let present = PatchResult::AlreadyPresent {
            file: PathBuf::from("/tmp/web.php"),
        };
        assert!(present.to_string().contains("Already present"));

        let missing = PatchResult::AnchorNotFound {
            file: PathBuf::from("/tmp/web.php"),
            hint: Some("closest match is line 3".to_string()),
        };
        let rendered = missing.to_string();
        assert!(rendered.contains("No insertion point"));
        assert!(rendered.contains("line 3"));
        assert_eq!(missing.file(), Path::new("/tmp/web.php"));
    }
}
