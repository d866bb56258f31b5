use crate::engine::{AnchorStrategy, InsertionSpec};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

/// A patch plan: a named list of fragments to weave into target files.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct PatchConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub patches: Vec<PatchDefinition>,
}

impl PatchConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.patches.is_empty() {
            issues.push(ValidationIssue::EmptyPatchList);
        }

        let mut seen = HashSet::new();
        for patch in &self.patches {
            let patch_id = if patch.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    patch_id: None,
                    field: "id",
                });
                None
            } else {
                if !seen.insert(patch.id.as_str()) {
                    issues.push(ValidationIssue::DuplicateId(patch.id.clone()));
                }
                Some(patch.id.clone())
            };

            if patch.file.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    patch_id: patch_id.clone(),
                    field: "file",
                });
            }
            if patch.spec.fragment.iter().all(|line| line.trim().is_empty()) {
                issues.push(ValidationIssue::MissingField {
                    patch_id: patch_id.clone(),
                    field: "fragment",
                });
            }
            if patch.spec.identity.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    patch_id: patch_id.clone(),
                    field: "identity",
                });
            } else {
                // A key the fragment cannot produce would never be found again
                let fragment = patch.spec.fragment.join("\n");
                for key in patch.spec.identity.keys() {
                    if !key.is_empty() && !fragment.contains(key.as_str()) {
                        issues.push(ValidationIssue::IdentityNotInFragment {
                            patch_id: patch_id.clone(),
                            key: key.clone(),
                        });
                    }
                }
            }
            if patch.spec.anchors.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    patch_id: patch_id.clone(),
                    field: "anchors",
                });
            }

            for anchor in &patch.spec.anchors {
                if let Some(field) = empty_anchor_field(anchor) {
                    issues.push(ValidationIssue::MissingField {
                        patch_id: patch_id.clone(),
                        field,
                    });
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

fn empty_anchor_field(anchor: &AnchorStrategy) -> Option<&'static str> {
    match anchor {
        AnchorStrategy::LiteralAfter {
            marker,
            from,
            through,
        } => {
            if marker.is_empty() {
                Some("anchors.marker")
            } else if from.as_deref() == Some("") {
                Some("anchors.from")
            } else if through.as_deref() == Some("") {
                Some("anchors.through")
            } else {
                None
            }
        }
        AnchorStrategy::LiteralBefore { marker, from } => {
            if marker.is_empty() {
                Some("anchors.marker")
            } else if from.as_deref() == Some("") {
                Some("anchors.from")
            } else {
                None
            }
        }
        AnchorStrategy::LastLiteralAfter { marker, through } => {
            if marker.is_empty() {
                Some("anchors.marker")
            } else if through.as_deref() == Some("") {
                Some("anchors.through")
            } else {
                None
            }
        }
        AnchorStrategy::BlockBodyStart { header, .. } | AnchorStrategy::BlockBodyEnd { header, .. }
            if header.is_empty() =>
        {
            Some("anchors.header")
        }
        _ => None,
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Resolve `file` against the project root and keep it inside
    #[serde(default)]
    pub workspace_relative: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PatchDefinition {
    pub id: String,
    pub file: String,
    #[serde(flatten)]
    pub spec: InsertionSpec,
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyPatchList,
    MissingField {
        patch_id: Option<String>,
        field: &'static str,
    },
    DuplicateId(String),
    IdentityNotInFragment {
        patch_id: Option<String>,
        key: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyPatchList => write!(f, "patch plan contains no patches"),
            ValidationIssue::MissingField { patch_id, field } => match patch_id {
                Some(id) => write!(f, "patch '{id}' missing required field '{field}'"),
                None => write!(f, "patch missing required field '{field}'"),
            },
            ValidationIssue::DuplicateId(id) => write!(f, "patch id '{id}' is used more than once"),
            ValidationIssue::IdentityNotInFragment { patch_id, key } => match patch_id {
                Some(id) => write!(f, "patch '{id}' identity {key:?} does not occur in its fragment"),
                None => write!(f, "patch identity {key:?} does not occur in its fragment"),
            },
        }
    }
}
