use crate::engine::{self, InsertionOutcome, InsertionSpec, Plan, SourceDocument};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("Target file does not exist: {0}")]
    MissingFile(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Target file is not valid UTF-8: {0}")]
    Utf8(PathBuf),

    #[error("Failed to write {path}: {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PatchError {
    pub fn path(&self) -> &Path {
        match self {
            PatchError::MissingFile(path) | PatchError::Utf8(path) => path,
            PatchError::Read { path, .. } | PatchError::WriteFailure { path, .. } => path,
        }
    }
}

/// Weave `spec` into an in-memory text.
pub fn patch_text(text: &str, spec: &InsertionSpec) -> InsertionOutcome {
    engine::apply(&SourceDocument::new(text), spec)
}

/// Plan and splice `spec` into `document`, logging which strategy resolved.
pub(crate) fn weave(
    document: &SourceDocument,
    spec: &InsertionSpec,
    file: &Path,
) -> InsertionOutcome {
    let plan = engine::plan(document, spec);
    if let Plan::Insert { strategy, .. } = &plan {
        debug!(
            file = %file.display(),
            strategy = *strategy,
            anchor = %spec.anchors[*strategy],
            "anchor resolved"
        );
    }
    engine::realize(document, spec, plan)
}

/// Read the text of a patch target.
pub fn read_target(path: &Path) -> Result<String, PatchError> {
    let bytes = fs::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => PatchError::MissingFile(path.to_path_buf()),
        _ => PatchError::Read {
            path: path.to_path_buf(),
            source,
        },
    })?;
    String::from_utf8(bytes).map_err(|_| PatchError::Utf8(path.to_path_buf()))
}

/// Overwrite a patch target with new content.
///
/// A plain overwrite: a failed write leaves the file in whatever state the
/// write call left it.
pub fn write_target(path: &Path, content: &str) -> Result<(), PatchError> {
    fs::write(path, content).map_err(|source| PatchError::WriteFailure {
        path: path.to_path_buf(),
        source,
    })
}

/// Weave `spec` into the file at `path`.
///
/// The new content is computed fully in memory and written back in one go
/// only when the outcome is [`InsertionOutcome::Applied`]; otherwise the file
/// is not touched.
pub fn patch_file(
    path: impl AsRef<Path>,
    spec: &InsertionSpec,
) -> Result<InsertionOutcome, PatchError> {
    let path = path.as_ref();
    let document = SourceDocument::new(read_target(path)?);
    let outcome = weave(&document, spec, path);

    match &outcome {
        InsertionOutcome::Applied(new_text) => {
            write_target(path, new_text)?;
            info!(file = %path.display(), identity = %spec.identity, "fragment applied");
        }
        InsertionOutcome::AlreadyPresent => {
            debug!(file = %path.display(), identity = %spec.identity, "fragment already present");
        }
        InsertionOutcome::AnchorNotFound => {
            warn!(
                file = %path.display(),
                identity = %spec.identity,
                strategies = spec.anchors.len(),
                "no anchor strategy resolved"
            );
        }
    }

    Ok(outcome)
}

/// Weave several specs into the same file, one after another.
///
/// Each spec sees the file as left by the previous one, so later duplicate
/// checks observe earlier insertions. A failure on one spec does not stop the
/// rest.
pub fn patch_file_all(
    path: impl AsRef<Path>,
    specs: &[InsertionSpec],
) -> Vec<Result<InsertionOutcome, PatchError>> {
    let path = path.as_ref();
    specs.iter().map(|spec| patch_file(path, spec)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AnchorStrategy;

    fn seeder_spec() -> InsertionSpec {
        InsertionSpec::new("$this->call(OrderSeeder::class);", "OrderSeeder::class")
            .anchor(AnchorStrategy::block_body_end("public function run(): void"))
    }

    #[test]
    fn test_patch_file_applies_and_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("DatabaseSeeder.php");
        fs::write(
            &file_path,
            "class DatabaseSeeder\n{\n    public function run(): void\n    {\n    }\n}\n",
        )
        .unwrap();

        let first = patch_file(&file_path, &seeder_spec()).unwrap();
        assert!(first.is_applied());
        let after_first = fs::read_to_string(&file_path).unwrap();
        assert_eq!(
            after_first,
            "class DatabaseSeeder\n{\n    public function run(): void\n    {\n        $this->call(OrderSeeder::class);\n    }\n}\n"
        );

        let second = patch_file(&file_path, &seeder_spec()).unwrap();
        assert_eq!(second, InsertionOutcome::AlreadyPresent);
        assert_eq!(fs::read_to_string(&file_path).unwrap(), after_first);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("nope.php");
        let result = patch_file(&file_path, &seeder_spec());
        assert!(matches!(result, Err(PatchError::MissingFile(_))));
        assert!(!file_path.exists());
    }

    #[test]
    fn test_anchor_not_found_leaves_file_untouched() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("Other.php");
        fs::write(&file_path, "class Other {}\n").unwrap();

        let outcome = patch_file(&file_path, &seeder_spec()).unwrap();
        assert_eq!(outcome, InsertionOutcome::AnchorNotFound);
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "class Other {}\n");
    }

    #[test]
    #[cfg(unix)]
    fn test_write_failure_is_reported() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("DatabaseSeeder.php");
        let original = "class DatabaseSeeder\n{\n    public function run(): void\n    {\n    }\n}\n";
        fs::write(&file_path, original).unwrap();
        fs::set_permissions(&file_path, fs::Permissions::from_mode(0o444)).unwrap();
        if fs::OpenOptions::new().write(true).open(&file_path).is_ok() {
            // file modes are not enforced for this user (root)
            return;
        }

        let result = patch_file(&file_path, &seeder_spec());
        assert!(matches!(
            result,
            Err(PatchError::WriteFailure { ref path, .. }) if path == &file_path
        ));
        assert_eq!(fs::read_to_string(&file_path).unwrap(), original);
    }

    #[test]
    fn test_non_utf8_target() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("binary.php");
        fs::write(&file_path, [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(
            patch_file(&file_path, &seeder_spec()),
            Err(PatchError::Utf8(_))
        ));
    }

    #[test]
    fn test_sequential_specs_see_each_other() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("routes.php");
        fs::write(&file_path, "<?php\n\nuse A;\n").unwrap();

        let import = InsertionSpec::self_identified("use B;")
            .anchor(AnchorStrategy::last_literal_after("\nuse "));
        let results = patch_file_all(&file_path, &[import.clone(), import]);

        assert!(matches!(results[0], Ok(InsertionOutcome::Applied(_))));
        assert!(matches!(results[1], Ok(InsertionOutcome::AlreadyPresent)));
        assert_eq!(
            fs::read_to_string(&file_path).unwrap(),
            "<?php\n\nuse A;\nuse B;\n"
        );
    }
}
