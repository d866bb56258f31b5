//! Integration tests for loading and running patch plans
//!
//! Covers plan ordering, dry runs, near-miss hints and workspace guarding

use feature_patcher::config::{
    apply_plan, check_plan, load_from_path, load_from_str, ApplicationError, PatchResult, RunMode,
};
use feature_patcher::patch::PatchError;
use feature_patcher::safety::SafetyError;
use std::fs;
use tempfile::TempDir;

const ROUTES_PLAN: &str = r#"
[meta]
name = "order-routes"
workspace_relative = true

[[patches]]
id = "controller-import"
file = "routes/web.php"
fragment = "use App\\Http\\Controllers\\OrderController;"
identity = "use App\\Http\\Controllers\\OrderController;"

[[patches.anchors]]
type = "last-literal-after"
marker = "\nuse "
through = ";"

[[patches.anchors]]
type = "literal-after"
marker = "<?php"

[[patches]]
id = "resource-route"
file = "routes/web.php"
fragment = ["", "Route::resource('orders', OrderController::class);"]
identity = ["orders", "OrderController::class"]

[[patches.anchors]]
type = "end-of-document"
"#;

fn setup_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("routes")).unwrap();
    fs::write(
        dir.path().join("routes/web.php"),
        "<?php\n\nuse Illuminate\\Support\\Facades\\Route;\n",
    )
    .unwrap();
    dir
}

#[test]
fn test_plan_applies_in_order() {
    let workspace = setup_workspace();
    let plan = load_from_str(ROUTES_PLAN).unwrap();

    let results = apply_plan(&plan, workspace.path(), RunMode::Write);
    let ids: Vec<&str> = results.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["controller-import", "resource-route"]);

    match &results[0].1 {
        Ok(PatchResult::Applied { diff, .. }) => {
            assert!(diff.contains("+use App\\Http\\Controllers\\OrderController;"));
        }
        other => panic!("expected applied import, got {other:?}"),
    }
    assert!(matches!(results[1].1, Ok(PatchResult::Applied { .. })));

    assert_eq!(
        fs::read_to_string(workspace.path().join("routes/web.php")).unwrap(),
        "<?php\n\nuse Illuminate\\Support\\Facades\\Route;\nuse App\\Http\\Controllers\\OrderController;\n\nRoute::resource('orders', OrderController::class);\n"
    );
}

#[test]
fn test_second_run_is_already_present() {
    let workspace = setup_workspace();
    let plan = load_from_str(ROUTES_PLAN).unwrap();

    let _ = apply_plan(&plan, workspace.path(), RunMode::Write);
    let patched = fs::read_to_string(workspace.path().join("routes/web.php")).unwrap();

    let results = apply_plan(&plan, workspace.path(), RunMode::Write);
    assert!(results
        .iter()
        .all(|(_, r)| matches!(r, Ok(PatchResult::AlreadyPresent { .. }))));
    assert_eq!(
        fs::read_to_string(workspace.path().join("routes/web.php")).unwrap(),
        patched
    );
}

#[test]
fn test_check_plan_chains_without_writing() {
    let workspace = setup_workspace();
    let plan = load_from_str(ROUTES_PLAN).unwrap();
    let before = fs::read_to_string(workspace.path().join("routes/web.php")).unwrap();

    let results = check_plan(&plan, workspace.path());
    assert!(results
        .iter()
        .all(|(_, r)| matches!(r, Ok(PatchResult::Applied { .. }))));

    // The route diff is computed against the simulated import, not the disk
    match &results[1].1 {
        Ok(PatchResult::Applied { diff, .. }) => {
            assert!(diff.contains("OrderController;"));
            assert!(diff.contains("+Route::resource('orders', OrderController::class);"));
        }
        other => panic!("expected applied route, got {other:?}"),
    }

    assert_eq!(
        fs::read_to_string(workspace.path().join("routes/web.php")).unwrap(),
        before
    );
}

#[test]
fn test_missing_file_does_not_stop_the_run() {
    let workspace = setup_workspace();
    let plan = load_from_str(&ROUTES_PLAN.replacen("routes/web.php", "routes/missing.php", 1))
        .unwrap();

    let results = apply_plan(&plan, workspace.path(), RunMode::Write);
    assert!(matches!(
        results[0].1,
        Err(ApplicationError::Patch(PatchError::MissingFile(_)))
    ));
    assert!(matches!(results[1].1, Ok(PatchResult::Applied { .. })));
    assert!(!workspace.path().join("routes/missing.php").exists());
}

#[test]
fn test_dry_run_overlay_follows_resolved_path() {
    let workspace = setup_workspace();
    let plan = load_from_str(
        r#"
[meta]
workspace_relative = true

[[patches]]
id = "import"
file = "routes/web.php"
fragment = "use App\\Http\\Controllers\\OrderController;"
identity = "use App\\Http\\Controllers\\OrderController;"

[[patches.anchors]]
type = "last-literal-after"
marker = "\nuse "
through = ";"

[[patches]]
id = "import-again"
file = "./routes/../routes/web.php"
fragment = "use App\\Http\\Controllers\\OrderController;"
identity = "use App\\Http\\Controllers\\OrderController;"

[[patches.anchors]]
type = "end-of-document"
"#,
    )
    .unwrap();

    let results = check_plan(&plan, workspace.path());
    assert!(matches!(results[0].1, Ok(PatchResult::Applied { .. })));
    match &results[1].1 {
        Ok(PatchResult::AlreadyPresent { file }) => {
            let canonical = workspace.path().join("routes/web.php").canonicalize().unwrap();
            assert_eq!(file, &canonical);
        }
        other => panic!("expected already present, got {other:?}"),
    }
}

#[test]
#[cfg(unix)]
fn test_write_failure_does_not_stop_the_run() {
    use std::os::unix::fs::PermissionsExt;

    let workspace = setup_workspace();
    let locked = workspace.path().join("routes/api.php");
    fs::write(&locked, "<?php\n").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o444)).unwrap();
    if fs::OpenOptions::new().write(true).open(&locked).is_ok() {
        // file modes are not enforced for this user (root)
        return;
    }

    let plan = load_from_str(&ROUTES_PLAN.replacen("routes/web.php", "routes/api.php", 1))
        .unwrap();
    let results = apply_plan(&plan, workspace.path(), RunMode::Write);

    assert!(matches!(
        results[0].1,
        Err(ApplicationError::Patch(PatchError::WriteFailure { .. }))
    ));
    assert!(matches!(results[1].1, Ok(PatchResult::Applied { .. })));
    assert_eq!(fs::read_to_string(&locked).unwrap(), "<?php\n");
}

#[test]
fn test_unresolved_anchor_reports_near_miss() {
    let workspace = TempDir::new().unwrap();
    let seeder = workspace.path().join("DatabaseSeeder.php");
    let original = "<?php\n\nclass A\n{\n    public function runAll()\n    {\n    }\n}\n";
    fs::write(&seeder, original).unwrap();

    let plan = load_from_str(
        r#"
[meta]
workspace_relative = true

[[patches]]
id = "seeder"
file = "DatabaseSeeder.php"
fragment = "$this->call(OrderSeeder::class);"
identity = "OrderSeeder::class"

[[patches.anchors]]
type = "block-body-end"
header = "public function run()"
"#,
    )
    .unwrap();

    let results = apply_plan(&plan, workspace.path(), RunMode::Write);
    match &results[0].1 {
        Ok(PatchResult::AnchorNotFound { hint, .. }) => {
            let hint = hint.as_deref().unwrap();
            assert!(hint.contains("line 5"), "unexpected hint: {hint}");
            assert!(hint.contains("runAll"));
        }
        other => panic!("expected anchor not found, got {other:?}"),
    }
    assert_eq!(fs::read_to_string(&seeder).unwrap(), original);
}

#[test]
fn test_guard_rejects_vendor_targets() {
    let workspace = TempDir::new().unwrap();
    let vendored = workspace.path().join("vendor/laravel/framework/routes.php");
    fs::create_dir_all(vendored.parent().unwrap()).unwrap();
    fs::write(&vendored, "<?php\n").unwrap();

    let plan = load_from_str(
        r#"
[meta]
workspace_relative = true

[[patches]]
id = "vendored"
file = "vendor/laravel/framework/routes.php"
fragment = "Route::get('/x', X::class);"
identity = "X::class"

[[patches.anchors]]
type = "end-of-document"
"#,
    )
    .unwrap();

    let results = apply_plan(&plan, workspace.path(), RunMode::Write);
    assert!(matches!(
        results[0].1,
        Err(ApplicationError::Safety {
            source: SafetyError::ForbiddenPath { .. },
            ..
        })
    ));
    assert_eq!(fs::read_to_string(&vendored).unwrap(), "<?php\n");
}

#[test]
fn test_guard_rejects_escaping_targets() {
    let outer = TempDir::new().unwrap();
    let workspace = outer.path().join("app");
    fs::create_dir_all(&workspace).unwrap();
    fs::write(outer.path().join("outside.php"), "<?php\n").unwrap();

    let plan = load_from_str(
        r#"
[meta]
workspace_relative = true

[[patches]]
id = "escape"
file = "../outside.php"
fragment = "echo 1;"
identity = "echo 1;"

[[patches.anchors]]
type = "end-of-document"
"#,
    )
    .unwrap();

    let results = apply_plan(&plan, &workspace, RunMode::Write);
    assert!(matches!(
        results[0].1,
        Err(ApplicationError::Safety {
            source: SafetyError::OutsideWorkspace { .. },
            ..
        })
    ));
}

#[test]
fn test_absolute_targets_without_workspace_relative() {
    let workspace = TempDir::new().unwrap();
    let target = workspace.path().join("web.php");
    fs::write(&target, "<?php\n").unwrap();

    let plan_path = workspace.path().join("plan.toml");
    fs::write(
        &plan_path,
        format!(
            r#"
[[patches]]
id = "absolute"
file = {:?}
fragment = "echo 1;"
identity = "echo 1;"

[[patches.anchors]]
type = "end-of-document"
"#,
            target.display().to_string()
        ),
    )
    .unwrap();

    let plan = load_from_path(&plan_path).unwrap();
    let results = apply_plan(&plan, workspace.path(), RunMode::Write);
    assert!(matches!(results[0].1, Ok(PatchResult::Applied { .. })));
    assert_eq!(fs::read_to_string(&target).unwrap(), "<?php\necho 1;\n");
}
