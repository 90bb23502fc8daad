use std::fs;
use std::path::PathBuf;

use cradle_core::config::GlobalConfig;
use cradle_ops::ops_check::{self, CheckSummary};
use cradle_ops::ops_deps;
use cradle_ops::ops_project::Project;
use cradle_ops::ops_resolve::PassFailed;
use cradle_ops::ops_variants;
use cradle_plugin::ordering::PluginOrderError;
use tempfile::TempDir;

fn fixture(path: &str) -> Project {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests/fixtures")
        .join(path);
    Project::from_descriptor(&path, &GlobalConfig::default()).unwrap()
}

fn project_in(dir: &TempDir, descriptor: &str) -> Project {
    let path = dir.path().join("build.gradle.kts");
    fs::write(&path, descriptor).unwrap();
    Project::from_descriptor(&path, &GlobalConfig::default()).unwrap()
}

#[test]
fn check_flavored_fixture() {
    let summary = ops_check::check(&fixture("flavored/build.gradle.kts")).unwrap();
    assert_eq!(
        summary,
        CheckSummary {
            plugins: 4,
            variants: 8,
            signed: 4,
        }
    );
}

#[test]
fn check_ignores_unreferenced_incomplete_identity() {
    let project = fixture("flavored/build.gradle.kts");
    let unused = project.identities.get("unused").unwrap();
    assert!(!unused.missing_fields().is_empty());
    assert!(ops_check::check(&project).is_ok());
}

#[test]
fn check_reports_incomplete_release_identity() {
    let dir = TempDir::new().unwrap();
    let project = project_in(
        &dir,
        r#"
android {
    namespace = "com.example.partial"
    signingConfigs {
        create("release") {
            storeFile = file("release.jks")
            keyAlias = "upload"
        }
    }
    buildTypes {
        release {
            signingConfig = signingConfigs.getByName("release")
        }
    }
}
"#,
    );
    let err = ops_check::check(&project).unwrap_err();
    let failed = err.downcast_ref::<PassFailed>().unwrap();
    assert_eq!(failed.total, 2);
    assert_eq!(failed.failures.len(), 1);
    assert_eq!(failed.failures[0].variant, "release");
    assert!(failed.failures[0].causes[0]
        .to_string()
        .contains("storePassword, keyPassword"));
}

#[test]
fn check_rejects_plugins_declared_too_late() {
    let dir = TempDir::new().unwrap();
    let project = project_in(
        &dir,
        r#"
plugins {
    id("com.google.gms.google-services")
    id("com.android.application")
}
"#,
    );
    let err = ops_check::check(&project).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PluginOrderError>(),
        Some(PluginOrderError::PrerequisiteOrder { .. })
    ));
}

#[test]
fn check_skips_version_resolution() {
    let dir = TempDir::new().unwrap();
    let project = project_in(&dir, "dependencies {\n    implementation(\"g:unversioned\")\n}\n");
    assert_eq!(ops_check::check(&project).unwrap().variants, 2);
    assert!(ops_deps::deps(&project, None).is_err());
}

#[test]
fn deps_reports_versions_without_signing() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("cradle.toml"),
        r#"
[platforms."g:bom:1.0"]
"g:a" = "1.5"
"g:b" = "2.0"
"#,
    )
    .unwrap();
    let project = project_in(
        &dir,
        r#"
android {
    buildTypes {
        release {
            signingConfig = signingConfigs.getByName("missing")
        }
    }
}

dependencies {
    implementation(platform("g:bom:1.0"))
    implementation("g:a")
    implementation("g:b:2.1")
}
"#,
    );
    let deps = ops_deps::deps(&project, Some("release")).unwrap();
    assert_eq!(deps.len(), 1);
    let text = ops_deps::render(&deps[0]);
    assert!(text.contains("g:a:1.5 (platform g:bom:1.0)"));
    assert!(text.contains("g:b:2.1 (explicit)"));
    assert!(text.contains("Precedence decisions (1):"));
}

#[test]
fn variants_lists_plans_in_order() {
    let summaries = ops_variants::variants(&fixture("flavored/build.gradle.kts")).unwrap();
    let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "freeStagingDebug",
            "freeStagingRelease",
            "freeProductionDebug",
            "freeProductionRelease",
            "paidStagingDebug",
            "paidStagingRelease",
            "paidProductionDebug",
            "paidProductionRelease",
        ]
    );
    assert_eq!(summaries[1].signing_config.as_deref(), Some("release"));
    assert_eq!(
        summaries[1].to_string(),
        "freeStagingRelease  com.example.shop.free.staging  signed by release"
    );
}
