use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(deprecated)]
fn cradle_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("cradle").unwrap();
    cmd.env("HOME", home.path()).env("NO_COLOR", "1");
    cmd
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn test_resolve_flutter_app() {
    let home = TempDir::new().unwrap();

    cradle_cmd(&home)
        .current_dir(fixture("flutter-app"))
        .args(["resolve"])
        .assert()
        .success()
        .stdout(predicate::str::contains("release\n"))
        .stdout(predicate::str::contains("debug\n"))
        .stdout(predicate::str::contains(
            "com.google.firebase:firebase-analytics:22.0.0",
        ))
        .stdout(predicate::str::contains("sdk: min 23  target 34  compile 34"))
        .stdout(predicate::str::contains("12345678").not())
        .stderr(predicate::str::contains("2 variant(s) resolved"));
}

#[test]
fn test_resolve_json_keeps_secrets_out() {
    let home = TempDir::new().unwrap();

    let output = cradle_cmd(&home)
        .current_dir(fixture("flavored"))
        .args(["resolve", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(!stdout.contains("store-secret-1"));
    assert!(!stdout.contains("key-secret-2"));

    let variants: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let variants = variants.as_array().unwrap();
    assert_eq!(variants.len(), 8);
    let release = variants
        .iter()
        .find(|v| v["name"] == "freeStagingRelease")
        .unwrap();
    assert_eq!(release["signing"]["identity"], "release");
    assert_eq!(release["application-id"], "com.example.shop.free.staging");
}

#[test]
fn test_resolve_single_variant() {
    let home = TempDir::new().unwrap();

    cradle_cmd(&home)
        .current_dir(fixture("flavored"))
        .args(["resolve", "--variant", "paidProductionDebug"])
        .assert()
        .success()
        .stdout(predicate::str::contains("paidProductionDebug"))
        .stdout(predicate::str::contains("freeStagingRelease").not());
}

#[test]
fn test_resolve_missing_release_identity_fails() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("build.gradle.kts"),
        r#"
android {
    namespace = "com.example.unsigned"
    buildTypes {
        release {
            signingConfig = signingConfigs.getByName("release")
        }
    }
}
"#,
    )
    .unwrap();

    cradle_cmd(&tmp)
        .current_dir(tmp.path())
        .args(["resolve"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("debug\n"))
        .stderr(predicate::str::contains("Failed release"))
        .stderr(predicate::str::contains("Failed debug").not())
        .stderr(predicate::str::contains("failed to resolve"));
}

#[test]
fn test_resolve_output_never_shows_env_secrets() {
    let home = TempDir::new().unwrap();

    cradle_cmd(&home)
        .current_dir(fixture("flavored"))
        .args(["--verbose", "resolve"])
        .assert()
        .success()
        .stdout(predicate::str::contains("store-secret-1").not())
        .stdout(predicate::str::contains("key-secret-2").not())
        .stderr(predicate::str::contains("store-secret-1").not())
        .stderr(predicate::str::contains("key-secret-2").not());
}

#[test]
fn test_verbose_names_unset_env_variables() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".cradle.env"), "SET_PW=visible-only-to-signer\n").unwrap();
    fs::write(
        tmp.path().join("build.gradle.kts"),
        r#"
android {
    namespace = "com.example.partial"
    signingConfigs {
        create("release") {
            storeFile = file("release.jks")
            storePassword = "${env:SET_PW}"
            keyAlias = "upload"
            keyPassword = "${env:CRADLE_TEST_UNSET_KEY_PW}"
        }
    }
}
"#,
    )
    .unwrap();

    cradle_cmd(&tmp)
        .current_dir(tmp.path())
        .args(["--verbose", "variants"])
        .assert()
        .success()
        .stderr(predicate::str::contains("CRADLE_TEST_UNSET_KEY_PW"))
        .stderr(predicate::str::contains("unset variable interpolated as empty"))
        .stderr(predicate::str::contains("visible-only-to-signer").not());
}
