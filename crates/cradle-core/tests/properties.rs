use cradle_core::properties::{environment, interpolate, load_env_file};
use std::collections::BTreeMap;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests/fixtures")
}

#[test]
fn test_load_env_from_fixture() {
    let env = load_env_file(&fixtures_dir().join("test.cradle.env")).unwrap();
    assert_eq!(env.get("STORE_PASSWORD").unwrap(), "store-secret-1");
    assert_eq!(env.get("KEY_PASSWORD").unwrap(), "key-secret-2");
    assert_eq!(env.get("CI_TOKEN").unwrap(), "ci-token-3");
    assert_eq!(env.len(), 3);
}

#[test]
fn load_env_file_nonexistent_path_returns_empty_map() {
    let env = load_env_file(std::path::Path::new("/nonexistent/.cradle.env")).unwrap();
    assert!(env.is_empty());
}

#[test]
fn interpolate_replaces_env_refs() {
    let mut env = BTreeMap::new();
    env.insert("PW".to_string(), "s3cret".to_string());
    assert_eq!(
        interpolate("storePassword = \"${env:PW}\"", &env),
        "storePassword = \"s3cret\""
    );
}

#[test]
fn interpolate_unknown_var_is_empty() {
    let env = BTreeMap::new();
    assert_eq!(
        interpolate("a${env:CRADLE_SURELY_UNSET_VARIABLE_42}b", &env),
        "ab"
    );
}

#[test]
fn interpolate_multiple_refs() {
    let mut env = BTreeMap::new();
    env.insert("A".to_string(), "1".to_string());
    env.insert("B".to_string(), "2".to_string());
    assert_eq!(interpolate("${env:A}-${env:B}-${env:A}", &env), "1-2-1");
}

#[test]
fn env_file_overrides_process_environment() {
    let mut file = BTreeMap::new();
    file.insert("PATH".to_string(), "from-file".to_string());
    let merged = environment(&file);
    assert_eq!(merged["PATH"], "from-file");
}
