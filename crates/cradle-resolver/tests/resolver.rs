use std::collections::BTreeMap;

use cradle_core::dependency::{DependencyCoordinate, ModuleId, VersionSource};
use cradle_resolver::platform::{PlatformCatalog, PlatformConstraint};
use cradle_resolver::precedence::PrecedenceDecision;
use cradle_resolver::resolver::{resolve, ResolveError};

fn coord(notation: &str) -> DependencyCoordinate {
    DependencyCoordinate::parse(notation).unwrap()
}

fn firebase_bom(version: &str, analytics: &str) -> PlatformConstraint {
    PlatformConstraint::new(format!("com.google.firebase:firebase-bom:{version}")).with_pin(
        ModuleId::new("com.google.firebase", "firebase-analytics"),
        analytics,
    )
}

#[test]
fn versionless_request_resolves_from_platform() {
    let platforms = [firebase_bom("33.0.0", "22.0.0")];
    let resolution = resolve(&[coord("com.google.firebase:firebase-analytics")], &platforms).unwrap();
    let analytics = resolution
        .get(&ModuleId::new("com.google.firebase", "firebase-analytics"))
        .unwrap();
    assert_eq!(analytics.version, "22.0.0");
    assert_eq!(
        analytics.source,
        VersionSource::Platform("com.google.firebase:firebase-bom:33.0.0".into())
    );
    assert!(resolution.report().is_empty());
}

#[test]
fn explicit_version_wins_over_platform() {
    let platforms = [firebase_bom("33.0.0", "22.0.0")];
    let resolution = resolve(
        &[coord("com.google.firebase:firebase-analytics:21.6.1")],
        &platforms,
    )
    .unwrap();
    let module = ModuleId::new("com.google.firebase", "firebase-analytics");
    let analytics = resolution.get(&module).unwrap();
    assert_eq!(analytics.version, "21.6.1");
    assert_eq!(analytics.source, VersionSource::Explicit);
    assert_eq!(
        resolution.report().for_module(&module).collect::<Vec<_>>(),
        [&PrecedenceDecision::ExplicitOverride {
            module: module.clone(),
            version: "21.6.1".into(),
            platform: "com.google.firebase:firebase-bom:33.0.0".into(),
            pinned: "22.0.0".into(),
        }]
    );
}

#[test]
fn earlier_platform_wins_and_is_recorded() {
    let platforms = [firebase_bom("33.0.0", "22.0.0"), firebase_bom("32.0.0", "21.3.0")];
    let resolution = resolve(&[coord("com.google.firebase:firebase-analytics")], &platforms).unwrap();
    let analytics = resolution.iter().next().unwrap();
    assert_eq!(analytics.version, "22.0.0");
    match resolution.report().decisions.as_slice() {
        [PrecedenceDecision::PlatformShadowed {
            shadowed_platform,
            shadowed_version,
            ..
        }] => {
            assert_eq!(shadowed_platform, "com.google.firebase:firebase-bom:32.0.0");
            assert_eq!(shadowed_version, "21.3.0");
        }
        other => panic!("unexpected decisions {other:?}"),
    }

    let reversed = [firebase_bom("32.0.0", "21.3.0"), firebase_bom("33.0.0", "22.0.0")];
    let resolution = resolve(&[coord("com.google.firebase:firebase-analytics")], &reversed).unwrap();
    assert_eq!(resolution.iter().next().unwrap().version, "21.3.0");
}

#[test]
fn agreeing_platforms_record_nothing() {
    let platforms = [firebase_bom("33.0.0", "22.0.0"), firebase_bom("33.0.1", "22.0")];
    let resolution = resolve(&[coord("com.google.firebase:firebase-analytics")], &platforms).unwrap();
    assert!(resolution.report().is_empty());
}

#[test]
fn conflicting_explicit_versions_fail() {
    let errors = resolve::<PlatformConstraint>(
        &[coord("androidx.core:core-ktx:1.12.0"), coord("androidx.core:core-ktx:1.13.1")],
        &[],
    )
    .unwrap_err();
    assert_eq!(
        errors,
        [ResolveError::VersionConflict {
            module: ModuleId::new("androidx.core", "core-ktx"),
            versions: vec!["1.12.0".into(), "1.13.1".into()],
        }]
    );
}

#[test]
fn maven_equal_versions_do_not_conflict() {
    let resolution = resolve::<PlatformConstraint>(
        &[coord("g:a:1.0.0"), coord("g:a:1.0"), coord("g:a")],
        &[],
    )
    .unwrap();
    let resolved = resolution.get(&ModuleId::new("g", "a")).unwrap();
    assert_eq!(resolved.version, "1.0");
    assert_eq!(resolved.source, VersionSource::Explicit);
}

#[test]
fn all_errors_are_reported_sorted_by_module() {
    let errors = resolve::<PlatformConstraint>(
        &[
            coord("z.group:late"),
            coord("a.group:conflict:1"),
            coord("m.group:missing"),
            coord("a.group:conflict:2"),
        ],
        &[],
    )
    .unwrap_err();
    let modules: Vec<String> = errors
        .iter()
        .map(|e| e.module().unwrap().to_string())
        .collect();
    assert_eq!(modules, ["a.group:conflict", "m.group:missing", "z.group:late"]);
    assert!(matches!(errors[1], ResolveError::UnresolvedVersion { .. }));
}

#[test]
fn resolution_is_independent_of_request_order() {
    let platforms = [firebase_bom("33.0.0", "22.0.0")];
    let mut requests = vec![
        coord("com.google.firebase:firebase-analytics"),
        coord("androidx.core:core-ktx:1.12.0"),
        coord("com.squareup.okhttp3:okhttp:4.12.0"),
        coord("androidx.core:core-ktx:1.12"),
    ];
    let first = resolve(&requests, &platforms).unwrap();
    requests.reverse();
    let second = resolve(&requests, &platforms).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn borrowed_platforms_from_catalog() {
    let mut tables = BTreeMap::new();
    let mut pins = BTreeMap::new();
    pins.insert("com.google.firebase:firebase-analytics".to_string(), "22.0.0".to_string());
    tables.insert("com.google.firebase:firebase-bom:33.0.0".to_string(), pins);
    let catalog = PlatformCatalog::from_tables(&tables).unwrap();

    let imports = [coord("com.google.firebase:firebase-bom:33.0.0")];
    let selected = catalog.select(&imports).unwrap();
    let resolution = resolve(&[coord("com.google.firebase:firebase-analytics")], &selected).unwrap();
    assert_eq!(resolution.len(), 1);
}

#[test]
fn resolution_json_lists_versions() {
    let platforms = [firebase_bom("33.0.0", "22.0.0")];
    let resolution = resolve(&[coord("com.google.firebase:firebase-analytics")], &platforms).unwrap();
    let json = serde_json::to_value(&resolution).unwrap();
    assert_eq!(json["versions"][0]["version"], "22.0.0");
    assert_eq!(json["versions"][0]["source"]["kind"], "platform");
}
