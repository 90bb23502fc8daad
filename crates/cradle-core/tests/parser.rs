use cradle_core::parser::{parse, ROOT};
use cradle_core::value::Value;
use std::path::PathBuf;

fn fixture(path: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests/fixtures")
        .join(path);
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn parses_flutter_app_descriptor() {
    let root = parse(&fixture("flutter-app/build.gradle.kts")).unwrap();
    assert_eq!(root.name, ROOT);

    let plugins = root.block("plugins").unwrap();
    assert_eq!(plugins.invocations().len(), 4);
    assert_eq!(plugins.invocations()[0].single_string(), Some("com.android.application"));

    let android = root.block("android").unwrap();
    assert_eq!(android.string("namespace"), Some("com.example.egypttest"));
    assert_eq!(
        android.get("compileSdk"),
        Some(&Value::VersionRef("flutter.compileSdkVersion".into()))
    );
    assert_eq!(
        root.path("android.kotlinOptions").unwrap().get("jvmTarget"),
        Some(&Value::VersionRef("JavaVersion.VERSION_11.toString()".into()))
    );

    let default_config = root.path("android.defaultConfig").unwrap();
    assert_eq!(default_config.get("minSdk"), Some(&Value::Integer(23)));
    assert_eq!(
        default_config.get("targetSdk"),
        Some(&Value::VersionRef("flutter.targetSdkVersion".into()))
    );

    let release = root.path("android.signingConfigs.release").unwrap();
    assert_eq!(release.name, "create");
    assert_eq!(release.get("storeFile"), Some(&Value::FileRef("release.jks".into())));

    let release_type = root.path("android.buildTypes.release").unwrap();
    assert_eq!(
        release_type.get("signingConfig"),
        Some(&Value::SigningRef("release".into()))
    );

    let deps = root.block("dependencies").unwrap();
    assert_eq!(deps.invocations().len(), 2);
    match &deps.invocations()[0].args[0] {
        Value::Call(call) => {
            assert_eq!(call.name, "platform");
            assert_eq!(call.single_string(), Some("com.google.firebase:firebase-bom:33.0.0"));
        }
        other => panic!("expected platform call, got {other:?}"),
    }
}

#[test]
fn parses_flutter_root_descriptor() {
    let root = parse(&fixture("flutter-root/build.gradle.kts")).unwrap();
    let classpath = root.path("buildscript.dependencies").unwrap().invocations();
    assert_eq!(classpath.len(), 3);
    assert!(classpath.iter().all(|i| i.name == "classpath"));

    let clean = root.block("clean").unwrap();
    assert_eq!(clean.name, "tasks.register<Delete>");
    assert_eq!(clean.label.as_deref(), Some("clean"));
    assert_eq!(
        clean.invocations()[0].args,
        vec![Value::VersionRef("rootProject.layout.buildDirectory".into())]
    );

    let repos = root.path("allprojects.repositories").unwrap().invocations();
    let names: Vec<&str> = repos.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["google", "mavenCentral"]);
}

#[test]
fn brace_on_next_line_opens_block() {
    let root = parse("android\n{\n  minSdk = 21\n}").unwrap();
    assert_eq!(root.block("android").unwrap().get("minSdk"), Some(&Value::Integer(21)));
}

#[test]
fn reopened_block_merges_into_first() {
    let root = parse("android {\n  minSdk = 21\n}\nandroid {\n  namespace = \"x\"\n}").unwrap();
    let android = root.block("android").unwrap();
    assert_eq!(android.get("minSdk"), Some(&Value::Integer(21)));
    assert_eq!(android.string("namespace"), Some("x"));
    assert_eq!(root.entries().len(), 1);
}

#[test]
fn dotted_assignment_creates_nested_blocks() {
    let root = parse("android.defaultConfig.minSdk = 24").unwrap();
    assert_eq!(
        root.path("android.defaultConfig").unwrap().get("minSdk"),
        Some(&Value::Integer(24))
    );
}

#[test]
fn plus_assign_extends_lists() {
    let root = parse("dims += listOf(\"a\")\ndims += listOf(\"b\", \"c\")").unwrap();
    assert_eq!(
        root.get("dims"),
        Some(&Value::List(vec![
            Value::String("a".into()),
            Value::String("b".into()),
            Value::String("c".into()),
        ]))
    );
}

#[test]
fn semicolons_separate_statements() {
    let root = parse("a = 1; b = true; c = signingConfigs.debug").unwrap();
    assert_eq!(root.get("a"), Some(&Value::Integer(1)));
    assert_eq!(root.get("b"), Some(&Value::Boolean(true)));
    assert_eq!(root.get("c"), Some(&Value::SigningRef("debug".into())));
}

#[test]
fn comments_are_ignored() {
    let root = parse("/* header\n comment */\na = \"x\" // trailing\n").unwrap();
    assert_eq!(root.string("a"), Some("x"));
}

#[test]
fn unclosed_brace_reports_opening_line() {
    let err = parse("plugins {\n  id(\"a\")\n\nandroid {\n").unwrap_err();
    assert!(err.message.contains("unbalanced braces"), "{}", err.message);
    assert!(err.message.contains("line 4"), "{}", err.message);
    assert_eq!(err.line, 4);
}

#[test]
fn stray_closing_brace_is_rejected() {
    let err = parse("a = 1\n}").unwrap_err();
    assert!(err.message.contains("unmatched '}'"));
    assert_eq!((err.line, err.column), (2, 1));
}

#[test]
fn unterminated_string_is_rejected() {
    let err = parse("id(\"com.android").unwrap_err();
    assert_eq!(err.message, "unterminated string literal");
    assert_eq!((err.line, err.column), (1, 4));
}

#[test]
fn fractional_number_cannot_be_typed() {
    let err = parse("ratio = 1.5").unwrap_err();
    assert!(err.message.starts_with("cannot type value"));
}

#[test]
fn null_cannot_be_typed() {
    let err = parse("applicationIdSuffix = null").unwrap_err();
    assert!(err.message.starts_with("cannot type value"));
}

#[test]
fn duplicate_assignment_is_rejected() {
    let err = parse("minSdk = 21\nminSdk = 23").unwrap_err();
    assert!(err.message.contains("duplicate assignment to `minSdk`"));
    assert_eq!(err.line, 2);
}

#[test]
fn block_and_value_under_one_key_is_rejected() {
    let err = parse("flutter = 1\nflutter {\n}").unwrap_err();
    assert!(err.message.contains("cannot also be a block"));
}

#[test]
fn syntax_error_display_carries_position() {
    let err = parse("a = =").unwrap_err();
    assert!(err.to_string().ends_with("(line 1, column 5)"), "{err}");
}
