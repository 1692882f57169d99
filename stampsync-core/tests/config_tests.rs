//! Config file error messages and layering, exercised through the public API.

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use stampsync_core::{config, Config, ConfigError, Overrides};
use std::path::PathBuf;

#[test]
fn corrupt_yaml_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("config.yaml");
    file.write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = config::load_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("config.yaml"), "must contain path, got: {err}");
}

#[test]
fn wrong_type_returns_parse_error() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("config.yaml");
    file.write_str("settle_ms: soon\n").expect("write");

    let err = config::load_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

#[test]
fn file_then_overrides_then_resolve() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("config.yaml");
    file.write_str(
        "repositories:\n  - /code/hud\nexternal_dir: /tmp/sl\nextension: lsl\nexternal_suffix: _Xed.lsl\n",
    )
    .expect("write");
    file.assert(predicate::path::exists());

    let cfg = config::load_at(file.path())
        .expect("load")
        .apply(Overrides {
            settle_ms: Some(10),
            ..Overrides::default()
        })
        .resolve()
        .expect("resolve");

    assert_eq!(cfg.repositories, vec![PathBuf::from("/code/hud")]);
    assert_eq!(cfg.external_dir, Some(PathBuf::from("/tmp/sl")));
    assert_eq!(cfg.settle_ms, 10);
}

#[test]
fn config_serializes_back_to_yaml() {
    let cfg = Config {
        repositories: vec![PathBuf::from("/code/hud")],
        ..Config::default()
    };
    let yaml = serde_yaml::to_string(&cfg).expect("serialize");
    assert!(yaml.contains("/code/hud"));
    assert!(!yaml.contains("external_dir"), "unset external_dir is omitted");
}
