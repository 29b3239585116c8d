//! Tests for host configuration.

use super::*;
use vnscript_bytecode::{
    ArchiveWriter, CipherKey, Command, Marker, Scenario, ScenarioId, TextEncoding,
};

const TITLE: &str = "KEY\\Example";

fn title_key() -> CipherKey {
    CipherKey::windowed(vec![0xA8, 0x28, 0xFD, 0x66], 4, 64)
}

#[test]
fn test_config_from_yaml() {
    let yaml = r#"
apiVersion: vnscript/v1
kind: HostConfig

title: "KEY\\Example"
entry:
  scenario: 42
  entrypoint: 3
callStackLimit: 16

keys:
  "KEY\\Example":
    key: "a8 28 fd 66"
    offset: 4
    span: 64
  "KEY\\Other":
    key: "0102"
"#;

    let config = HostConfig::from_yaml(yaml).unwrap();
    assert_eq!(config.title.as_deref(), Some(TITLE));
    assert_eq!(config.entry, EntrySpec { scenario: 42, entrypoint: 3 });
    assert_eq!(config.call_stack_limit, 16);
    assert_eq!(config.cipher_key().unwrap(), title_key());

    let ring = config.key_ring().unwrap();
    assert_eq!(ring.titles().collect::<Vec<_>>(), vec![TITLE, "KEY\\Other"]);
    assert_eq!(ring.get("KEY\\Other"), Some(&CipherKey::new(vec![1, 2], 0)));

    let engine = config.engine_config();
    assert_eq!(engine.entry_scenario, ScenarioId::new(42));
    assert_eq!(engine.entrypoint, 3);
    assert_eq!(engine.call_stack_limit, 16);
}

#[test]
fn test_config_defaults() {
    let config = HostConfig::from_yaml("apiVersion: vnscript/v1\nkind: HostConfig\n").unwrap();
    assert_eq!(config, HostConfig::new());
    assert_eq!(config.entry, EntrySpec { scenario: 1, entrypoint: 0 });
    assert_eq!(config.call_stack_limit, vnscript_machine::DEFAULT_CALL_STACK_LIMIT);
    assert!(config.cipher_key().unwrap().is_identity());
}

#[test]
fn test_unknown_title_falls_back_to_identity() {
    let config = HostConfig::new()
        .with_key(TITLE, &title_key())
        .with_title("KEY\\Unregistered");
    assert!(config.cipher_key().unwrap().is_identity());
}

#[test]
fn test_invalid_api_version() {
    let err = HostConfig::from_yaml("apiVersion: vnscript/v0\nkind: HostConfig\n").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidApiVersion(v) if v == "vnscript/v0"));
}

#[test]
fn test_invalid_kind() {
    let err = HostConfig::from_yaml("apiVersion: vnscript/v1\nkind: Scenario\n").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidKind(k) if k == "Scenario"));
}

#[test]
fn test_entry_out_of_range() {
    let yaml = r#"
apiVersion: vnscript/v1
kind: HostConfig
entry:
  scenario: 10000
"#;
    let err = HostConfig::from_yaml(yaml).unwrap_err();
    assert!(matches!(err, ConfigError::EntryOutOfRange(10000)));
}

#[test]
fn test_zero_call_stack_limit() {
    let err = HostConfig::new().with_call_stack_limit(0).validate().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidCallStackLimit));
}

#[test]
fn test_malformed_keys() {
    let too_long = "00".repeat(MAX_KEY_LEN + 1);
    for key in ["", "abc", "zz", too_long.as_str()] {
        let yaml = format!(
            "apiVersion: vnscript/v1\nkind: HostConfig\nkeys:\n  t:\n    key: \"{key}\"\n"
        );
        let err = HostConfig::from_yaml(&yaml).unwrap_err();
        assert!(
            matches!(&err, ConfigError::InvalidKey { title, .. } if title == "t"),
            "key {key:?} gave {err}"
        );
    }
}

#[test]
fn test_yaml_syntax_error() {
    let err = HostConfig::from_yaml("apiVersion: [unclosed").unwrap_err();
    assert!(matches!(err, ConfigError::Yaml(_)));
}

#[test]
fn test_builder_serializes_back() {
    let config = HostConfig::new()
        .with_title(TITLE)
        .with_key(TITLE, &title_key())
        .with_entry(7, 2)
        .with_call_stack_limit(32);

    let yaml = config.to_yaml().unwrap();
    let parsed = HostConfig::from_yaml(&yaml).unwrap();
    assert_eq!(parsed, config);
    assert_eq!(parsed.keys[TITLE].key, "a8 28 fd 66");
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.yaml");
    let err = HostConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { path: p, .. } if p == path));
}

#[test]
fn test_open_archive_with_title_key() {
    let dir = tempfile::tempdir().unwrap();
    let archive_path = dir.path().join("SEEN.TXT");
    let scenario = Scenario::new(
        ScenarioId::new(5),
        TextEncoding::Utf8,
        vec![
            Marker::Entrypoint(0).into(),
            Command::new(1, 4, 0, 0).into(),
        ],
    );
    ArchiveWriter::new(title_key())
        .add_scenario(&scenario)
        .unwrap()
        .write_to(&archive_path)
        .unwrap();

    let config_path = dir.path().join("host.yaml");
    let config = HostConfig::new()
        .with_title(TITLE)
        .with_key(TITLE, &title_key())
        .with_entry(5, 0);
    std::fs::write(&config_path, config.to_yaml().unwrap()).unwrap();

    let loaded = HostConfig::load(&config_path).unwrap();
    let archive = loaded.open_archive(&archive_path).unwrap();
    assert_eq!(archive.key(), &title_key());
    assert_eq!(*archive.scenario(ScenarioId::new(5)).unwrap(), scenario);

    let err = HostConfig::new().open_archive(dir.path().join("nope")).unwrap_err();
    assert!(matches!(err, ConfigError::Archive(_)));
}
