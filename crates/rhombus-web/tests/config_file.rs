//! Loading configuration from disk

use rhombus_web::{ConfigError, ServerConfig};
use std::io::Write;

#[test]
fn loads_toml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
public_url = "https://rhombus.example"
word = "DIAMOND"
max_lines = 99

[image]
model = "custom-model"
"#
    )
    .unwrap();

    let config = ServerConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.redirect_uri(), "https://rhombus.example/auth");
    assert_eq!(config.word().unwrap().len(), 7);
    assert_eq!(config.max_lines, Some(99));
    assert_eq!(config.image.model, "custom-model");
    assert_eq!(config.image.timeout_secs, 60);
}

#[test]
fn missing_file_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ServerConfig::load(Some(dir.path().join("absent.toml").as_path())).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn invalid_values_rejected_on_load() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, r#"word = """#).unwrap();
    let err = ServerConfig::load(Some(file.path())).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn shipped_example_parses() {
    let config =
        ServerConfig::from_toml_str(include_str!("../../../rhombus.example.toml")).unwrap();
    config.validate().unwrap();
    assert_eq!(config.max_lines, Some(1001));
    assert_eq!(config.oauth.scopes, ["email", "profile"]);
}
