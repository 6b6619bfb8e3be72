//! Configuration resolution tests
//!
//! Tests that manipulate ORGMIG_ROOT_FOLDER or ORGMIG_SOURCE_API_TOKEN are
//! marked #[serial] so they never race each other.

use orgmig_common::config::{
    default_root_folder, RootFolderInitializer, RootFolderResolver, TomlConfig, DEFAULT_TPS,
    ROOT_FOLDER_ENV, SOURCE_API_TOKEN_ENV,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let root_folder = RootFolderResolver::new().resolve();
    assert_eq!(root_folder, default_root_folder());
}

#[test]
#[serial]
fn test_cli_argument_beats_environment() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/orgmig-env");

    let resolver = RootFolderResolver::new().with_cli_arg(Some(PathBuf::from("/tmp/orgmig-cli")));
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/orgmig-cli"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_environment_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/orgmig-env");

    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/orgmig-toml")),
        ..Default::default()
    };
    let resolver = RootFolderResolver::new().with_toml(toml.clone());
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/orgmig-env"));

    env::remove_var(ROOT_FOLDER_ENV);
    let resolver = RootFolderResolver::new().with_toml(toml);
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/orgmig-toml"));
}

#[test]
fn test_toml_load_and_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
root_folder = "/srv/orgmig"
source_base_url = "https://live.example.org/api/migrator"
default_tps = 25
"#,
    )
    .unwrap();

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/orgmig")));
    assert_eq!(config.default_tps(), 25);
    assert_eq!(config.log_level(), "info");
    assert_eq!(config.bind_address(), "127.0.0.1:5741");
    assert_eq!(config.requested_by(), "migrator");

    assert_eq!(TomlConfig::default().default_tps(), DEFAULT_TPS);
}

#[test]
fn test_invalid_toml_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "default_tps = \"many\"").unwrap();

    let err = TomlConfig::load(&path).unwrap_err();
    assert!(matches!(err, orgmig_common::Error::Config(_)));
}

#[test]
#[serial]
fn test_source_token_environment_beats_toml() {
    let config = TomlConfig {
        source_api_token: Some("from-toml".to_string()),
        ..Default::default()
    };

    env::remove_var(SOURCE_API_TOKEN_ENV);
    assert_eq!(config.source_api_token().as_deref(), Some("from-toml"));

    env::set_var(SOURCE_API_TOKEN_ENV, "from-env");
    assert_eq!(config.source_api_token().as_deref(), Some("from-env"));
    env::remove_var(SOURCE_API_TOKEN_ENV);
}

#[test]
fn test_initializer_creates_log_folder() {
    let dir = tempfile::tempdir().unwrap();
    let initializer = RootFolderInitializer::new(dir.path().join("root"));

    initializer.ensure_directory_exists().unwrap();
    assert!(initializer.migration_log_dir().is_dir());
    assert_eq!(initializer.database_path(), dir.path().join("root").join("orgmig.db"));
}
