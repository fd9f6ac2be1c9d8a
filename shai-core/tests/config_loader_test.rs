use shai_core::config::{ConfigError, ConfigManager};
use shai_core::{Messages, RiskTier, ShaiError};
use std::fs;

fn deepseek_env(name: &str) -> Option<String> {
    (name == "DEEPSEEK_API_KEY").then(|| "abc123".to_string())
}

#[test]
fn fresh_template_loads_with_environment_key() {
    let dir = tempfile::tempdir().unwrap();
    let manager = ConfigManager::new(dir.path().join("shai").join("config.yaml"));
    assert!(!manager.exists());

    manager.write_template(None).unwrap();
    assert!(manager.exists());

    let config = manager.load_with_env(None, deepseek_env).unwrap();
    assert_eq!(config.default_model, "deepseek");
    assert_eq!(config.model().id, "deepseek-chat");
    assert_eq!(config.provider_name(), "deepseek");
    assert_eq!(config.provider().api_key, "abc123");
}

#[test]
fn loading_twice_gives_the_same_result() {
    let dir = tempfile::tempdir().unwrap();
    let manager = ConfigManager::new(dir.path().join("config.yaml"));
    manager.write_template(None).unwrap();

    let first = manager.load_with_env(None, deepseek_env).unwrap();
    let second = manager.load_with_env(None, deepseek_env).unwrap();
    assert_eq!(first, second);
}

#[test]
fn unset_key_names_the_variable() {
    let dir = tempfile::tempdir().unwrap();
    let manager = ConfigManager::new(dir.path().join("config.yaml"));
    manager.write_template(None).unwrap();

    match manager.load_with_env(None, |_: &str| None) {
        Err(ShaiError::MissingSecret(e)) => assert_eq!(e.name, "DEEPSEEK_API_KEY"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn key_entered_on_first_run_is_stored() {
    let dir = tempfile::tempdir().unwrap();
    let manager = ConfigManager::new(dir.path().join("config.yaml"));
    manager.write_template(Some("sk-entered")).unwrap();

    let config = manager.load_with_env(None, |_: &str| None).unwrap();
    assert_eq!(config.provider().api_key, "sk-entered");
}

#[test]
fn missing_providers_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    fs::write(
        &path,
        "default_model: m\nmodels:\n  - id: m\n    provider: a\n",
    )
    .unwrap();

    let err = ConfigManager::new(&path)
        .load_with_env(None, deepseek_env)
        .unwrap_err();
    assert!(matches!(
        err,
        ShaiError::Config(ConfigError::MissingField("providers"))
    ));
    assert!(err.is_fatal());
}

#[test]
fn malformed_yaml_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    fs::write(&path, "default_model: [unclosed\n").unwrap();

    let err = ConfigManager::new(&path)
        .load_with_env(None, deepseek_env)
        .unwrap_err();
    assert!(matches!(err, ShaiError::Config(ConfigError::Parse(_))));
}

#[test]
fn absent_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = ConfigManager::new(dir.path().join("nope.yaml"))
        .load_with_env(None, deepseek_env)
        .unwrap_err();
    assert!(matches!(err, ShaiError::Config(ConfigError::NotFound { .. })));
}

#[test]
fn ensure_config_creates_only_once() {
    let dir = tempfile::tempdir().unwrap();
    let manager = ConfigManager::new(dir.path().join("nested").join("config.yaml"));

    assert!(manager.ensure_config().unwrap());
    fs::write(manager.path(), "default_model: edited\n").unwrap();
    assert!(!manager.ensure_config().unwrap());
    assert_eq!(
        fs::read_to_string(manager.path()).unwrap(),
        "default_model: edited\n"
    );
}

#[test]
fn model_override_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let manager = ConfigManager::new(dir.path().join("config.yaml"));
    manager.write_template(None).unwrap();

    let err = manager
        .load_with_env(Some("no-such-model"), deepseek_env)
        .unwrap_err();
    match err {
        ShaiError::Config(ConfigError::ModelNotFound(name)) => assert_eq!(name, "no-such-model"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn edit_command_is_safe_and_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let manager = ConfigManager::new(dir.path().join("config.yaml"));

    let command = manager.edit_command(&Messages::default());
    assert_eq!(command.risk, RiskTier::Safe);
    assert!(command.command.contains("config.yaml"));
    assert!(!command.explanation.is_empty());
}

#[cfg(unix)]
#[test]
fn written_config_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let manager = ConfigManager::new(dir.path().join("config.yaml"));
    manager.write_template(Some("secret")).unwrap();

    let mode = fs::metadata(manager.path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}
