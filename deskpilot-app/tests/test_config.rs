use deskpilot_app::config::{AppConfig, AugmentConfig, LOG_ENV, TIMEOUT_ENV};
use deskpilot_core::Capability;
use std::collections::HashMap;
use std::fs;

#[test]
fn test_config_full_yaml() {
    let config_yaml = r#"
log_level: debug
tool_timeout_ms: 2000
bus_timeout_ms: 1000
request_timeout_ms: 10000
disabled_capabilities: [clipboard, screenshot]
augment:
  program: llm
  args: ["-m", "small"]
  complex_threshold: 40
"#;

    let config: AppConfig = serde_yaml::from_str(config_yaml).unwrap();

    assert_eq!(config.log_level, "debug");
    assert_eq!(config.tool_timeout_ms, 2000);
    assert_eq!(config.bus_timeout_ms, 1000);
    assert_eq!(config.request_timeout_ms, 10000);
    assert_eq!(
        config.disabled_capabilities,
        vec![Capability::Clipboard, Capability::Screenshot]
    );
    let augment = config.augment.unwrap();
    assert_eq!(augment.program, "llm");
    assert_eq!(augment.args, vec!["-m", "small"]);
    assert_eq!(augment.complex_threshold, 40);
}

#[test]
fn test_config_partial_yaml_keeps_defaults() {
    let config: AppConfig = serde_yaml::from_str("log_level: info\naugment:\n  program: llm\n").unwrap();
    let defaults = AppConfig::default();

    assert_eq!(config.log_level, "info");
    assert_eq!(config.tool_timeout_ms, defaults.tool_timeout_ms);
    assert_eq!(config.request_timeout_ms, defaults.request_timeout_ms);
    assert!(config.disabled_capabilities.is_empty());
    let augment = config.augment.unwrap();
    assert!(augment.args.is_empty());
    assert_eq!(augment.complex_threshold, deskpilot_intent::DEFAULT_COMPLEX_THRESHOLD);
}

#[test]
fn test_config_missing_file_is_default() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::load(&dir.path().join("absent.yaml")).unwrap();
    assert_eq!(config, AppConfig::default());
}

#[test]
fn test_config_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");

    let config = AppConfig {
        log_level: "trace".to_string(),
        augment: Some(AugmentConfig {
            program: "llm".to_string(),
            args: Vec::new(),
            complex_threshold: 80,
        }),
        ..AppConfig::default()
    };
    fs::write(&path, serde_yaml::to_string(&config).unwrap()).unwrap();

    assert_eq!(AppConfig::load(&path).unwrap(), config);
}

#[test]
fn test_config_invalid_yaml_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    fs::write(&path, "tool_timeout_ms: [not, a, number]\n").unwrap();

    assert!(AppConfig::load(&path).is_err());
}

#[test]
fn test_config_env_overrides() {
    let env: HashMap<&str, &str> = [(TIMEOUT_ENV, "1500"), (LOG_ENV, "debug")].into_iter().collect();
    let mut config = AppConfig::default();

    config
        .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
        .unwrap();

    assert_eq!(config.request_timeout_ms, 1500);
    assert_eq!(config.log_level, "debug");
}

#[test]
fn test_config_bad_timeout_override() {
    let mut config = AppConfig::default();
    let result = config.apply_overrides(|key| (key == TIMEOUT_ENV).then(|| "soon".to_string()));
    assert!(result.is_err());
}

#[test]
fn test_config_validation() {
    assert!(AppConfig::default().validate().is_ok());

    let zero_timeout = AppConfig {
        tool_timeout_ms: 0,
        ..AppConfig::default()
    };
    assert!(zero_timeout.validate().is_err());

    let empty_program = AppConfig {
        augment: Some(AugmentConfig {
            program: " ".to_string(),
            args: Vec::new(),
            complex_threshold: 60,
        }),
        ..AppConfig::default()
    };
    assert!(empty_program.validate().is_err());
}

#[test]
fn test_config_unknown_capability_is_error() {
    let result: Result<AppConfig, _> = serde_yaml::from_str("disabled_capabilities: [teleport]\n");
    assert!(result.is_err());
}
