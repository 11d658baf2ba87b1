use std::fs;
use std::path::Path;
use storygen_app::common::DomainError;
use storygen_app::config::*;
use storygen_app::domains::narration::{FailurePolicy, DEFAULT_SUMMARY_PROMPT, DEFAULT_SYSTEM_PROMPT};
use storygen_app::domains::relativity::ClassifierMode;
use tempfile::tempdir;

#[test]
fn test_defaults_match_documented_values() {
    let config = Config::default();
    assert_eq!(config.classifier.vertical_threshold, 0.8);
    assert_eq!(config.classifier.horizontal_threshold, 0.8);
    assert_eq!(config.classifier.mode, ClassifierMode::ThreeAxis);
    assert_eq!(config.proximity.threshold, 800.0);
    assert_eq!(config.history.capacity, 10);
    assert_eq!(config.hud.poll_interval_ms, 4000);
    assert_eq!(config.hud.lines, 3);
    assert_eq!(config.response.path, "LLM_Response/LLM_response.txt");
    assert_eq!(config.response.failure_policy, FailurePolicy::WriteFailureText);
    assert_eq!(config.llm.max_tokens, 150);
    assert!(config.validate().is_ok());
    assert_eq!(config.pipeline_settings().system_prompt, DEFAULT_SYSTEM_PROMPT);
}

#[tokio::test]
async fn test_bundled_config_file_parses() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.toml");
    let config = Config::from_file(path).await.unwrap();
    assert_eq!(config.llm.provider, LlmProvider::OpenaiChat);
    assert_eq!(config.environment.name_denylist.len(), 5);
}

#[tokio::test]
async fn test_partial_file_keeps_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[classifier]
mode = "two_axis"

[response]
failure_policy = "retain_previous"
"#,
    )
    .unwrap();

    let config = Config::from_file(&path).await.unwrap();
    assert_eq!(config.classifier.mode, ClassifierMode::TwoAxis);
    assert_eq!(config.classifier.vertical_threshold, 0.8);
    assert_eq!(config.failure_handling().policy, FailurePolicy::RetainPrevious);
    assert_eq!(config.history.capacity, 10);
}

#[test]
fn test_validation_rejects_bad_values() {
    let mut config = Config::default();
    config.history.capacity = 0;
    let err = config.validate().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DomainError>(),
        Some(DomainError::InvalidConfiguration { .. })
    ));

    let mut config = Config::default();
    config.classifier.vertical_threshold = 1.5;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.proximity.threshold = f64::NAN;
    assert!(config.validate().is_err());
}

#[test]
fn test_environment_overrides_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("storygen.toml");
    fs::write(&path, "[proximity]\nthreshold = 500.0\n\n[hud]\nlines = 5\n").unwrap();

    std::env::set_var("STORYGEN__HUD__LINES", "4");
    let config = Config::load(&path).unwrap();
    std::env::remove_var("STORYGEN__HUD__LINES");

    assert_eq!(config.proximity.threshold, 500.0);
    assert_eq!(config.hud.lines, 4);
    assert_eq!(config.event_builder().gate.threshold, 500.0);
}

#[test]
fn test_llm_endpoint_reads_key_from_named_variable() {
    let mut config = Config::default();
    config.llm.api_key_env = Some("STORYGEN_TEST_API_KEY".to_string());
    std::env::set_var("STORYGEN_TEST_API_KEY", "sk-test");
    assert_eq!(config.llm_endpoint().api_key.as_deref(), Some("sk-test"));

    config.llm.api_key_env = None;
    assert!(config.llm_endpoint().api_key.is_none());
}

#[test]
fn test_summary_defaults_and_slot_clash() {
    let mut config = Config::default();
    assert!(config.summary.enabled);
    assert_eq!(config.summary.path, "LLM_Response/Whole_LLM_response.txt");
    assert_eq!(config.summary_prompt(), DEFAULT_SUMMARY_PROMPT);

    config.summary.path = config.response.path.clone();
    assert!(config.validate().is_err());
    config.summary.enabled = false;
    assert!(config.validate().is_ok());
}
