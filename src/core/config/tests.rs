use super::data::Config;
use crate::core::chat_config::{BlockThreshold, ConfigPatch, HarmCategory};
use crate::core::error::ChatError;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent_config.toml");

    let config = Config::load_from_path(&config_path).expect("Failed to load config");

    assert_eq!(config, Config::default());
}

#[test]
fn test_config_persistence_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let mut config = Config {
        default_model: Some("gemini-1.0-pro".to_string()),
        temperature: Some(0.4),
        system_prompt: Some("You are a helpful and witty AI assistant named Sparky.".to_string()),
        ..Default::default()
    };
    config
        .safety
        .insert("harassment".to_string(), "none".to_string());
    config
        .save_to_path(&config_path)
        .expect("Failed to save config");

    let loaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(loaded, config);

    let mut config = loaded;
    config.temperature = None;
    config.safety.clear();
    config
        .save_to_path(&config_path)
        .expect("Failed to save modified config");
    let loaded = Config::load_from_path(&config_path).expect("Failed to load modified config");
    assert_eq!(loaded.temperature, None);
    assert!(loaded.safety.is_empty());
    assert_eq!(loaded.default_model.as_deref(), Some("gemini-1.0-pro"));
}

#[test]
fn test_invalid_toml_reports_path() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "temperature = [not toml").expect("write");

    let err = Config::load_from_path(&config_path).expect_err("parse failure");
    assert!(err.to_string().starts_with("Failed to parse config at"));
}

#[test]
fn chat_config_layers_file_then_overrides() {
    let mut file = Config {
        default_model: Some("Gemini 1.5 Pro (Latest)".to_string()),
        temperature: Some(0.1),
        max_output_tokens: Some(1024),
        ..Default::default()
    };
    file.safety
        .insert("dangerous".to_string(), "low".to_string());

    let overrides = ConfigPatch::new().temperature(0.9);
    let config = file.chat_config(&overrides).expect("valid config");

    assert_eq!(config.model_id(), "gemini-1.5-pro-latest");
    assert_eq!(config.temperature(), 0.9);
    assert_eq!(config.max_output_tokens(), 1024);
    assert_eq!(
        config.threshold_for(HarmCategory::DangerousContent),
        Some(BlockThreshold::BlockLowAndAbove)
    );
    assert_eq!(
        config.threshold_for(HarmCategory::Harassment),
        Some(BlockThreshold::BlockMediumAndAbove)
    );
}

#[test]
fn chat_config_rejects_invalid_file_values() {
    let file = Config {
        temperature: Some(3.0),
        ..Default::default()
    };
    assert!(matches!(
        file.chat_config(&ConfigPatch::new()),
        Err(ChatError::InvalidConfig {
            field: "temperature",
            ..
        })
    ));

    let mut file = Config::default();
    file.safety
        .insert("violence".to_string(), "none".to_string());
    assert!(file.chat_config(&ConfigPatch::new()).is_err());
}

#[test]
fn zero_timeout_means_no_timeout() {
    let mut config = Config::default();
    assert_eq!(config.request_timeout(), None);
    config.request_timeout_secs = Some(0);
    assert_eq!(config.request_timeout(), None);
    config.request_timeout_secs = Some(30);
    assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
}

#[test]
fn describe_lists_every_key() {
    let mut config = Config {
        default_model: Some("gemini-1.0-pro".to_string()),
        ..Default::default()
    };
    config
        .safety
        .insert("hate-speech".to_string(), "high".to_string());

    let text = config.describe();
    assert!(text.contains("default-model: gemini-1.0-pro"));
    assert!(text.contains("temperature: (unset)"));
    assert!(text.contains("    hate-speech: high"));
    assert!(text.contains("request-timeout: (unset)"));
}
