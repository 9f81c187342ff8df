//! Integration tests for config.rs

use std::time::Duration;

use voice_chat_store::config::AppConfig;

#[test]
fn test_default_storage_config() {
    let config = AppConfig::default();

    assert_eq!(config.storage.data_dir, "./data/store");
    assert_eq!(config.storage.audio_dir, "./data/audio");
    assert!(config.storage.seed_sample_data);
}

#[test]
fn test_default_network_and_user() {
    let config = AppConfig::default();

    assert_eq!(config.network.simulated_latency_ms, 300);
    assert_eq!(config.latency(), Duration::from_millis(300));
    assert_eq!(config.user.id, "current-user");
    assert_eq!(config.user.name, "You");
    assert_eq!(config.transcription_delay(), Duration::from_millis(1500));
}

#[test]
fn test_default_logging_config() {
    let config = AppConfig::default();

    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.file_path, None);
    assert_eq!(config.logging.format, "text");
}

#[test]
fn test_default_config_validates() {
    assert!(AppConfig::default().validate().is_ok());
}

#[test]
fn test_zero_latency_is_valid() {
    let mut config = AppConfig::default();
    config.network.simulated_latency_ms = 0;
    assert!(config.validate().is_ok());
    assert!(config.latency().is_zero());
}

#[test]
fn test_validate_rejects_excessive_latency() {
    let mut config = AppConfig::default();
    config.network.simulated_latency_ms = 10_001;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_shared_directories() {
    let mut config = AppConfig::default();
    config.storage.audio_dir = config.storage.data_dir.clone();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_empty_paths() {
    let mut config = AppConfig::default();
    config.storage.data_dir = "  ".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.storage.audio_dir = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_blank_user() {
    let mut config = AppConfig::default();
    config.user.name = " ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_bad_logging() {
    let mut config = AppConfig::default();
    config.logging.level = "verbose".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.logging.format = "xml".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_all_log_levels_accepted() {
    for level in ["trace", "debug", "info", "warn", "error"] {
        let mut config = AppConfig::default();
        config.logging.level = level.to_string();
        assert!(config.validate().is_ok(), "level {level} should be valid");
    }
}

#[test]
fn test_yaml_round_trip() {
    let mut config = AppConfig::default();
    config.network.simulated_latency_ms = 42;
    config.logging.file_path = Some("logs/voice-chat.log".to_string());

    let yaml = config.to_yaml().unwrap();
    assert!(yaml.contains("simulated_latency_ms: 42"));

    let parsed: AppConfig = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed.network.simulated_latency_ms, 42);
    assert_eq!(parsed.logging.file_path.as_deref(), Some("logs/voice-chat.log"));
    assert_eq!(parsed.storage.audio_dir, config.storage.audio_dir);
}

#[test]
fn test_audio_dir_from_config() {
    let mut config = AppConfig::default();
    config.storage.audio_dir = "/tmp/voice".to_string();
    assert_eq!(config.audio_dir(), std::path::PathBuf::from("/tmp/voice"));
}
