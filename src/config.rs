use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub network: NetworkConfig,
    pub user: UserConfig,
    pub transcription: TranscriptionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory of the key-value store
    pub data_dir: String,
    /// Directory for voice message files
    pub audio_dir: String,
    /// Seed sample conversations into an empty store
    pub seed_sample_data: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Artificial delay before every store operation; 0 disables it
    pub simulated_latency_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                data_dir: "./data/store".to_string(),
                audio_dir: "./data/audio".to_string(),
                seed_sample_data: true,
            },
            network: NetworkConfig {
                simulated_latency_ms: 300,
            },
            user: UserConfig {
                id: "current-user".to_string(),
                name: "You".to_string(),
            },
            transcription: TranscriptionConfig { delay_ms: 1500 },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        let defaults = Config::try_from(&Self::default()).context("Failed to encode default configuration")?;

        let config = Config::builder()
            // Start with default values
            .add_source(defaults)
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("config").required(false))
            // e.g. VOICE_CHAT__NETWORK__SIMULATED_LATENCY_MS=0
            .add_source(
                Environment::with_prefix("VOICE_CHAT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to load configuration")?;

        let app_config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow::anyhow!("storage.data_dir cannot be empty"));
        }
        if self.storage.audio_dir.trim().is_empty() {
            return Err(anyhow::anyhow!("storage.audio_dir cannot be empty"));
        }
        if self.storage.data_dir == self.storage.audio_dir {
            return Err(anyhow::anyhow!("storage.data_dir and storage.audio_dir must differ"));
        }

        // Anything slower than this makes the CLI look hung
        if self.network.simulated_latency_ms > 10_000 {
            return Err(anyhow::anyhow!("simulated_latency_ms must be at most 10000"));
        }

        if self.user.id.trim().is_empty() || self.user.name.trim().is_empty() {
            return Err(anyhow::anyhow!("user.id and user.name must be set"));
        }

        if self.transcription.delay_ms > 60_000 {
            return Err(anyhow::anyhow!("transcription.delay_ms must be at most 60000"));
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        Ok(())
    }

    /// Simulated network latency
    #[must_use]
    pub const fn latency(&self) -> Duration {
        Duration::from_millis(self.network.simulated_latency_ms)
    }

    /// Mock transcription delay
    #[must_use]
    pub const fn transcription_delay(&self) -> Duration {
        Duration::from_millis(self.transcription.delay_ms)
    }

    /// Get data directory from environment or config
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        std::env::var("VOICE_CHAT_DATA_DIR")
            .map_or_else(|_| PathBuf::from(&self.storage.data_dir), PathBuf::from)
    }

    /// Audio directory
    #[must_use]
    pub fn audio_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.audio_dir)
    }

    /// Get log level from environment or config
    #[must_use]
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }

    /// Render the configuration as YAML, e.g. for a starter `config.yaml`
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to render configuration as YAML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.storage.data_dir, "./data/store");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.network.simulated_latency_ms, 300);
    }

    #[test]
    fn test_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = AppConfig::default();
        config.storage.audio_dir = config.storage.data_dir.clone();
        assert!(config.validate().is_err());
    }
}
