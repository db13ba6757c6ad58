//! Bot configuration loaded from a TOML file.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::OtvetError;

/// Top-level otvet configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
}

/// Telegram bot config.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelegramConfig {
    /// Bot API token from @BotFather.
    #[serde(default)]
    pub bot_token: String,
}

/// Knowledge store config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Path to the JSON file with keyword records.
    #[serde(default = "default_knowledge_path")]
    pub path: String,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            path: default_knowledge_path(),
        }
    }
}

fn default_knowledge_path() -> String {
    "qa_data.json".to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist. When the file leaves
/// `bot_token` empty, the `TELEGRAM_BOT_TOKEN` environment variable is
/// consulted as a fallback.
pub fn load(path: &str) -> Result<Config, OtvetError> {
    let path = Path::new(path);
    let mut config: Config = if path.exists() {
        let content = std::fs::read_to_string(path).map_err(|e| {
            OtvetError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| OtvetError::Config(format!("failed to parse config: {}", e)))?
    } else {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        Config::default()
    };

    if config.telegram.bot_token.is_empty() {
        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
            config.telegram.bot_token = token;
        }
    }

    Ok(config)
}
