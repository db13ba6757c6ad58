//! Telegram Bot API channel.
//!
//! Uses long polling via `getUpdates` and `sendMessage` for responses.
//! Docs: <https://core.telegram.org/bots/api>

mod polling;
pub(crate) mod send;
pub(crate) mod types;


use otvet_core::config::TelegramConfig;
use otvet_core::error::OtvetError;
use std::sync::Arc;
use tokio::sync::Mutex;
use types::{TgResponse, TgUser};

/// Telegram channel using the Bot API with long polling.
pub struct TelegramChannel {
    client: reqwest::Client,
    base_url: String,
    /// Tracks the last update_id to avoid reprocessing.
    last_update_id: Arc<Mutex<Option<i64>>>,
}

impl TelegramChannel {
    /// Create a new Telegram channel from config.
    pub fn new(config: TelegramConfig) -> Self {
        let base_url = format!("https://api.telegram.org/bot{}", config.bot_token);
        Self {
            client: reqwest::Client::new(),
            base_url,
            last_update_id: Arc::new(Mutex::new(None)),
        }
    }

    /// Verify the configured token by calling `getMe`.
    ///
    /// Returns the bot's display name on success.
    pub async fn check_token(&self) -> Result<String, OtvetError> {
        let url = format!("{}/getMe", self.base_url);
        let resp: TgResponse<TgUser> = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| OtvetError::Channel(format!("telegram getMe failed: {e}")))?
            .json()
            .await
            .map_err(|e| OtvetError::Channel(format!("telegram getMe parse failed: {e}")))?;

        if !resp.ok {
            return Err(OtvetError::Channel(format!(
                "telegram rejected the token: {}",
                resp.description.unwrap_or_default()
            )));
        }

        let me = resp
            .result
            .ok_or_else(|| OtvetError::Channel("telegram getMe returned no result".into()))?;

        Ok(polling::sender_display_name(&me))
    }
}
