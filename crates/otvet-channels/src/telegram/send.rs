//! Message sending: text and photo uploads.

use super::TelegramChannel;
use crate::utils::split_message;
use otvet_core::error::OtvetError;

impl TelegramChannel {
    /// Send a text message to a specific chat.
    ///
    /// Answers are sent exactly as stored, with no markup parse mode. Long
    /// texts are split at Telegram's 4096-character limit.
    pub(crate) async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), OtvetError> {
        let chunks = split_message(text, 4096);

        for chunk in chunks {
            let url = format!("{}/sendMessage", self.base_url);
            let body = serde_json::json!({
                "chat_id": chat_id,
                "text": chunk,
            });

            let resp = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| OtvetError::Channel(format!("telegram send failed: {e}")))?;

            let status = resp.status();
            if !status.is_success() {
                let error_text = resp.text().await.unwrap_or_default();
                return Err(OtvetError::Channel(format!(
                    "telegram send failed ({status}): {error_text}"
                )));
            }
        }

        Ok(())
    }

    /// Send a photo with a caption to a chat. An empty caption is omitted
    /// from the upload.
    pub(crate) async fn send_photo_bytes(
        &self,
        chat_id: i64,
        image: &[u8],
        caption: &str,
    ) -> Result<(), OtvetError> {
        let url = format!("{}/sendPhoto", self.base_url);

        let part = reqwest::multipart::Part::bytes(image.to_vec())
            .file_name("photo.png")
            .mime_str("image/png")
            .map_err(|e| OtvetError::Channel(format!("mime error: {e}")))?;

        let mut form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .part("photo", part);
        if let Some(caption) = caption_field(caption) {
            form = form.text("caption", caption.to_string());
        }

        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| OtvetError::Channel(format!("telegram sendPhoto failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            return Err(OtvetError::Channel(format!(
                "telegram sendPhoto failed ({status}): {error_text}"
            )));
        }

        Ok(())
    }
}

/// Caption form field for a photo upload. An empty caption yields `None`,
/// leaving the field off the form entirely.
pub(super) fn caption_field(caption: &str) -> Option<&str> {
    if caption.is_empty() {
        None
    } else {
        Some(caption)
    }
}
