//! Per-message pipeline: receipt logging, command filtering, knowledge
//! lookup, and reply dispatch.

use super::Gateway;
use otvet_core::knowledge::{self, Reply};
use otvet_core::message::IncomingMessage;
use std::path::Path;
use tracing::{debug, error, info};

/// Reply sent when a photo answer's file cannot be read.
pub(super) const MISSING_FILE_REPLY: &str = "Извините, файл не найден.";

impl Gateway {
    /// Handle one incoming message end to end. Never fails: every error on
    /// this path is logged and the loop moves on.
    pub(super) async fn handle_message(&self, incoming: IncomingMessage) {
        let preview: String = incoming.text.chars().take(50).collect();
        info!(
            "[{}] message in chat {} ({}) from {}: {preview}",
            incoming.channel,
            incoming.reply_target.as_deref().unwrap_or("?"),
            incoming.chat_kind,
            incoming.sender_name.as_deref().unwrap_or("unknown"),
        );

        // Bot commands are not answered from the knowledge file.
        if incoming.text.starts_with('/') {
            debug!("skipping command: {}", incoming.text);
            return;
        }

        let records = knowledge::load(&self.qa_path);
        let reply = match knowledge::resolve(&incoming.text, &records) {
            Some(r) => r,
            None => {
                debug!("no keyword match");
                return;
            }
        };

        match reply {
            Reply::Text(answer) => {
                let answer_preview: String = answer.chars().take(50).collect();
                info!("[{}] matched text answer: {answer_preview}", incoming.channel);
                self.send_text(&incoming, &answer).await;
            }
            Reply::Photo { path, caption } => {
                info!(
                    "[{}] matched photo answer: {}",
                    incoming.channel,
                    path.display()
                );
                self.send_photo_reply(&incoming, &path, &caption).await;
            }
        }
    }

    /// Send a photo answer, falling back to a fixed text when the file
    /// cannot be read.
    async fn send_photo_reply(&self, incoming: &IncomingMessage, path: &Path, caption: &str) {
        let target = incoming.reply_target.as_deref().unwrap_or("");
        match std::fs::read(path) {
            Ok(bytes) => {
                if let Some(channel) = self.channels.get(&incoming.channel) {
                    if let Err(e) = channel.send_photo(target, &bytes, caption).await {
                        error!("failed to send photo {}: {e}", path.display());
                    }
                }
            }
            Err(e) => {
                error!("photo file {} unreadable: {e}", path.display());
                self.send_text(incoming, MISSING_FILE_REPLY).await;
            }
        }
    }
}
