//! Gateway: the event loop connecting channels to the knowledge store.
//!
//! Every incoming message re-reads the knowledge file, so answer edits
//! apply without a restart. Shutdown is graceful on ctrl-c.

mod pipeline;

use otvet_core::{
    message::{IncomingMessage, OutgoingMessage},
    traits::Channel,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// The central gateway that routes messages between channels and the
/// knowledge store.
pub struct Gateway {
    channels: HashMap<String, Arc<dyn Channel>>,
    /// Path to the knowledge file, re-read for every message.
    qa_path: PathBuf,
}

impl Gateway {
    /// Create a new gateway.
    pub fn new(channels: HashMap<String, Arc<dyn Channel>>, qa_path: PathBuf) -> Self {
        Self { channels, qa_path }
    }

    /// Run the main event loop.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        info!(
            "otvet gateway running | channels: {} | knowledge: {}",
            self.channels.keys().cloned().collect::<Vec<_>>().join(", "),
            self.qa_path.display(),
        );

        let (tx, mut rx) = mpsc::channel::<IncomingMessage>(256);

        for (name, channel) in &self.channels {
            let mut channel_rx = channel
                .start()
                .await
                .map_err(|e| anyhow::anyhow!("failed to start channel {name}: {e}"))?;
            let tx = tx.clone();
            let channel_name = name.clone();

            tokio::spawn(async move {
                while let Some(msg) = channel_rx.recv().await {
                    if tx.send(msg).await.is_err() {
                        info!("gateway receiver dropped, stopping {channel_name} forwarder");
                        break;
                    }
                }
            });

            info!("Channel started: {name}");
        }

        drop(tx);

        // Main event loop with graceful shutdown.
        loop {
            tokio::select! {
                Some(incoming) = rx.recv() => {
                    let gw = self.clone();
                    tokio::spawn(async move {
                        gw.handle_message(incoming).await;
                    });
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Graceful shutdown: stop all channels.
    async fn shutdown(&self) {
        info!("Shutting down...");

        for (name, channel) in &self.channels {
            if let Err(e) = channel.stop().await {
                warn!("failed to stop channel {name}: {e}");
            }
        }

        info!("Shutdown complete.");
    }

    /// Send a plain text message back to the chat the message came from.
    async fn send_text(&self, incoming: &IncomingMessage, text: &str) {
        let msg = OutgoingMessage {
            text: text.to_string(),
            reply_target: incoming.reply_target.clone(),
        };

        if let Some(channel) = self.channels.get(&incoming.channel) {
            if let Err(e) = channel.send(msg).await {
                error!("failed to send message: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::pipeline::MISSING_FILE_REPLY;
    use super::*;
    use async_trait::async_trait;
    use otvet_core::error::OtvetError;
    use std::sync::Mutex;

    /// A mock channel that records sent texts and photos for assertion.
    struct MockChannel {
        sent: Mutex<Vec<OutgoingMessage>>,
        photos: Mutex<Vec<(String, Vec<u8>, String)>>,
        /// When true, `send()` returns an error (simulates delivery failure).
        fail_send: bool,
        /// When true, `send_photo()` returns an error.
        fail_photo: bool,
    }

    impl MockChannel {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                photos: Mutex::new(Vec::new()),
                fail_send: false,
                fail_photo: false,
            }
        }
    }

    #[async_trait]
    impl Channel for MockChannel {
        fn name(&self) -> &str {
            "telegram"
        }

        async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, OtvetError> {
            let (_tx, rx) = mpsc::channel(1);
            Ok(rx)
        }

        async fn send(&self, message: OutgoingMessage) -> Result<(), OtvetError> {
            if self.fail_send {
                return Err(OtvetError::Channel("connection reset".to_string()));
            }
            self.sent.lock().unwrap().push(message);
            Ok(())
        }

        async fn send_photo(
            &self,
            target: &str,
            image: &[u8],
            caption: &str,
        ) -> Result<(), OtvetError> {
            if self.fail_photo {
                return Err(OtvetError::Channel("connection reset".to_string()));
            }
            self.photos
                .lock()
                .unwrap()
                .push((target.to_string(), image.to_vec(), caption.to_string()));
            Ok(())
        }

        async fn stop(&self) -> Result<(), OtvetError> {
            Ok(())
        }
    }

    fn gateway_with(mock: Arc<MockChannel>, qa_path: PathBuf) -> Gateway {
        let channel: Arc<dyn Channel> = mock;
        let mut channels: HashMap<String, Arc<dyn Channel>> = HashMap::new();
        channels.insert("telegram".to_string(), channel);
        Gateway::new(channels, qa_path)
    }

    fn incoming(text: &str) -> IncomingMessage {
        IncomingMessage {
            id: uuid::Uuid::new_v4(),
            channel: "telegram".to_string(),
            sender_name: Some("@tester".to_string()),
            text: text.to_string(),
            timestamp: chrono::Utc::now(),
            reply_target: Some("100".to_string()),
            chat_kind: "group".to_string(),
        }
    }

    fn write_qa(dir: &tempfile::TempDir, json: &str) -> PathBuf {
        let path = dir.path().join("qa_data.json");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[tokio::test]
    async fn test_text_answer_sent_on_keyword_match() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_qa(
            &dir,
            r#"{"questions": [{"keywords": ["price", "cost"], "answer": "10 USD"}]}"#,
        );
        let mock = Arc::new(MockChannel::new());
        let gw = gateway_with(mock.clone(), path);

        gw.handle_message(incoming("What is the cost?")).await;

        let sent = mock.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, "10 USD");
        assert_eq!(sent[0].reply_target.as_deref(), Some("100"));
    }

    #[tokio::test]
    async fn test_no_reply_without_match() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_qa(
            &dir,
            r#"{"questions": [{"keywords": ["price"], "answer": "10 USD"}]}"#,
        );
        let mock = Arc::new(MockChannel::new());
        let gw = gateway_with(mock.clone(), path);

        gw.handle_message(incoming("good morning everyone")).await;

        assert!(mock.sent.lock().unwrap().is_empty());
        assert!(mock.photos.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commands_are_not_answered() {
        let dir = tempfile::tempdir().unwrap();
        // "start" would match the command text, but commands are skipped.
        let path = write_qa(
            &dir,
            r#"{"questions": [{"keywords": ["start"], "answer": "welcome"}]}"#,
        );
        let mock = Arc::new(MockChannel::new());
        let gw = gateway_with(mock.clone(), path);

        gw.handle_message(incoming("/start")).await;

        assert!(mock.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_photo_answer_uploads_file_with_caption() {
        let dir = tempfile::tempdir().unwrap();
        let photo_path = dir.path().join("logo.png");
        std::fs::write(&photo_path, b"\x89PNG fake image bytes").unwrap();
        let path = write_qa(
            &dir,
            &format!(
                r#"{{"questions": [{{"keywords": ["logo"], "answer": "{}", "type": "photo", "caption": "Our logo"}}]}}"#,
                photo_path.display()
            ),
        );
        let mock = Arc::new(MockChannel::new());
        let gw = gateway_with(mock.clone(), path);

        gw.handle_message(incoming("show me the logo")).await;

        let photos = mock.photos.lock().unwrap();
        assert_eq!(photos.len(), 1);
        let (target, bytes, caption) = &photos[0];
        assert_eq!(target, "100");
        assert_eq!(bytes, b"\x89PNG fake image bytes");
        assert_eq!(caption, "Our logo");
        assert!(
            mock.sent.lock().unwrap().is_empty(),
            "no text should accompany a successful photo send"
        );
    }

    #[tokio::test]
    async fn test_missing_photo_file_sends_fallback_text() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("logo.png");
        let path = write_qa(
            &dir,
            &format!(
                r#"{{"questions": [{{"keywords": ["logo"], "answer": "{}", "type": "photo"}}]}}"#,
                absent.display()
            ),
        );
        let mock = Arc::new(MockChannel::new());
        let gw = gateway_with(mock.clone(), path);

        gw.handle_message(incoming("logo please")).await;

        assert!(mock.photos.lock().unwrap().is_empty());
        let sent = mock.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, MISSING_FILE_REPLY);
    }

    #[tokio::test]
    async fn test_photo_send_failure_does_not_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let photo_path = dir.path().join("logo.png");
        std::fs::write(&photo_path, b"bytes").unwrap();
        let path = write_qa(
            &dir,
            &format!(
                r#"{{"questions": [{{"keywords": ["logo"], "answer": "{}", "type": "photo"}}]}}"#,
                photo_path.display()
            ),
        );
        let mock = Arc::new(MockChannel {
            fail_photo: true,
            ..MockChannel::new()
        });
        let gw = gateway_with(mock.clone(), path);

        gw.handle_message(incoming("logo please")).await;

        // The fallback is for a missing file, not a failed upload.
        assert!(mock.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_is_logged_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_qa(
            &dir,
            r#"{"questions": [{"keywords": ["ping"], "answer": "pong"}]}"#,
        );
        let mock = Arc::new(MockChannel {
            fail_send: true,
            ..MockChannel::new()
        });
        let gw = gateway_with(mock.clone(), path);

        gw.handle_message(incoming("ping")).await;

        assert!(mock.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_edits_apply_between_messages() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_qa(
            &dir,
            r#"{"questions": [{"keywords": ["ping"], "answer": "pong"}]}"#,
        );
        let mock = Arc::new(MockChannel::new());
        let gw = gateway_with(mock.clone(), path.clone());

        gw.handle_message(incoming("ping")).await;
        std::fs::write(
            &path,
            r#"{"questions": [{"keywords": ["ping"], "answer": "pang"}]}"#,
        )
        .unwrap();
        gw.handle_message(incoming("ping")).await;

        let sent = mock.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].text, "pong");
        assert_eq!(sent[1].text, "pang");
    }

    #[tokio::test]
    async fn test_missing_store_yields_no_reply() {
        let mock = Arc::new(MockChannel::new());
        let gw = gateway_with(mock.clone(), PathBuf::from("/nonexistent/qa_data.json"));

        gw.handle_message(incoming("hello")).await;

        assert!(mock.sent.lock().unwrap().is_empty());
    }
}
