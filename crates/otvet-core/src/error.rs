use thiserror::Error;

/// Top-level error type for otvet.
///
/// File and parse failures never surface here: the knowledge loader and the
/// photo dispatch recover locally, and the config loader reports them as
/// `Config` with the offending path in the message.
#[derive(Debug, Error)]
pub enum OtvetError {
    /// Error from a messaging channel.
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),
}
