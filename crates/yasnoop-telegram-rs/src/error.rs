// ABOUTME: Error types for yasnoop-telegram-rs.
// ABOUTME: Defines BridgeError enum covering Telegram, download, and config failures.

use thiserror::Error;

/// Error types for the Telegram bot.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Configuration loading or validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Telegram API error from teloxide.
    #[error("Telegram API error: {0}")]
    Telegram(String),

    /// Telegram request error from teloxide.
    #[error("Telegram request error: {0}")]
    TeloxideRequest(#[from] teloxide::RequestError),

    /// Attachment download from Telegram failed.
    #[error("Download error: {0}")]
    Download(#[from] teloxide::DownloadError),
}

/// Result type alias using BridgeError.
pub type Result<T> = std::result::Result<T, BridgeError>;
