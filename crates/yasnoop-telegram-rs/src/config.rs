// ABOUTME: Configuration loading and validation for the Telegram bot.
// ABOUTME: Supports TOML config files with environment variable expansion.

use crate::error::{BridgeError, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;
use yasnoop_disk::search::DEFAULT_MAX_DEPTH;
use yasnoop_disk::trash::{DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL};
use yasnoop_disk::upload::DEFAULT_MAX_FILE_BYTES;
use yasnoop_disk::yandex::DEFAULT_API_URL;

/// Top-level configuration structure for yasnoop-telegram-rs.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub disk: DiskConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub trash: TrashConfig,
    #[serde(default)]
    pub bot: BotConfig,
}

/// Telegram bot credentials and the one chat allowed to use it.
#[derive(Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token from @BotFather (e.g., "123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11").
    pub bot_token: String,
    /// Chat ID allowed to drive the bot; everyone else is refused.
    pub authorized_chat: i64,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .field("authorized_chat", &self.authorized_chat)
            .finish()
    }
}

/// Yandex Disk API access.
#[derive(Clone, Deserialize)]
pub struct DiskConfig {
    /// OAuth token for the Yandex Disk REST API.
    pub token: String,
    /// REST API root.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for DiskConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskConfig")
            .field("token", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl DiskConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

/// Upload limits.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Largest attachment accepted, in bytes.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

fn default_max_file_bytes() -> u64 {
    DEFAULT_MAX_FILE_BYTES
}

/// Search behavior.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Directory the search starts from.
    #[serde(default = "default_search_root")]
    pub root: String,
    /// How many directory levels below the root are searched.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            root: default_search_root(),
            max_depth: default_max_depth(),
        }
    }
}

fn default_search_root() -> String {
    "/".to_string()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

/// Trash clearing: how often and how long to wait for the service.
#[derive(Debug, Clone, Deserialize)]
pub struct TrashConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
}

impl Default for TrashConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
        }
    }
}

impl TrashConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

fn default_max_poll_attempts() -> u32 {
    DEFAULT_MAX_POLL_ATTEMPTS
}

/// Bot presentation.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Greet the authorized chat with the command keyboard on start-up.
    #[serde(default = "default_welcome_message")]
    pub welcome_message: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            welcome_message: default_welcome_message(),
        }
    }
}

fn default_welcome_message() -> bool {
    true
}

impl Config {
    /// Load configuration from the specified path or default location.
    ///
    /// Default location: `~/.config/yasnoop/bot.toml`
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let path = path
            .or_else(|| dirs::config_dir().map(|d| d.join("yasnoop").join("bot.toml")))
            .ok_or_else(|| BridgeError::Config("Could not determine config path".into()))?;

        let contents = std::fs::read_to_string(&path).map_err(|e| {
            BridgeError::Config(format!("Failed to read config from {:?}: {}", path, e))
        })?;

        Self::from_toml(&contents)
    }

    /// Parse and validate configuration text, expanding `${VAR}` references first.
    pub fn from_toml(contents: &str) -> Result<Self> {
        // Expand environment variables, warning on undefined vars.
        let contents = shellexpand::env_with_context_no_errors(contents, |var: &str| {
            match std::env::var(var) {
                Ok(val) => Some(val),
                Err(_) => {
                    warn!(
                        variable = %var,
                        "Environment variable not defined, using empty string"
                    );
                    Some(String::new())
                }
            }
        });

        let config: Config = toml::from_str(&contents)
            .map_err(|e| BridgeError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate that required fields are present and properly formatted.
    fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.is_empty() {
            return Err(BridgeError::Config("telegram.bot_token is required".into()));
        }
        // Telegram bot tokens have format: <bot_id>:<token_string>
        if !self.telegram.bot_token.contains(':') {
            return Err(BridgeError::Config(
                "telegram.bot_token must contain ':' (format: BOT_ID:TOKEN_STRING)".into(),
            ));
        }
        if self.disk.token.is_empty() {
            return Err(BridgeError::Config("disk.token is required".into()));
        }
        if self.disk.api_url.is_empty() {
            return Err(BridgeError::Config("disk.api_url must not be empty".into()));
        }
        if self.upload.max_file_bytes == 0 {
            return Err(BridgeError::Config(
                "upload.max_file_bytes must be greater than zero".into(),
            ));
        }
        if self.search.max_depth == 0 {
            return Err(BridgeError::Config(
                "search.max_depth must be at least 1".into(),
            ));
        }
        if self.trash.max_poll_attempts == 0 {
            return Err(BridgeError::Config(
                "trash.max_poll_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
