// ABOUTME: Telegram transport using teloxide Long Polling.
// ABOUTME: Bot authentication, replies, the command keyboard, attachment downloads, and message conversion.

use crate::config::TelegramConfig;
use crate::error::{BridgeError, Result};
use crate::message::{Attachment, FileRef, Inbound, InboundMessage, PhotoVariant};
use crate::transport::{ChatTransport, MENU_COMMANDS};
use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{
    FileMeta, KeyboardButton, KeyboardMarkup, MessageId, ReplyParameters,
};
use tracing::{debug, info};

/// Telegram limits a message to 4096 characters; stay under it.
const MAX_MESSAGE_CHARS: usize = 4000;

/// Telegram bot wrapper for Long Polling communication.
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    /// Create a new Telegram bot client and authenticate.
    pub async fn new(config: &TelegramConfig) -> Result<Self> {
        info!("Initializing Telegram bot");

        let bot = Bot::new(&config.bot_token);

        let me = bot.get_me().await.map_err(|e| {
            BridgeError::Telegram(format!("Failed to authenticate with Telegram: {}", e))
        })?;

        info!(
            bot_id = me.id.0,
            bot_username = ?me.username(),
            "Telegram authentication successful"
        );

        Ok(Self { bot })
    }

    /// Get a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn reply(&self, chat_id: i64, reply_to: Option<i32>, text: &str) -> Result<()> {
        debug!(chat_id = chat_id, reply_to = ?reply_to, "Sending message to Telegram");

        for (index, chunk) in split_message(text).iter().enumerate() {
            let mut request = self.bot.send_message(ChatId(chat_id), chunk.as_str());
            // Only the first chunk quotes the original message.
            if let (0, Some(message_id)) = (index, reply_to) {
                request = request.reply_parameters(ReplyParameters::new(MessageId(message_id)));
            }
            request.await?;
        }
        Ok(())
    }

    async fn send_menu(&self, chat_id: i64, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .reply_markup(menu_keyboard())
            .await?;
        Ok(())
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        let file = self.bot.get_file(file_id.to_string()).await?;
        let mut data = Vec::with_capacity(file.meta.size as usize);
        self.bot.download_file(&file.path, &mut data).await?;

        debug!(file_id = %file_id, bytes = data.len(), "Attachment downloaded");
        Ok(data)
    }
}

/// Reply keyboard offering the bot's commands.
pub fn menu_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(
        MENU_COMMANDS
            .iter()
            .map(|row| row.iter().map(|label| KeyboardButton::new(*label)).collect::<Vec<_>>()),
    )
}

/// Split text into chunks Telegram will accept, preferring line boundaries.
pub fn split_message(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for line in text.split_inclusive('\n') {
        let line_chars = line.chars().count();

        if current_chars + line_chars > MAX_MESSAGE_CHARS && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        if line_chars > MAX_MESSAGE_CHARS {
            // A single oversized line is cut on character boundaries.
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(MAX_MESSAGE_CHARS) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        current.push_str(line);
        current_chars += line_chars;
    }

    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn file_ref(meta: &FileMeta) -> FileRef {
    FileRef {
        id: meta.id.clone(),
        unique_id: meta.unique_id.clone(),
        size: u64::from(meta.size),
    }
}

/// Convert a Telegram message into what the router handles.
///
/// Returns None for messages with neither text nor a supported attachment.
pub fn inbound_from_message(msg: &Message) -> Option<Inbound> {
    let payload = if let Some(text) = msg.text() {
        InboundMessage::from_text(text)
    } else if let Some(document) = msg.document() {
        InboundMessage::Attachment(Attachment::Document {
            file: file_ref(&document.file),
            file_name: document.file_name.clone(),
        })
    } else if let Some(sizes) = msg.photo() {
        InboundMessage::Attachment(Attachment::Photo {
            variants: sizes
                .iter()
                .map(|size| PhotoVariant {
                    file: file_ref(&size.file),
                    width: size.width,
                    height: size.height,
                })
                .collect(),
        })
    } else if let Some(video) = msg.video() {
        InboundMessage::Attachment(Attachment::Video {
            file: file_ref(&video.file),
            file_name: video.file_name.clone(),
        })
    } else if let Some(audio) = msg.audio() {
        InboundMessage::Attachment(Attachment::Audio {
            file: file_ref(&audio.file),
            file_name: audio.file_name.clone(),
        })
    } else {
        return None;
    };

    Some(Inbound {
        chat_id: msg.chat.id.0,
        message_id: msg.id.0,
        payload,
    })
}
