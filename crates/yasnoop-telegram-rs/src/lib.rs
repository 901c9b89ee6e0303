// ABOUTME: Library root for yasnoop-telegram-rs.
// ABOUTME: Exports the router, transport, config, commands, and error modules, plus the bot's run loop.

pub mod commands;
pub mod config;
pub mod error;
pub mod message;
pub mod router;
pub mod state;
pub mod telegram;
pub mod transport;

pub use commands::Command;
pub use config::Config;
pub use error::{BridgeError, Result};
pub use message::{Attachment, FileRef, Inbound, InboundMessage, PhotoVariant};
pub use router::Router;
pub use state::{ConversationMode, ConversationStore};
pub use telegram::TelegramTransport;
pub use transport::ChatTransport;

use std::path::PathBuf;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{error, info, warn};
use yasnoop_disk::{Disk, YandexDisk};

/// Load configuration, connect to Telegram and Yandex Disk, and poll until interrupted.
pub async fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = Config::load(config_path)?;
    info!(
        authorized_chat = config.telegram.authorized_chat,
        api_url = %config.disk.api_url,
        "Configuration loaded"
    );

    let disk: Arc<dyn Disk> = Arc::new(YandexDisk::new(
        config.disk.api_url.clone(),
        config.disk.token.clone(),
        config.disk.request_timeout(),
    )?);
    let transport = Arc::new(TelegramTransport::new(&config.telegram).await?);
    let bot = transport.bot().clone();
    let router = Arc::new(Router::new(&config, disk, transport.clone()));

    if config.bot.welcome_message {
        if let Err(e) = transport
            .send_menu(config.telegram.authorized_chat, router::WELCOME_MESSAGE)
            .await
        {
            warn!(error = %e, "Failed to send welcome message");
        }
    }

    info!("Starting Long Polling");

    let handler = Update::filter_message().endpoint(handle_update);
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![router])
        .error_handler(LoggingErrorHandler::with_custom_text(
            "Error in update handler",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Shutdown complete");
    Ok(())
}

async fn handle_update(msg: Message, router: Arc<Router>) -> ResponseResult<()> {
    let Some(inbound) = telegram::inbound_from_message(&msg) else {
        return Ok(());
    };

    let chat_id = inbound.chat_id;
    if let Err(e) = router.handle(inbound).await {
        error!(chat_id = chat_id, error = %e, "Failed to handle message");
    }
    Ok(())
}
