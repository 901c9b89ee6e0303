// ABOUTME: Helper binary printing the chat ID of the latest message sent to the bot.
// ABOUTME: Used once during setup to fill in telegram.authorized_chat.

use anyhow::{bail, Result};
use clap::Parser;
use teloxide::prelude::*;

#[derive(Parser)]
#[command(name = "yasnoop-chat-id")]
#[command(about = "Print the chat ID of the most recent message sent to the bot")]
struct Cli {
    /// Bot token from @BotFather
    #[arg(short, long, env = "YASNOOP_BOT_TOKEN")]
    token: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    yasnoop_log::init();

    let cli = Cli::parse();
    let bot = Bot::new(cli.token);

    let updates = bot.get_updates().await?;
    let Some(chat) = updates.iter().rev().find_map(|update| update.chat()) else {
        bail!("No messages found. Send any message to the bot and run this again.");
    };

    tracing::info!(updates = updates.len(), "Fetched pending updates");
    println!("{}", chat.id.0);
    Ok(())
}
