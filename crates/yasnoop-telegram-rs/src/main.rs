// ABOUTME: Entry point for the yasnoop-bot binary.
// ABOUTME: Loads config, connects to Telegram and Yandex Disk, runs the Long Polling event loop.

use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(name = "yasnoop-bot")]
#[command(about = "Telegram front-end for Yandex Disk using Long Polling")]
struct Cli {
    /// Config file path
    #[arg(short, long, env = "YASNOOP_CONFIG")]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up YASNOOP_* variables and config secrets from a local .env file.
    let _ = dotenvy::dotenv();
    yasnoop_log::init_for(&["yasnoop_telegram_rs", "yasnoop_disk"]);

    let cli = Cli::parse();
    yasnoop_telegram_rs::run(cli.config).await
}
