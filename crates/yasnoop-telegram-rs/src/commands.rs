// ABOUTME: Parses slash commands sent to the bot.
// ABOUTME: Recognizes /upload, /search, /space_info, /clear, /start, /help; anything else is Other.

use crate::state::ConversationMode;

/// Command name prefix.
pub const COMMAND_PREFIX: char = '/';

/// Parsed slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Enter upload mode: /upload
    Upload,
    /// Enter search mode: /search
    Search,
    /// Show disk usage: /space_info
    SpaceInfo,
    /// Empty the trash: /clear
    Clear,
    /// Show the command keyboard: /start or /help
    Help,
    /// Any other command; only leaves the current mode.
    Other(String),
}

impl Command {
    /// Parse message text into a Command. Returns None for text that is not a command.
    ///
    /// Bot-name suffixes (`/upload@my_bot`) and arguments after the name are ignored.
    pub fn parse(text: &str) -> Option<Command> {
        let rest = text.trim().strip_prefix(COMMAND_PREFIX)?;
        let word = rest.split_whitespace().next().unwrap_or("");
        let name = word.split('@').next().unwrap_or("");

        Some(match name {
            "upload" => Command::Upload,
            "search" => Command::Search,
            "space_info" => Command::SpaceInfo,
            "clear" => Command::Clear,
            "start" | "help" => Command::Help,
            other => Command::Other(other.to_string()),
        })
    }

    /// Mode the conversation is in after this command.
    pub fn next_mode(&self) -> ConversationMode {
        match self {
            Command::Upload => ConversationMode::Uploading,
            Command::Search => ConversationMode::Searching,
            Command::SpaceInfo | Command::Clear | Command::Help | Command::Other(_) => {
                ConversationMode::Idle
            }
        }
    }
}
