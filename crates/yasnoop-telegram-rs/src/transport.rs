// ABOUTME: Chat transport seam between the router and the chat service.
// ABOUTME: Replies, the command menu, and attachment downloads.

use crate::error::Result;
use async_trait::async_trait;

/// Labels of the reply keyboard, one inner slice per row.
pub const MENU_COMMANDS: [[&str; 2]; 2] = [["/upload", "/search"], ["/space_info", "/clear"]];

/// Outbound side of the chat service.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send `text` to a chat, optionally as a reply to one of its messages.
    async fn reply(&self, chat_id: i64, reply_to: Option<i32>, text: &str) -> Result<()>;

    /// Send `text` with the command keyboard attached.
    async fn send_menu(&self, chat_id: i64, text: &str) -> Result<()>;

    /// Fetch the bytes of an attachment.
    async fn download(&self, file_id: &str) -> Result<Vec<u8>>;
}
