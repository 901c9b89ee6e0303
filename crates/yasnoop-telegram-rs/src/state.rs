// ABOUTME: Per-conversation mode storage for the router.
// ABOUTME: One lockable mode per chat ID; distinct chats never share a lock.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// How the router interprets the next message from a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationMode {
    #[default]
    Idle,
    /// Attachments are uploaded.
    Uploading,
    /// Free text is a search query.
    Searching,
}

/// Handle to one conversation's mode. Lock it to read and change the mode atomically.
pub type ConversationHandle = Arc<Mutex<ConversationMode>>;

/// In-memory map of chat ID to conversation mode. Lost on restart.
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: RwLock<HashMap<i64, ConversationHandle>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the conversation for a chat, starting it in Idle on first contact.
    pub async fn conversation(&self, chat_id: i64) -> ConversationHandle {
        if let Some(handle) = self.conversations.read().await.get(&chat_id) {
            return Arc::clone(handle);
        }

        let mut conversations = self.conversations.write().await;
        Arc::clone(conversations.entry(chat_id).or_insert_with(|| {
            debug!(chat_id = %chat_id, "Starting conversation");
            Arc::new(Mutex::new(ConversationMode::Idle))
        }))
    }

    /// Current mode of a chat; chats never seen are Idle.
    pub async fn mode(&self, chat_id: i64) -> ConversationMode {
        let handle = self.conversations.read().await.get(&chat_id).cloned();
        match handle {
            Some(handle) => *handle.lock().await,
            None => ConversationMode::Idle,
        }
    }

    /// Number of conversations seen since start-up.
    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.conversations.read().await.is_empty()
    }
}
