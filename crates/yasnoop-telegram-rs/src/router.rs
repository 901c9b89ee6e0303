// ABOUTME: Conversation router deciding how each inbound message is handled.
// ABOUTME: Authorization guard, Idle/Uploading/Searching transitions, and dispatch to the disk engines.

use crate::commands::Command;
use crate::config::Config;
use crate::error::Result;
use crate::message::{Attachment, Inbound, InboundMessage};
use crate::state::{ConversationMode, ConversationStore};
use crate::transport::ChatTransport;
use std::sync::Arc;
use tracing::{debug, info, warn};
use yasnoop_disk::{
    Category, Disk, Quota, SearchEngine, SearchError, SearchReport, TrashOutcome, TrashPoller,
    TrashStage, UploadOutcome, UploadPipeline,
};

pub const UNAUTHORIZED_REPLY: &str = "⛔ You are not authorized to use this bot.";

pub const UPLOAD_PROMPT: &str = "📤 Send documents, photos, videos or audio to upload them to Yandex Disk.\n\
To leave upload mode, send any other command.";

pub const SEARCH_PROMPT: &str = "🔍 Enter a query to search files and folders.\n\
To leave search mode, send any other command.";

pub const WELCOME_MESSAGE: &str = "🤖 Bot started. Choose an action to get going.";

pub const HELP_MESSAGE: &str = "📖 Commands:\n\
/upload - upload files to Yandex Disk\n\
/search - search files and folders\n\
/space_info - show disk usage\n\
/clear - empty the trash";

const UPLOAD_FOLLOW_UP: &str =
    "You can keep sending files, or send another command to leave upload mode.";

const SEARCH_FOLLOW_UP: &str =
    "Enter another query, or send another command to leave search mode.";

const BYTES_PER_GB: f64 = (1024u64 * 1024 * 1024) as f64;

/// What the router does with a message once its mode is known.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Reply(&'static str),
    Menu,
    SpaceInfo,
    ClearTrash,
    Search(String),
    Upload(Attachment),
    Ignore,
}

/// Next mode and action for a message arriving in `mode`.
fn transition(mode: ConversationMode, payload: InboundMessage) -> (ConversationMode, Action) {
    match payload {
        InboundMessage::Command(command) => {
            let action = match &command {
                Command::Upload => Action::Reply(UPLOAD_PROMPT),
                Command::Search => Action::Reply(SEARCH_PROMPT),
                Command::SpaceInfo => Action::SpaceInfo,
                Command::Clear => Action::ClearTrash,
                Command::Help => Action::Menu,
                Command::Other(_) => Action::Ignore,
            };
            (command.next_mode(), action)
        }
        InboundMessage::Text(query) if mode == ConversationMode::Searching => {
            (mode, Action::Search(query))
        }
        InboundMessage::Attachment(attachment) if mode == ConversationMode::Uploading => {
            (mode, Action::Upload(attachment))
        }
        InboundMessage::Text(_) | InboundMessage::Attachment(_) => (mode, Action::Ignore),
    }
}

/// Routes messages from chats to the disk engines and replies with the outcome.
pub struct Router {
    authorized_chat: i64,
    search_root: String,
    store: ConversationStore,
    transport: Arc<dyn ChatTransport>,
    disk: Arc<dyn Disk>,
    uploads: UploadPipeline,
    search: SearchEngine,
    trash: TrashPoller,
}

impl Router {
    pub fn new(config: &Config, disk: Arc<dyn Disk>, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            authorized_chat: config.telegram.authorized_chat,
            search_root: config.search.root.clone(),
            store: ConversationStore::new(),
            transport,
            uploads: UploadPipeline::new(disk.clone(), config.upload.max_file_bytes),
            search: SearchEngine::new(disk.clone(), config.search.max_depth),
            trash: TrashPoller::new(
                disk.clone(),
                config.trash.poll_interval(),
                config.trash.max_poll_attempts,
            ),
            disk,
        }
    }

    /// Conversation modes known to the router.
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Handle one inbound message.
    ///
    /// The conversation's mode is read and updated under its lock; the resulting
    /// action runs after the lock is released. Only reply delivery errors are returned.
    pub async fn handle(&self, inbound: Inbound) -> Result<()> {
        let Inbound {
            chat_id,
            message_id,
            payload,
        } = inbound;
        let reply_to = Some(message_id);

        if chat_id != self.authorized_chat {
            warn!(chat_id = %chat_id, "Message from unauthorized chat");
            return self
                .transport
                .reply(chat_id, reply_to, UNAUTHORIZED_REPLY)
                .await;
        }

        let action = {
            let conversation = self.store.conversation(chat_id).await;
            let mut mode = conversation.lock().await;
            let current = *mode;
            let (next, action) = transition(current, payload);
            if next != current {
                info!(chat_id = %chat_id, from = ?current, to = ?next, "Conversation mode changed");
            }
            *mode = next;
            action
        };

        match action {
            Action::Reply(text) => self.transport.reply(chat_id, reply_to, text).await,
            Action::Menu => self.transport.send_menu(chat_id, HELP_MESSAGE).await,
            Action::SpaceInfo => {
                let text = self.space_info().await;
                self.transport.reply(chat_id, reply_to, &text).await
            }
            Action::ClearTrash => {
                info!(chat_id = %chat_id, "Clearing trash");
                let outcome = self.trash.clear().await;
                self.transport
                    .reply(chat_id, reply_to, &trash_reply(&outcome))
                    .await
            }
            Action::Search(query) => {
                info!(chat_id = %chat_id, query = %query, "Searching");
                let result = self.search.search(&self.search_root, &query).await;
                self.transport
                    .reply(chat_id, reply_to, &search_reply(&result))
                    .await
            }
            Action::Upload(attachment) => {
                let category = attachment.category();
                let outcome = self.upload(&attachment).await;
                self.transport
                    .reply(chat_id, reply_to, &upload_reply(category, &outcome))
                    .await
            }
            Action::Ignore => {
                debug!(chat_id = %chat_id, "Message not handled in current mode");
                Ok(())
            }
        }
    }

    async fn upload(&self, attachment: &Attachment) -> UploadOutcome {
        let Some(file) = attachment.file() else {
            return UploadOutcome::TransferFailed {
                reason: "the message carries no file".to_string(),
            };
        };

        // Refuse on the declared size before downloading anything.
        if let Some(too_large) = self.uploads.check_size(file.size) {
            info!(size = file.size, "Attachment too large");
            return too_large;
        }

        let data = match self.transport.download(&file.id).await {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, file_id = %file.id, "Attachment download failed");
                return UploadOutcome::TransferFailed {
                    reason: e.to_string(),
                };
            }
        };

        let file_name = attachment.file_name(file);
        self.uploads
            .upload(data, &file_name, attachment.category())
            .await
    }

    async fn space_info(&self) -> String {
        match self.disk.quota().await {
            Ok(quota) => quota_reply(&quota),
            Err(e) => {
                warn!(error = %e, "Failed to read disk quota");
                "❌ Failed to get Yandex Disk space information.".to_string()
            }
        }
    }
}

fn gigabytes(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GB
}

fn quota_reply(quota: &Quota) -> String {
    format!(
        "💾 Yandex Disk space:\nTotal: {:.2} GB\nUsed: {:.2} GB\nFree: {:.2} GB",
        gigabytes(quota.total),
        gigabytes(quota.used),
        gigabytes(quota.free())
    )
}

fn upload_reply(category: Category, outcome: &UploadOutcome) -> String {
    let label = category.label();
    match outcome {
        UploadOutcome::Stored { .. } => format!(
            "✅ {} uploaded to Yandex Disk into '{}'. {}",
            label,
            category.folder(),
            UPLOAD_FOLLOW_UP
        ),
        UploadOutcome::AlreadyExists { .. } => format!(
            "ℹ️ {} already exists on Yandex Disk. {}",
            label, UPLOAD_FOLLOW_UP
        ),
        UploadOutcome::TooLarge { limit, .. } => format!(
            "⚠️ {} is too large. Maximum size is {} MB.",
            label,
            limit / (1024 * 1024)
        ),
        UploadOutcome::TransferFailed { reason } => format!(
            "❌ Failed to upload {}: {}. You can send it again.",
            label.to_lowercase(),
            reason
        ),
    }
}

fn search_reply(result: &std::result::Result<SearchReport, SearchError>) -> String {
    match result {
        Ok(report) if report.matches.is_empty() && report.is_complete() => {
            format!("🔍 No files or folders found. {}", SEARCH_FOLLOW_UP)
        }
        Ok(report) => {
            let mut text = if report.matches.is_empty() {
                String::from("🔍 No files or folders found.")
            } else {
                format!("🔍 Found files and folders:\n{}", report.matches.join("\n"))
            };
            if !report.is_complete() {
                text.push_str(&format!(
                    "\n\n⚠️ {} folder(s) could not be searched.",
                    report.skipped.len()
                ));
            }
            text.push_str("\n\n");
            text.push_str(SEARCH_FOLLOW_UP);
            text
        }
        Err(SearchError::EmptyQuery) => "✏️ Please enter search criteria.".to_string(),
        Err(e @ SearchError::RootUnavailable { .. }) => {
            format!("❌ Search is unavailable: {}", e)
        }
    }
}

fn trash_reply(outcome: &TrashOutcome) -> String {
    match outcome {
        TrashOutcome::AlreadyEmpty => "🗑 Trash is already empty.".to_string(),
        TrashOutcome::Cleared => "✅ Trash emptied.".to_string(),
        TrashOutcome::Failed {
            stage: TrashStage::Query,
            reason,
        } => format!("❌ Failed to read the trash: {}", reason),
        TrashOutcome::Failed { reason, .. } => format!("❌ Failed to empty the trash: {}", reason),
    }
}
