// ABOUTME: Transport-neutral model of messages delivered to the router.
// ABOUTME: Commands, free text, and attachments with the file metadata needed for upload.

use crate::commands::Command;
use yasnoop_disk::Category;

/// A message from a chat, as the router sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub chat_id: i64,
    pub message_id: i32,
    pub payload: InboundMessage,
}

/// What the message carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    Command(Command),
    Text(String),
    Attachment(Attachment),
}

impl InboundMessage {
    /// Classify message text as a command or free text.
    pub fn from_text(text: &str) -> Self {
        match Command::parse(text) {
            Some(command) => InboundMessage::Command(command),
            None => InboundMessage::Text(text.to_string()),
        }
    }
}

/// Reference to a file held by the chat service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    /// ID used to download the file.
    pub id: String,
    /// Stable ID, used to name files that arrive without a name.
    pub unique_id: String,
    /// Declared size in bytes.
    pub size: u64,
}

/// One resolution of a photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoVariant {
    pub file: FileRef,
    pub width: u32,
    pub height: u32,
}

/// File attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    Document {
        file: FileRef,
        file_name: Option<String>,
    },
    Photo {
        variants: Vec<PhotoVariant>,
    },
    Video {
        file: FileRef,
        file_name: Option<String>,
    },
    Audio {
        file: FileRef,
        file_name: Option<String>,
    },
}

impl Attachment {
    pub fn category(&self) -> Category {
        match self {
            Attachment::Document { .. } => Category::Document,
            Attachment::Photo { .. } => Category::Photo,
            Attachment::Video { .. } => Category::Video,
            Attachment::Audio { .. } => Category::Audio,
        }
    }

    /// The file to upload. For photos, the highest-resolution variant.
    pub fn file(&self) -> Option<&FileRef> {
        match self {
            Attachment::Document { file, .. }
            | Attachment::Video { file, .. }
            | Attachment::Audio { file, .. } => Some(file),
            Attachment::Photo { variants } => variants
                .iter()
                .max_by_key(|v| u64::from(v.width) * u64::from(v.height))
                .map(|v| &v.file),
        }
    }

    /// Name to store `file` under: the declared name, or one built from its unique ID.
    pub fn file_name(&self, file: &FileRef) -> String {
        let declared = match self {
            Attachment::Document { file_name, .. }
            | Attachment::Video { file_name, .. }
            | Attachment::Audio { file_name, .. } => file_name.as_deref(),
            Attachment::Photo { .. } => None,
        };
        match declared.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) => name.to_string(),
            None => self.category().synthesized_name(&file.unique_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(id: &str, size: u64) -> FileRef {
        FileRef {
            id: format!("file-{}", id),
            unique_id: id.to_string(),
            size,
        }
    }

    fn photo(id: &str, width: u32, height: u32) -> PhotoVariant {
        PhotoVariant {
            file: file(id, u64::from(width * height)),
            width,
            height,
        }
    }

    #[test]
    fn test_from_text_classifies_commands() {
        assert_eq!(
            InboundMessage::from_text("/upload"),
            InboundMessage::Command(Command::Upload)
        );
        assert_eq!(
            InboundMessage::from_text("holiday"),
            InboundMessage::Text("holiday".to_string())
        );
    }

    #[test]
    fn test_photo_picks_highest_resolution() {
        let attachment = Attachment::Photo {
            variants: vec![
                photo("small", 90, 90),
                photo("large", 1280, 960),
                photo("medium", 320, 240),
            ],
        };
        assert_eq!(attachment.file().unwrap().unique_id, "large");
        assert_eq!(attachment.category(), Category::Photo);
    }

    #[test]
    fn test_photo_without_variants_has_no_file() {
        let attachment = Attachment::Photo { variants: vec![] };
        assert!(attachment.file().is_none());
    }

    #[test]
    fn test_declared_name_is_kept() {
        let attachment = Attachment::Document {
            file: file("doc", 10),
            file_name: Some("invoice.pdf".to_string()),
        };
        let f = attachment.file().unwrap();
        assert_eq!(attachment.file_name(f), "invoice.pdf");
    }

    #[test]
    fn test_missing_name_is_synthesized() {
        let video = Attachment::Video {
            file: file("vid42", 10),
            file_name: None,
        };
        let f = video.file().unwrap();
        assert_eq!(video.file_name(f), "vid42.mp4");

        let audio = Attachment::Audio {
            file: file("aud7", 10),
            file_name: Some("   ".to_string()),
        };
        let f = audio.file().unwrap();
        assert_eq!(audio.file_name(f), "aud7.mp3");

        let picture = Attachment::Photo {
            variants: vec![photo("pic", 10, 10)],
        };
        let f = picture.file().unwrap();
        assert_eq!(picture.file_name(f), "pic.jpg");
    }
}
