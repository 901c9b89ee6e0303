// ABOUTME: Upload pipeline that files attachments under a month and category folder.
// ABOUTME: Enforces the size ceiling, creates missing folders, and refuses to store a name twice.

use crate::client::Disk;
use crate::error::{DiskError, Result};
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tracing::{info, warn};

/// Largest attachment accepted for upload (100 MiB).
pub const DEFAULT_MAX_FILE_BYTES: u64 = 100 * 1024 * 1024;

/// Kind of attachment, which decides the category folder and synthesized extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Document,
    Photo,
    Video,
    Audio,
}

impl Category {
    /// Folder the category is filed under inside the month directory.
    pub fn folder(&self) -> &'static str {
        match self {
            Category::Document => "Files",
            Category::Photo => "Photos",
            Category::Video => "Videos",
            Category::Audio => "Music",
        }
    }

    /// Extension used when the attachment carries no file name.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Category::Document => None,
            Category::Photo => Some("jpg"),
            Category::Video => Some("mp4"),
            Category::Audio => Some("mp3"),
        }
    }

    /// Human-readable name used in replies.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Document => "Document",
            Category::Photo => "Photo",
            Category::Video => "Video",
            Category::Audio => "Audio",
        }
    }

    /// Build a file name from an attachment's unique id.
    pub fn synthesized_name(&self, unique_id: &str) -> String {
        match self.extension() {
            Some(ext) => format!("{}.{}", unique_id, ext),
            None => unique_id.to_string(),
        }
    }
}

/// Where an upload lands: `<Month>_<Year>/<Folder>/<file name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub remote_directory: String,
    pub remote_file_name: String,
}

impl UploadTarget {
    /// Compute the destination for `file_name` uploaded on `date`.
    pub fn for_date(date: NaiveDate, category: Category, file_name: &str) -> Self {
        let month = date.format("%B_%Y");
        Self {
            remote_directory: format!("{}/{}", month, category.folder()),
            remote_file_name: sanitize_file_name(file_name),
        }
    }

    /// The month directory that holds every category folder.
    pub fn month_directory(&self) -> &str {
        self.remote_directory
            .split('/')
            .next()
            .unwrap_or(&self.remote_directory)
    }

    /// Full destination path of the file.
    pub fn path(&self) -> String {
        format!("{}/{}", self.remote_directory, self.remote_file_name)
    }
}

/// Keep a declared name from escaping its category folder.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "unnamed".to_string(),
        _ => cleaned,
    }
}

/// Result of a single upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Stored { path: String },
    AlreadyExists { path: String },
    TooLarge { size: u64, limit: u64 },
    TransferFailed { reason: String },
}

/// Files attachments into the remote disk.
pub struct UploadPipeline {
    disk: Arc<dyn Disk>,
    max_file_bytes: u64,
}

impl UploadPipeline {
    pub fn new(disk: Arc<dyn Disk>, max_file_bytes: u64) -> Self {
        Self {
            disk,
            max_file_bytes,
        }
    }

    /// Return `TooLarge` if `size` exceeds the ceiling.
    pub fn check_size(&self, size: u64) -> Option<UploadOutcome> {
        (size > self.max_file_bytes).then_some(UploadOutcome::TooLarge {
            size,
            limit: self.max_file_bytes,
        })
    }

    /// Upload under the current local month.
    pub async fn upload(
        &self,
        data: Vec<u8>,
        file_name: &str,
        category: Category,
    ) -> UploadOutcome {
        self.upload_on(Local::now().date_naive(), data, file_name, category)
            .await
    }

    /// Upload under the month of `date`.
    pub async fn upload_on(
        &self,
        date: NaiveDate,
        data: Vec<u8>,
        file_name: &str,
        category: Category,
    ) -> UploadOutcome {
        if let Some(too_large) = self.check_size(data.len() as u64) {
            return too_large;
        }

        let target = UploadTarget::for_date(date, category, file_name);
        match self.transfer(data, &target).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, path = %target.path(), "Upload failed");
                UploadOutcome::TransferFailed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn transfer(&self, data: Vec<u8>, target: &UploadTarget) -> Result<UploadOutcome> {
        self.ensure_dir(target.month_directory()).await?;
        self.ensure_dir(&target.remote_directory).await?;

        let path = target.path();
        if self.disk.exists(&path).await? {
            info!(path = %path, "File already stored, skipping");
            return Ok(UploadOutcome::AlreadyExists { path });
        }

        let size = data.len();
        match self.disk.upload(data, &path).await {
            Ok(()) => {
                info!(path = %path, size, "File stored");
                Ok(UploadOutcome::Stored { path })
            }
            // Lost a race with another upload of the same name.
            Err(DiskError::AlreadyExists(_)) => Ok(UploadOutcome::AlreadyExists { path }),
            Err(e) => Err(e),
        }
    }

    async fn ensure_dir(&self, path: &str) -> Result<()> {
        if self.disk.exists(path).await? {
            return Ok(());
        }
        match self.disk.mkdir(path).await {
            // Another upload created it between the check and the mkdir.
            Ok(()) | Err(DiskError::AlreadyExists(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryDisk, Operation};

    fn october() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn test_category_folders() {
        assert_eq!(Category::Document.folder(), "Files");
        assert_eq!(Category::Photo.folder(), "Photos");
        assert_eq!(Category::Video.folder(), "Videos");
        assert_eq!(Category::Audio.folder(), "Music");
    }

    #[test]
    fn test_synthesized_names() {
        assert_eq!(Category::Photo.synthesized_name("AQADx"), "AQADx.jpg");
        assert_eq!(Category::Video.synthesized_name("BAADv"), "BAADv.mp4");
        assert_eq!(Category::Audio.synthesized_name("CQADa"), "CQADa.mp3");
        assert_eq!(Category::Document.synthesized_name("BQADd"), "BQADd");
    }

    #[test]
    fn test_target_layout() {
        let target = UploadTarget::for_date(october(), Category::Photo, "cat.jpg");
        assert_eq!(target.remote_directory, "October_2026/Photos");
        assert_eq!(target.month_directory(), "October_2026");
        assert_eq!(target.path(), "October_2026/Photos/cat.jpg");
    }

    #[test]
    fn test_target_changes_with_month() {
        let next_month = NaiveDate::from_ymd_opt(2026, 11, 2).unwrap();
        let a = UploadTarget::for_date(october(), Category::Document, "a.pdf");
        let b = UploadTarget::for_date(next_month, Category::Document, "a.pdf");
        assert_ne!(a.path(), b.path());
        assert_eq!(b.path(), "November_2026/Files/a.pdf");
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("../etc/passwd"), ".._etc_passwd");
        assert_eq!(sanitize_file_name("  report.pdf "), "report.pdf");
        assert_eq!(sanitize_file_name(".."), "unnamed");
        assert_eq!(sanitize_file_name(""), "unnamed");
    }

    #[tokio::test]
    async fn test_upload_creates_folders_then_stores() {
        let disk = Arc::new(MemoryDisk::new());
        let pipeline = UploadPipeline::new(disk.clone(), DEFAULT_MAX_FILE_BYTES);

        let outcome = pipeline
            .upload_on(october(), b"hello".to_vec(), "notes.txt", Category::Document)
            .await;

        assert_eq!(
            outcome,
            UploadOutcome::Stored {
                path: "October_2026/Files/notes.txt".to_string()
            }
        );
        assert!(disk.contains("/October_2026"));
        assert!(disk.contains("/October_2026/Files"));
        assert!(disk.contains("/October_2026/Files/notes.txt"));
        assert_eq!(disk.calls(Operation::Mkdir), 2);
    }

    #[tokio::test]
    async fn test_second_upload_is_already_exists() {
        let disk = Arc::new(MemoryDisk::new());
        let pipeline = UploadPipeline::new(disk.clone(), DEFAULT_MAX_FILE_BYTES);

        let first = pipeline
            .upload_on(october(), vec![1; 8], "song.mp3", Category::Audio)
            .await;
        let second = pipeline
            .upload_on(october(), vec![2; 8], "song.mp3", Category::Audio)
            .await;

        assert!(matches!(first, UploadOutcome::Stored { .. }));
        assert_eq!(
            second,
            UploadOutcome::AlreadyExists {
                path: "October_2026/Music/song.mp3".to_string()
            }
        );
        assert_eq!(disk.calls(Operation::Upload), 1);
        // Folders exist the second time round.
        assert_eq!(disk.calls(Operation::Mkdir), 2);
    }

    #[tokio::test]
    async fn test_oversized_upload_makes_no_calls() {
        let disk = Arc::new(MemoryDisk::new());
        let pipeline = UploadPipeline::new(disk.clone(), DEFAULT_MAX_FILE_BYTES);

        let data = vec![0u8; 101 * 1024 * 1024];
        let outcome = pipeline
            .upload_on(october(), data, "big.mkv", Category::Video)
            .await;

        assert_eq!(
            outcome,
            UploadOutcome::TooLarge {
                size: 101 * 1024 * 1024,
                limit: DEFAULT_MAX_FILE_BYTES
            }
        );
        assert_eq!(disk.calls(Operation::Upload), 0);
        assert_eq!(disk.calls(Operation::Exists), 0);
    }

    #[tokio::test]
    async fn test_file_at_limit_is_accepted() {
        let disk = Arc::new(MemoryDisk::new());
        let pipeline = UploadPipeline::new(disk.clone(), 16);
        let outcome = pipeline
            .upload_on(october(), vec![0; 16], "edge.bin", Category::Document)
            .await;
        assert!(matches!(outcome, UploadOutcome::Stored { .. }));
    }

    #[tokio::test]
    async fn test_mkdir_failure_is_transfer_failed() {
        let disk = Arc::new(MemoryDisk::new().failing_at(Operation::Mkdir, "October_2026"));
        let pipeline = UploadPipeline::new(disk.clone(), DEFAULT_MAX_FILE_BYTES);

        let outcome = pipeline
            .upload_on(october(), vec![1], "a.jpg", Category::Photo)
            .await;

        assert!(matches!(outcome, UploadOutcome::TransferFailed { .. }));
        assert_eq!(disk.calls(Operation::Upload), 0);
    }

    #[tokio::test]
    async fn test_upload_failure_is_transfer_failed() {
        let disk = Arc::new(MemoryDisk::new().failing(Operation::Upload));
        let pipeline = UploadPipeline::new(disk.clone(), DEFAULT_MAX_FILE_BYTES);

        let outcome = pipeline
            .upload_on(october(), vec![1], "clip.mp4", Category::Video)
            .await;

        match outcome {
            UploadOutcome::TransferFailed { reason } => assert!(reason.contains("Upload")),
            other => panic!("Expected TransferFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_existing_month_directory_is_reused() {
        let disk = Arc::new(MemoryDisk::new().with_dir("/October_2026"));
        let pipeline = UploadPipeline::new(disk.clone(), DEFAULT_MAX_FILE_BYTES);

        let outcome = pipeline
            .upload_on(october(), vec![1], "a.jpg", Category::Photo)
            .await;

        assert!(matches!(outcome, UploadOutcome::Stored { .. }));
        assert_eq!(disk.calls(Operation::Mkdir), 1);
    }
}
