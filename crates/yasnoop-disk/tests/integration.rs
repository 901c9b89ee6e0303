// ABOUTME: Integration tests for yasnoop-disk.
// ABOUTME: Runs the upload, search, and trash engines together against the in-memory disk.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::SeqCst;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;
use yasnoop_disk::{
    Category, ClearResponse, Disk, DiskError, MemoryDisk, Operation, OperationStatus, Quota,
    RemoteNode, Result, SearchEngine, TrashOutcome, TrashPoller, UploadOutcome, UploadPipeline,
};

fn date(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap()
}

// ============================================================================
// Upload + Search
// ============================================================================

#[tokio::test]
async fn test_uploaded_files_are_found_by_search() {
    let disk = Arc::new(MemoryDisk::new());
    let pipeline = UploadPipeline::new(disk.clone(), 1024);
    let search = SearchEngine::new(disk.clone(), 8);

    for (name, category) in [
        ("Quarterly Report.pdf", Category::Document),
        ("beach.jpg", Category::Photo),
        ("report-video.mp4", Category::Video),
    ] {
        let outcome = pipeline
            .upload_on(date(2026, 3), vec![7; 10], name, category)
            .await;
        assert!(matches!(outcome, UploadOutcome::Stored { .. }));
    }

    let report = search.search("/", "report").await.unwrap();
    assert_eq!(
        report.matches,
        vec![
            "/March_2026/Files/Quarterly Report.pdf",
            "/March_2026/Videos/report-video.mp4",
        ]
    );
}

#[tokio::test]
async fn test_same_name_in_different_months_does_not_collide() {
    let disk = Arc::new(MemoryDisk::new());
    let pipeline = UploadPipeline::new(disk.clone(), 1024);

    let march = pipeline
        .upload_on(date(2026, 3), vec![1], "scan.pdf", Category::Document)
        .await;
    let april = pipeline
        .upload_on(date(2026, 4), vec![1], "scan.pdf", Category::Document)
        .await;
    let april_again = pipeline
        .upload_on(date(2026, 4), vec![1], "scan.pdf", Category::Document)
        .await;

    assert!(matches!(march, UploadOutcome::Stored { .. }));
    assert!(matches!(april, UploadOutcome::Stored { .. }));
    assert!(matches!(april_again, UploadOutcome::AlreadyExists { .. }));
    assert_eq!(disk.calls(Operation::Upload), 2);
}

/// Disk whose first two existence checks of `gate` both finish before either
/// caller moves on, and whose mkdir reports a lost race as `AlreadyExists`.
struct RacingDisk {
    inner: MemoryDisk,
    gate: String,
    gate_checks: AtomicUsize,
    barrier: Barrier,
    lost_races: AtomicUsize,
}

impl RacingDisk {
    fn new(gate: &str) -> Self {
        Self {
            inner: MemoryDisk::new(),
            gate: gate.to_string(),
            gate_checks: AtomicUsize::new(0),
            barrier: Barrier::new(2),
            lost_races: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Disk for RacingDisk {
    async fn exists(&self, path: &str) -> Result<bool> {
        let exists = self.inner.exists(path).await?;
        if path.trim_matches('/') == self.gate && self.gate_checks.fetch_add(1, SeqCst) < 2 {
            self.barrier.wait().await;
        }
        Ok(exists)
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        if self.inner.contains(path) {
            self.lost_races.fetch_add(1, SeqCst);
            return Err(DiskError::AlreadyExists(path.to_string()));
        }
        self.inner.mkdir(path).await
    }

    async fn upload(&self, data: Vec<u8>, path: &str) -> Result<()> {
        self.inner.upload(data, path).await
    }

    async fn list_children(&self, path: &str) -> Result<Vec<RemoteNode>> {
        self.inner.list_children(path).await
    }

    async fn quota(&self) -> Result<Quota> {
        self.inner.quota().await
    }

    async fn trash_total(&self) -> Result<u64> {
        self.inner.trash_total().await
    }

    async fn clear_trash(&self) -> Result<ClearResponse> {
        self.inner.clear_trash().await
    }

    async fn operation_status(&self, href: &str) -> Result<OperationStatus> {
        self.inner.operation_status(href).await
    }
}

#[tokio::test]
async fn test_concurrent_uploads_into_new_month_both_store() {
    let disk = Arc::new(RacingDisk::new("May_2026"));
    let pipeline = Arc::new(UploadPipeline::new(disk.clone(), 1024));

    let a = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            pipeline
                .upload_on(date(2026, 5), vec![1], "a.jpg", Category::Photo)
                .await
        })
    };
    let b = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            pipeline
                .upload_on(date(2026, 5), vec![2], "b.jpg", Category::Photo)
                .await
        })
    };

    assert!(matches!(a.await.unwrap(), UploadOutcome::Stored { .. }));
    assert!(matches!(b.await.unwrap(), UploadOutcome::Stored { .. }));
    // Both saw the month missing; one of them lost the mkdir.
    assert_eq!(disk.gate_checks.load(SeqCst), 2);
    assert!(disk.lost_races.load(SeqCst) >= 1);
    assert!(disk.exists("/May_2026/Photos/a.jpg").await.unwrap());
    assert!(disk.exists("/May_2026/Photos/b.jpg").await.unwrap());
}

// ============================================================================
// Trash
// ============================================================================

#[tokio::test]
async fn test_trash_clear_then_already_empty() {
    let disk = Arc::new(MemoryDisk::new().with_trash(12).with_async_clear(
        "https://cloud-api.yandex.net/v1/disk/operations/abc",
        vec![OperationStatus::Pending, OperationStatus::Success],
    ));
    let poller = TrashPoller::new(disk.clone(), Duration::from_millis(1), 5);

    assert_eq!(poller.clear().await, TrashOutcome::Cleared);
    assert_eq!(poller.clear().await, TrashOutcome::AlreadyEmpty);
    assert_eq!(disk.calls(Operation::ClearTrash), 1);
}
