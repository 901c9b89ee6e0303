// ABOUTME: In-memory implementation of the Disk trait.
// ABOUTME: Keeps a listing-ordered tree, counts calls per operation, and injects scripted failures.

use crate::client::{ClearResponse, Disk, NodeKind, OperationStatus, Quota, RemoteNode};
use crate::error::{DiskError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// Operations of the Disk contract, used to count calls and inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Exists,
    Mkdir,
    Upload,
    List,
    Quota,
    TrashTotal,
    ClearTrash,
    OperationStatus,
}

#[derive(Debug, Clone)]
struct StoredNode {
    path: String,
    kind: NodeKind,
    size: u64,
}

#[derive(Debug)]
struct State {
    nodes: Vec<StoredNode>,
    total_space: u64,
    trash_total: u64,
    clear_response: ClearResponse,
    statuses: VecDeque<OperationStatus>,
    failures: Vec<(Operation, Option<String>)>,
    calls: HashMap<Operation, usize>,
}

/// Disk backed by process memory.
///
/// Paths are stored `/`-rooted; relative paths are rooted on the way in.
/// Listing order is insertion order.
#[derive(Debug)]
pub struct MemoryDisk {
    state: Mutex<State>,
}

impl Default for MemoryDisk {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(path: &str) -> String {
    let path = path.strip_prefix("disk:").unwrap_or(path);
    let trimmed = path.trim_matches('/');
    format!("/{}", trimmed)
}

fn parent_of(path: &str) -> String {
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}

fn name_of(path: &str) -> String {
    path.rsplit('/').next().unwrap_or_default().to_string()
}

impl State {
    fn contains(&self, path: &str) -> bool {
        path == "/" || self.nodes.iter().any(|n| n.path == path)
    }

    fn is_dir(&self, path: &str) -> bool {
        path == "/"
            || self
                .nodes
                .iter()
                .any(|n| n.path == path && n.kind == NodeKind::Dir)
    }

    fn record(&mut self, op: Operation, path: Option<&str>) -> Result<()> {
        *self.calls.entry(op).or_default() += 1;
        let failing = self.failures.iter().any(|(failed_op, failed_path)| {
            *failed_op == op
                && match (failed_path, path) {
                    (None, _) => true,
                    (Some(f), Some(p)) => f == p,
                    (Some(_), None) => false,
                }
        });
        if failing {
            return Err(DiskError::Unavailable(format!(
                "{:?} failed for {}",
                op,
                path.unwrap_or("account")
            )));
        }
        Ok(())
    }

    fn insert(&mut self, path: String, kind: NodeKind, size: u64) {
        if !self.contains(&path) {
            self.nodes.push(StoredNode { path, kind, size });
        }
    }

    fn insert_with_parents(&mut self, path: &str, kind: NodeKind, size: u64) {
        let parent = parent_of(path);
        if parent != "/" && !self.contains(&parent) {
            self.insert_with_parents(&parent, NodeKind::Dir, 0);
        }
        self.insert(path.to_string(), kind, size);
    }
}

impl MemoryDisk {
    /// Empty 10 GiB disk with an empty trash.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                nodes: Vec::new(),
                total_space: 10 * 1024 * 1024 * 1024,
                trash_total: 0,
                clear_response: ClearResponse::Completed,
                statuses: VecDeque::new(),
                failures: Vec::new(),
                calls: HashMap::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a directory, creating missing parents.
    pub fn with_dir(self, path: &str) -> Self {
        self.state()
            .insert_with_parents(&normalize(path), NodeKind::Dir, 0);
        self
    }

    /// Add a file of `size` bytes, creating missing parents.
    pub fn with_file(self, path: &str, size: u64) -> Self {
        self.state()
            .insert_with_parents(&normalize(path), NodeKind::File, size);
        self
    }

    /// Set the account's total space in bytes.
    pub fn with_total_space(self, total: u64) -> Self {
        self.state().total_space = total;
        self
    }

    /// Put `total` entries in the trash.
    pub fn with_trash(self, total: u64) -> Self {
        self.state().trash_total = total;
        self
    }

    /// Answer trash-clear requests as accepted, then report `statuses` one poll at a time.
    pub fn with_async_clear(self, href: &str, statuses: Vec<OperationStatus>) -> Self {
        {
            let mut state = self.state();
            state.clear_response = ClearResponse::Accepted {
                href: href.to_string(),
            };
            state.statuses = statuses.into();
        }
        self
    }

    /// Make every call of `op` fail.
    pub fn failing(self, op: Operation) -> Self {
        self.state().failures.push((op, None));
        self
    }

    /// Make calls of `op` on `path` fail.
    pub fn failing_at(self, op: Operation, path: &str) -> Self {
        self.state().failures.push((op, Some(normalize(path))));
        self
    }

    /// Number of times `op` has been called.
    pub fn calls(&self, op: Operation) -> usize {
        self.state().calls.get(&op).copied().unwrap_or(0)
    }

    /// Whether a file or directory is stored at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.state().contains(&normalize(path))
    }

    /// Current number of entries in the trash.
    pub fn trash_len(&self) -> u64 {
        self.state().trash_total
    }
}

#[async_trait]
impl Disk for MemoryDisk {
    async fn exists(&self, path: &str) -> Result<bool> {
        let path = normalize(path);
        let mut state = self.state();
        state.record(Operation::Exists, Some(&path))?;
        Ok(state.contains(&path))
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        let path = normalize(path);
        let mut state = self.state();
        state.record(Operation::Mkdir, Some(&path))?;
        if state.is_dir(&path) {
            return Ok(());
        }
        if !state.is_dir(&parent_of(&path)) {
            return Err(DiskError::Api {
                status: 409,
                body: format!("parent of {} does not exist", path),
            });
        }
        state.insert(path, NodeKind::Dir, 0);
        Ok(())
    }

    async fn upload(&self, data: Vec<u8>, path: &str) -> Result<()> {
        let path = normalize(path);
        let mut state = self.state();
        state.record(Operation::Upload, Some(&path))?;
        if state.contains(&path) {
            return Err(DiskError::AlreadyExists(path));
        }
        if !state.is_dir(&parent_of(&path)) {
            return Err(DiskError::Api {
                status: 409,
                body: format!("parent of {} does not exist", path),
            });
        }
        state.insert(path, NodeKind::File, data.len() as u64);
        Ok(())
    }

    async fn list_children(&self, path: &str) -> Result<Vec<RemoteNode>> {
        let path = normalize(path);
        let mut state = self.state();
        state.record(Operation::List, Some(&path))?;
        if !state.contains(&path) {
            return Err(DiskError::NotFound(path));
        }
        Ok(state
            .nodes
            .iter()
            .filter(|n| parent_of(&n.path) == path)
            .map(|n| RemoteNode {
                name: name_of(&n.path),
                path: n.path.clone(),
                kind: n.kind,
            })
            .collect())
    }

    async fn quota(&self) -> Result<Quota> {
        let mut state = self.state();
        state.record(Operation::Quota, None)?;
        Ok(Quota {
            total: state.total_space,
            used: state.nodes.iter().map(|n| n.size).sum(),
        })
    }

    async fn trash_total(&self) -> Result<u64> {
        let mut state = self.state();
        state.record(Operation::TrashTotal, None)?;
        Ok(state.trash_total)
    }

    async fn clear_trash(&self) -> Result<ClearResponse> {
        let mut state = self.state();
        state.record(Operation::ClearTrash, None)?;
        let response = state.clear_response.clone();
        if response == ClearResponse::Completed {
            state.trash_total = 0;
        }
        Ok(response)
    }

    async fn operation_status(&self, href: &str) -> Result<OperationStatus> {
        let mut state = self.state();
        state.record(Operation::OperationStatus, Some(href))?;
        let status = state
            .statuses
            .pop_front()
            .unwrap_or(OperationStatus::Pending);
        if status == OperationStatus::Success {
            state.trash_total = 0;
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_roots_paths() {
        assert_eq!(normalize("A/B"), "/A/B");
        assert_eq!(normalize("/A/B/"), "/A/B");
        assert_eq!(normalize("disk:/A"), "/A");
        assert_eq!(normalize("/"), "/");
    }

    #[test]
    fn test_parent_of() {
        assert_eq!(parent_of("/A"), "/");
        assert_eq!(parent_of("/A/B/c.txt"), "/A/B");
    }

    #[tokio::test]
    async fn test_with_file_creates_parents_in_order() {
        let disk = MemoryDisk::new().with_file("/A/B/report_old.txt", 3);
        let root = disk.list_children("/").await.unwrap();
        assert_eq!(root.len(), 1);
        assert_eq!(root[0].path, "/A");
        assert!(root[0].is_dir());

        let nested = disk.list_children("/A/B").await.unwrap();
        assert_eq!(nested[0].name, "report_old.txt");
        assert_eq!(disk.calls(Operation::List), 2);
    }

    #[tokio::test]
    async fn test_mkdir_existing_directory_succeeds() {
        let disk = MemoryDisk::new().with_dir("/October_2026");
        disk.mkdir("October_2026").await.unwrap();
        assert!(disk.contains("/October_2026"));
    }

    #[tokio::test]
    async fn test_mkdir_requires_parent() {
        let disk = MemoryDisk::new();
        let err = disk.mkdir("/missing/child").await.unwrap_err();
        assert!(matches!(err, DiskError::Api { status: 409, .. }));
    }

    #[tokio::test]
    async fn test_upload_refuses_overwrite() {
        let disk = MemoryDisk::new().with_file("/A/x.txt", 1);
        let err = disk.upload(vec![1, 2], "/A/x.txt").await.unwrap_err();
        assert!(matches!(err, DiskError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_failing_at_only_hits_named_path() {
        let disk = MemoryDisk::new()
            .with_dir("/A")
            .with_dir("/C")
            .failing_at(Operation::List, "/A");
        assert!(disk.list_children("/A").await.is_err());
        assert!(disk.list_children("/C").await.is_ok());
    }

    #[tokio::test]
    async fn test_quota_sums_stored_files() {
        let disk = MemoryDisk::new()
            .with_total_space(100)
            .with_file("/a.bin", 30)
            .with_file("/b.bin", 20);
        let quota = disk.quota().await.unwrap();
        assert_eq!(quota.total, 100);
        assert_eq!(quota.used, 50);
    }
}
