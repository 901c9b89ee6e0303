// ABOUTME: Remote storage contract used by every engine in this crate.
// ABOUTME: Defines the Disk trait and the node, quota, and async-operation types it returns.

use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;

/// Kind of a remote tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Dir,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
}

impl RemoteNode {
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Dir
    }
}

/// Account space usage in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub total: u64,
    pub used: u64,
}

impl Quota {
    pub fn free(&self) -> u64 {
        self.total.saturating_sub(self.used)
    }
}

/// Synchronous answer to a trash-clear request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearResponse {
    /// The service finished the operation before answering.
    Completed,
    /// The service accepted the operation and will finish it later.
    Accepted { href: String },
}

/// Status of an asynchronous operation tracked by its handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Success,
    Failed,
    /// Anything else (`in-progress` on Yandex Disk) is still running.
    #[serde(other)]
    Pending,
}

/// Remote storage account the bot writes into.
///
/// Every call is a suspension point; implementations must be shareable
/// across concurrently handled conversations.
#[async_trait]
pub trait Disk: Send + Sync {
    /// Check whether a file or directory exists at `path`.
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Create a directory. Creating a directory that already exists succeeds.
    async fn mkdir(&self, path: &str) -> Result<()>;

    /// Store `data` at `path` without overwriting.
    async fn upload(&self, data: Vec<u8>, path: &str) -> Result<()>;

    /// List the immediate children of a directory in listing order.
    async fn list_children(&self, path: &str) -> Result<Vec<RemoteNode>>;

    /// Query total and used space.
    async fn quota(&self) -> Result<Quota>;

    /// Number of entries currently in the trash.
    async fn trash_total(&self) -> Result<u64>;

    /// Request permanent removal of everything in the trash.
    async fn clear_trash(&self) -> Result<ClearResponse>;

    /// Look up the status of an asynchronous operation.
    async fn operation_status(&self, href: &str) -> Result<OperationStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_free() {
        let quota = Quota {
            total: 10,
            used: 4,
        };
        assert_eq!(quota.free(), 6);

        let over = Quota {
            total: 10,
            used: 12,
        };
        assert_eq!(over.free(), 0);
    }

    #[test]
    fn test_operation_status_unknown_is_pending() {
        let status: OperationStatus = serde_json::from_str("\"in-progress\"").unwrap();
        assert_eq!(status, OperationStatus::Pending);
        let status: OperationStatus = serde_json::from_str("\"success\"").unwrap();
        assert_eq!(status, OperationStatus::Success);
        let status: OperationStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(status, OperationStatus::Failed);
    }

    #[test]
    fn test_remote_node_decodes_listing_item() {
        let node: RemoteNode = serde_json::from_str(
            r#"{"name":"report.txt","path":"disk:/A/report.txt","type":"file","size":12}"#,
        )
        .unwrap();
        assert_eq!(node.name, "report.txt");
        assert_eq!(node.path, "disk:/A/report.txt");
        assert!(!node.is_dir());
    }
}
