// ABOUTME: Trash clearing with polling of the service's asynchronous operation.
// ABOUTME: Skips the delete when the trash is empty and bounds the wait by attempt count.

use crate::client::{ClearResponse, Disk, OperationStatus};
use crate::error::DiskError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Delay between status checks of an accepted clear operation.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Status checks made before giving up on an accepted clear operation.
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 300;

/// Step of the clearing protocol that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrashStage {
    /// Reading how many entries the trash holds.
    Query,
    /// Issuing the delete request.
    Clear,
    /// Waiting for the accepted operation to finish.
    Poll,
}

impl std::fmt::Display for TrashStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrashStage::Query => write!(f, "query"),
            TrashStage::Clear => write!(f, "clear"),
            TrashStage::Poll => write!(f, "poll"),
        }
    }
}

/// Result of a clear request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrashOutcome {
    AlreadyEmpty,
    Cleared,
    Failed { stage: TrashStage, reason: String },
}

impl TrashOutcome {
    fn failed(stage: TrashStage, error: DiskError) -> Self {
        warn!(error = %error, stage = %stage, "Trash clearing failed");
        TrashOutcome::Failed {
            stage,
            reason: error.to_string(),
        }
    }
}

/// Empties the trash and follows the resulting operation to completion.
pub struct TrashPoller {
    disk: Arc<dyn Disk>,
    poll_interval: Duration,
    max_attempts: u32,
}

impl TrashPoller {
    pub fn new(disk: Arc<dyn Disk>, poll_interval: Duration, max_attempts: u32) -> Self {
        Self {
            disk,
            poll_interval,
            max_attempts,
        }
    }

    /// Permanently delete everything in the trash.
    pub async fn clear(&self) -> TrashOutcome {
        let total = match self.disk.trash_total().await {
            Ok(total) => total,
            Err(e) => return TrashOutcome::failed(TrashStage::Query, e),
        };
        if total == 0 {
            debug!("Trash already empty");
            return TrashOutcome::AlreadyEmpty;
        }

        info!(entries = total, "Clearing trash");
        match self.disk.clear_trash().await {
            Ok(ClearResponse::Completed) => {
                info!("Trash cleared");
                TrashOutcome::Cleared
            }
            Ok(ClearResponse::Accepted { href }) => self.wait_for(&href).await,
            Err(e) => TrashOutcome::failed(TrashStage::Clear, e),
        }
    }

    async fn wait_for(&self, href: &str) -> TrashOutcome {
        for attempt in 1..=self.max_attempts {
            match self.disk.operation_status(href).await {
                Ok(OperationStatus::Success) => {
                    info!(attempt, "Trash cleared");
                    return TrashOutcome::Cleared;
                }
                Ok(OperationStatus::Failed) => {
                    warn!(attempt, "Trash clearing operation failed");
                    return TrashOutcome::Failed {
                        stage: TrashStage::Poll,
                        reason: "the service reported the operation as failed".to_string(),
                    };
                }
                Ok(OperationStatus::Pending) => {
                    debug!(attempt, "Trash clearing still in progress");
                }
                Err(e) => return TrashOutcome::failed(TrashStage::Poll, e),
            }
            if attempt < self.max_attempts {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        warn!(attempts = self.max_attempts, "Gave up waiting for trash clearing");
        TrashOutcome::Failed {
            stage: TrashStage::Poll,
            reason: format!(
                "operation still in progress after {} status checks",
                self.max_attempts
            ),
        }
    }
}
