// ABOUTME: Recursive name search over the remote disk tree.
// ABOUTME: Depth-first, pre-order, case-insensitive substring matching with a depth bound.

use crate::client::{Disk, RemoteNode};
use crate::error::DiskError;
use futures::future::BoxFuture;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Default bound on how many directory levels a search descends.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Reasons a search produces no report at all.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The query was empty or whitespace.
    #[error("search query is empty")]
    EmptyQuery,

    /// The starting directory could not be listed.
    #[error("cannot list {root}: {source}")]
    RootUnavailable {
        root: String,
        #[source]
        source: DiskError,
    },
}

/// Matches collected by a search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchReport {
    /// Matching paths in pre-order.
    pub matches: Vec<String>,
    /// Directories that were not searched (listing failed or too deep).
    pub skipped: Vec<String>,
}

impl SearchReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Walks the disk tree looking for names containing a query.
pub struct SearchEngine {
    disk: Arc<dyn Disk>,
    max_depth: usize,
}

impl SearchEngine {
    pub fn new(disk: Arc<dyn Disk>, max_depth: usize) -> Self {
        Self { disk, max_depth }
    }

    /// Search everything below `root` for names containing `query`, ignoring case.
    ///
    /// A directory that matches is reported before anything found inside it.
    /// Directories that cannot be listed are recorded in `skipped` and the walk
    /// carries on; only a failure to list `root` itself is an error.
    /// A whitespace-only query is empty; otherwise the query is matched as given.
    pub async fn search(&self, root: &str, query: &str) -> Result<SearchReport, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let needle = query.to_lowercase();

        let children = self
            .disk
            .list_children(root)
            .await
            .map_err(|source| SearchError::RootUnavailable {
                root: root.to_string(),
                source,
            })?;

        let mut report = SearchReport::default();
        self.visit(children, &needle, 1, &mut report).await;

        debug!(
            root = %root,
            matches = report.matches.len(),
            skipped = report.skipped.len(),
            "Search finished"
        );
        Ok(report)
    }

    fn visit<'a>(
        &'a self,
        children: Vec<RemoteNode>,
        needle: &'a str,
        depth: usize,
        report: &'a mut SearchReport,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            for child in children {
                if child.name.to_lowercase().contains(needle) {
                    report.matches.push(child.path.clone());
                }
                if !child.is_dir() {
                    continue;
                }
                if depth >= self.max_depth {
                    warn!(path = %child.path, depth, "Search depth limit reached");
                    report.skipped.push(child.path);
                    continue;
                }
                match self.disk.list_children(&child.path).await {
                    Ok(grandchildren) => {
                        self.visit(grandchildren, needle, depth + 1, report).await
                    }
                    Err(e) => {
                        warn!(error = %e, path = %child.path, "Skipping unreadable directory");
                        report.skipped.push(child.path);
                    }
                }
            }
        })
    }
}
