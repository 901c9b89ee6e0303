// ABOUTME: Library root for yasnoop-disk.
// ABOUTME: Exports the Disk contract, its Yandex and in-memory backends, and the storage engines.

pub mod client;
pub mod error;
pub mod memory;
pub mod search;
pub mod trash;
pub mod upload;
pub mod yandex;

pub use client::{ClearResponse, Disk, NodeKind, OperationStatus, Quota, RemoteNode};
pub use error::{DiskError, Result};
pub use memory::{MemoryDisk, Operation};
pub use search::{SearchEngine, SearchError, SearchReport};
pub use trash::{TrashOutcome, TrashPoller, TrashStage};
pub use upload::{Category, UploadOutcome, UploadPipeline, UploadTarget};
pub use yandex::YandexDisk;
