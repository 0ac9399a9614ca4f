//! Upload progress aggregation for multi-file imports.
//!
//! Each file of an import gets its own progress channel. One watcher task
//! per file folds that channel into a shared byte counter, and a heartbeat
//! task reports the aggregate percentage to the import lease on a fixed
//! cadence so the remote side does not expire it mid-transfer.

mod coordinator;
mod heartbeat;
mod http;
mod progress;
mod types;

pub use coordinator::UploadCoordinator;
pub use heartbeat::{LeaseProgress, lease_percentage};
pub use http::{FileTransport, HttpTransport};
pub use progress::bytes_for_percentage;
pub use reqwest::Url;
pub use types::{
    ItemProgress, PROGRESS_CHANNEL_CAPACITY, ProgressReport, ProgressSink, TransferItem,
    UploadOptions, progress_channel,
};

/// Body chunk size used by [`HttpTransport`]: 1 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upload to {url} rejected with status {status}")]
    Rejected { url: String, status: u16 },

    #[error("lease progress report failed: {0}")]
    Lease(String),
}
