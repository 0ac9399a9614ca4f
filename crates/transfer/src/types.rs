use reqwest::Url;
use tokio::sync::mpsc;

use ovfpush_protocol::constants::{OVERWRITE_HEADER, OVERWRITE_VALUE, STREAM_VMDK_CONTENT_TYPE};
use ovfpush_protocol::{OvfFileItem, UploadMethod};

/// Buffered progress events per file.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 64;

/// A progress event emitted by a file transport for one file.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressReport {
    /// Absolute completion of the file, `0.0..=100.0`.
    Percentage(f32),
    /// Terminal failure; nothing else is credited for the file.
    Failed(String),
}

/// Write side of a file's progress channel.
///
/// The channel closes once every clone of the sink is dropped, which tells
/// the watcher that the transport is done with the file.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: mpsc::Sender<ProgressReport>,
}

impl ProgressSink {
    /// Publishes an absolute percentage without waiting.
    ///
    /// Events are absolute, so one dropped on a full channel is superseded
    /// by the next.
    pub fn report(&self, percentage: f32) {
        let _ = self.tx.try_send(ProgressReport::Percentage(percentage));
    }

    /// Publishes a terminal failure.
    pub async fn fail(&self, error: impl Into<String>) {
        let _ = self.tx.send(ProgressReport::Failed(error.into())).await;
    }

    /// Returns `true` once the watcher side has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Events sent but not yet taken by the watcher.
    #[cfg(test)]
    pub(crate) fn queued(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }
}

/// Read side of a file's progress channel, consumed by one watcher.
#[derive(Debug)]
pub struct ItemProgress {
    pub(crate) size: u64,
    pub(crate) label: String,
    pub(crate) rx: mpsc::Receiver<ProgressReport>,
}

impl ItemProgress {
    /// Declared size of the file in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Creates a fresh progress channel for a file of `size` bytes.
pub fn progress_channel(size: u64, label: impl Into<String>) -> (ProgressSink, ItemProgress) {
    let (tx, rx) = mpsc::channel(PROGRESS_CHANNEL_CAPACITY);
    (
        ProgressSink { tx },
        ItemProgress {
            size,
            label: label.into(),
            rx,
        },
    )
}

/// One file to upload to one lease transfer endpoint.
#[derive(Debug)]
pub struct TransferItem {
    url: Url,
    file: OvfFileItem,
    sink: ProgressSink,
}

impl TransferItem {
    /// Builds an item and the matching progress reader.
    ///
    /// The size is the one declared by the import spec, not the local file's.
    pub fn new(url: Url, file: OvfFileItem) -> (Self, ItemProgress) {
        let (sink, progress) = progress_channel(file.size, url.as_str());
        (
            Self {
                url,
                file,
                sink,
            },
            progress,
        )
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn file(&self) -> &OvfFileItem {
        &self.file
    }

    pub fn method(&self) -> UploadMethod {
        self.file.upload_method()
    }

    /// Splits the item for upload, handing its progress sink to the caller.
    ///
    /// Consuming the item means a file's sink can only be handed out once.
    pub fn into_parts(self) -> (Url, OvfFileItem, ProgressSink) {
        (self.url, self.file, self.sink)
    }
}

/// Per-request settings for a file upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub method: UploadMethod,
    pub content_length: u64,
    pub content_type: Option<&'static str>,
    pub headers: Vec<(&'static str, &'static str)>,
}

impl UploadOptions {
    /// Options for uploading `file` with a body of `content_length` bytes.
    ///
    /// Non-disk files (such as `.iso`) are created with `PUT` and need the
    /// overwrite header; disks are streamed with `POST`.
    pub fn for_item(file: &OvfFileItem, content_length: u64) -> Self {
        match file.upload_method() {
            UploadMethod::Create => Self {
                method: UploadMethod::Create,
                content_length,
                content_type: None,
                headers: vec![(OVERWRITE_HEADER, OVERWRITE_VALUE)],
            },
            UploadMethod::Append => Self {
                method: UploadMethod::Append,
                content_length,
                content_type: Some(STREAM_VMDK_CONTENT_TYPE),
                headers: Vec::new(),
            },
        }
    }
}
