//! File transport boundary and its HTTP implementation.

use std::future::Future;
use std::pin::Pin;

use futures_util::Stream;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Method, Url};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::debug;

use ovfpush_protocol::UploadMethod;

use crate::types::{ProgressSink, UploadOptions};
use crate::{DEFAULT_CHUNK_SIZE, TransferError};

/// Moves the bytes of one file to one transfer endpoint.
///
/// Implementations report absolute percentages to `sink` while sending,
/// report a failure before returning an error, and drop the sink when done.
/// There is no retry or resume.
pub trait FileTransport: Send + Sync {
    fn upload<'a>(
        &'a self,
        file: File,
        url: &'a Url,
        options: &'a UploadOptions,
        sink: ProgressSink,
    ) -> Pin<Box<dyn Future<Output = Result<(), TransferError>> + Send + 'a>>;
}

/// Streams files to transfer endpoints with `reqwest`.
///
/// TLS trust and credentials are whatever the supplied client carries.
pub struct HttpTransport {
    client: reqwest::Client,
    chunk_size: usize,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Overrides the body chunk size (and so the progress granularity).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    async fn send(
        &self,
        file: File,
        url: &Url,
        options: &UploadOptions,
        sink: &ProgressSink,
    ) -> Result<(), TransferError> {
        let method = match options.method {
            UploadMethod::Create => Method::PUT,
            UploadMethod::Append => Method::POST,
        };

        let body = reqwest::Body::wrap_stream(progress_stream(
            file,
            options.content_length,
            self.chunk_size,
            sink.clone(),
        ));

        let mut request = self
            .client
            .request(method, url.clone())
            .header(CONTENT_LENGTH, options.content_length)
            .body(body);
        if let Some(content_type) = options.content_type {
            request = request.header(CONTENT_TYPE, content_type);
        }
        for (name, value) in &options.headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::Rejected {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        sink.report(100.0);
        debug!(%url, bytes = options.content_length, "upload acknowledged");
        Ok(())
    }
}

impl FileTransport for HttpTransport {
    fn upload<'a>(
        &'a self,
        file: File,
        url: &'a Url,
        options: &'a UploadOptions,
        sink: ProgressSink,
    ) -> Pin<Box<dyn Future<Output = Result<(), TransferError>> + Send + 'a>> {
        Box::pin(async move {
            let result = self.send(file, url, options, &sink).await;
            if let Err(e) = &result {
                sink.fail(e.to_string()).await;
            }
            result
        })
    }
}

/// Reads `file` in chunks, reporting the share of `total` sent after each one.
fn progress_stream(
    file: File,
    total: u64,
    chunk_size: usize,
    sink: ProgressSink,
) -> impl Stream<Item = Result<Vec<u8>, std::io::Error>> + Send + 'static {
    futures_util::stream::try_unfold(
        (file, 0u64, sink),
        move |(mut file, sent, sink)| async move {
            let mut buf = vec![0u8; chunk_size];
            let n = file.read(&mut buf).await?;
            if n == 0 {
                return Ok(None);
            }
            buf.truncate(n);

            let sent = sent + n as u64;
            if total > 0 {
                sink.report((sent as f64 / total as f64 * 100.0) as f32);
            }
            Ok(Some((buf, (file, sent, sink))))
        },
    )
}
