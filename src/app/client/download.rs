//! File download operations with atomic writes and streaming
//!
//! Bodies are streamed into `<name>.tmp` next to the destination and renamed
//! into place once complete, so an interrupted transfer never leaves a file
//! that looks finished.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use url::Url;

use crate::app::client::http::HttpHandler;
use crate::app::fetcher::FetchObserver;
use crate::constants::files;
use crate::errors::{DownloadError, DownloadResult};

/// File download operations handler
pub struct DownloadHandler<'a> {
    http_handler: &'a HttpHandler,
    timeout: Duration,
    chunk_size: usize,
}

impl<'a> DownloadHandler<'a> {
    /// Creates a new DownloadHandler with the given HTTP handler
    pub fn new(http_handler: &'a HttpHandler, timeout: Duration, chunk_size: usize) -> Self {
        Self {
            http_handler,
            timeout,
            chunk_size,
        }
    }

    /// Downloads a file to the specified path, overwriting any existing file
    ///
    /// Reports byte progress to `observer` as chunks arrive, against the
    /// declared content length or `expected_size` when none is declared.
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The server answers with a non-success status
    /// - The body ends before the declared content length
    /// - File I/O operations fail
    pub async fn download_file(
        &self,
        url: &Url,
        destination: &Path,
        expected_size: Option<u64>,
        observer: &mut dyn FetchObserver,
    ) -> DownloadResult<u64> {
        let temp_path = temp_path_for(destination);

        match self
            .download_to(url, &temp_path, expected_size, observer)
            .await
        {
            Ok(received) => {
                tokio::fs::rename(&temp_path, destination)
                    .await
                    .map_err(|_e| DownloadError::AtomicOperationFailed {
                        temp_path: temp_path.clone(),
                        final_path: destination.to_path_buf(),
                    })?;
                tracing::info!(
                    "Downloaded {} ({} bytes)",
                    destination.display(),
                    received
                );
                Ok(received)
            }
            Err(e) => {
                if temp_path.exists() {
                    let _ = tokio::fs::remove_file(&temp_path).await;
                }
                tracing::error!("Download of {} failed: {}", url, e);
                Err(e)
            }
        }
    }

    /// Streams the response body into `temp_path`
    async fn download_to(
        &self,
        url: &Url,
        temp_path: &Path,
        expected_size: Option<u64>,
        observer: &mut dyn FetchObserver,
    ) -> DownloadResult<u64> {
        let response = self
            .http_handler
            .client()
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DownloadError::ServerError {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let declared = response.content_length();
        if declared.is_none() {
            tracing::debug!("No content length declared for {}", url);
        }
        let total = progress_total(declared, expected_size);

        let file = File::create(temp_path).await?;
        let mut writer = BufWriter::with_capacity(self.chunk_size, file);
        let mut stream = response.bytes_stream();
        let mut received: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
            received += chunk.len() as u64;
            observer.file_progress(received, total);
        }
        writer.flush().await?;

        if let Some(expected) = declared {
            if received != expected {
                return Err(DownloadError::IncompleteDownload { received, expected });
            }
        }

        Ok(received)
    }
}

/// Size to report progress against
///
/// Only the declared length is enforced; the listed size just scales progress.
fn progress_total(declared: Option<u64>, expected_size: Option<u64>) -> Option<u64> {
    declared.or(expected_size)
}

/// Temporary sibling path used while a download is in flight
pub fn temp_path_for(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(files::TEMP_FILE_SUFFIX);
    destination.with_file_name(name)
}
