//! Sequential bulk download of request files
//!
//! Files are fetched one after another in the order the server listed them.
//! A file already on disk with the expected size is skipped without touching
//! the network; anything else is downloaded again in full. The first failure
//! aborts the batch.

use std::path::Path;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::app::client::RdaClient;
use crate::app::models::FileDescriptor;
use crate::errors::{DownloadError, DownloadResult};

/// Receives progress notifications from a running batch
///
/// All methods default to doing nothing.
pub trait FetchObserver: Send {
    /// Fraction of the batch completed, in `0.0..=1.0`
    fn batch_progress(&mut self, _fraction: f64) {}

    /// A transfer is about to begin
    fn file_started(&mut self, _file: &FileDescriptor) {}

    /// Bytes received so far for the current transfer
    ///
    /// `total` is the declared content length, or the listed size when the
    /// server declared none.
    fn file_progress(&mut self, _received: u64, _total: Option<u64>) {}

    /// The file was already complete on disk
    fn file_skipped(&mut self, _file: &FileDescriptor) {}

    /// The transfer finished and was renamed into place
    fn file_finished(&mut self, _file: &FileDescriptor, _bytes: u64) {}
}

/// Observer that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl FetchObserver for NullObserver {}

/// Summary of one `fetch_all` run
#[derive(Debug, Clone)]
pub struct FetchReport {
    pub downloaded: usize,
    pub skipped: usize,
    pub bytes_downloaded: u64,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

impl FetchReport {
    /// Total files handled, downloaded or skipped
    pub fn total(&self) -> usize {
        self.downloaded + self.skipped
    }

    /// One-line summary printed after a download
    pub fn summary(&self) -> String {
        format!(
            "Fetched {} files (started {}): downloaded {} ({} bytes), skipped {} already complete, in {:.1}s",
            self.total(),
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.downloaded,
            self.bytes_downloaded,
            self.skipped,
            self.duration.as_secs_f64()
        )
    }
}

/// Downloads a list of files into a directory
pub struct BulkFetcher<'a> {
    client: &'a RdaClient,
}

impl<'a> BulkFetcher<'a> {
    pub fn new(client: &'a RdaClient) -> Self {
        Self { client }
    }

    /// Fetch every file into `out_dir`
    ///
    /// # Errors
    ///
    /// Returns the first `DownloadError` encountered; files after the failing
    /// one are not attempted.
    pub async fn fetch_all(
        &self,
        files: &[FileDescriptor],
        out_dir: &Path,
        observer: &mut dyn FetchObserver,
    ) -> DownloadResult<FetchReport> {
        let started_at = Utc::now();
        let timer = Instant::now();

        tokio::fs::create_dir_all(out_dir).await?;
        info!("Fetching {} files into {}", files.len(), out_dir.display());

        let mut report = FetchReport {
            downloaded: 0,
            skipped: 0,
            bytes_downloaded: 0,
            started_at,
            duration: Duration::ZERO,
        };

        let total = files.len();
        for (position, file) in files.iter().enumerate() {
            observer.batch_progress(position as f64 / total as f64);

            let name = file
                .file_name()
                .ok_or_else(|| DownloadError::InvalidFileName {
                    remote_path: file.remote_path.clone(),
                })?;
            let destination = out_dir.join(name);

            if is_complete(&destination, file.expected_size).await {
                debug!("Skipping {}: already complete", destination.display());
                report.skipped += 1;
                observer.file_skipped(file);
                continue;
            }

            observer.file_started(file);
            let url = self.client.resolve_file_url(&file.remote_path)?;
            let bytes = self
                .client
                .download_file(&url, &destination, file.expected_size, observer)
                .await?;

            report.downloaded += 1;
            report.bytes_downloaded += bytes;
            observer.file_finished(file, bytes);
        }

        observer.batch_progress(1.0);
        report.duration = timer.elapsed();

        info!(
            "Fetch complete: {} downloaded, {} skipped, {} bytes",
            report.downloaded, report.skipped, report.bytes_downloaded
        );
        Ok(report)
    }
}

/// True when `path` exists with exactly the expected size
///
/// An unknown expected size never counts as complete.
async fn is_complete(path: &Path, expected_size: Option<u64>) -> bool {
    let Some(expected) = expected_size else {
        return false;
    };
    match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata.is_file() && metadata.len() == expected,
        Err(_) => false,
    }
}
