//! Streaming HTTP download with throttled progress reporting.

use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;
use uuid::Uuid;

use crate::error::{MediaError, MediaResult};
use crate::fs_utils::remove_quietly;
use crate::metrics::record_download_duration;

/// Minimum time between two progress lines.
const REPORT_INTERVAL: Duration = Duration::from_millis(500);

/// Byte counters for a running download.
#[derive(Debug, Clone)]
pub struct DownloadProgress {
    downloaded: u64,
    total: Option<u64>,
    started: Instant,
}

impl DownloadProgress {
    /// Start tracking a download of `total` bytes (unknown if `None`).
    pub fn new(total: Option<u64>) -> Self {
        Self {
            downloaded: 0,
            total: total.filter(|t| *t > 0),
            started: Instant::now(),
        }
    }

    /// Account for a received chunk.
    pub fn advance(&mut self, bytes: u64) {
        self.downloaded += bytes;
    }

    pub fn downloaded(&self) -> u64 {
        self.downloaded
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Whole percent done, rounded down. `None` when the size is unknown.
    pub fn percentage(&self) -> Option<u32> {
        let total = self.total?;
        Some(((self.downloaded.min(total) * 100) / total) as u32)
    }

    /// Transfer rate in bytes per second after `elapsed`.
    pub fn rate_at(&self, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.downloaded as f64 / secs
    }

    /// Estimated seconds remaining after `elapsed`.
    pub fn eta_at(&self, elapsed: Duration) -> Option<f64> {
        let total = self.total?;
        let rate = self.rate_at(elapsed);
        if rate <= 0.0 {
            return None;
        }
        Some(total.saturating_sub(self.downloaded) as f64 / rate)
    }

    /// Progress line: `42% - 4.2 MB/10.0 MB - 1.5 MB/s - 4s`.
    pub fn line_at(&self, elapsed: Duration) -> String {
        let pct = self
            .percentage()
            .map_or_else(|| "?".to_string(), |p| p.to_string());
        let total = self.total.map_or_else(|| "?".to_string(), format_bytes);
        let eta = self
            .eta_at(elapsed)
            .map_or_else(|| "?".to_string(), |s| format!("{}s", s.ceil() as u64));

        format!(
            "{}% - {}/{} - {}/s - {}",
            pct,
            format_bytes(self.downloaded),
            total,
            format_bytes(self.rate_at(elapsed) as u64),
            eta
        )
    }

    /// Progress line as of now.
    pub fn line(&self) -> String {
        self.line_at(self.started.elapsed())
    }
}

/// Human-readable byte count (decimal units).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["kB", "MB", "GB", "TB"];

    if bytes < 1000 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = "B";
    for u in UNITS {
        if value < 1000.0 {
            break;
        }
        value /= 1000.0;
        unit = u;
    }
    format!("{:.1} {}", value, unit)
}

/// Sibling temp path for `dest`, unique per call.
fn temp_path_for(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());
    dest.with_file_name(format!("{}.{}.part", name, Uuid::new_v4().simple()))
}

/// Download `url` into a temp file next to `dest`.
///
/// Returns the temp path once the body is fully written and synced; the
/// caller moves it into place. On any failure the temp file is removed and
/// `MediaError::DownloadFailed` is returned.
pub async fn download_to_temp(client: &reqwest::Client, url: &str, dest: &Path) -> MediaResult<PathBuf> {
    let started = Instant::now();

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| MediaError::download_failed(url, e))?;

    if !response.status().is_success() {
        return Err(MediaError::download_failed(
            url,
            format!("HTTP {}", response.status()),
        ));
    }

    let tmp = temp_path_for(dest);
    if let Err(e) = stream_body(response, &tmp, url).await {
        remove_quietly(&tmp).await;
        return Err(e);
    }

    record_download_duration(started.elapsed().as_secs_f64());
    Ok(tmp)
}

async fn stream_body(response: reqwest::Response, path: &Path, url: &str) -> MediaResult<()> {
    let write_err = |e: std::io::Error| MediaError::download_failed(url, format!("{}: {}", path.display(), e));

    let mut progress = DownloadProgress::new(response.content_length());
    let mut file = fs::File::create(path).await.map_err(write_err)?;
    let mut stream = response.bytes_stream();
    let mut last_report = Instant::now();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| MediaError::download_failed(url, e))?;
        file.write_all(&chunk).await.map_err(write_err)?;
        progress.advance(chunk.len() as u64);

        if last_report.elapsed() >= REPORT_INTERVAL {
            info!(target: "venc::download", "{}", progress.line());
            last_report = Instant::now();
        }
    }

    file.flush().await.map_err(write_err)?;
    file.sync_all().await.map_err(write_err)?;

    info!(target: "venc::download", "{}", progress.line());
    Ok(())
}
