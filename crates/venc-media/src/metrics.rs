//! Encoder metrics.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding process installs a recorder.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const TRANSCODES_TOTAL: &str = "venc_transcodes_total";
    pub const TRANSCODE_DURATION_SECONDS: &str = "venc_transcode_duration_seconds";
    pub const BINARY_RESOLUTIONS_TOTAL: &str = "venc_binary_resolutions_total";
    pub const BINARY_DOWNLOAD_DURATION_SECONDS: &str = "venc_binary_download_duration_seconds";
}

/// Record a finished encoder run.
pub fn record_transcode(outcome: &str, duration_secs: f64) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::TRANSCODES_TOTAL, &labels).increment(1);
    histogram!(names::TRANSCODE_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record where the encoder binary came from ("override", "cache", "download").
pub fn record_binary_resolution(source: &str) {
    let labels = [("source", source.to_string())];
    counter!(names::BINARY_RESOLUTIONS_TOTAL, &labels).increment(1);
}

/// Record binary download duration.
pub fn record_download_duration(duration_secs: f64) {
    histogram!(names::BINARY_DOWNLOAD_DURATION_SECONDS).record(duration_secs);
}
