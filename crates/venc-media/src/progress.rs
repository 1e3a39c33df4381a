//! FFmpeg progress parsing.
//!
//! FFmpeg announces the input duration once (`Duration: 00:02:00.00, start: ...`)
//! and then periodically reports the output position
//! (`frame=... time=00:01:00.00 bitrate=...`). Both are matched against a
//! small pending buffer so an announcement split across two reads is still
//! seen; text is dropped once it has matched or once a line terminator
//! (`\n` or `\r`) follows it.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::info;

use venc_models::JobId;

/// Pending text beyond this size is discarded.
const MAX_PENDING_BYTES: usize = 64 * 1024;

static DURATION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+):(\d+):(\d+)\.(\d+), start:").unwrap());

static POSITION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"time=(\d+):(\d+):(\d+)\.(\d+) bitrate=").unwrap());

/// Convert an `HH:MM:SS` timestamp to milliseconds.
///
/// `None` when the value does not fit in a `u64`.
pub fn to_milliseconds(hours: u64, minutes: u64, seconds: u64) -> Option<u64> {
    hours
        .checked_mul(60)?
        .checked_add(minutes)?
        .checked_mul(60)?
        .checked_add(seconds)?
        .checked_mul(1000)
}

fn captured_ms(caps: &Captures<'_>) -> u64 {
    let field = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };
    // Out-of-range timestamps count as unknown.
    to_milliseconds(field(1), field(2), field(3)).unwrap_or(0)
}

/// Progress of one encoder invocation. Zero means "not known yet".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    /// Input duration in milliseconds
    pub total_duration_ms: u64,
    /// Output position in milliseconds
    pub current_position_ms: u64,
}

impl ProgressState {
    /// Completion percentage, rounded up and capped at 100.
    ///
    /// The encoder can report a position slightly past the announced
    /// duration; such readings are reported as 100 rather than e.g. 101.
    /// `None` while either value is unknown.
    pub fn percentage(&self) -> Option<u32> {
        if self.total_duration_ms == 0 || self.current_position_ms == 0 {
            return None;
        }
        let pct = self.current_position_ms.saturating_mul(100).div_ceil(self.total_duration_ms);
        Some(pct.min(100) as u32)
    }
}

/// A progress emission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub job_id: JobId,
    /// Output file being written
    pub output: String,
    pub percentage: u32,
    pub position_ms: u64,
    pub total_ms: u64,
}

/// Incremental stderr parser for one encoder invocation.
#[derive(Debug)]
pub struct ProgressTracker {
    job_id: JobId,
    output: String,
    state: ProgressState,
    pending: String,
}

impl ProgressTracker {
    /// Create a tracker for one invocation.
    pub fn new(job_id: JobId, output: impl Into<String>) -> Self {
        Self {
            job_id,
            output: output.into(),
            state: ProgressState::default(),
            pending: String::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> ProgressState {
        self.state
    }

    /// Feed one stderr chunk.
    ///
    /// Returns the progress emitted for this chunk, if any. An emission
    /// happens only when the chunk completed a position announcement and
    /// the duration is already known.
    pub fn on_data(&mut self, chunk: &str) -> Option<ProgressUpdate> {
        self.pending.push_str(chunk);

        let mut consumed = 0;

        if self.state.total_duration_ms == 0 {
            if let Some(caps) = DURATION_PATTERN.captures(&self.pending) {
                self.state.total_duration_ms = captured_ms(&caps);
                consumed = caps.get(0).map_or(0, |m| m.end());
            }
        }

        let mut position = None;
        for caps in POSITION_PATTERN.captures_iter(&self.pending) {
            position = Some(captured_ms(&caps));
            consumed = consumed.max(caps.get(0).map_or(0, |m| m.end()));
        }

        if let Some(idx) = self.pending.rfind(['\n', '\r']) {
            consumed = consumed.max(idx + 1);
        }
        self.pending.drain(..consumed);
        if self.pending.len() > MAX_PENDING_BYTES {
            self.pending.clear();
        }

        self.state.current_position_ms = position?;
        let percentage = self.state.percentage()?;

        info!(
            job_id = %self.job_id,
            "[{}] [{}] encoding progress {}%...",
            self.job_id, self.output, percentage
        );

        Some(ProgressUpdate {
            job_id: self.job_id.clone(),
            output: self.output.clone(),
            percentage,
            position_ms: self.state.current_position_ms,
            total_ms: self.state.total_duration_ms,
        })
    }
}
