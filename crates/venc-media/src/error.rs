//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while resolving or running the encoder.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Download failed for {url}: {message}")]
    DownloadFailed { url: String, message: String },

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Error starting ffmpeg process {}: {source}", .binary.display())]
    SpawnFailed {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "FFmpeg exited with {}",
        .exit_code.map_or_else(|| "no exit code (terminated by signal)".to_string(), |c| format!("code {c}"))
    )]
    EncodeFailed { exit_code: Option<i32> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create a download failure error.
    pub fn download_failed(url: impl Into<String>, message: impl ToString) -> Self {
        Self::DownloadFailed {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a spawn failure error.
    pub fn spawn_failed(binary: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SpawnFailed {
            binary: binary.into(),
            source,
        }
    }

    /// Create an encoder failure error.
    pub fn encode_failed(exit_code: Option<i32>) -> Self {
        Self::EncodeFailed { exit_code }
    }

    /// Exit code of a failed encoder run, if any.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::EncodeFailed { exit_code } => *exit_code,
            _ => None,
        }
    }
}
