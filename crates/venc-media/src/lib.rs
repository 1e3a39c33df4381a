//! FFmpeg CLI plumbing for the encode action.
//!
//! This crate provides:
//! - Encoder binary resolution (override, cached copy, release download)
//! - Layered, deterministic argument building
//! - Progress parsing from the encoder's stderr
//! - Process spawning and supervision with exit-code mapping

pub mod binary;
pub mod command;
pub mod download;
pub mod error;
pub mod fs_utils;
pub mod metrics;
pub mod params;
pub mod progress;

pub use binary::{resolve_binary, BinaryHandle, BinaryResolver};
pub use command::{encoded_output_path, transcode, transcode_with, EncoderCommand, TranscodeState};
pub use download::DownloadProgress;
pub use error::{MediaError, MediaResult};
pub use params::{build_params, EncodeParameters, ParamValue};
pub use progress::{ProgressState, ProgressTracker, ProgressUpdate};
