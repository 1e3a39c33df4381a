//! Worker configuration.

use std::path::PathBuf;

use venc_models::settings::{DEFAULT_DOWNLOAD_BASE_URL, DEFAULT_FFMPEG_VERSION};
use venc_models::{BinarySettings, Settings};

/// Environment variable naming an external ffmpeg binary.
pub const FFMPEG_PATH_ENV: &str = "NEXRENDER_FFMPEG";

/// Fallback name for the external binary, read when `NEXRENDER_FFMPEG` is unset.
pub const FFMPEG_PATH_ALIAS_ENV: &str = "FFMPEG_PATH";

/// Worker configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Work directory for the cached encoder binary
    pub work_dir: PathBuf,
    /// Echo encoder output and command lines
    pub debug: bool,
    /// External ffmpeg binary; used when it exists on disk
    pub ffmpeg_path: Option<PathBuf>,
    /// Pinned ffmpeg release
    pub ffmpeg_version: String,
    /// Release download root
    pub download_base_url: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("venc"),
            debug: false,
            ffmpeg_path: None,
            ffmpeg_version: DEFAULT_FFMPEG_VERSION.to_string(),
            download_base_url: DEFAULT_DOWNLOAD_BASE_URL.to_string(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Create config from any variable source; unset or empty values fall back to defaults.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            work_dir: var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            debug: var("WORKER_DEBUG")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(defaults.debug),
            ffmpeg_path: var(FFMPEG_PATH_ENV)
                .or_else(|| var(FFMPEG_PATH_ALIAS_ENV))
                .map(PathBuf::from),
            ffmpeg_version: var("FFMPEG_VERSION").unwrap_or(defaults.ffmpeg_version),
            download_base_url: var("FFMPEG_DOWNLOAD_BASE_URL").unwrap_or(defaults.download_base_url),
        }
    }

    /// Run settings for the encode action.
    pub fn settings(&self) -> Settings {
        Settings {
            workpath: self.work_dir.clone(),
            debug: self.debug,
            binary: BinarySettings {
                override_path: self.ffmpeg_path.clone(),
                version: self.ffmpeg_version.clone(),
                download_base_url: self.download_base_url.clone(),
            },
        }
    }
}
