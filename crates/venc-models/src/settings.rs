//! Run settings supplied by the host.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Pinned ffmpeg-static release.
pub const DEFAULT_FFMPEG_VERSION: &str = "b6.0";
/// Release download root; `<base>/<version>/<platform>-<arch>`.
pub const DEFAULT_DOWNLOAD_BASE_URL: &str =
    "https://github.com/eugeneware/ffmpeg-static/releases/download";

/// Where the encoder binary comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BinarySettings {
    /// Externally provided encoder; wins over cache and download when it exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_path: Option<PathBuf>,

    /// Pinned release used for the cache file name and download URL
    #[serde(default = "default_version")]
    pub version: String,

    /// Release download root
    #[serde(default = "default_download_base_url")]
    pub download_base_url: String,
}

fn default_version() -> String {
    DEFAULT_FFMPEG_VERSION.to_string()
}
fn default_download_base_url() -> String {
    DEFAULT_DOWNLOAD_BASE_URL.to_string()
}

impl Default for BinarySettings {
    fn default() -> Self {
        Self {
            override_path: None,
            version: default_version(),
            download_base_url: default_download_base_url(),
        }
    }
}

/// Settings for one run of the encode action. Immutable while it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Settings {
    /// Directory holding the cached encoder binary
    pub workpath: PathBuf,

    /// Echo encoder output and command lines
    #[serde(default)]
    pub debug: bool,

    /// Encoder binary source
    #[serde(default)]
    pub binary: BinarySettings,
}

impl Settings {
    /// Create settings with default binary source and debug off.
    pub fn new(workpath: impl Into<PathBuf>) -> Self {
        Self {
            workpath: workpath.into(),
            debug: false,
            binary: BinarySettings::default(),
        }
    }

    /// Enable or disable debug output.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Use an external encoder binary.
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary.override_path = Some(path.into());
        self
    }

    /// Download releases from a different root.
    pub fn with_download_base_url(mut self, url: impl Into<String>) -> Self {
        self.binary.download_base_url = url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::new("/tmp/work");
        assert!(!settings.debug);
        assert_eq!(settings.binary.version, DEFAULT_FFMPEG_VERSION);
        assert!(settings.binary.override_path.is_none());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"workpath":"/w"}"#).unwrap();
        assert_eq!(settings.binary, BinarySettings::default());
        assert!(!settings.debug);
    }
}
