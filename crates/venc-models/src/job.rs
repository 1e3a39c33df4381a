//! Render job definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::Asset;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A render job owned by the host pipeline.
///
/// The encode action only ever rewrites `Asset::dest`; every other field,
/// including ones this crate does not know about, round-trips untouched.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Unique job ID
    pub uid: JobId,

    /// Working directory; relative asset paths resolve against it
    pub workpath: PathBuf,

    /// Assets in host order
    #[serde(default)]
    pub assets: Vec<Asset>,

    /// Host fields passed through verbatim
    #[serde(flatten)]
    #[schemars(skip)]
    pub extra: Map<String, Value>,
}

impl Job {
    /// Create a job with no assets.
    pub fn new(workpath: impl Into<PathBuf>) -> Self {
        Self {
            uid: JobId::new(),
            workpath: workpath.into(),
            assets: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Add an asset.
    pub fn with_asset(mut self, asset: Asset) -> Self {
        self.assets.push(asset);
        self
    }

    /// Resolve a path against the job's working directory.
    ///
    /// Absolute paths are returned unchanged.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workpath.join(path)
        }
    }

    /// Number of assets the encode action will transcode.
    pub fn video_asset_count(&self) -> usize {
        self.assets.iter().filter(|a| a.is_video()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_display() {
        let id = JobId::from_string("job-123");
        assert_eq!(id.to_string(), "job-123");
        assert_eq!(id.as_str(), "job-123");
    }

    #[test]
    fn test_resolve_path() {
        let job = Job::new("/tmp/work");
        assert_eq!(job.resolve_path("clip.mov"), PathBuf::from("/tmp/work/clip.mov"));
        assert_eq!(job.resolve_path("/abs/clip.mov"), PathBuf::from("/abs/clip.mov"));
    }

    #[test]
    fn test_unknown_fields_round_trip() {
        let json = r#"{
            "uid": "abc",
            "workpath": "/tmp/abc",
            "state": "render:postrender",
            "template": {"composition": "main"},
            "assets": [{"type": "video", "dest": "a.mov", "layerName": "bg", "src": "http://x/a.mov"}]
        }"#;

        let job: Job = serde_json::from_str(json).unwrap();
        assert_eq!(job.uid.as_str(), "abc");
        assert_eq!(job.video_asset_count(), 1);

        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["state"], "render:postrender");
        assert_eq!(value["template"]["composition"], "main");
        assert_eq!(value["assets"][0]["src"], "http://x/a.mov");
        assert_eq!(value["assets"][0]["layerName"], "bg");
    }
}
