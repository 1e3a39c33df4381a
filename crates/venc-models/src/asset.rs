//! Job asset definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Asset type handled by the encode action.
pub const ASSET_TYPE_VIDEO: &str = "video";

/// One media item of a job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Asset type ("video", "image", "audio", ...)
    #[serde(rename = "type")]
    pub asset_type: String,

    /// Local path of the asset, relative to the job workpath unless absolute.
    /// Replaced by the encoded file after a successful transcode.
    pub dest: String,

    /// Display label (the composition layer the asset feeds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_name: Option<String>,

    /// Host fields passed through verbatim
    #[serde(flatten)]
    #[schemars(skip)]
    pub extra: Map<String, Value>,
}

impl Asset {
    /// Create an asset of the given type.
    pub fn new(asset_type: impl Into<String>, dest: impl Into<String>) -> Self {
        Self {
            asset_type: asset_type.into(),
            dest: dest.into(),
            layer_name: None,
            extra: Map::new(),
        }
    }

    /// Create a video asset.
    pub fn video(dest: impl Into<String>) -> Self {
        Self::new(ASSET_TYPE_VIDEO, dest)
    }

    /// Set the display label.
    pub fn with_layer_name(mut self, name: impl Into<String>) -> Self {
        self.layer_name = Some(name.into());
        self
    }

    /// Whether the encode action processes this asset.
    pub fn is_video(&self) -> bool {
        self.asset_type == ASSET_TYPE_VIDEO
    }

    /// Label used in log lines; falls back to the destination path.
    pub fn label(&self) -> &str {
        self.layer_name.as_deref().unwrap_or(&self.dest)
    }
}
