//! Shared data models for the venc encode action.
//!
//! This crate provides Serde-serializable types for:
//! - Render jobs and their assets, as handed over by the host pipeline
//! - Run settings (work directory, debug flag, encoder binary source)
//! - Fixed encoding defaults

pub mod asset;
pub mod encoding;
pub mod job;
pub mod settings;

// Re-export common types
pub use asset::{Asset, ASSET_TYPE_VIDEO};
pub use job::{Job, JobId};
pub use settings::{BinarySettings, Settings};
