//! Encode action for render jobs.
//!
//! This crate provides:
//! - The action entry point that transcodes a job's video assets in order
//! - Worker configuration from the environment
//! - Structured job logging

pub mod action;
pub mod config;
pub mod error;
pub mod logging;

pub use action::{run, run_with_options, ActionOptions};
pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::JobLogger;
