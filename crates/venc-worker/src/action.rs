//! Encode action entry point.
//!
//! Transcodes every video asset of a job, one encoder process at a time, in
//! asset order. Each successful transcode rewrites the asset's `dest`. The
//! first failure aborts the run; assets already rewritten stay rewritten.

use serde::{Deserialize, Serialize};
use tracing::{debug, Instrument};

use venc_media::{transcode_with, EncodeParameters};
use venc_models::{Job, Settings};

use crate::error::WorkerResult;
use crate::logging::JobLogger;

const OPERATION: &str = "action-encode";

/// Per-action options supplied by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOptions {
    /// Encoder flags layered over the defaults for every asset
    #[serde(default)]
    pub params: EncodeParameters,
}

/// Transcode all video assets of `job` with default parameters.
pub async fn run(job: &mut Job, settings: &Settings) -> WorkerResult<()> {
    run_with_options(job, settings, &ActionOptions::default()).await
}

/// Transcode all video assets of `job`, applying `options.params` to each.
pub async fn run_with_options(
    job: &mut Job,
    settings: &Settings,
    options: &ActionOptions,
) -> WorkerResult<()> {
    let logger = JobLogger::new(&job.uid, OPERATION);
    let span = logger.create_span();

    async {
        logger.log_start("action-encode action (ffmpeg)");

        for index in 0..job.assets.len() {
            let asset = &job.assets[index];
            if !asset.is_video() {
                continue;
            }

            logger.log_progress(asset.label());
            let input = asset.dest.clone();

            let output = match transcode_with(job, settings, &input, options.params.clone()).await {
                Ok(output) => output,
                Err(e) => {
                    logger.log_error(&format!("transcoding {} failed: {}", input, e));
                    return Err(e.into());
                }
            };

            job.assets[index].dest = output;
        }

        logger.log_completion("transcoding");
        if let Ok(dump) = serde_json::to_string(&*job) {
            debug!(job_id = %job.uid, "{}", dump);
        }

        Ok(())
    }
    .instrument(span)
    .await
}
