//! Encode action binary.
//!
//! Usage: `venc-worker <job.json> [options.json]`
//!
//! Reads a job description, transcodes its video assets and prints the
//! updated job as JSON on stdout.

use std::path::Path;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use venc_models::Job;
use venc_worker::{run_with_options, ActionOptions, WorkerConfig};

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr; stdout carries the resulting job.
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

async fn execute(job_path: &Path, options_path: Option<&Path>) -> anyhow::Result<Job> {
    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let mut job: Job = read_json(job_path).await?;
    let options: ActionOptions = match options_path {
        Some(path) => read_json(path).await?,
        None => ActionOptions::default(),
    };

    run_with_options(&mut job, &config.settings(), &options).await?;
    Ok(job)
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider was already installed");
    }

    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(job_path) = args.first() else {
        eprintln!("usage: venc-worker <job.json> [options.json]");
        std::process::exit(2);
    };
    let options_path = args.get(1).map(Path::new);

    match execute(Path::new(job_path), options_path).await {
        Ok(job) => match serde_json::to_string_pretty(&job) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize job: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            error!("Encode action failed: {:#}", e);
            std::process::exit(1);
        }
    }
}
