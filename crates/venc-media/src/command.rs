//! Encoder process orchestration.
//!
//! A transcode walks an explicit state machine:
//! `NotStarted → Resolving → Spawned → Succeeded | Failed`.
//! Once spawned, the runner awaits stream events (stderr chunk, stdout
//! chunk, stream closed) until both pipes close, then awaits the exit status.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

use venc_models::encoding::{ENCODED_SUFFIX, INPUT_EXTENSION_LEN};
use venc_models::{Job, Settings};

use crate::binary::{resolve_binary, BinaryHandle};
use crate::error::{MediaError, MediaResult};
use crate::metrics::record_transcode;
use crate::params::{build_params, EncodeParameters};
use crate::progress::ProgressTracker;

/// Size of a single stream read.
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Output path for an input: the last four characters (the extension) are
/// replaced by `-encoded.mp4`.
pub fn encoded_output_path(input: &str) -> String {
    let keep = input.chars().count().saturating_sub(INPUT_EXTENSION_LEN);
    let stem: String = input.chars().take(keep).collect();
    format!("{}{}", stem, ENCODED_SUFFIX)
}

/// Lifecycle of one transcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscodeState {
    NotStarted,
    /// Building parameters and resolving the binary
    Resolving,
    /// Encoder process is running
    Spawned,
    Succeeded,
    Failed,
}

impl TranscodeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscodeState::NotStarted => "not_started",
            TranscodeState::Resolving => "resolving",
            TranscodeState::Spawned => "spawned",
            TranscodeState::Succeeded => "succeeded",
            TranscodeState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TranscodeState::Succeeded | TranscodeState::Failed)
    }
}

/// A ready-to-spawn encoder invocation.
#[derive(Debug, Clone)]
pub struct EncoderCommand {
    binary: BinaryHandle,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    echo_stdout: bool,
}

impl EncoderCommand {
    /// Create a command for `binary` with the flattened argument list.
    pub fn new(binary: BinaryHandle, args: Vec<String>) -> Self {
        Self {
            binary,
            args,
            current_dir: None,
            echo_stdout: false,
        }
    }

    /// Run the encoder from this directory.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Capture stdout and echo it to the log.
    pub fn echo_stdout(mut self, echo: bool) -> Self {
        self.echo_stdout = echo;
        self
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn binary(&self) -> &BinaryHandle {
        &self.binary
    }

    /// Command line for logs. Not for shell use.
    pub fn display_line(&self) -> String {
        let mut line = self.binary.to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(self.binary.path());
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stderr(Stdio::piped())
            .stdout(if self.echo_stdout {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .kill_on_drop(true);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

/// What a single await on the process streams produced.
enum StreamEvent {
    Stderr(std::io::Result<usize>),
    Stdout(std::io::Result<usize>),
}

/// Read from a pipe that may already be closed; a closed pipe never resolves.
async fn read_chunk<R: AsyncRead + Unpin>(reader: &mut Option<R>, buf: &mut [u8]) -> std::io::Result<usize> {
    match reader {
        Some(r) => r.read(buf).await,
        None => std::future::pending().await,
    }
}

/// One transcode of one input, driven through [`TranscodeState`].
struct Transcode<'a> {
    job: &'a Job,
    settings: &'a Settings,
    input: &'a str,
    output: String,
    state: TranscodeState,
}

impl<'a> Transcode<'a> {
    fn new(job: &'a Job, settings: &'a Settings, input: &'a str) -> Self {
        Self {
            job,
            settings,
            input,
            output: encoded_output_path(input),
            state: TranscodeState::NotStarted,
        }
    }

    fn transition(&mut self, next: TranscodeState) {
        debug!(
            job_id = %self.job.uid,
            "transcode {}: {} -> {}",
            self.input,
            self.state.as_str(),
            next.as_str()
        );
        self.state = next;
    }

    fn fail(&mut self, err: MediaError) -> MediaError {
        self.transition(TranscodeState::Failed);
        err
    }

    async fn run(mut self, overrides: EncodeParameters) -> MediaResult<String> {
        info!(job_id = %self.job.uid, "[{}] transcoding asset: {}", self.job.uid, self.input);

        self.transition(TranscodeState::Resolving);
        let args = build_params(self.job, self.input, &self.output, overrides);
        let binary = match resolve_binary(self.settings).await {
            Ok(binary) => binary,
            Err(e) => return Err(self.fail(e)),
        };

        let command = EncoderCommand::new(binary, args)
            .current_dir(&self.job.workpath)
            .echo_stdout(self.settings.debug);

        if self.settings.debug {
            info!(
                job_id = %self.job.uid,
                "[{}] spawning ffmpeg process: {}",
                self.job.uid,
                command.display_line()
            );
        }

        let started = Instant::now();
        let result = self.supervise(&command).await;
        let outcome = if result.is_ok() { "success" } else { "failure" };
        record_transcode(outcome, started.elapsed().as_secs_f64());

        match result {
            Ok(()) => {
                self.transition(TranscodeState::Succeeded);
                info!(
                    job_id = %self.job.uid,
                    "[{}] Completed transcoding, new asset {}",
                    self.job.uid,
                    self.output
                );
                Ok(self.output)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn supervise(&mut self, command: &EncoderCommand) -> MediaResult<()> {
        let mut child = command
            .to_command()
            .spawn()
            .map_err(|e| MediaError::spawn_failed(command.binary().path(), e))?;
        self.transition(TranscodeState::Spawned);

        let mut tracker = ProgressTracker::new(self.job.uid.clone(), self.output.clone());
        let mut stderr = child.stderr.take();
        let mut stdout = child.stdout.take();
        let mut err_buf = vec![0u8; READ_CHUNK_SIZE];
        let mut out_buf = vec![0u8; READ_CHUNK_SIZE];

        while stderr.is_some() || stdout.is_some() {
            let event = tokio::select! {
                read = read_chunk(&mut stderr, &mut err_buf) => StreamEvent::Stderr(read),
                read = read_chunk(&mut stdout, &mut out_buf) => StreamEvent::Stdout(read),
            };

            match event {
                StreamEvent::Stderr(Ok(0)) => stderr = None,
                StreamEvent::Stderr(Ok(n)) => {
                    let text = String::from_utf8_lossy(&err_buf[..n]);
                    if self.settings.debug {
                        debug!(job_id = %self.job.uid, "[{}] {}", self.job.uid, text.trim_end());
                    }
                    tracker.on_data(&text);
                }
                StreamEvent::Stdout(Ok(0)) => stdout = None,
                StreamEvent::Stdout(Ok(n)) => {
                    let text = String::from_utf8_lossy(&out_buf[..n]);
                    info!(job_id = %self.job.uid, "[{}] {}", self.job.uid, text.trim_end());
                }
                StreamEvent::Stderr(Err(e)) => {
                    warn!(job_id = %self.job.uid, "Failed to read ffmpeg stderr: {}", e);
                    stderr = None;
                }
                StreamEvent::Stdout(Err(e)) => {
                    warn!(job_id = %self.job.uid, "Failed to read ffmpeg stdout: {}", e);
                    stdout = None;
                }
            }
        }

        let status = child.wait().await?;
        match status.code() {
            Some(0) => Ok(()),
            code => Err(MediaError::encode_failed(code)),
        }
    }
}

/// Transcode one input with default parameters.
///
/// Returns the output path on success. Relative inputs and outputs are
/// interpreted against the job workpath; the returned path is in the same
/// form as `input`.
pub async fn transcode(job: &Job, settings: &Settings, input: &str) -> MediaResult<String> {
    transcode_with(job, settings, input, EncodeParameters::new()).await
}

/// Transcode one input, layering `overrides` over the default parameters.
pub async fn transcode_with(
    job: &Job,
    settings: &Settings,
    input: &str,
    overrides: EncodeParameters,
) -> MediaResult<String> {
    Transcode::new(job, settings, input).run(overrides).await
}
