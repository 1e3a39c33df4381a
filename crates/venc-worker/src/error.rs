//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Error in action-encode module (ffmpeg): {0}")]
    Media(#[from] venc_media::MediaError),
}

impl WorkerError {
    /// The underlying media error.
    pub fn media(&self) -> &venc_media::MediaError {
        match self {
            WorkerError::Media(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use venc_media::MediaError;

    #[test]
    fn test_media_error_is_wrapped_unchanged() {
        let err: WorkerError = MediaError::encode_failed(Some(3)).into();
        assert_eq!(err.media().exit_code(), Some(3));
        assert_eq!(
            err.to_string(),
            "Error in action-encode module (ffmpeg): FFmpeg exited with code 3"
        );
    }

    #[test]
    fn test_download_error_is_wrapped_unchanged() {
        let err: WorkerError = MediaError::download_failed("https://example.com/ffmpeg", "HTTP 500").into();
        assert!(matches!(err.media(), MediaError::DownloadFailed { .. }));
        assert_eq!(err.media().exit_code(), None);
    }
}
