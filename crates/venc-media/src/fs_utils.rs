//! Filesystem helpers for the cached encoder binary.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::MediaResult;

/// Outcome of moving a finished file into place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The file was renamed to its destination
    Renamed,
    /// Another writer got there first; the temp file was discarded
    AlreadyPresent,
}

/// Move a fully written temp file to `dst`.
///
/// The temp file must live in the same directory as `dst` so the rename is
/// atomic. If `dst` already exists it is kept and the temp file removed.
pub async fn persist_file(tmp: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<PersistOutcome> {
    let tmp = tmp.as_ref();
    let dst = dst.as_ref();

    if fs::try_exists(dst).await.unwrap_or(false) {
        tracing::debug!(
            "{} already exists, discarding {}",
            dst.display(),
            tmp.display()
        );
        remove_quietly(tmp).await;
        return Ok(PersistOutcome::AlreadyPresent);
    }

    if let Err(e) = fs::rename(tmp, dst).await {
        remove_quietly(tmp).await;
        return Err(e.into());
    }

    Ok(PersistOutcome::Renamed)
}

/// Set mode 0755 on unix. No-op elsewhere.
pub async fn make_executable(path: impl AsRef<Path>) -> MediaResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path.as_ref(), std::fs::Permissions::from_mode(0o755)).await?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Absolute form of `path`, without resolving symlinks.
pub fn absolute(path: impl AsRef<Path>) -> MediaResult<PathBuf> {
    Ok(std::path::absolute(path.as_ref())?)
}

/// Remove a file, logging instead of failing.
pub async fn remove_quietly(path: impl AsRef<Path>) {
    let path = path.as_ref();
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}
