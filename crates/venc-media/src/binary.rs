//! Encoder binary resolution.
//!
//! Precedence, first match wins:
//! 1. an override path that exists on disk
//! 2. the version-pinned cache file `<workpath>/ffmpeg-<version>[.exe]`
//! 3. a fresh download of the pinned release into the cache path

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::info;

use venc_models::Settings;

use crate::download::download_to_temp;
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{self, PersistOutcome};
use crate::metrics::record_binary_resolution;

/// Connect timeout for release downloads. The body itself is not time-limited.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Absolute path to an existing encoder executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryHandle(PathBuf);

impl BinaryHandle {
    #[cfg(test)]
    pub(crate) fn from_path(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn into_path(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for BinaryHandle {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for BinaryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Release platform key for the host, e.g. `linux-x64` or `win32-x64`.
pub fn platform_key() -> MediaResult<String> {
    let os = match std::env::consts::OS {
        "linux" => "linux",
        "macos" => "darwin",
        "windows" => "win32",
        "freebsd" => "freebsd",
        other => return Err(MediaError::UnsupportedPlatform(other.to_string())),
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        "x86" => "ia32",
        "arm" => "arm",
        other => return Err(MediaError::UnsupportedPlatform(format!("{}-{}", os, other))),
    };
    Ok(format!("{}-{}", os, arch))
}

/// Cache file name for a pinned version.
pub fn cache_file_name(version: &str) -> String {
    if cfg!(windows) {
        format!("ffmpeg-{}.exe", version)
    } else {
        format!("ffmpeg-{}", version)
    }
}

/// Resolves the encoder binary for one run.
#[derive(Debug, Clone)]
pub struct BinaryResolver {
    workpath: PathBuf,
    override_path: Option<PathBuf>,
    version: String,
    download_base_url: String,
    client: reqwest::Client,
}

impl BinaryResolver {
    /// Create a resolver from run settings.
    pub fn new(settings: &Settings) -> MediaResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| MediaError::download_failed(&settings.binary.download_base_url, e))?;

        Ok(Self {
            workpath: settings.workpath.clone(),
            override_path: settings.binary.override_path.clone(),
            version: settings.binary.version.clone(),
            download_base_url: settings.binary.download_base_url.clone(),
            client,
        })
    }

    /// Use a specific HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Where the pinned binary is cached.
    pub fn cache_path(&self) -> PathBuf {
        self.workpath.join(cache_file_name(&self.version))
    }

    /// Release URL for the host platform.
    pub fn download_url(&self) -> MediaResult<String> {
        Ok(format!(
            "{}/{}/{}",
            self.download_base_url.trim_end_matches('/'),
            self.version,
            platform_key()?
        ))
    }

    /// Resolve the encoder binary, downloading it if needed.
    pub async fn resolve(&self) -> MediaResult<BinaryHandle> {
        if let Some(path) = &self.override_path {
            if fs::try_exists(path).await.unwrap_or(false) {
                info!("Using external ffmpeg binary at: {}", path.display());
                record_binary_resolution("override");
                return Ok(BinaryHandle(fs_utils::absolute(path)?));
            }
        }

        let cache_path = fs_utils::absolute(self.cache_path())?;

        if fs::try_exists(&cache_path).await.unwrap_or(false) {
            info!(
                "Using existing ffmpeg binary {} at: {}",
                self.version,
                cache_path.display()
            );
            record_binary_resolution("cache");
            return Ok(BinaryHandle(cache_path));
        }

        info!("ffmpeg binary {} is not found", self.version);
        self.download(&cache_path).await?;
        record_binary_resolution("download");

        Ok(BinaryHandle(cache_path))
    }

    async fn download(&self, cache_path: &Path) -> MediaResult<()> {
        let url = self.download_url()?;
        info!(
            "Downloading ffmpeg binary {} from {} to: {}",
            self.version,
            url,
            cache_path.display()
        );

        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| MediaError::download_failed(&url, e))?;
        }

        let tmp = download_to_temp(&self.client, &url, cache_path).await?;

        if let Err(e) = fs_utils::make_executable(&tmp).await {
            fs_utils::remove_quietly(&tmp).await;
            return Err(MediaError::download_failed(&url, e));
        }

        match fs_utils::persist_file(&tmp, cache_path).await {
            Ok(PersistOutcome::Renamed) => {
                info!("ffmpeg binary {} was successfully downloaded", self.version);
            }
            Ok(PersistOutcome::AlreadyPresent) => {
                info!(
                    "ffmpeg binary {} was downloaded concurrently, using existing copy",
                    self.version
                );
            }
            Err(e) => return Err(MediaError::download_failed(&url, e)),
        }

        Ok(())
    }
}

/// Resolve the encoder binary for `settings`.
pub async fn resolve_binary(settings: &Settings) -> MediaResult<BinaryHandle> {
    BinaryResolver::new(settings)?.resolve().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn release_path(version: &str) -> String {
        format!("/{}/{}", version, platform_key().unwrap())
    }

    /// Release server that announces more bytes than it sends, then hangs up.
    async fn truncated_release_server() -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    return;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 8192\r\n\r\n")
                .await
                .unwrap();
            socket.write_all(&[7u8; 1024]).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_cache_file_name() {
        let name = cache_file_name("b6.0");
        if cfg!(windows) {
            assert_eq!(name, "ffmpeg-b6.0.exe");
        } else {
            assert_eq!(name, "ffmpeg-b6.0");
        }
    }

    #[test]
    fn test_download_url() {
        let settings = Settings::new("/work").with_download_base_url("https://example.com/releases/");
        let resolver = BinaryResolver::new(&settings).unwrap();
        let url = resolver.download_url().unwrap();
        assert!(url.starts_with("https://example.com/releases/b6.0/"));
        assert!(url.ends_with(&platform_key().unwrap()));
    }

    #[tokio::test]
    async fn test_override_short_circuits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let external = dir.path().join("my-ffmpeg");
        std::fs::write(&external, b"#!/bin/sh\n").unwrap();

        let settings = Settings::new(dir.path())
            .with_override_path(&external)
            .with_download_base_url(server.uri());
        let handle = BinaryResolver::new(&settings).unwrap().resolve().await.unwrap();

        assert_eq!(handle.path(), external.as_path());
        assert!(!BinaryResolver::new(&settings).unwrap().cache_path().exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_missing_override_falls_through_to_cache() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::new(dir.path()).with_override_path(dir.path().join("nope"));
        let resolver = BinaryResolver::new(&settings).unwrap();
        std::fs::write(resolver.cache_path(), b"cached").unwrap();

        let handle = resolver.resolve().await.unwrap();
        assert_eq!(handle.path(), resolver.cache_path().as_path());
    }

    #[tokio::test]
    async fn test_download_once_then_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(release_path("b6.0")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 4096]))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let settings = Settings::new(dir.path()).with_download_base_url(server.uri());
        let resolver = BinaryResolver::new(&settings).unwrap();

        let handle = resolver.resolve().await.unwrap();
        assert_eq!(handle.path(), resolver.cache_path().as_path());
        assert_eq!(std::fs::read(handle.path()).unwrap().len(), 4096);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(handle.path()).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }

        // Second resolution hits the cache; the mock expects exactly one GET.
        let again = resolver.resolve().await.unwrap();
        assert_eq!(again, handle);

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty(), "No temp files should remain");
    }

    #[tokio::test]
    async fn test_http_error_is_download_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let settings = Settings::new(dir.path()).with_download_base_url(server.uri());
        let resolver = BinaryResolver::new(&settings).unwrap();

        let err = resolver.resolve().await.unwrap_err();
        match err {
            MediaError::DownloadFailed { url, message } => {
                assert!(url.starts_with(&server.uri()));
                assert!(message.contains("404"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!resolver.cache_path().exists());
    }

    #[tokio::test]
    async fn test_truncated_body_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::new(dir.path()).with_download_base_url(truncated_release_server().await);
        let resolver = BinaryResolver::new(&settings).unwrap();

        let err = resolver.resolve().await.unwrap_err();
        assert!(matches!(err, MediaError::DownloadFailed { .. }), "unexpected error: {err:?}");

        assert!(!resolver.cache_path().exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0, "No temp files should remain");
    }
}
