//! Fetching clip and impulse files from the vox data path.

use crate::error::{Result, VoxError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Trait for retrieving the raw bytes of a vox asset.
///
/// This trait allows swapping implementations (HTTP, filesystem, mock).
#[async_trait]
pub trait ClipFetcher: Send + Sync {
    /// Fetch the file at `path`.
    ///
    /// # Errors
    /// Any failure, including a non-success HTTP status, is an error.
    async fn fetch(&self, path: &str) -> Result<Vec<u8>>;
}

/// Implement ClipFetcher for Arc<T> to allow sharing between engines.
#[async_trait]
impl<T: ClipFetcher + ?Sized> ClipFetcher for Arc<T> {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        (**self).fetch(path).await
    }
}

/// Fetches over HTTP(S).
#[cfg(feature = "http")]
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl ClipFetcher for HttpFetcher {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(path)
            .send()
            .await
            .map_err(|e| VoxError::Fetch {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(VoxError::Fetch {
                path: path.to_string(),
                message: format!("status {}", response.status()),
            });
        }

        let bytes = response.bytes().await.map_err(|e| VoxError::Fetch {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }
}

/// Reads from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

#[async_trait]
impl ClipFetcher for FileFetcher {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        tokio::fs::read(path).await.map_err(|e| VoxError::Fetch {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

/// Returns true if `base_path` names an HTTP(S) location.
pub fn is_remote(base_path: &str) -> bool {
    let lower = base_path.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Picks HTTP for remote paths and the filesystem for everything else.
#[derive(Debug, Clone, Default)]
pub struct AutoFetcher {
    #[cfg(feature = "http")]
    http: HttpFetcher,
    file: FileFetcher,
}

impl AutoFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClipFetcher for AutoFetcher {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        if is_remote(path) {
            #[cfg(feature = "http")]
            return self.http.fetch(path).await;
            #[cfg(not(feature = "http"))]
            return Err(VoxError::Fetch {
                path: path.to_string(),
                message: "built without HTTP support".to_string(),
            });
        }
        self.file.fetch(path).await
    }
}

/// Mock fetcher for testing.
///
/// Serves registered paths, fails on unknown ones, and can be told to never
/// answer so requests stay in flight.
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    files: HashMap<String, Vec<u8>>,
    default: Option<Vec<u8>>,
    hang: bool,
    requests: Arc<AtomicUsize>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bytes` for `path`.
    pub fn with_file(mut self, path: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(path.to_string(), bytes);
        self
    }

    /// Serve `bytes` for every path not registered explicitly.
    pub fn with_default(mut self, bytes: Vec<u8>) -> Self {
        self.default = Some(bytes);
        self
    }

    /// Configure the mock to never complete a fetch.
    pub fn with_hang(mut self) -> Self {
        self.hang = true;
        self
    }

    /// Number of fetches started so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClipFetcher for MockFetcher {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.files
            .get(path)
            .or(self.default.as_ref())
            .cloned()
            .ok_or_else(|| VoxError::Fetch {
                path: path.to_string(),
                message: "status 404 Not Found".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.org/vox"));
        assert!(is_remote("HTTP://example.org/vox"));
        assert!(!is_remote("data/vox"));
        assert!(!is_remote("/usr/share/railvox/vox"));
    }

    #[tokio::test]
    async fn test_file_fetcher_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"clip").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let bytes = FileFetcher.fetch(&path).await.unwrap();
        assert_eq!(bytes, b"clip");
    }

    #[tokio::test]
    async fn test_file_fetcher_missing_file() {
        let result = FileFetcher.fetch("/nonexistent/railvox/clip.mp3").await;
        assert!(matches!(result, Err(VoxError::Fetch { .. })));
    }

    #[tokio::test]
    async fn test_auto_fetcher_uses_filesystem_for_local_paths() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"local").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let bytes = AutoFetcher::new().fetch(&path).await.unwrap();
        assert_eq!(bytes, b"local");
    }

    #[tokio::test]
    async fn test_mock_fetcher_serves_and_counts() {
        let fetcher = MockFetcher::new().with_file("a.mp3", vec![1, 2, 3]);
        assert_eq!(fetcher.fetch("a.mp3").await.unwrap(), vec![1, 2, 3]);
        assert!(fetcher.fetch("b.mp3").await.is_err());
        assert_eq!(fetcher.request_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_fetcher_default() {
        let fetcher = MockFetcher::new().with_default(vec![9]);
        assert_eq!(fetcher.fetch("anything.mp3").await.unwrap(), vec![9]);
    }
}
