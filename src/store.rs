//! Artifact storage for a presentation's output directory.
//!
//! All names are relative to the store root, which is only created once
//! something is actually written.

use crate::error::StoreError;
use crate::utils::check_response_status;
use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Suffix for downloads still in flight.
const PARTIAL_SUFFIX: &str = ".part";

/// Trait for the file store the crawler writes artifacts into.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Directory artifacts are written to.
    fn root(&self) -> &Path;

    /// Checks whether an artifact named `name` already exists.
    async fn exists(&self, name: &str) -> Result<bool, StoreError>;

    /// Downloads `url` into `name`, returning the number of bytes written.
    async fn download(&self, url: &str, name: &str) -> Result<u64, StoreError>;

    /// Writes `text` into `name`.
    async fn write_text(&self, name: &str, text: &str) -> Result<(), StoreError>;
}

/// Common HTTP client configuration for media downloads.
pub fn create_http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
        .timeout(Duration::from_secs(120))
        .build()
}

/// File store on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
    client: reqwest::Client,
}

impl LocalFileStore {
    /// Creates a store rooted at `root` using the default HTTP client.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self::with_client(root, create_http_client()?))
    }

    /// Creates a store rooted at `root` using the given HTTP client.
    pub fn with_client(root: impl Into<PathBuf>, client: reqwest::Client) -> Self {
        Self {
            root: root.into(),
            client,
        }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(tokio::fs::try_exists(self.path_for(name)).await?)
    }

    async fn download(&self, url: &str, name: &str) -> Result<u64, StoreError> {
        let response = self.client.get(url).send().await?;
        let response = check_response_status(response, url)?;

        tokio::fs::create_dir_all(&self.root).await?;

        // Stream into a side file so an interrupted download never leaves a
        // truncated artifact that later runs would skip.
        let final_path = self.path_for(name);
        let partial_path = self.path_for(&format!("{}{}", name, PARTIAL_SUFFIX));
        let file = tokio::fs::File::create(&partial_path).await?;

        let result = write_partial(file, response, &partial_path, &final_path).await;
        if result.is_err() {
            let _ = tokio::fs::remove_file(&partial_path).await;
        }
        result
    }

    async fn write_text(&self, name: &str, text: &str) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.path_for(name), text).await?;
        Ok(())
    }
}

/// Streams `response` into `file`, then moves it to `final_path`.
async fn write_partial(
    mut file: tokio::fs::File,
    response: reqwest::Response,
    partial_path: &Path,
    final_path: &Path,
) -> Result<u64, StoreError> {
    let mut written: u64 = 0;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    drop(file);
    tokio::fs::rename(partial_path, final_path).await?;

    Ok(written)
}
