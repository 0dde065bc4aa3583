use async_trait::async_trait;
use bytes::Bytes;
#[cfg(test)]
use mockall::{automock, predicate::*};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Transport error downloading {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Download of {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Nothing to download at {0}")]
    NotFound(String),

    #[error("Downloaded body from {0} is empty")]
    Empty(String),
}

/// Port for downloading blob bytes from a fetch URL
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn download(&self, url: &str) -> Result<Bytes, DownloadError>;
}
