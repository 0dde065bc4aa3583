use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

use crate::application::ports::{DownloadError, ImageFetcher};

/// Downloads blob bytes from the fetch URLs the blob store hands out
pub struct HttpImageFetcher {
    http: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
        })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn download(&self, url: &str) -> Result<Bytes, DownloadError> {
        let transport = |e: reqwest::Error| DownloadError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let resp = self.http.get(url).send().await.map_err(transport)?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DownloadError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = resp.bytes().await.map_err(transport)?;
        if bytes.is_empty() {
            return Err(DownloadError::Empty(url.to_string()));
        }
        Ok(bytes)
    }
}
