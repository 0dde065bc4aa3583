use async_trait::async_trait;
use bytes::Bytes;
use futures_util::future::join_all;
#[cfg(test)]
use mockall::{automock, predicate::*};
use thiserror::Error;

use crate::domain::entities::{BlobMetadata, BlobPage};
use crate::domain::value_objects::BlobId;

/// Hard maximum of ids a single listing call may return
pub const MAX_PAGE_SIZE: usize = 8000;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Backend rejected call: {0}")]
    Backend(String),

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("Invalid upload target: {0}")]
    InvalidUploadTarget(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// One-shot destination for uploading new blob bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget(pub String);

impl UploadTarget {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Port for the platform's blob store
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Reserve an upload destination for a new blob
    async fn generate_upload_target(&self) -> Result<UploadTarget, StorageError>;

    /// Upload bytes to a reserved target and return the new blob id
    async fn upload_bytes(
        &self,
        target: &UploadTarget,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<BlobId, StorageError>;

    /// Resolve a URL the blob can be downloaded from, if the blob exists
    async fn fetch_url(&self, id: &BlobId) -> Result<Option<String>, StorageError>;

    /// Delete a single blob
    async fn delete_blob(&self, id: &BlobId) -> Result<(), StorageError>;

    /// Delete a batch of blobs in one call.
    ///
    /// The outer error means the whole call failed; otherwise one result per
    /// id is returned in input order. The default issues an independent
    /// `delete_blob` per id and awaits them together.
    async fn delete_batch(
        &self,
        ids: &[BlobId],
    ) -> Result<Vec<Result<(), StorageError>>, StorageError> {
        Ok(join_all(ids.iter().map(|id| self.delete_blob(id))).await)
    }

    /// List up to `limit` ids in ascending order, strictly after `cursor`
    async fn list_blobs(
        &self,
        cursor: Option<String>,
        limit: usize,
    ) -> Result<BlobPage, StorageError>;

    /// Metadata for each id in input order; `None` for ids the store does not know
    async fn get_metadata(
        &self,
        ids: &[BlobId],
    ) -> Result<Vec<Option<BlobMetadata>>, StorageError>;
}
