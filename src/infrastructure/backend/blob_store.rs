use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;

use super::client::{with_token, BackendClient, BackendError};
use crate::application::ports::{BlobStore, StorageError, UploadTarget};
use crate::domain::entities::{BlobMetadata, BlobPage};
use crate::domain::value_objects::BlobId;

const GENERATE_UPLOAD_URL: &str = "storage:generateUploadUrl";
const GET_URL: &str = "storage:getUrl";
const DELETE_FILE: &str = "storage:deleteFile";
const DELETE_FILES: &str = "storage:deleteFiles";
const LIST_FILES: &str = "storage:listFiles";
const GET_METADATA: &str = "storage:getMetadata";

impl From<BackendError> for StorageError {
    fn from(error: BackendError) -> Self {
        if error.is_unauthorized() {
            return StorageError::Unauthorized(error.to_string());
        }
        match error {
            BackendError::Http(e) => StorageError::Transport(e.to_string()),
            BackendError::Deserialize(e) => StorageError::Malformed(e.to_string()),
            other => StorageError::Backend(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    storage_id: BlobId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMetadata {
    size: u64,
    content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireDeleteOutcome {
    success: bool,
    error: Option<String>,
}

/// Blob store backed by the catalog backend's storage functions.
///
/// `token` is attached to every mutating call so the backend can enforce the
/// same shared secret the local gate checks.
pub struct HttpBlobStore {
    client: BackendClient,
    token: Option<String>,
}

impl HttpBlobStore {
    pub fn new(client: BackendClient, token: Option<String>) -> Self {
        Self { client, token }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn generate_upload_target(&self) -> Result<UploadTarget, StorageError> {
        let url: String = self
            .client
            .mutation(GENERATE_UPLOAD_URL, with_token(json!({}), self.token.as_deref()))
            .await?;
        Ok(UploadTarget(url))
    }

    async fn upload_bytes(
        &self,
        target: &UploadTarget,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<BlobId, StorageError> {
        if reqwest::Url::parse(target.as_str()).is_err() {
            return Err(StorageError::InvalidUploadTarget(target.as_str().to_string()));
        }
        let response: UploadResponse = self
            .client
            .post_bytes(target.as_str(), bytes, content_type)
            .await?;
        Ok(response.storage_id)
    }

    async fn fetch_url(&self, id: &BlobId) -> Result<Option<String>, StorageError> {
        Ok(self
            .client
            .query(GET_URL, json!({ "storageId": id }))
            .await?)
    }

    async fn delete_blob(&self, id: &BlobId) -> Result<(), StorageError> {
        let args = with_token(json!({ "storageId": id }), self.token.as_deref());
        self.client
            .mutation::<serde_json::Value>(DELETE_FILE, args)
            .await?;
        Ok(())
    }

    async fn delete_batch(
        &self,
        ids: &[BlobId],
    ) -> Result<Vec<Result<(), StorageError>>, StorageError> {
        let args = with_token(json!({ "storageIds": ids }), self.token.as_deref());
        let outcomes: Vec<WireDeleteOutcome> = self.client.mutation(DELETE_FILES, args).await?;

        Ok(outcomes
            .into_iter()
            .zip(ids)
            .map(|(outcome, id)| {
                if outcome.success {
                    Ok(())
                } else {
                    Err(StorageError::Backend(
                        outcome
                            .error
                            .unwrap_or_else(|| format!("delete of {} failed", id)),
                    ))
                }
            })
            .collect())
    }

    async fn list_blobs(
        &self,
        cursor: Option<String>,
        limit: usize,
    ) -> Result<BlobPage, StorageError> {
        Ok(self
            .client
            .query(LIST_FILES, json!({ "cursor": cursor, "limit": limit }))
            .await?)
    }

    async fn get_metadata(
        &self,
        ids: &[BlobId],
    ) -> Result<Vec<Option<BlobMetadata>>, StorageError> {
        let metadata: Vec<Option<WireMetadata>> = self
            .client
            .query(GET_METADATA, json!({ "storageIds": ids }))
            .await?;
        Ok(metadata
            .into_iter()
            .map(|m| m.map(|m| BlobMetadata::new(m.size, m.content_type)))
            .collect())
    }
}
