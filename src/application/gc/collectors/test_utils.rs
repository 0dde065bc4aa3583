use async_trait::async_trait;
use bytes::Bytes;
use futures_util::future::join_all;
use std::collections::HashSet;
use std::sync::Mutex;

use crate::application::ports::{
    BlobStore, MockBlobStore, MockRecordStore, StorageError, UploadTarget,
};
use crate::domain::entities::{BlobMetadata, BlobPage, ReferencedRecord};
use crate::domain::value_objects::{BlobId, EntityKind};

pub fn blob_ids(raw: &[&str]) -> Vec<BlobId> {
    raw.iter().map(|s| BlobId::new(*s).unwrap()).collect()
}

/// Blob store mock whose listing returns `raw` as one complete page
pub fn single_page_store(raw: &[&str]) -> MockBlobStore {
    let items = blob_ids(raw);
    let mut store = MockBlobStore::new();
    store.expect_list_blobs().returning(move |_, _| {
        Ok(BlobPage {
            items: items.clone(),
            next_cursor: None,
            has_more: false,
        })
    });
    store
}

/// Record store mock serving the given `(kind, entity id, slots)` records
pub fn reference_store(records: &[(EntityKind, &str, &[&str])]) -> MockRecordStore {
    let records: Vec<ReferencedRecord> = records
        .iter()
        .map(|(kind, entity, slots)| {
            ReferencedRecord::new(*kind, *entity, blob_ids(slots)).unwrap()
        })
        .collect();

    let mut store = MockRecordStore::new();
    store.expect_list_with_image_refs().returning(move |descriptor| {
        Ok(records
            .iter()
            .filter(|r| r.kind() == descriptor.kind)
            .cloned()
            .collect())
    });
    store
}

/// Blob store that records deletions for testing
pub struct RecordingBlobStore {
    pub deleted: Mutex<Vec<BlobId>>,
    pub batch_calls: Mutex<usize>,
    /// Ids whose individual delete fails
    pub failing_ids: HashSet<BlobId>,
    /// Zero-based batch calls that fail as a whole
    pub failing_batches: HashSet<usize>,
}

impl RecordingBlobStore {
    pub fn new() -> Self {
        Self {
            deleted: Mutex::new(Vec::new()),
            batch_calls: Mutex::new(0),
            failing_ids: HashSet::new(),
            failing_batches: HashSet::new(),
        }
    }

    pub fn failing_ids(raw: &[&str]) -> Self {
        Self {
            failing_ids: blob_ids(raw).into_iter().collect(),
            ..Self::new()
        }
    }

    pub fn failing_batches(batches: &[usize]) -> Self {
        Self {
            failing_batches: batches.iter().copied().collect(),
            ..Self::new()
        }
    }

    pub fn deleted(&self) -> Vec<BlobId> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn batch_calls(&self) -> usize {
        *self.batch_calls.lock().unwrap()
    }
}

#[async_trait]
impl BlobStore for RecordingBlobStore {
    async fn generate_upload_target(&self) -> Result<UploadTarget, StorageError> {
        unimplemented!("Not needed for deletion tests")
    }

    async fn upload_bytes(
        &self,
        _target: &UploadTarget,
        _bytes: Bytes,
        _content_type: &str,
    ) -> Result<BlobId, StorageError> {
        unimplemented!("Not needed for deletion tests")
    }

    async fn fetch_url(&self, _id: &BlobId) -> Result<Option<String>, StorageError> {
        unimplemented!("Not needed for deletion tests")
    }

    async fn delete_blob(&self, id: &BlobId) -> Result<(), StorageError> {
        if self.failing_ids.contains(id) {
            return Err(StorageError::Backend(format!("refused to delete {}", id)));
        }
        self.deleted.lock().unwrap().push(id.clone());
        Ok(())
    }

    async fn delete_batch(
        &self,
        ids: &[BlobId],
    ) -> Result<Vec<Result<(), StorageError>>, StorageError> {
        let call = {
            let mut calls = self.batch_calls.lock().unwrap();
            *calls += 1;
            *calls - 1
        };
        if self.failing_batches.contains(&call) {
            return Err(StorageError::Transport("batch call dropped".to_string()));
        }
        Ok(join_all(ids.iter().map(|id| self.delete_blob(id))).await)
    }

    async fn list_blobs(
        &self,
        _cursor: Option<String>,
        _limit: usize,
    ) -> Result<BlobPage, StorageError> {
        unimplemented!("Not needed for deletion tests")
    }

    async fn get_metadata(
        &self,
        _ids: &[BlobId],
    ) -> Result<Vec<Option<BlobMetadata>>, StorageError> {
        unimplemented!("Not needed for deletion tests")
    }
}
