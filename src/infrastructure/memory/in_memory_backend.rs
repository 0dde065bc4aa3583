use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;
use uuid::Uuid;

use crate::application::ports::{
    BlobStore, DownloadError, ImageFetcher, RecordStore, RepositoryError, StorageError,
    UploadTarget, MAX_PAGE_SIZE,
};
use crate::domain::authorization::AuthorizationGate;
use crate::domain::entities::{BlobMetadata, BlobPage, ReferencedRecord};
use crate::domain::reference_table::ReferenceDescriptor;
use crate::domain::value_objects::{BlobId, EntityKind};

const URL_SCHEME: &str = "memory://";
const UPLOAD_SCHEME: &str = "memory-upload://";

/// Failures to inject into an `InMemoryBackend`
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// One-based listing call that fails
    pub fail_list_call: Option<usize>,
    pub fail_metadata: bool,
    pub fail_scan_kind: Option<EntityKind>,
    /// Ids whose delete is refused
    pub failing_deletes: HashSet<BlobId>,
    /// One-based batch delete call that fails as a whole
    pub fail_delete_batch_call: Option<usize>,
    pub fail_record_updates: bool,
}

/// Calls observed by an `InMemoryBackend`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounters {
    pub list_calls: usize,
    pub metadata_calls: usize,
    pub delete_batch_calls: usize,
    pub deletes: usize,
    pub uploads: usize,
    pub record_updates: usize,
    pub downloads: usize,
}

#[derive(Debug, Clone)]
struct StoredBlob {
    bytes: Bytes,
    content_type: Option<String>,
}

#[derive(Default)]
struct State {
    blobs: BTreeMap<BlobId, StoredBlob>,
    records: BTreeMap<(EntityKind, String), Vec<BlobId>>,
    pending_uploads: HashSet<String>,
    faults: Faults,
    counters: CallCounters,
}

/// Blob store, record store and fetcher held entirely in memory.
///
/// Applies the same rules as the remote backend: listings follow the +1
/// over-fetch pagination, and mutations are refused unless the configured
/// gate admits the caller's token. Blob-store mutations present the session
/// token given at construction; record updates present the per-call token.
pub struct InMemoryBackend {
    state: Mutex<State>,
    gate: AuthorizationGate,
    session_token: Option<String>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            gate: AuthorizationGate::open(),
            session_token: None,
        }
    }

    /// Enforce `gate` on mutations; blob-store calls present `session_token`
    pub fn with_gate(mut self, gate: AuthorizationGate, session_token: Option<&str>) -> Self {
        self.gate = gate;
        self.session_token = session_token.map(str::to_string);
        self
    }

    pub fn insert_blob(
        &self,
        id: &str,
        bytes: impl Into<Bytes>,
        content_type: Option<&str>,
    ) -> Result<BlobId, StorageError> {
        let id = BlobId::new(id).map_err(|e| StorageError::Backend(e.to_string()))?;
        self.state.lock().blobs.insert(
            id.clone(),
            StoredBlob {
                bytes: bytes.into(),
                content_type: content_type.map(str::to_string),
            },
        );
        Ok(id)
    }

    /// Create or replace a record's reference slots
    pub fn set_record(
        &self,
        kind: EntityKind,
        entity_id: &str,
        slots: &[&str],
    ) -> Result<(), RepositoryError> {
        let slots = slots
            .iter()
            .map(|s| BlobId::new(*s))
            .collect::<Result<Vec<_>, _>>()?;
        let record = ReferencedRecord::new(kind, entity_id, slots)?;
        self.state
            .lock()
            .records
            .insert((kind, entity_id.to_string()), record.slots().to_vec());
        Ok(())
    }

    pub fn set_faults(&self, faults: Faults) {
        self.state.lock().faults = faults;
    }

    pub fn counters(&self) -> CallCounters {
        self.state.lock().counters
    }

    pub fn blob_ids(&self) -> Vec<BlobId> {
        self.state.lock().blobs.keys().cloned().collect()
    }

    pub fn contains_blob(&self, id: &str) -> bool {
        self.state.lock().blobs.keys().any(|b| b.as_str() == id)
    }

    pub fn blob_content_type(&self, id: &BlobId) -> Option<String> {
        self.state
            .lock()
            .blobs
            .get(id)
            .and_then(|b| b.content_type.clone())
    }

    pub fn blob_bytes(&self, id: &BlobId) -> Option<Bytes> {
        self.state.lock().blobs.get(id).map(|b| b.bytes.clone())
    }

    pub fn record_slots(&self, kind: EntityKind, entity_id: &str) -> Option<Vec<BlobId>> {
        self.state
            .lock()
            .records
            .get(&(kind, entity_id.to_string()))
            .cloned()
    }

    fn authorize_session(&self) -> Result<(), StorageError> {
        self.gate
            .authorize(self.session_token.as_deref())
            .map_err(|e| StorageError::Unauthorized(e.to_string()))
    }

    fn update_slots(
        &self,
        descriptor: &ReferenceDescriptor,
        entity_id: &str,
        slots: Vec<BlobId>,
        token: Option<&str>,
    ) -> Result<(), RepositoryError> {
        self.gate
            .authorize(token)
            .map_err(|e| RepositoryError::Unauthorized(e.to_string()))?;
        ReferencedRecord::new(descriptor.kind, entity_id, slots.clone())?;

        let mut state = self.state.lock();
        if state.faults.fail_record_updates {
            return Err(RepositoryError::Backend("record update rejected".to_string()));
        }
        let key = (descriptor.kind, entity_id.to_string());
        let Some(current) = state.records.get_mut(&key) else {
            return Err(RepositoryError::NotFound(format!(
                "{} {}",
                descriptor.kind, entity_id
            )));
        };
        *current = slots;
        state.counters.record_updates += 1;
        Ok(())
    }
}

#[async_trait]
impl BlobStore for InMemoryBackend {
    async fn generate_upload_target(&self) -> Result<UploadTarget, StorageError> {
        self.authorize_session()?;
        let target = format!("{}{}", UPLOAD_SCHEME, Uuid::new_v4());
        self.state.lock().pending_uploads.insert(target.clone());
        Ok(UploadTarget(target))
    }

    async fn upload_bytes(
        &self,
        target: &UploadTarget,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<BlobId, StorageError> {
        let mut state = self.state.lock();
        if !state.pending_uploads.remove(target.as_str()) {
            return Err(StorageError::InvalidUploadTarget(target.as_str().to_string()));
        }
        let id = BlobId::new(format!("blob-{}", Uuid::new_v4().simple()))
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        state.blobs.insert(
            id.clone(),
            StoredBlob {
                bytes,
                content_type: Some(content_type.to_string()),
            },
        );
        state.counters.uploads += 1;
        Ok(id)
    }

    async fn fetch_url(&self, id: &BlobId) -> Result<Option<String>, StorageError> {
        let state = self.state.lock();
        Ok(state
            .blobs
            .contains_key(id)
            .then(|| format!("{}{}", URL_SCHEME, id)))
    }

    async fn delete_blob(&self, id: &BlobId) -> Result<(), StorageError> {
        self.authorize_session()?;
        let mut state = self.state.lock();
        if state.faults.failing_deletes.contains(id) {
            return Err(StorageError::Backend(format!("delete of {} refused", id)));
        }
        match state.blobs.remove(id) {
            Some(_) => {
                state.counters.deletes += 1;
                Ok(())
            }
            None => Err(StorageError::NotFound(id.to_string())),
        }
    }

    async fn delete_batch(
        &self,
        ids: &[BlobId],
    ) -> Result<Vec<Result<(), StorageError>>, StorageError> {
        self.authorize_session()?;
        {
            let mut state = self.state.lock();
            state.counters.delete_batch_calls += 1;
            if state.faults.fail_delete_batch_call == Some(state.counters.delete_batch_calls) {
                return Err(StorageError::Transport("batch call dropped".to_string()));
            }
        }

        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            results.push(self.delete_blob(id).await);
        }
        Ok(results)
    }

    async fn list_blobs(
        &self,
        cursor: Option<String>,
        limit: usize,
    ) -> Result<BlobPage, StorageError> {
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(StorageError::Backend(format!(
                "limit {} outside 1..={}",
                limit, MAX_PAGE_SIZE
            )));
        }
        let after = cursor
            .map(BlobId::new)
            .transpose()
            .map_err(|e| StorageError::InvalidCursor(e.to_string()))?;

        let mut state = self.state.lock();
        state.counters.list_calls += 1;
        if state.faults.fail_list_call == Some(state.counters.list_calls) {
            return Err(StorageError::Transport("listing interrupted".to_string()));
        }

        let lower = match &after {
            Some(after) => Bound::Excluded(after),
            None => Bound::Unbounded,
        };
        let fetched: Vec<BlobId> = state
            .blobs
            .range::<BlobId, _>((lower, Bound::Unbounded))
            .take(limit + 1)
            .map(|(id, _)| id.clone())
            .collect();
        Ok(BlobPage::from_overfetch(fetched, limit))
    }

    async fn get_metadata(
        &self,
        ids: &[BlobId],
    ) -> Result<Vec<Option<BlobMetadata>>, StorageError> {
        let mut state = self.state.lock();
        state.counters.metadata_calls += 1;
        if state.faults.fail_metadata {
            return Err(StorageError::Transport("metadata service unavailable".to_string()));
        }
        Ok(ids
            .iter()
            .map(|id| {
                state.blobs.get(id).map(|blob| {
                    BlobMetadata::new(blob.bytes.len() as u64, blob.content_type.clone())
                })
            })
            .collect())
    }
}

#[async_trait]
impl RecordStore for InMemoryBackend {
    async fn list_with_image_refs(
        &self,
        descriptor: &ReferenceDescriptor,
    ) -> Result<Vec<ReferencedRecord>, RepositoryError> {
        let state = self.state.lock();
        if state.faults.fail_scan_kind == Some(descriptor.kind) {
            return Err(RepositoryError::Transport(format!(
                "{} listing timed out",
                descriptor.kind
            )));
        }
        state
            .records
            .iter()
            .filter(|((kind, _), slots)| *kind == descriptor.kind && !slots.is_empty())
            .map(|((kind, entity_id), slots)| {
                ReferencedRecord::new(*kind, entity_id.as_str(), slots.clone())
                    .map_err(RepositoryError::from)
            })
            .collect()
    }

    async fn update_image_ref(
        &self,
        descriptor: &ReferenceDescriptor,
        entity_id: &str,
        blob_id: &BlobId,
        token: Option<String>,
    ) -> Result<(), RepositoryError> {
        self.update_slots(descriptor, entity_id, vec![blob_id.clone()], token.as_deref())
    }

    async fn update_image_refs(
        &self,
        descriptor: &ReferenceDescriptor,
        entity_id: &str,
        blob_ids: &[BlobId],
        token: Option<String>,
    ) -> Result<(), RepositoryError> {
        self.update_slots(descriptor, entity_id, blob_ids.to_vec(), token.as_deref())
    }
}

#[async_trait]
impl ImageFetcher for InMemoryBackend {
    async fn download(&self, url: &str) -> Result<Bytes, DownloadError> {
        let Some(raw_id) = url.strip_prefix(URL_SCHEME) else {
            return Err(DownloadError::Transport {
                url: url.to_string(),
                message: "unsupported scheme".to_string(),
            });
        };

        let mut state = self.state.lock();
        state.counters.downloads += 1;
        let blob = state
            .blobs
            .iter()
            .find(|(id, _)| id.as_str() == raw_id)
            .map(|(_, blob)| blob.bytes.clone())
            .ok_or_else(|| DownloadError::NotFound(url.to_string()))?;
        if blob.is_empty() {
            return Err(DownloadError::Empty(url.to_string()));
        }
        Ok(blob)
    }
}
