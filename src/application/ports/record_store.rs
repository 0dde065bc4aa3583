use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::ReferencedRecord;
use crate::domain::errors::DomainError;
use crate::domain::reference_table::ReferenceDescriptor;
use crate::domain::value_objects::BlobId;
#[cfg(test)]
use mockall::{automock, predicate::*};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Backend rejected call: {0}")]
    Backend(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] DomainError),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Port for the catalog records that reference blobs.
///
/// Every method is keyed by a reference-table entry so the same
/// implementation serves all record kinds.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Live records of the descriptor's kind with a non-empty reference field
    async fn list_with_image_refs(
        &self,
        descriptor: &ReferenceDescriptor,
    ) -> Result<Vec<ReferencedRecord>, RepositoryError>;

    /// Point a single-slot reference field at `blob_id`
    async fn update_image_ref(
        &self,
        descriptor: &ReferenceDescriptor,
        entity_id: &str,
        blob_id: &BlobId,
        token: Option<String>,
    ) -> Result<(), RepositoryError>;

    /// Replace an ordered multi-slot reference field
    async fn update_image_refs(
        &self,
        descriptor: &ReferenceDescriptor,
        entity_id: &str,
        blob_ids: &[BlobId],
        token: Option<String>,
    ) -> Result<(), RepositoryError>;
}
