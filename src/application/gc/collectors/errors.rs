use thiserror::Error;

use crate::application::gc::results::GcRunSummary;
use crate::application::ports::{RepositoryError, StorageError};
use crate::domain::authorization::UnauthorizedError;
use crate::domain::value_objects::{BlobId, EntityKind};

/// Listing the blob store failed; no partial enumeration is ever used
#[derive(Debug, Error)]
pub enum EnumerationError {
    #[error("Failed to list blob page {page}: {source}")]
    PageFailed {
        page: usize,
        #[source]
        source: StorageError,
    },

    #[error("Blob page {page} reports more pages but carries no cursor")]
    MissingCursor { page: usize },

    #[error("Blob page {page} returned cursor {cursor:?} again; listing would not advance")]
    StalledCursor { page: usize, cursor: String },

    #[error("Blob page {page} returned {returned} items for a limit of {limit}")]
    OversizedPage {
        page: usize,
        returned: usize,
        limit: usize,
    },
}

/// Reading one of the referencing record kinds failed
#[derive(Debug, Error)]
#[error("Failed to scan {kind} references: {source}")]
pub struct ScanError {
    pub kind: EntityKind,
    #[source]
    pub source: RepositoryError,
}

/// Metadata lookup for dangling blobs failed; reporting degrades to ids only
#[derive(Debug, Error)]
pub enum MetadataFetchError {
    #[error("Metadata lookup failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Metadata lookup returned {returned} entries for {requested} ids")]
    LengthMismatch { requested: usize, returned: usize },
}

/// Run-aborting failures of a garbage collection run
#[derive(Debug, Error)]
pub enum GcError {
    #[error(transparent)]
    Enumeration(#[from] EnumerationError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The token was rejected after reconciliation finished
    #[error("{error}")]
    Unauthorized {
        error: UnauthorizedError,
        /// Counts gathered before the refusal
        summary: Box<GcRunSummary>,
    },
}

impl GcError {
    /// Summary of the work done before the run was aborted, if any
    pub fn partial_summary(&self) -> Option<&GcRunSummary> {
        match self {
            GcError::Unauthorized { summary, .. } => Some(summary),
            _ => None,
        }
    }
}

/// Result type for GC operations
pub type GcResult<T> = Result<T, GcError>;

/// Deleting one blob failed; recorded in its result, never propagated
#[derive(Debug, Error)]
pub enum BlobDeletionError {
    #[error("Failed to delete blob {blob_id}: {source}")]
    Item {
        blob_id: BlobId,
        #[source]
        source: StorageError,
    },

    #[error("Batch {batch} delete call failed for blob {blob_id}: {message}")]
    Batch {
        batch: usize,
        blob_id: BlobId,
        message: String,
    },

    #[error("Batch {batch} returned no result for blob {blob_id}")]
    MissingResult { batch: usize, blob_id: BlobId },
}
