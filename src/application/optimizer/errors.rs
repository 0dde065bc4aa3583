use thiserror::Error;

use super::stats::OptimizationStats;
use crate::application::gc::collectors::ScanError;
use crate::application::ports::{DownloadError, EncodeError, RepositoryError, StorageError};
use crate::domain::authorization::UnauthorizedError;
use crate::domain::value_objects::{BlobId, EntityKind, OptimizationStage};

/// Run-aborting failures of an optimization run
#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error(transparent)]
    Unauthorized(#[from] UnauthorizedError),

    /// Listing a kind failed; kinds already processed keep their counts
    #[error("{error}")]
    Scan {
        error: ScanError,
        partial: Box<OptimizationStats>,
    },
}

impl OptimizerError {
    /// Counts gathered before the run was aborted, if any
    pub fn partial_stats(&self) -> Option<&OptimizationStats> {
        match self {
            OptimizerError::Scan { partial, .. } => Some(partial),
            OptimizerError::Unauthorized(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Failed to reserve upload target: {0}")]
    Target(#[source] StorageError),

    #[error("Failed to upload encoded bytes: {0}")]
    Transfer(#[source] StorageError),
}

#[derive(Debug, Error)]
pub enum ItemFailure {
    #[error("Blob has no fetch URL")]
    MissingUrl,

    #[error("Failed to resolve fetch URL: {0}")]
    UrlLookup(#[source] StorageError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Failed to repoint record: {0}")]
    Repoint(#[from] RepositoryError),
}

/// One blob could not be optimized; counted and logged, never propagated
#[derive(Debug, Error)]
#[error("{kind} {entity_id} blob {blob_id} failed at {stage}: {source}")]
pub struct ItemOptimizationError {
    pub kind: EntityKind,
    pub entity_id: String,
    pub blob_id: BlobId,
    /// Stage that was being attempted
    pub stage: OptimizationStage,
    #[source]
    pub source: ItemFailure,
}
