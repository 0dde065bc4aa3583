use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::enumerator::StorageEnumerator;
use super::errors::{GcError, GcResult, MetadataFetchError};
use super::scanner::{ReferenceScanner, ReferenceSet};
use crate::application::ports::BlobStore;
use crate::domain::entities::{BlobMetadata, DanglingBlob};
use crate::domain::value_objects::{BlobId, EntityKind};

/// Ids present in `enumerated` but absent from `referenced`.
///
/// Enumeration order is preserved, so ascending input yields ascending output.
pub fn dangling_ids(enumerated: &[BlobId], referenced: &ReferenceSet) -> Vec<BlobId> {
    enumerated
        .iter()
        .filter(|id| !referenced.contains(id))
        .cloned()
        .collect()
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub enumerated: usize,
    pub referenced: usize,
    pub references_per_kind: BTreeMap<EntityKind, usize>,
    pub dangling: Vec<DanglingBlob>,
    /// False when the metadata lookup failed and entries carry ids only
    pub metadata_available: bool,
}

impl Reconciliation {
    pub fn dangling_ids(&self) -> Vec<BlobId> {
        self.dangling.iter().map(|blob| blob.id.clone()).collect()
    }

    /// Sum of known dangling sizes; blobs without metadata count as zero
    pub fn dangling_bytes(&self) -> u64 {
        self.dangling.iter().filter_map(|blob| blob.size_bytes).sum()
    }
}

/// Computes the dangling set: every stored blob no live record references.
///
/// The enumeration and the reference scan run concurrently on the calling
/// task. Either failing aborts the pass, since working from a partial view of
/// either side could mark live blobs as dangling.
#[derive(Clone)]
pub struct Reconciler {
    enumerator: StorageEnumerator,
    scanner: ReferenceScanner,
    blob_store: Arc<dyn BlobStore>,
}

impl Reconciler {
    pub fn new(
        enumerator: StorageEnumerator,
        scanner: ReferenceScanner,
        blob_store: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            enumerator,
            scanner,
            blob_store,
        }
    }

    pub async fn find_dangling(&self) -> GcResult<Vec<DanglingBlob>> {
        Ok(self.reconcile().await?.dangling)
    }

    pub async fn reconcile(&self) -> GcResult<Reconciliation> {
        let (enumerated, referenced) = tokio::try_join!(
            async { self.enumerator.list_all_blob_ids().await.map_err(GcError::from) },
            async { self.scanner.scan_references().await.map_err(GcError::from) },
        )?;

        let ids = dangling_ids(&enumerated, &referenced);
        info!(
            enumerated = enumerated.len(),
            referenced = referenced.len(),
            dangling = ids.len(),
            "Reconciliation complete"
        );

        let mut reconciliation = Reconciliation {
            enumerated: enumerated.len(),
            referenced: referenced.len(),
            references_per_kind: referenced.references_per_kind().clone(),
            dangling: Vec::new(),
            metadata_available: true,
        };

        if ids.is_empty() {
            return Ok(reconciliation);
        }

        match self.fetch_metadata(&ids).await {
            Ok(metadata) => {
                reconciliation.dangling = ids
                    .into_iter()
                    .zip(metadata)
                    .map(|(id, meta)| DanglingBlob::with_metadata(id, meta))
                    .collect();
            }
            Err(e) => {
                warn!("Reporting dangling blobs without metadata: {}", e);
                reconciliation.metadata_available = false;
                reconciliation.dangling = ids.into_iter().map(DanglingBlob::id_only).collect();
            }
        }

        Ok(reconciliation)
    }

    async fn fetch_metadata(
        &self,
        ids: &[BlobId],
    ) -> Result<Vec<Option<BlobMetadata>>, MetadataFetchError> {
        let metadata = self.blob_store.get_metadata(ids).await?;
        if metadata.len() != ids.len() {
            return Err(MetadataFetchError::LengthMismatch {
                requested: ids.len(),
                returned: metadata.len(),
            });
        }
        debug!(blobs = ids.len(), "Fetched dangling blob metadata");
        Ok(metadata)
    }
}
