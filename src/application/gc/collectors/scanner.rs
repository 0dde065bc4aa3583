use futures_util::future::try_join_all;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

use super::errors::ScanError;
use crate::application::ports::RecordStore;
use crate::domain::entities::ReferencedRecord;
use crate::domain::reference_table::REFERENCE_TABLE;
use crate::domain::value_objects::{BlobId, EntityKind};

/// Point-in-time union of every blob id a live record references.
///
/// Built fresh on each run and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSet {
    ids: BTreeSet<BlobId>,
    references_per_kind: BTreeMap<EntityKind, usize>,
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_record(&mut self, record: &ReferencedRecord) {
        *self.references_per_kind.entry(record.kind()).or_default() += record.slots().len();
        self.ids.extend(record.slots().iter().cloned());
    }

    pub fn contains(&self, id: &BlobId) -> bool {
        self.ids.contains(id)
    }

    /// Number of distinct referenced blobs
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &BlobId> {
        self.ids.iter()
    }

    /// Reference tuples seen per kind, duplicates included
    pub fn references_per_kind(&self) -> &BTreeMap<EntityKind, usize> {
        &self.references_per_kind
    }
}

impl FromIterator<BlobId> for ReferenceSet {
    fn from_iter<I: IntoIterator<Item = BlobId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
            references_per_kind: BTreeMap::new(),
        }
    }
}

/// Produces the set of blob ids referenced by any live record.
///
/// Issues one bulk read per entry of the reference table and awaits all of
/// them together. Any failed read fails the scan: a partial reference set
/// would turn live blobs into deletion candidates.
#[derive(Clone)]
pub struct ReferenceScanner {
    record_store: Arc<dyn RecordStore>,
}

impl ReferenceScanner {
    pub fn new(record_store: Arc<dyn RecordStore>) -> Self {
        Self { record_store }
    }

    pub async fn scan_references(&self) -> Result<ReferenceSet, ScanError> {
        let reads = REFERENCE_TABLE.iter().map(|descriptor| async move {
            let records = self
                .record_store
                .list_with_image_refs(descriptor)
                .await
                .map_err(|source| ScanError {
                    kind: descriptor.kind,
                    source,
                })?;
            debug!(kind = %descriptor.kind, records = records.len(), "Scanned references");
            Ok::<_, ScanError>(records)
        });

        let per_kind = try_join_all(reads).await?;

        let mut references = ReferenceSet::new();
        for record in per_kind.iter().flatten() {
            references.insert_record(record);
        }

        info!(
            referenced_blobs = references.len(),
            "Reference scan complete: {:?}",
            references.references_per_kind()
        );
        Ok(references)
    }
}
