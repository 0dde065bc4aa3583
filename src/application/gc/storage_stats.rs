use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::gc::collectors::{EnumerationError, StorageEnumerator};
use crate::application::ports::BlobStore;
use crate::domain::entities::BlobRecord;
use crate::domain::value_objects::BlobId;

const UNKNOWN_CONTENT_TYPE: &str = "unknown";

/// Count and size of the blobs sharing one content type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContentTypeUsage {
    pub blobs: usize,
    pub bytes: u64,
}

/// Report-only view of what the blob store holds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    pub blob_count: usize,
    pub total_bytes: u64,
    pub by_content_type: BTreeMap<String, ContentTypeUsage>,
    /// Blobs the store returned no metadata for, or whose lookup failed
    pub without_metadata: usize,
    pub errors: Vec<String>,
}

impl StorageStats {
    pub fn record(&mut self, blob: &BlobRecord) {
        self.blob_count += 1;
        let Some(size) = blob.size_bytes() else {
            self.without_metadata += 1;
            return;
        };
        self.total_bytes += size;
        let content_type = blob.content_type().unwrap_or(UNKNOWN_CONTENT_TYPE);
        let usage = self
            .by_content_type
            .entry(content_type.to_string())
            .or_default();
        usage.blobs += 1;
        usage.bytes += size;
    }

    pub fn summary(&self) -> String {
        format!(
            "{} blobs, {} bytes across {} content types ({} without metadata)",
            self.blob_count,
            self.total_bytes,
            self.by_content_type.len(),
            self.without_metadata
        )
    }

    pub fn details(&self) -> String {
        let mut lines = vec![
            format!("Blobs: {}", self.blob_count),
            format!("Total bytes: {}", self.total_bytes),
            format!("Without metadata: {}", self.without_metadata),
        ];
        for (content_type, usage) in &self.by_content_type {
            lines.push(format!(
                "  {}: {} blobs, {} bytes",
                content_type, usage.blobs, usage.bytes
            ));
        }
        if !self.errors.is_empty() {
            lines.push("Errors:".to_string());
            for (i, error) in self.errors.iter().enumerate() {
                lines.push(format!("  {}. {}", i + 1, error));
            }
        }
        lines.join("\n")
    }
}

/// Gathers `StorageStats` without touching any record or blob.
///
/// Metadata is looked up one chunk at a time; a failed chunk is counted as
/// blobs without metadata and the walk goes on.
pub struct StorageStatsCollector {
    enumerator: StorageEnumerator,
    blob_store: Arc<dyn BlobStore>,
}

impl StorageStatsCollector {
    pub fn new(enumerator: StorageEnumerator, blob_store: Arc<dyn BlobStore>) -> Self {
        Self {
            enumerator,
            blob_store,
        }
    }

    pub async fn collect(&self) -> Result<StorageStats, EnumerationError> {
        let ids = self.enumerator.list_all_blob_ids().await?;
        let mut stats = StorageStats::default();

        for chunk in ids.chunks(self.enumerator.page_size()) {
            match self.blob_store.get_metadata(chunk).await {
                Ok(metadata) if metadata.len() == chunk.len() => {
                    for (id, entry) in chunk.iter().zip(metadata) {
                        stats.record(&BlobRecord::new(id.clone(), entry));
                    }
                }
                Ok(metadata) => {
                    let message = format!(
                        "Metadata lookup returned {} entries for {} ids",
                        metadata.len(),
                        chunk.len()
                    );
                    warn!("{}", message);
                    stats.errors.push(message);
                    record_without_metadata(&mut stats, chunk);
                }
                Err(e) => {
                    warn!("Metadata lookup failed for {} blobs: {}", chunk.len(), e);
                    stats.errors.push(e.to_string());
                    record_without_metadata(&mut stats, chunk);
                }
            }
        }

        info!("Storage stats: {}", stats.summary());
        Ok(stats)
    }
}

fn record_without_metadata(stats: &mut StorageStats, ids: &[BlobId]) {
    for id in ids {
        stats.record(&BlobRecord::new(id.clone(), None));
    }
}
