use serde::{Deserialize, Serialize};

use crate::domain::value_objects::BlobId;

/// Size and content type the blob store reports for a blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMetadata {
    pub size_bytes: u64,
    pub content_type: Option<String>,
}

impl BlobMetadata {
    pub fn new(size_bytes: u64, content_type: Option<String>) -> Self {
        Self {
            size_bytes,
            content_type,
        }
    }
}

/// A blob as held by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRecord {
    id: BlobId,
    metadata: Option<BlobMetadata>,
}

impl BlobRecord {
    pub fn new(id: BlobId, metadata: Option<BlobMetadata>) -> Self {
        Self { id, metadata }
    }

    pub fn id(&self) -> &BlobId {
        &self.id
    }

    pub fn size_bytes(&self) -> Option<u64> {
        self.metadata.as_ref().map(|m| m.size_bytes)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.content_type.as_deref())
    }
}

/// A blob no live record references at scan time.
///
/// Derived on every reconciliation run, never stored. Size and content type
/// are best-effort and absent when the metadata lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DanglingBlob {
    pub id: BlobId,
    pub size_bytes: Option<u64>,
    pub content_type: Option<String>,
}

impl DanglingBlob {
    pub fn id_only(id: BlobId) -> Self {
        Self {
            id,
            size_bytes: None,
            content_type: None,
        }
    }

    pub fn with_metadata(id: BlobId, metadata: Option<BlobMetadata>) -> Self {
        match metadata {
            Some(metadata) => Self {
                id,
                size_bytes: Some(metadata.size_bytes),
                content_type: metadata.content_type,
            },
            None => Self::id_only(id),
        }
    }
}

/// One page of a cursor-based blob listing
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobPage {
    pub items: Vec<BlobId>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl BlobPage {
    /// Build a page from a read of up to `limit + 1` ascending ids.
    ///
    /// The extra id only signals that another page exists; it is dropped
    /// here and becomes the first item of the next page, which resumes
    /// strictly after the returned cursor.
    pub fn from_overfetch(mut fetched: Vec<BlobId>, limit: usize) -> Self {
        let has_more = fetched.len() > limit;
        if has_more {
            fetched.truncate(limit);
        }

        let next_cursor = if has_more {
            fetched.last().map(|id| id.as_str().to_string())
        } else {
            None
        };

        Self {
            items: fetched,
            next_cursor,
            has_more,
        }
    }
}
