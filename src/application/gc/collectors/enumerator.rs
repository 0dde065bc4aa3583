use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use super::errors::EnumerationError;
use crate::application::ports::{BlobStore, MAX_PAGE_SIZE};
use crate::domain::value_objects::BlobId;

/// Paginates the complete set of blob ids held by the blob store.
///
/// Pages are requested strictly in sequence since each request resumes from
/// the previous page's cursor. An enumeration either completes or fails; a
/// partial list is never returned.
#[derive(Clone)]
pub struct StorageEnumerator {
    blob_store: Arc<dyn BlobStore>,
    page_size: usize,
}

impl StorageEnumerator {
    /// Page size is clamped to `1..=MAX_PAGE_SIZE`
    pub fn new(blob_store: Arc<dyn BlobStore>, page_size: usize) -> Self {
        Self {
            blob_store,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub async fn list_all_blob_ids(&self) -> Result<Vec<BlobId>, EnumerationError> {
        let limit = self.page_size;
        let mut ids = Vec::new();
        let mut cursor: Option<String> = None;
        let mut seen_cursors: HashSet<String> = HashSet::new();
        let mut page = 0;

        loop {
            page += 1;
            let result = self
                .blob_store
                .list_blobs(cursor.clone(), limit)
                .await
                .map_err(|source| EnumerationError::PageFailed { page, source })?;

            if result.items.len() > limit {
                return Err(EnumerationError::OversizedPage {
                    page,
                    returned: result.items.len(),
                    limit,
                });
            }

            debug!(
                page,
                items = result.items.len(),
                has_more = result.has_more,
                "Listed blob page"
            );
            ids.extend(result.items);

            if !result.has_more {
                break;
            }

            match result.next_cursor {
                Some(next) if seen_cursors.contains(&next) => {
                    return Err(EnumerationError::StalledCursor { page, cursor: next });
                }
                Some(next) => {
                    seen_cursors.insert(next.clone());
                    cursor = Some(next);
                }
                None => return Err(EnumerationError::MissingCursor { page }),
            }
        }

        info!(blobs = ids.len(), pages = page, "Enumerated blob store");
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockBlobStore, StorageError};
    use crate::domain::entities::BlobPage;

    fn ids(raw: &[&str]) -> Vec<BlobId> {
        raw.iter().map(|s| BlobId::new(*s).unwrap()).collect()
    }

    #[tokio::test]
    async fn test_single_page_store() {
        let mut store = MockBlobStore::new();
        store
            .expect_list_blobs()
            .times(1)
            .returning(|cursor, _limit| {
                assert!(cursor.is_none());
                Ok(BlobPage {
                    items: ids(&["a", "b"]),
                    next_cursor: None,
                    has_more: false,
                })
            });

        let enumerator = StorageEnumerator::new(Arc::new(store), 100);
        let listed = enumerator.list_all_blob_ids().await.unwrap();
        assert_eq!(listed, ids(&["a", "b"]));
    }

    #[tokio::test]
    async fn test_follows_cursor_until_exhausted() {
        let mut store = MockBlobStore::new();
        store
            .expect_list_blobs()
            .times(3)
            .returning(|cursor, _limit| {
                let page = match cursor.as_deref() {
                    None => BlobPage::from_overfetch(ids(&["a", "b", "c"]), 2),
                    Some("b") => BlobPage::from_overfetch(ids(&["c", "d", "e"]), 2),
                    Some("d") => BlobPage::from_overfetch(ids(&["e"]), 2),
                    other => panic!("unexpected cursor {:?}", other),
                };
                Ok(page)
            });

        let enumerator = StorageEnumerator::new(Arc::new(store), 2);
        let listed = enumerator.list_all_blob_ids().await.unwrap();
        assert_eq!(listed, ids(&["a", "b", "c", "d", "e"]));
    }

    #[tokio::test]
    async fn test_page_failure_aborts_without_partial_result() {
        let mut store = MockBlobStore::new();
        store.expect_list_blobs().returning(|cursor, _limit| match cursor {
            None => Ok(BlobPage::from_overfetch(ids(&["a", "b"]), 1)),
            Some(_) => Err(StorageError::Transport("connection reset".to_string())),
        });

        let enumerator = StorageEnumerator::new(Arc::new(store), 1);
        let err = enumerator.list_all_blob_ids().await.unwrap_err();
        assert!(matches!(err, EnumerationError::PageFailed { page: 2, .. }));
    }

    #[tokio::test]
    async fn test_missing_cursor_is_an_error() {
        let mut store = MockBlobStore::new();
        store.expect_list_blobs().times(1).returning(|_, _| {
            Ok(BlobPage {
                items: ids(&["a"]),
                next_cursor: None,
                has_more: true,
            })
        });

        let enumerator = StorageEnumerator::new(Arc::new(store), 1);
        let err = enumerator.list_all_blob_ids().await.unwrap_err();
        assert!(matches!(err, EnumerationError::MissingCursor { page: 1 }));
    }

    #[tokio::test]
    async fn test_stalled_cursor_is_an_error() {
        let mut store = MockBlobStore::new();
        store.expect_list_blobs().times(2).returning(|_, _| {
            Ok(BlobPage {
                items: ids(&["a"]),
                next_cursor: Some("a".to_string()),
                has_more: true,
            })
        });

        let enumerator = StorageEnumerator::new(Arc::new(store), 1);
        let err = enumerator.list_all_blob_ids().await.unwrap_err();
        assert!(matches!(err, EnumerationError::StalledCursor { page: 2, .. }));
    }

    #[tokio::test]
    async fn test_cursor_cycle_is_an_error() {
        let mut store = MockBlobStore::new();
        store
            .expect_list_blobs()
            .times(3)
            .returning(|cursor, _limit| {
                let next = match cursor.as_deref() {
                    None | Some("b") => "a",
                    Some("a") => "b",
                    other => panic!("unexpected cursor {:?}", other),
                };
                Ok(BlobPage {
                    items: ids(&["x"]),
                    next_cursor: Some(next.to_string()),
                    has_more: true,
                })
            });

        let enumerator = StorageEnumerator::new(Arc::new(store), 1);
        let err = enumerator.list_all_blob_ids().await.unwrap_err();
        match err {
            EnumerationError::StalledCursor { page, cursor } => {
                assert_eq!(page, 3);
                assert_eq!(cursor, "a");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_page_size_is_capped() {
        let mut store = MockBlobStore::new();
        store
            .expect_list_blobs()
            .withf(|_, limit| *limit == MAX_PAGE_SIZE)
            .times(1)
            .returning(|_, _| Ok(BlobPage::default()));

        let enumerator = StorageEnumerator::new(Arc::new(store), 50_000);
        assert_eq!(enumerator.page_size(), MAX_PAGE_SIZE);
        assert!(enumerator.list_all_blob_ids().await.unwrap().is_empty());
    }
}
