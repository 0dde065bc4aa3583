use std::future::Future;
use tracing::debug;

/// Configuration for batch processing operations.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// The number of items handed to each batch call.
    ///
    /// This also bounds the number of in-flight requests, since a batch is
    /// fully resolved before the next one starts.
    pub batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { batch_size: 10 }
    }
}

impl BatchConfig {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    /// Number of batch calls needed for `items` items
    pub fn batch_count(&self, items: usize) -> usize {
        items.div_ceil(self.batch_size.max(1))
    }
}

/// Result of processing one batch.
///
/// Holds the items handed to the batch call together with what the call
/// returned, so callers can attribute a whole-batch failure to every item.
#[derive(Debug)]
pub struct BatchResult<T, R> {
    /// Zero-based position of the batch.
    pub index: usize,
    /// The items that were processed in this batch.
    pub items: Vec<T>,
    /// The result of the batch call.
    pub result: R,
}

/// Processor for handling sequential batch operations.
///
/// Items are split into fixed-size batches. Each batch is handed to the
/// processor as one call and awaited to completion before the next batch
/// starts. Everything runs on the calling task; nothing is spawned.
///
/// # Examples
///
/// ```rust,ignore
/// use crate::application::gc::collectors::{BatchConfig, BatchProcessor};
///
/// let results = BatchProcessor::process_batches(
///     ids,
///     &BatchConfig::default(),
///     |batch| async move { store.delete_batch(&batch).await },
/// )
/// .await;
/// ```
pub struct BatchProcessor;

impl BatchProcessor {
    /// Process items in sequential batches
    pub async fn process_batches<F, Fut, T, R>(
        items: Vec<T>,
        config: &BatchConfig,
        processor: F,
    ) -> Vec<BatchResult<T, R>>
    where
        F: Fn(Vec<T>) -> Fut,
        Fut: Future<Output = R>,
        T: Clone,
    {
        let batch_size = config.batch_size.max(1);
        let total_batches = config.batch_count(items.len());
        let mut results = Vec::with_capacity(total_batches);

        for (index, chunk) in items.chunks(batch_size).enumerate() {
            debug!(
                batch = index + 1,
                total_batches,
                items = chunk.len(),
                "Processing batch"
            );
            let result = processor(chunk.to_vec()).await;
            results.push(BatchResult {
                index,
                items: chunk.to_vec(),
                result,
            });
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_process_batches_splits_into_fixed_size_chunks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let items: Vec<i32> = (1..=25).collect();

        let processor = {
            let calls = Arc::clone(&calls);
            move |batch: Vec<i32>| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    batch.len()
                }
            }
        };

        let results = BatchProcessor::process_batches(items, &BatchConfig::new(10), processor).await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let sizes: Vec<_> = results.iter().map(|r| r.result).collect();
        assert_eq!(sizes, vec![10, 10, 5]);
        assert_eq!(results[2].items, vec![21, 22, 23, 24, 25]);
        assert_eq!(results[2].index, 2);
    }

    #[tokio::test]
    async fn test_failed_batch_does_not_stop_later_batches() {
        let items: Vec<i32> = (0..30).collect();

        let processor = |batch: Vec<i32>| async move {
            if batch.contains(&0) {
                Err("first batch exploded")
            } else {
                Ok(batch.len())
            }
        };

        let results = BatchProcessor::process_batches(items, &BatchConfig::default(), processor).await;

        assert_eq!(results.len(), 3);
        assert!(results[0].result.is_err());
        assert_eq!(results[1].result, Ok(10));
        assert_eq!(results[2].result, Ok(10));
    }

    #[tokio::test]
    async fn test_process_batches_empty_input() {
        let items: Vec<i32> = vec![];

        let processor = |_batch: Vec<i32>| async move {
            unreachable!("never called for empty input")
        };

        let results: Vec<BatchResult<i32, ()>> =
            BatchProcessor::process_batches(items, &BatchConfig::default(), processor).await;

        assert!(results.is_empty());
    }

    #[test]
    fn test_batch_count_rounds_up() {
        let config = BatchConfig::default();
        assert_eq!(config.batch_count(0), 0);
        assert_eq!(config.batch_count(1), 1);
        assert_eq!(config.batch_count(10), 1);
        assert_eq!(config.batch_count(11), 2);
        assert_eq!(BatchConfig::new(0).batch_size, 1);
    }
}
