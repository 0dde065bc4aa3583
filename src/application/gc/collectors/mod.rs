pub mod batch_processor;
pub mod deletion_executor;
pub mod enumerator;
pub mod errors;
pub mod reconciler;
pub mod scanner;
#[cfg(test)]
pub mod test_utils;

pub use batch_processor::{BatchConfig, BatchProcessor, BatchResult};
pub use deletion_executor::{DeletionExecutor, DeletionOutcome, DryRunReport, RunMode};
pub use enumerator::StorageEnumerator;
pub use errors::{
    BlobDeletionError, EnumerationError, GcError, GcResult, MetadataFetchError, ScanError,
};
pub use reconciler::{dangling_ids, Reconciler, Reconciliation};
pub use scanner::{ReferenceScanner, ReferenceSet};
