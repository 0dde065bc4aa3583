use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::BlobId;

/// Outcome of deleting one blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionResult {
    pub blob_id: BlobId,
    pub success: bool,
    pub error: Option<String>,
}

impl DeletionResult {
    pub fn success(blob_id: BlobId) -> Self {
        Self {
            blob_id,
            success: true,
            error: None,
        }
    }

    pub fn failure(blob_id: BlobId, error: impl Into<String>) -> Self {
        Self {
            blob_id,
            success: false,
            error: Some(error.into()),
        }
    }
}

impl fmt::Display for DeletionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            None => write!(f, "Blob {}: deleted", self.blob_id),
            Some(error) => write!(f, "Blob {}: failed ({})", self.blob_id, error),
        }
    }
}

/// Aggregate of a deletion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionReport {
    pub total: usize,
    pub success_count: usize,
    pub failure_count: usize,
    /// Number of batch calls issued
    pub batches: usize,
    pub results: Vec<DeletionResult>,
}

impl DeletionReport {
    pub fn from_results(results: Vec<DeletionResult>, batches: usize) -> Self {
        let success_count = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            success_count,
            failure_count: results.len() - success_count,
            batches,
            results,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &DeletionResult> {
        self.results.iter().filter(|r| !r.success)
    }

    pub fn deleted_ids(&self) -> impl Iterator<Item = &BlobId> {
        self.results.iter().filter(|r| r.success).map(|r| &r.blob_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts_always_add_up() {
        let results = vec![
            DeletionResult::success(BlobId::new("a").unwrap()),
            DeletionResult::failure(BlobId::new("b").unwrap(), "Blob not found"),
            DeletionResult::success(BlobId::new("c").unwrap()),
        ];
        let report = DeletionReport::from_results(results, 1);

        assert_eq!(report.total, 3);
        assert_eq!(report.success_count, 2);
        assert_eq!(report.failure_count, 1);
        assert_eq!(report.success_count + report.failure_count, report.total);
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.deleted_ids().count(), 2);
    }

    #[test]
    fn test_deletion_result_display() {
        let ok = DeletionResult::success(BlobId::new("a").unwrap());
        assert_eq!(ok.to_string(), "Blob a: deleted");

        let failed = DeletionResult::failure(BlobId::new("b").unwrap(), "timeout");
        assert_eq!(failed.to_string(), "Blob b: failed (timeout)");
    }
}
