use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::batch_processor::{BatchConfig, BatchProcessor};
use super::errors::BlobDeletionError;
use crate::application::ports::{BlobStore, Confirmation};
use crate::domain::authorization::{AuthorizationGate, UnauthorizedError};
use crate::domain::entities::{DanglingBlob, DeletionReport, DeletionResult};
use crate::domain::value_objects::BlobId;

/// Whether a run only reports or actually deletes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    #[default]
    DryRun,
    Delete,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::DryRun => f.write_str("dry-run"),
            RunMode::Delete => f.write_str("delete"),
        }
    }
}

/// What a deletion would remove
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DryRunReport {
    pub count: usize,
    /// Sum of known sizes
    pub total_bytes: u64,
    /// Blobs whose size is unknown and not counted in `total_bytes`
    pub unknown_sizes: usize,
    pub ids: Vec<BlobId>,
}

impl DryRunReport {
    pub fn from_dangling(dangling: &[DanglingBlob]) -> Self {
        Self {
            count: dangling.len(),
            total_bytes: dangling.iter().filter_map(|d| d.size_bytes).sum(),
            unknown_sizes: dangling.iter().filter(|d| d.size_bytes.is_none()).count(),
            ids: dangling.iter().map(|d| d.id.clone()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionOutcome {
    /// Report only; nothing was asked or deleted
    DryRun(DryRunReport),
    /// The operator declined; nothing was deleted
    Declined(DryRunReport),
    Deleted {
        plan: DryRunReport,
        report: DeletionReport,
    },
}

impl DeletionOutcome {
    pub fn plan(&self) -> &DryRunReport {
        match self {
            DeletionOutcome::DryRun(plan) | DeletionOutcome::Declined(plan) => plan,
            DeletionOutcome::Deleted { plan, .. } => plan,
        }
    }

    pub fn report(&self) -> Option<&DeletionReport> {
        match self {
            DeletionOutcome::Deleted { report, .. } => Some(report),
            _ => None,
        }
    }
}

/// Deletes blobs in sequential fixed-size batches behind the authorization gate.
///
/// Per-item failures land in the report and never stop the run. A failed
/// batch call marks each of its ids failed and the next batch still runs.
#[derive(Clone)]
pub struct DeletionExecutor {
    blob_store: Arc<dyn BlobStore>,
    gate: AuthorizationGate,
    batch_config: BatchConfig,
}

impl DeletionExecutor {
    pub fn new(
        blob_store: Arc<dyn BlobStore>,
        gate: AuthorizationGate,
        batch_config: BatchConfig,
    ) -> Self {
        Self {
            blob_store,
            gate,
            batch_config,
        }
    }

    pub fn dry_run(&self, dangling: &[DanglingBlob]) -> DryRunReport {
        DryRunReport::from_dangling(dangling)
    }

    /// Report, then, in delete mode, authorize, confirm and delete.
    ///
    /// The token is checked before the operator is prompted so a bad token
    /// fails without asking anything.
    pub async fn execute(
        &self,
        dangling: &[DanglingBlob],
        mode: RunMode,
        token: Option<&str>,
        confirmation: &dyn Confirmation,
    ) -> Result<DeletionOutcome, UnauthorizedError> {
        let plan = self.dry_run(dangling);
        info!(
            mode = %mode,
            blobs = plan.count,
            bytes = plan.total_bytes,
            unknown_sizes = plan.unknown_sizes,
            "Deletion plan ready"
        );

        if mode == RunMode::DryRun || plan.is_empty() {
            return Ok(DeletionOutcome::DryRun(plan));
        }

        self.gate.authorize(token)?;

        let prompt = format!(
            "Delete {} dangling blobs ({} bytes known)? Type 'yes' to continue",
            plan.count, plan.total_bytes
        );
        if !confirmation.confirm(&prompt) {
            info!("Deletion declined; nothing was deleted");
            return Ok(DeletionOutcome::Declined(plan));
        }

        let report = self.delete_blobs(plan.ids.clone(), token).await?;
        Ok(DeletionOutcome::Deleted { plan, report })
    }

    pub async fn delete_blobs(
        &self,
        ids: Vec<BlobId>,
        token: Option<&str>,
    ) -> Result<DeletionReport, UnauthorizedError> {
        self.gate.authorize(token)?;

        let batch_results = BatchProcessor::process_batches(ids, &self.batch_config, |batch| async move {
            self.blob_store.delete_batch(&batch).await
        })
        .await;

        let batches = batch_results.len();
        let mut results = Vec::new();

        for batch_result in batch_results {
            let batch = batch_result.index + 1;
            match batch_result.result {
                Ok(outcomes) => {
                    let mut outcomes = outcomes.into_iter();
                    for blob_id in batch_result.items {
                        let failure = match outcomes.next() {
                            Some(Ok(())) => None,
                            Some(Err(source)) => Some(BlobDeletionError::Item {
                                blob_id: blob_id.clone(),
                                source,
                            }),
                            None => Some(BlobDeletionError::MissingResult {
                                batch,
                                blob_id: blob_id.clone(),
                            }),
                        };
                        results.push(record(blob_id, failure));
                    }
                }
                Err(e) => {
                    warn!(batch, "Batch delete call failed: {}", e);
                    let message = e.to_string();
                    for blob_id in batch_result.items {
                        let failure = BlobDeletionError::Batch {
                            batch,
                            blob_id: blob_id.clone(),
                            message: message.clone(),
                        };
                        results.push(record(blob_id, Some(failure)));
                    }
                }
            }
        }

        let report = DeletionReport::from_results(results, batches);
        info!(
            deleted = report.success_count,
            failed = report.failure_count,
            batches = report.batches,
            "Deletion finished"
        );
        Ok(report)
    }
}

fn record(blob_id: BlobId, failure: Option<BlobDeletionError>) -> DeletionResult {
    match failure {
        None => {
            debug!(blob = %blob_id, "Deleted blob");
            DeletionResult::success(blob_id)
        }
        Some(error) => {
            warn!("{}", error);
            DeletionResult::failure(blob_id, error.to_string())
        }
    }
}
