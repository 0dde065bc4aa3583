use std::sync::Arc;
use tracing::{error, info};

use crate::application::context::BackendContext;
use crate::application::gc::collectors::{
    DeletionExecutor, GcError, GcResult, Reconciler, Reconciliation, ReferenceScanner, RunMode,
    StorageEnumerator,
};
use crate::application::gc::config::GcConfig;
use crate::application::gc::results::GcRunSummary;
use crate::application::gc::storage_stats::{StorageStats, StorageStatsCollector};
use crate::application::ports::{BlobStore, Confirmation};

/// Garbage collector for blobs no live record references.
///
/// Orchestrates one run: reconcile the blob store against every referencing
/// record kind, then hand the dangling set to the deletion executor. Every
/// run reconciles afresh immediately before deleting; there is no way to
/// delete from an earlier report.
///
/// # Examples
///
/// ```rust,ignore
/// let gc = GarbageCollector::new(&context, GcConfig::default());
///
/// let summary = gc.run(RunMode::DryRun, None, &FixedConfirmation(false)).await?;
/// println!("{}", summary.summary());
/// ```
pub struct GarbageCollector {
    reconciler: Reconciler,
    executor: DeletionExecutor,
    enumerator: StorageEnumerator,
    blob_store: Arc<dyn BlobStore>,
    config: GcConfig,
}

impl GarbageCollector {
    pub fn new(context: &BackendContext, config: GcConfig) -> Self {
        let enumerator = StorageEnumerator::new(Arc::clone(&context.blob_store), config.page_size);
        let scanner = ReferenceScanner::new(Arc::clone(&context.record_store));
        let reconciler = Reconciler::new(
            enumerator.clone(),
            scanner,
            Arc::clone(&context.blob_store),
        );
        let executor = DeletionExecutor::new(
            Arc::clone(&context.blob_store),
            context.gate.clone(),
            config.batch_config(),
        );

        Self {
            reconciler,
            executor,
            enumerator,
            blob_store: Arc::clone(&context.blob_store),
            config,
        }
    }

    pub fn config(&self) -> &GcConfig {
        &self.config
    }

    pub async fn reconcile(&self) -> GcResult<Reconciliation> {
        self.reconciler.reconcile().await
    }

    /// Runs one complete garbage collection cycle.
    ///
    /// Enumeration, scan and authorization failures abort the run. Per-blob
    /// deletion failures are collected into the summary instead.
    pub async fn run(
        &self,
        mode: RunMode,
        token: Option<&str>,
        confirmation: &dyn Confirmation,
    ) -> GcResult<GcRunSummary> {
        info!(mode = %mode, "Starting storage garbage collection");
        let mut summary = GcRunSummary::new(mode);

        let reconciliation = self.reconciler.reconcile().await.inspect_err(|e| {
            error!("Reconciliation failed: {}", e);
        })?;
        summary.record_reconciliation(&reconciliation);

        let outcome = match self
            .executor
            .execute(&reconciliation.dangling, mode, token, confirmation)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Deletion refused: {}", e);
                summary.record_refusal(&e);
                summary.finish();
                return Err(GcError::Unauthorized {
                    error: e,
                    summary: Box::new(summary),
                });
            }
        };
        summary.record_outcome(&outcome);
        summary.finish();

        info!("{}", summary.summary());
        Ok(summary)
    }

    /// Report-only storage statistics; never reads records or mutates state
    pub async fn storage_stats(&self) -> GcResult<StorageStats> {
        let collector =
            StorageStatsCollector::new(self.enumerator.clone(), Arc::clone(&self.blob_store));
        Ok(collector.collect().await?)
    }
}
