use bytes::Bytes;
use std::slice;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::config::OptimizerConfig;
use super::errors::{ItemFailure, ItemOptimizationError, OptimizerError, UploadError};
use super::stats::{ItemOutcome, OptimizationStats};
use crate::application::context::BackendContext;
use crate::application::gc::collectors::ScanError;
use crate::application::ports::{
    BlobStore, ImageFetcher, ImageTranscoder, RecordStore, RepositoryError,
};
use crate::domain::authorization::AuthorizationGate;
use crate::domain::entities::{ImageReference, ReferencedRecord};
use crate::domain::value_objects::{BlobId, ImageFormat, OptimizationStage};

/// Progress of a single blob through the pipeline.
///
/// `stage` is the last stage reached; `attempting` is the stage in flight and
/// is what a failure gets tagged with.
struct Progress {
    stage: OptimizationStage,
    attempting: OptimizationStage,
}

impl Progress {
    fn new() -> Self {
        Self {
            stage: OptimizationStage::Fetched,
            attempting: OptimizationStage::Fetched,
        }
    }

    fn begin(&mut self, next: OptimizationStage) {
        debug_assert!(
            self.stage.can_transition_to(next),
            "{} -> {}",
            self.stage,
            next
        );
        self.attempting = next;
    }

    fn reach(&mut self) {
        debug!(from = %self.stage, to = %self.attempting, "Stage transition");
        self.stage = self.attempting;
    }

    fn skip(&mut self) {
        self.begin(OptimizationStage::Skipped);
        self.reach();
    }

    /// Marks the blob failed and returns the stage it failed in
    fn fail(&mut self) -> OptimizationStage {
        debug_assert!(self.stage.can_transition_to(OptimizationStage::Failed));
        self.stage = OptimizationStage::Failed;
        self.attempting
    }
}

/// Re-encodes every referenced image into the transcoder's target format.
///
/// Blobs are processed one at a time with a pause in between. Each blob is
/// downloaded, encoded, uploaded as a new blob and its owning record is
/// repointed. Blobs already in the target format are skipped, so a rerun only
/// touches what is left. Old blobs stay in place for the garbage collector.
pub struct ImageOptimizer {
    blob_store: Arc<dyn BlobStore>,
    record_store: Arc<dyn RecordStore>,
    gate: AuthorizationGate,
    fetcher: Arc<dyn ImageFetcher>,
    transcoder: Arc<dyn ImageTranscoder>,
    config: OptimizerConfig,
}

impl ImageOptimizer {
    pub fn new(
        context: &BackendContext,
        fetcher: Arc<dyn ImageFetcher>,
        transcoder: Arc<dyn ImageTranscoder>,
        config: OptimizerConfig,
    ) -> Self {
        Self {
            blob_store: Arc::clone(&context.blob_store),
            record_store: Arc::clone(&context.record_store),
            gate: context.gate.clone(),
            fetcher,
            transcoder,
            config,
        }
    }

    /// Optimize every image of the configured kinds.
    ///
    /// The token is checked before anything is uploaded. A failed listing for
    /// a kind aborts the run and returns the counts gathered so far inside the
    /// error; per-blob failures are counted and the run continues with the
    /// next blob.
    pub async fn optimize_all(
        &self,
        token: Option<&str>,
    ) -> Result<OptimizationStats, OptimizerError> {
        self.gate.authorize(token)?;

        let target = self.transcoder.target_format();
        info!(
            target = %target,
            quality = self.config.quality,
            kinds = ?self.config.kinds,
            "Starting image optimization"
        );

        let mut stats = OptimizationStats::default();
        let mut first_item = true;

        for kind in &self.config.kinds {
            let descriptor = kind.descriptor();
            let records = match self.record_store.list_with_image_refs(descriptor).await {
                Ok(records) => records,
                Err(source) => {
                    let error = ScanError { kind: *kind, source };
                    warn!("{}; aborting after {}", error, stats.summary());
                    return Err(OptimizerError::Scan {
                        error,
                        partial: Box::new(stats),
                    });
                }
            };
            info!(kind = %kind, records = records.len(), "Optimizing images");

            for mut record in records {
                let references: Vec<ImageReference> = record.references().collect();
                for reference in references {
                    if !first_item && !self.config.item_delay.is_zero() {
                        tokio::time::sleep(self.config.item_delay).await;
                    }
                    first_item = false;

                    let outcome = self.optimize_slot(&mut record, reference.slot, token).await;
                    match &outcome {
                        ItemOutcome::Optimized {
                            new_blob,
                            bytes_before,
                            bytes_after,
                        } => info!(
                            kind = %kind,
                            entity = %reference.entity_id,
                            field = reference.field,
                            old_blob = %reference.blob_id,
                            new_blob = %new_blob,
                            bytes_before,
                            bytes_after,
                            "Optimized image"
                        ),
                        ItemOutcome::Skipped => {}
                        ItemOutcome::Failed(error) => warn!("{}", error),
                    }
                    stats.record(*kind, &outcome);
                }
            }
        }

        info!("{}", stats.summary());
        Ok(stats)
    }

    async fn optimize_slot(
        &self,
        record: &mut ReferencedRecord,
        slot: usize,
        token: Option<&str>,
    ) -> ItemOutcome {
        let blob_id = record.slots()[slot].clone();
        let mut progress = Progress::new();

        match self.run_pipeline(record, slot, &blob_id, token, &mut progress).await {
            Ok(outcome) => outcome,
            Err(source) => {
                let stage = progress.fail();
                ItemOutcome::Failed(ItemOptimizationError {
                    kind: record.kind(),
                    entity_id: record.entity_id().to_string(),
                    blob_id,
                    stage,
                    source,
                })
            }
        }
    }

    /// Walks one blob through the stages, recording each in `progress`
    async fn run_pipeline(
        &self,
        record: &mut ReferencedRecord,
        slot: usize,
        blob_id: &BlobId,
        token: Option<&str>,
        progress: &mut Progress,
    ) -> Result<ItemOutcome, ItemFailure> {
        let target = self.transcoder.target_format();

        let url = self
            .blob_store
            .fetch_url(blob_id)
            .await
            .map_err(ItemFailure::UrlLookup)?
            .ok_or(ItemFailure::MissingUrl)?;

        progress.begin(OptimizationStage::FormatChecked);
        let stored_format = match self.blob_store.get_metadata(slice::from_ref(blob_id)).await {
            Ok(metadata) => metadata
                .into_iter()
                .next()
                .flatten()
                .and_then(|m| m.content_type)
                .map(|content_type| ImageFormat::from_content_type(&content_type)),
            Err(e) => {
                warn!(blob = %blob_id, "Metadata lookup failed, sniffing bytes instead: {}", e);
                None
            }
        };
        progress.reach();
        if stored_format == Some(target) {
            debug!(blob = %blob_id, "Stored content type already {}", target);
            progress.skip();
            return Ok(ItemOutcome::Skipped);
        }

        progress.begin(OptimizationStage::Downloaded);
        let original = self.fetcher.download(&url).await?;
        progress.reach();
        if ImageFormat::sniff(&original) == target {
            debug!(blob = %blob_id, "Downloaded bytes already {}", target);
            progress.skip();
            return Ok(ItemOutcome::Skipped);
        }

        progress.begin(OptimizationStage::Encoded);
        let encoded: Bytes = self.transcoder.encode(&original)?;
        progress.reach();

        progress.begin(OptimizationStage::Uploaded);
        let upload_target = self
            .blob_store
            .generate_upload_target()
            .await
            .map_err(UploadError::Target)?;
        let new_blob = self
            .blob_store
            .upload_bytes(&upload_target, encoded.clone(), target.mime_type())
            .await
            .map_err(UploadError::Transfer)?;
        progress.reach();

        progress.begin(OptimizationStage::Repointed);
        self.repoint(record, slot, &new_blob, token).await.inspect_err(|_| {
            warn!(
                blob = %new_blob,
                "Uploaded blob left unreferenced after failed repoint"
            );
        })?;
        progress.reach();

        Ok(ItemOutcome::Optimized {
            new_blob,
            bytes_before: original.len() as u64,
            bytes_after: encoded.len() as u64,
        })
    }

    /// Point the record's `slot` at `new_blob`.
    ///
    /// Multi-slot fields are rewritten whole with only `slot` replaced, and
    /// the local copy is restored when the write fails so later slots of the
    /// same record are written against what the store actually holds.
    async fn repoint(
        &self,
        record: &mut ReferencedRecord,
        slot: usize,
        new_blob: &BlobId,
        token: Option<&str>,
    ) -> Result<(), ItemFailure> {
        let descriptor = record.kind().descriptor();
        let token = token.map(str::to_string);

        if !descriptor.is_multi_slot() {
            self.record_store
                .update_image_ref(descriptor, record.entity_id(), new_blob, token)
                .await?;
            return Ok(());
        }

        let previous = record
            .replace_slot(slot, new_blob.clone())
            .map_err(RepositoryError::from)?;
        let written = self
            .record_store
            .update_image_refs(descriptor, record.entity_id(), record.slots(), token)
            .await;

        if let Err(e) = written {
            record
                .replace_slot(slot, previous)
                .map_err(RepositoryError::from)?;
            return Err(e.into());
        }
        Ok(())
    }
}
