//! Result types returned by garbage collection runs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::application::gc::collectors::{DeletionOutcome, Reconciliation, RunMode};
use crate::domain::authorization::UnauthorizedError;
use crate::domain::value_objects::EntityKind;

/// Result of one complete garbage collection run
#[derive(Debug, Clone, Serialize)]
pub struct GcRunSummary {
    pub mode: RunMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Blobs held by the store
    pub enumerated: usize,
    /// Distinct blobs referenced by live records
    pub referenced: usize,
    pub references_per_kind: BTreeMap<EntityKind, usize>,
    pub dangling: usize,
    /// Known size of the dangling blobs
    pub dangling_bytes: u64,
    /// Whether the operator approved the deletion; `None` when never asked
    pub confirmed: Option<bool>,
    pub deleted: usize,
    pub failed: usize,
    /// Whether the caller's token was rejected before anything was deleted
    pub refused: bool,
    /// Degraded diagnostics that do not make the run unsuccessful
    pub warnings: Vec<String>,
    /// Non-fatal problems encountered along the way.
    ///
    /// The run still completes when these occur; fatal failures are returned
    /// as errors instead of a summary.
    pub errors: Vec<String>,
}

impl GcRunSummary {
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            started_at: Utc::now(),
            finished_at: None,
            enumerated: 0,
            referenced: 0,
            references_per_kind: BTreeMap::new(),
            dangling: 0,
            dangling_bytes: 0,
            confirmed: None,
            deleted: 0,
            failed: 0,
            refused: false,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn record_reconciliation(&mut self, reconciliation: &Reconciliation) {
        self.enumerated = reconciliation.enumerated;
        self.referenced = reconciliation.referenced;
        self.references_per_kind = reconciliation.references_per_kind.clone();
        self.dangling = reconciliation.dangling.len();
        self.dangling_bytes = reconciliation.dangling_bytes();
        if !reconciliation.metadata_available {
            self.warnings
                .push("Dangling blob metadata unavailable; sizes are unknown".to_string());
        }
    }

    pub fn record_outcome(&mut self, outcome: &DeletionOutcome) {
        match outcome {
            DeletionOutcome::DryRun(_) => {}
            DeletionOutcome::Declined(_) => self.confirmed = Some(false),
            DeletionOutcome::Deleted { report, .. } => {
                self.confirmed = Some(true);
                self.deleted = report.success_count;
                self.failed = report.failure_count;
                for failure in report.failures() {
                    self.add_error(failure.to_string());
                }
            }
        }
    }

    /// Record that the deletion was refused for the caller's token
    pub fn record_refusal(&mut self, error: &UnauthorizedError) {
        self.refused = true;
        self.add_error(format!("Deletion refused: {}", error));
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Returns true if the run completed without any errors
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_deletions(&self) -> bool {
        self.deleted > 0
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_milliseconds())
    }

    /// Returns a one-line summary of the run
    pub fn summary(&self) -> String {
        let outcome = match (self.mode, self.confirmed) {
            (RunMode::DryRun, _) => format!(
                "{} dangling blobs ({} bytes) would be deleted",
                self.dangling, self.dangling_bytes
            ),
            (RunMode::Delete, _) if self.refused => {
                format!("deletion of {} dangling blobs refused", self.dangling)
            }
            (RunMode::Delete, Some(false)) => {
                format!("deletion of {} dangling blobs declined", self.dangling)
            }
            (RunMode::Delete, _) => format!(
                "{} deleted, {} failed of {} dangling blobs",
                self.deleted, self.failed, self.dangling
            ),
        };

        if self.errors.is_empty() {
            format!("GC {} completed successfully: {}", self.mode, outcome)
        } else {
            format!(
                "GC {} completed with {} errors: {}",
                self.mode,
                self.errors.len(),
                outcome
            )
        }
    }

    /// Returns detailed information about the run
    pub fn details(&self) -> String {
        let mut details = vec![
            format!("Mode: {}", self.mode),
            format!("Blobs enumerated: {}", self.enumerated),
            format!("Blobs referenced: {}", self.referenced),
        ];
        for (kind, count) in &self.references_per_kind {
            details.push(format!("  {} references: {}", kind, count));
        }
        details.push(format!("Dangling blobs: {}", self.dangling));
        details.push(format!("Dangling bytes (known): {}", self.dangling_bytes));
        if self.mode == RunMode::Delete {
            details.push(format!("Blobs deleted: {}", self.deleted));
            details.push(format!("Deletions failed: {}", self.failed));
        }
        if let Some(ms) = self.duration_ms() {
            details.push(format!("Duration: {} ms", ms));
        }
        for warning in &self.warnings {
            details.push(format!("Warning: {}", warning));
        }
        details.push(format!("Errors encountered: {}", self.errors.len()));

        if !self.errors.is_empty() {
            details.push("Errors:".to_string());
            for (i, error) in self.errors.iter().enumerate() {
                details.push(format!("  {}. {}", i + 1, error));
            }
        }

        details.join("\n")
    }
}
