use serde::Serialize;
use std::collections::BTreeMap;

use super::errors::ItemOptimizationError;
use crate::domain::value_objects::{BlobId, EntityKind};

/// Terminal result of one blob going through the pipeline
#[derive(Debug)]
pub enum ItemOutcome {
    Optimized {
        new_blob: BlobId,
        bytes_before: u64,
        bytes_after: u64,
    },
    Skipped,
    Failed(ItemOptimizationError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindStats {
    pub processed: usize,
    pub optimized: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Counters of an optimization run.
///
/// Every processed blob ends in exactly one of optimized, skipped or failed,
/// both overall and per kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptimizationStats {
    pub processed: usize,
    pub optimized: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Original size of the optimized blobs
    pub bytes_before: u64,
    /// Encoded size of the optimized blobs
    pub bytes_after: u64,
    pub per_kind: BTreeMap<EntityKind, KindStats>,
    pub errors: Vec<String>,
}

impl OptimizationStats {
    pub fn record(&mut self, kind: EntityKind, outcome: &ItemOutcome) {
        self.processed += 1;
        let per_kind = self.per_kind.entry(kind).or_default();
        per_kind.processed += 1;

        match outcome {
            ItemOutcome::Optimized {
                bytes_before,
                bytes_after,
                ..
            } => {
                self.optimized += 1;
                per_kind.optimized += 1;
                self.bytes_before += bytes_before;
                self.bytes_after += bytes_after;
            }
            ItemOutcome::Skipped => {
                self.skipped += 1;
                per_kind.skipped += 1;
            }
            ItemOutcome::Failed(error) => {
                self.failed += 1;
                per_kind.failed += 1;
                self.errors.push(error.to_string());
            }
        }
    }

    /// Fraction of the original bytes saved, 0.0 when nothing was optimized
    pub fn savings_ratio(&self) -> f64 {
        if self.bytes_before == 0 {
            return 0.0;
        }
        1.0 - self.bytes_after as f64 / self.bytes_before as f64
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn summary(&self) -> String {
        format!(
            "Processed {} blobs: {} optimized, {} skipped, {} failed ({} -> {} bytes, {:.1}% saved)",
            self.processed,
            self.optimized,
            self.skipped,
            self.failed,
            self.bytes_before,
            self.bytes_after,
            self.savings_ratio() * 100.0
        )
    }

    pub fn details(&self) -> String {
        let mut details = vec![self.summary()];
        for (kind, stats) in &self.per_kind {
            details.push(format!(
                "  {}: {} processed, {} optimized, {} skipped, {} failed",
                kind, stats.processed, stats.optimized, stats.skipped, stats.failed
            ));
        }
        if !self.errors.is_empty() {
            details.push("Errors:".to_string());
            for (i, error) in self.errors.iter().enumerate() {
                details.push(format!("  {}. {}", i + 1, error));
            }
        }
        details.join("\n")
    }
}
