use serde::{Deserialize, Serialize};

/// Per-blob progress through the image optimization pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptimizationStage {
    /// Fetch URL and stored metadata resolved
    Fetched,
    /// Stored content type inspected
    FormatChecked,
    /// Original bytes in memory
    Downloaded,
    /// Re-encoded to the target format
    Encoded,
    /// Re-encoded bytes stored as a new blob
    Uploaded,
    /// Owning record points at the new blob
    Repointed,
    /// Already in the target format, nothing to do
    Skipped,
    /// Gave up on this blob for the current run
    Failed,
}

impl OptimizationStage {
    /// Check if transition is valid
    pub fn can_transition_to(&self, target: OptimizationStage) -> bool {
        use OptimizationStage::*;

        if target == Failed {
            return !self.is_terminal();
        }

        matches!(
            (self, target),
            (Fetched, FormatChecked)
                | (FormatChecked, Skipped)
                | (FormatChecked, Downloaded)
                // bytes sniffed after download can still reveal the target format
                | (Downloaded, Skipped)
                | (Downloaded, Encoded)
                | (Encoded, Uploaded)
                | (Uploaded, Repointed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OptimizationStage::Skipped | OptimizationStage::Repointed | OptimizationStage::Failed
        )
    }
}

impl std::fmt::Display for OptimizationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OptimizationStage::Fetched => "FETCHED",
            OptimizationStage::FormatChecked => "FORMAT_CHECKED",
            OptimizationStage::Downloaded => "DOWNLOADED",
            OptimizationStage::Encoded => "ENCODED",
            OptimizationStage::Uploaded => "UPLOADED",
            OptimizationStage::Repointed => "REPOINTED",
            OptimizationStage::Skipped => "SKIPPED",
            OptimizationStage::Failed => "FAILED",
        };
        f.write_str(name)
    }
}
