use std::time::Duration;

use crate::domain::value_objects::EntityKind;

/// Configuration for image optimization runs
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Lossy encoder quality, 1 to 100
    pub quality: f32,
    /// Pause between two consecutive blobs
    pub item_delay: Duration,
    /// Kinds to process, in order
    pub kinds: Vec<EntityKind>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            quality: 80.0,
            item_delay: Duration::from_millis(500),
            kinds: EntityKind::ALL.to_vec(),
        }
    }
}

impl OptimizerConfig {
    pub fn new(quality: f32, item_delay: Duration) -> Self {
        Self {
            quality: quality.clamp(1.0, 100.0),
            item_delay,
            ..Self::default()
        }
    }

    /// Restrict the run to `kinds`; an empty list keeps every kind
    pub fn with_kinds(mut self, kinds: Vec<EntityKind>) -> Self {
        if !kinds.is_empty() {
            let mut kinds = kinds;
            kinds.sort();
            kinds.dedup();
            self.kinds = kinds;
        }
        self
    }
}
