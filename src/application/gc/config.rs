use crate::application::gc::collectors::BatchConfig;
use crate::application::ports::MAX_PAGE_SIZE;

/// Configuration for garbage collection runs
#[derive(Debug, Clone)]
pub struct GcConfig {
    /// Ids requested per listing call, at most `MAX_PAGE_SIZE`
    pub page_size: usize,
    /// Ids handed to each delete batch call
    pub delete_batch_size: usize,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            delete_batch_size: 10,
        }
    }
}

impl GcConfig {
    pub fn new(page_size: usize, delete_batch_size: usize) -> Self {
        Self {
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            delete_batch_size: delete_batch_size.max(1),
        }
    }

    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig::new(self.delete_batch_size)
    }
}
