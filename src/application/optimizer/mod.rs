pub mod config;
pub mod errors;
pub mod image_optimizer;
pub mod stats;

pub use config::OptimizerConfig;
pub use errors::{ItemFailure, ItemOptimizationError, OptimizerError, UploadError};
pub use image_optimizer::ImageOptimizer;
pub use stats::{ItemOutcome, KindStats, OptimizationStats};
