pub mod collectors;
pub mod config;
pub mod results;
pub mod storage_stats;
pub mod worker;

pub use collectors::{GcError, GcResult, RunMode};
pub use config::GcConfig;
pub use results::GcRunSummary;
pub use storage_stats::{ContentTypeUsage, StorageStats, StorageStatsCollector};
pub use worker::GarbageCollector;
