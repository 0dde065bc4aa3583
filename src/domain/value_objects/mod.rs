mod blob_id;
mod entity_kind;
mod image_format;
mod optimization_stage;

pub use blob_id::BlobId;
pub use entity_kind::EntityKind;
pub use image_format::ImageFormat;
pub use optimization_stage::OptimizationStage;
