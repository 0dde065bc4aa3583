mod blob;
mod deletion;
mod reference;

pub use blob::{BlobMetadata, BlobPage, BlobRecord, DanglingBlob};
pub use deletion::{DeletionReport, DeletionResult};
pub use reference::{ImageReference, ReferencedRecord};
