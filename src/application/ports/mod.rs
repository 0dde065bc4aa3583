mod blob_store;
mod confirmation;
mod image_fetcher;
mod image_transcoder;
mod record_store;

pub use blob_store::{BlobStore, StorageError, UploadTarget, MAX_PAGE_SIZE};
pub use confirmation::{Confirmation, FixedConfirmation};
pub use image_fetcher::{DownloadError, ImageFetcher};
pub use image_transcoder::{EncodeError, ImageTranscoder};
pub use record_store::{RecordStore, RepositoryError};

#[cfg(test)]
pub use blob_store::MockBlobStore;
#[cfg(test)]
pub use image_fetcher::MockImageFetcher;
#[cfg(test)]
pub use image_transcoder::MockImageTranscoder;
#[cfg(test)]
pub use record_store::MockRecordStore;
