mod blob_store;
mod client;
mod image_fetcher;
mod record_store;

pub use blob_store::HttpBlobStore;
pub use client::{BackendClient, BackendError};
pub use image_fetcher::HttpImageFetcher;
pub use record_store::HttpRecordStore;
