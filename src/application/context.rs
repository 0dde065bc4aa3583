use std::sync::Arc;

use crate::application::ports::{BlobStore, RecordStore};
use crate::domain::authorization::AuthorizationGate;

/// Backend collaborators shared by every maintenance job.
///
/// Built once at startup and handed to each component constructor.
#[derive(Clone)]
pub struct BackendContext {
    pub blob_store: Arc<dyn BlobStore>,
    pub record_store: Arc<dyn RecordStore>,
    pub gate: AuthorizationGate,
}

impl BackendContext {
    pub fn new(
        blob_store: Arc<dyn BlobStore>,
        record_store: Arc<dyn RecordStore>,
        gate: AuthorizationGate,
    ) -> Self {
        Self {
            blob_store,
            record_store,
            gate,
        }
    }
}
