use std::sync::Arc;

use tracing::info;

use crate::application::context::BackendContext;
use crate::application::gc::GarbageCollector;
use crate::application::optimizer::{ImageOptimizer, OptimizerConfig};
use crate::application::ports::{BlobStore, ImageFetcher, ImageTranscoder, RecordStore};
use crate::config::Config;
use crate::infrastructure::backend::{
    BackendClient, HttpBlobStore, HttpImageFetcher, HttpRecordStore,
};
use crate::infrastructure::imaging::WebpTranscoder;

/// Wires the configured backend adapters into the maintenance jobs
pub struct ApplicationBuilder {
    config: Config,
    blob_store: Option<Arc<dyn BlobStore>>,
    record_store: Option<Arc<dyn RecordStore>>,
    fetcher: Option<Arc<dyn ImageFetcher>>,
}

impl ApplicationBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            blob_store: None,
            record_store: None,
            fetcher: None,
        }
    }

    /// Connect the stores to the HTTP backend named in the config
    pub fn with_http_backend(mut self) -> Result<Self, Box<dyn std::error::Error>> {
        let client = BackendClient::new(
            &self.config.backend_url,
            self.config.backend_admin_key.as_deref(),
            self.config.http_timeout(),
        )?;
        info!(backend = %client.base_url(), "Backend client configured");

        let blob_store: Arc<dyn BlobStore> = Arc::new(HttpBlobStore::new(
            client.clone(),
            self.config.admin_token.clone(),
        ));
        let record_store: Arc<dyn RecordStore> = Arc::new(HttpRecordStore::new(client));
        let fetcher: Arc<dyn ImageFetcher> =
            Arc::new(HttpImageFetcher::new(self.config.http_timeout())?);

        self.blob_store = Some(blob_store);
        self.record_store = Some(record_store);
        self.fetcher = Some(fetcher);
        Ok(self)
    }

    /// Use caller-provided stores, e.g. the in-memory backend
    pub fn with_backend(
        mut self,
        blob_store: Arc<dyn BlobStore>,
        record_store: Arc<dyn RecordStore>,
    ) -> Self {
        self.blob_store = Some(blob_store);
        self.record_store = Some(record_store);
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn ImageFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn build_context(&self) -> Result<BackendContext, Box<dyn std::error::Error>> {
        let blob_store = self
            .blob_store
            .as_ref()
            .ok_or("Blob store not initialized")?;
        let record_store = self
            .record_store
            .as_ref()
            .ok_or("Record store not initialized")?;

        Ok(BackendContext::new(
            Arc::clone(blob_store),
            Arc::clone(record_store),
            self.config.gate(),
        ))
    }

    pub fn build_gc(&self) -> Result<GarbageCollector, Box<dyn std::error::Error>> {
        let context = self.build_context()?;
        Ok(GarbageCollector::new(&context, self.config.gc_config()))
    }

    /// Build the optimizer with a WebP transcoder at the configured quality
    pub fn build_optimizer(
        &self,
        config: OptimizerConfig,
    ) -> Result<ImageOptimizer, Box<dyn std::error::Error>> {
        let context = self.build_context()?;
        let fetcher = self.fetcher.as_ref().ok_or("Image fetcher not initialized")?;
        let transcoder: Arc<dyn ImageTranscoder> = Arc::new(WebpTranscoder::new(config.quality));

        Ok(ImageOptimizer::new(
            &context,
            Arc::clone(fetcher),
            transcoder,
            config,
        ))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
