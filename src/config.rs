use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::application::gc::GcConfig;
use crate::application::optimizer::OptimizerConfig;
use crate::application::ports::MAX_PAGE_SIZE;
use crate::domain::authorization::AuthorizationGate;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Runtime configuration for both maintenance binaries.
///
/// Credentials are never read from the config file; they only come from the
/// environment or the command line.
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub backend_url: String,
    #[serde(skip)]
    pub backend_admin_key: Option<String>,
    #[serde(skip)]
    pub admin_secret: Option<String>,
    #[serde(skip)]
    pub admin_token: Option<String>,
    pub gc_page_size: usize,
    pub gc_delete_batch_size: usize,
    pub optimizer_quality: u8,
    pub optimizer_delay_ms: u64,
    pub http_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:3210".to_string(),
            backend_admin_key: None,
            admin_secret: None,
            admin_token: None,
            gc_page_size: MAX_PAGE_SIZE,
            gc_delete_batch_size: 10,
            optimizer_quality: 80,
            optimizer_delay_ms: 500,
            http_timeout_secs: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Load a TOML file, then let the environment override it
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config.overlay(|key| std::env::var(key).ok()))
    }

    /// Apply every variable `lookup` knows on top of `self`.
    ///
    /// Values that fail to parse leave the current setting in place.
    pub fn overlay<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("BACKEND_URL") {
            self.backend_url = url;
        }
        if let Some(key) = non_empty("BACKEND_ADMIN_KEY") {
            self.backend_admin_key = Some(key);
        }
        if let Some(secret) = non_empty("STORAGE_ADMIN_SECRET") {
            self.admin_secret = Some(secret);
        }
        if let Some(token) = non_empty("STORAGE_ADMIN_TOKEN") {
            self.admin_token = Some(token);
        }
        self.gc_page_size = non_empty("GC_PAGE_SIZE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.gc_page_size);
        self.gc_delete_batch_size = non_empty("GC_DELETE_BATCH_SIZE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.gc_delete_batch_size);
        self.optimizer_quality = non_empty("OPTIMIZER_QUALITY")
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.optimizer_quality);
        self.optimizer_delay_ms = non_empty("OPTIMIZER_DELAY_MS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.optimizer_delay_ms);
        if let Some(secs) = non_empty("HTTP_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.http_timeout_secs = Some(secs);
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.backend_url.starts_with("http://") && !self.backend_url.starts_with("https://") {
            return Err("BACKEND_URL must start with http:// or https://".to_string());
        }

        if self.gc_page_size < 1 || self.gc_page_size > MAX_PAGE_SIZE {
            return Err(format!("GC_PAGE_SIZE must be between 1 and {}", MAX_PAGE_SIZE));
        }

        if self.gc_delete_batch_size < 1 || self.gc_delete_batch_size > 100 {
            return Err("GC_DELETE_BATCH_SIZE must be between 1 and 100".to_string());
        }

        if self.optimizer_quality < 1 || self.optimizer_quality > 100 {
            return Err("OPTIMIZER_QUALITY must be between 1 and 100".to_string());
        }

        if self.http_timeout_secs == Some(0) {
            return Err("HTTP_TIMEOUT_SECS must be at least 1 second".to_string());
        }

        Ok(())
    }

    pub fn gate(&self) -> AuthorizationGate {
        AuthorizationGate::new(self.admin_secret.as_deref())
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs.map(Duration::from_secs)
    }

    pub fn gc_config(&self) -> GcConfig {
        GcConfig::new(self.gc_page_size, self.gc_delete_batch_size)
    }

    pub fn optimizer_config(&self) -> OptimizerConfig {
        OptimizerConfig::new(
            f32::from(self.optimizer_quality),
            Duration::from_millis(self.optimizer_delay_ms),
        )
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("Config")
            .field("backend_url", &self.backend_url)
            .field("backend_admin_key", &redact(&self.backend_admin_key))
            .field("admin_secret", &redact(&self.admin_secret))
            .field("admin_token", &redact(&self.admin_token))
            .field("gc_page_size", &self.gc_page_size)
            .field("gc_delete_batch_size", &self.gc_delete_batch_size)
            .field("optimizer_quality", &self.optimizer_quality)
            .field("optimizer_delay_ms", &self.optimizer_delay_ms)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}
