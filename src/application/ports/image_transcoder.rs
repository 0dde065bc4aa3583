use bytes::Bytes;
#[cfg(test)]
use mockall::{automock, predicate::*};
use thiserror::Error;

use crate::domain::value_objects::ImageFormat;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Failed to decode source image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Port for re-encoding image bytes into a compact format
#[cfg_attr(test, automock)]
pub trait ImageTranscoder: Send + Sync {
    /// Format every encoded output is in
    fn target_format(&self) -> ImageFormat;

    fn encode(&self, source: &[u8]) -> Result<Bytes, EncodeError>;
}
