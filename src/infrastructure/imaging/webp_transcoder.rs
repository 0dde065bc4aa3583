use bytes::Bytes;
use image::DynamicImage;

use crate::application::ports::{EncodeError, ImageTranscoder};
use crate::domain::value_objects::ImageFormat;

/// Lossy WebP encoder.
///
/// Decodes any format the `image` crate reads, normalizes to 8-bit RGB or
/// RGBA (the only layouts libwebp accepts) and encodes at a fixed quality.
#[derive(Debug, Clone, Copy)]
pub struct WebpTranscoder {
    quality: f32,
}

impl WebpTranscoder {
    pub fn new(quality: f32) -> Self {
        Self {
            quality: quality.clamp(1.0, 100.0),
        }
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }
}

impl ImageTranscoder for WebpTranscoder {
    fn target_format(&self) -> ImageFormat {
        ImageFormat::Webp
    }

    fn encode(&self, source: &[u8]) -> Result<Bytes, EncodeError> {
        let decoded =
            image::load_from_memory(source).map_err(|e| EncodeError::Decode(e.to_string()))?;

        let normalized = if decoded.color().has_alpha() {
            DynamicImage::ImageRgba8(decoded.to_rgba8())
        } else {
            DynamicImage::ImageRgb8(decoded.to_rgb8())
        };

        let encoder = webp::Encoder::from_image(&normalized)
            .map_err(|e| EncodeError::Encode(e.to_string()))?;
        let encoded = encoder.encode(self.quality);
        Ok(Bytes::copy_from_slice(&encoded))
    }
}
