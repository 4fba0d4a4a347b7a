//! Bytes → displayable bitmap.

use std::sync::Arc;

use crate::DecodedImage;
use crate::error::ServiceError;

pub trait ImageDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, ServiceError>;
}

/// Decodes with the `image` crate, sniffing the format from the bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageCrateDecoder;

impl ImageDecoder for ImageCrateDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, ServiceError> {
        let img = image::load_from_memory(bytes)?;
        Ok(Arc::new(img))
    }
}
