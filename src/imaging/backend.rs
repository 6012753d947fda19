//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the codec capability the rest of the crate
//! leans on: decode bytes, encode JPEG at a quality, and resample to exact
//! dimensions. Everything above it (validation, base64, box fitting) is
//! backend-agnostic.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests swap in `MockBackend`, which records what it was asked to do.

use super::params::{Quality, ResizeParams};
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Unsupported media kind: {0}")]
    UnsupportedMediaKind(String),
    #[error("Malformed image data: {0}")]
    MalformedImageData(String),
    #[error("Invalid size: {0} (expected one of 32, 64, 128, 150, 256, 800)")]
    InvalidSize(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// An in-memory raster produced by decoding or resampling.
///
/// Owned by whichever call produced it; clone it to share.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage(DynamicImage);

impl DecodedImage {
    pub fn new(image: DynamicImage) -> Self {
        Self(image)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.0
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.0
    }
}

impl From<DynamicImage> for DecodedImage {
    fn from(image: DynamicImage) -> Self {
        Self(image)
    }
}

/// Trait for image codec backends.
///
/// `Sync` so a single backend can serve [`resize_all`](super::operations::resize_all)
/// across rayon workers.
pub trait ImageBackend: Sync {
    /// Decode an encoded image (any compiled-in format) into pixels.
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, ConvertError>;

    /// Encode pixels as baseline JPEG at the given quality.
    fn encode_jpeg(&self, image: &DecodedImage, quality: Quality) -> Result<Vec<u8>, ConvertError>;

    /// Produce a new raster at exactly `params.width` × `params.height`.
    fn resample(
        &self,
        image: &DecodedImage,
        params: &ResizeParams,
    ) -> Result<DecodedImage, ConvertError>;
}
