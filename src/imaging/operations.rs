//! High-level resize operations.
//!
//! These combine [`fit_to_box`] with backend execution: plan the target
//! dimensions, resample, and optionally re-encode through the
//! [`bridge`](super::bridge).

use super::backend::{DecodedImage, Dimensions, ImageBackend};
use super::bridge::{self, ImageSource, Result};
use super::calculations::fit_to_box;
use super::params::{BoundingBoxSize, Quality, ResizeFilter, ResizeParams};
use crate::upload::EncodedBlob;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rayon::prelude::*;
use tracing::{debug, instrument};

/// Settings applied to every resize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResizeConfig {
    pub filter: ResizeFilter,
    pub quality: Quality,
}

/// Plan a resize without executing it.
pub fn plan_resize(source: Dimensions, box_size: BoundingBoxSize, filter: ResizeFilter) -> ResizeParams {
    let (width, height) = fit_to_box(source.width, source.height, box_size.side());
    ResizeParams {
        width,
        height,
        filter,
    }
}

/// Fit a decoded image into `box_size`.
///
/// Images already inside the box come back as an unscaled copy; the backend
/// is not asked to resample them.
pub fn resize(
    backend: &impl ImageBackend,
    image: &DecodedImage,
    box_size: BoundingBoxSize,
    config: &ResizeConfig,
) -> Result<DecodedImage> {
    let source = image.dimensions();
    let params = plan_resize(source, box_size, config.filter);

    if params.width == source.width && params.height == source.height {
        debug!(
            width = source.width,
            height = source.height,
            %box_size,
            "image already fits, not resampling"
        );
        return Ok(image.clone());
    }

    debug!(
        from_width = source.width,
        from_height = source.height,
        width = params.width,
        height = params.height,
        %box_size,
        "resizing"
    );
    backend.resample(image, &params)
}

/// Decode (if needed) and fit into `box_size`.
pub fn resize_source(
    backend: &impl ImageBackend,
    source: ImageSource<'_>,
    box_size: BoundingBoxSize,
    config: &ResizeConfig,
) -> Result<DecodedImage> {
    let image = bridge::decode(backend, source)?;
    resize(backend, &image, box_size, config)
}

/// Decode (if needed), fit into `box_size`, and encode as JPEG.
pub fn resize_to_encoded(
    backend: &impl ImageBackend,
    source: ImageSource<'_>,
    box_size: BoundingBoxSize,
    config: &ResizeConfig,
) -> Result<EncodedBlob> {
    let resized = resize_source(backend, source, box_size, config)?;
    bridge::encode(backend, &resized, config.quality)
}

/// Like [`resize_to_encoded`], returning base64 text.
pub fn resize_to_base64(
    backend: &impl ImageBackend,
    source: ImageSource<'_>,
    box_size: BoundingBoxSize,
    config: &ResizeConfig,
) -> Result<String> {
    let blob = resize_to_encoded(backend, source, box_size, config)?;
    Ok(STANDARD.encode(blob.as_bytes()))
}

/// Fit one image into several boxes in parallel.
///
/// Output follows the order of `boxes`. The first failure aborts the set.
#[instrument(skip_all, fields(count = boxes.len()))]
pub fn resize_all(
    backend: &impl ImageBackend,
    image: &DecodedImage,
    boxes: &[BoundingBoxSize],
    config: &ResizeConfig,
) -> Result<Vec<(BoundingBoxSize, DecodedImage)>> {
    boxes
        .par_iter()
        .map(|&box_size| resize(backend, image, box_size, config).map(|img| (box_size, img)))
        .collect()
}
