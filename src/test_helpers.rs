//! Shared test utilities: synthetic images and their encodings.
//!
//! Everything is generated in memory, so tests need no fixture files.

use crate::imaging::DecodedImage;
use image::codecs::avif::AvifEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

/// An RGB gradient, so encoders have something non-trivial to compress.
pub fn gradient(width: u32, height: u32) -> DecodedImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    DecodedImage::new(DynamicImage::ImageRgb8(img))
}

/// An RGBA gradient with varying alpha.
pub fn gradient_rgba(width: u32, height: u32) -> DecodedImage {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 64, ((x + y) % 256) as u8])
    });
    DecodedImage::new(DynamicImage::ImageRgba8(img))
}

fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    gradient(width, height)
        .as_dynamic()
        .write_to(&mut buffer, format)
        .unwrap();
    buffer.into_inner()
}

/// JPEG bytes of a `width`×`height` gradient.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encoded(width, height, ImageFormat::Jpeg)
}

/// PNG bytes of a `width`×`height` gradient.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encoded(width, height, ImageFormat::Png)
}

/// AVIF bytes of a `width`×`height` gradient, encoded at the fastest speed.
pub fn avif_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buffer = Vec::new();
    let encoder = AvifEncoder::new_with_speed_quality(&mut buffer, 10, 85);
    gradient(width, height)
        .as_dynamic()
        .write_with_encoder(encoder)
        .unwrap();
    buffer
}
