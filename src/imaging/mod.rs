//! Image conversion and thumbnail fitting.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` |
//! | **Base64** | `base64` standard engine |
//! | **Fit to box** | [`fit_to_box`] (pure) |
//! | **Resample** | `DynamicImage::resize_exact` |
//! | **Encode** | `JpegEncoder` at a fixed quality |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Quality, bounding boxes, filters
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Bridge**: conversions between decoded images, base64, bytes and uploads
//! - **Operations**: resize entry points combining calculations + backend

pub mod backend;
pub mod bridge;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{ConvertError, DecodedImage, Dimensions, ImageBackend};
pub use bridge::ImageSource;
pub use calculations::{fit_to_box, scale_long_edge};
pub use operations::{ResizeConfig, resize, resize_all, resize_to_base64, resize_to_encoded};
pub use params::{BoundingBoxSize, Quality, ResizeFilter, ResizeParams};
pub use rust_backend::RustBackend;
