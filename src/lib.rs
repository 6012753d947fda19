//! # thumbfit
//!
//! Moves raster images between three shapes an upload handler deals with
//! (decoded pixels, base64 text, and uploaded files) and fits them into a
//! fixed set of square thumbnail boxes without distorting them.
//!
//! ```text
//! upload / base64 / bytes ──decode──▶ DecodedImage ──fit_to_box + resample──▶ DecodedImage
//!                                                                             │
//!                                             base64 / EncodedBlob ◀──JPEG────┘
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Box fitting, codec backend, conversions and resize operations |
//! | [`upload`] | Uploaded files, encoded blobs, and the declared content-type gate |
//! | [`converter`] | [`Converter`]: the operation surface bound to a backend and config |
//! | [`config`] | TOML configuration with stock defaults and validation |
//!
//! # Design Decisions
//!
//! ## Never Upscale, Never Distort
//!
//! The longer side of an image is fitted to the box and the shorter side
//! follows the original ratio, truncated to whole pixels. Images already
//! inside the box keep their size. [`imaging::fit_to_box`] is a pure function
//! of `(width, height, box)`, so concurrent resizes share nothing.
//!
//! ## Always JPEG Out
//!
//! Every encode produces JPEG at the configured quality, whatever the input
//! format or the extension a caller names. Alpha is flattened.
//!
//! ## Gate on the Declared Type
//!
//! Uploads are accepted or rejected on the content type they *declare*; the
//! bytes are not sniffed. Base64 input has no declared type and goes straight
//! to the decoder, which is the real arbiter of whether bytes are an image.
//!
//! ## Logging
//!
//! The crate emits `tracing` events at debug level for decode, resize and
//! encode, and at warn level for rejected uploads. It never installs a
//! subscriber.

pub mod config;
pub mod converter;
pub mod imaging;
pub mod upload;

pub use config::{ConfigError, ConverterConfig};
pub use converter::Converter;
pub use imaging::{BoundingBoxSize, ConvertError, DecodedImage, ImageSource, Quality};
pub use upload::{EncodedBlob, UploadedFile};

#[cfg(test)]
pub(crate) mod test_helpers;
