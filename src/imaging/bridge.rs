//! Conversions between decoded images, base64 text, raw bytes and uploads.
//!
//! Uploads go through the declared-type gate before their bytes are touched;
//! base64 text and raw bytes are decoded directly and only fail if the codec
//! cannot read them. Every encode produces JPEG, whatever the input format.

use super::backend::{ConvertError, DecodedImage, ImageBackend};
use super::params::Quality;
use crate::upload::{
    EncodedBlob, UploadedFile, bare_extension, content_type_for_extension, is_accepted_image,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::borrow::Cow;
use tracing::{debug, warn};

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Anything a resize or conversion can start from.
#[derive(Debug)]
pub enum ImageSource<'a> {
    /// Already decoded; used as-is.
    Decoded(&'a DecodedImage),
    /// Base64 text of an encoded image. Not type-gated.
    Base64(&'a str),
    /// Raw encoded bytes. Not type-gated.
    Bytes(&'a [u8]),
    /// A transport upload. Gated on its declared content type.
    File(UploadedFile),
}

impl<'a> From<&'a DecodedImage> for ImageSource<'a> {
    fn from(image: &'a DecodedImage) -> Self {
        ImageSource::Decoded(image)
    }
}

impl<'a> From<&'a str> for ImageSource<'a> {
    fn from(base64: &'a str) -> Self {
        ImageSource::Base64(base64)
    }
}

impl<'a> From<&'a [u8]> for ImageSource<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        ImageSource::Bytes(bytes)
    }
}

impl From<UploadedFile> for ImageSource<'_> {
    fn from(file: UploadedFile) -> Self {
        ImageSource::File(file)
    }
}

/// Decode whatever the source holds. Decoded input is borrowed, not copied.
pub fn decode<'a>(
    backend: &impl ImageBackend,
    source: ImageSource<'a>,
) -> Result<Cow<'a, DecodedImage>> {
    match source {
        ImageSource::Decoded(image) => Ok(Cow::Borrowed(image)),
        ImageSource::Base64(text) => decode_from_base64(backend, text).map(Cow::Owned),
        ImageSource::Bytes(bytes) => decode_from_bytes(backend, bytes).map(Cow::Owned),
        ImageSource::File(file) => decode_from_file(backend, file).map(Cow::Owned),
    }
}

/// Decode raw encoded bytes.
pub fn decode_from_bytes(backend: &impl ImageBackend, bytes: &[u8]) -> Result<DecodedImage> {
    let image = backend.decode(bytes)?;
    debug!(
        len = bytes.len(),
        width = image.width(),
        height = image.height(),
        "decoded image"
    );
    Ok(image)
}

/// Decode an upload after checking its declared content type and length.
pub fn decode_from_file(backend: &impl ImageBackend, file: UploadedFile) -> Result<DecodedImage> {
    let bytes = read_accepted(file)?;
    decode_from_bytes(backend, &bytes)
}

/// Decode base64 text of an encoded image.
///
/// ASCII whitespace (line wrapping) in the text is ignored.
pub fn decode_from_base64(backend: &impl ImageBackend, base64: &str) -> Result<DecodedImage> {
    let bytes = base64_to_bytes(base64)?;
    decode_from_bytes(backend, &bytes)
}

/// Encode an image as JPEG at `quality`.
pub fn encode(
    backend: &impl ImageBackend,
    image: &DecodedImage,
    quality: Quality,
) -> Result<EncodedBlob> {
    let bytes = backend.encode_jpeg(image, quality)?;
    debug!(
        width = image.width(),
        height = image.height(),
        quality = quality.value(),
        len = bytes.len(),
        "encoded jpeg"
    );
    Ok(EncodedBlob::jpeg(bytes))
}

/// Encode an image as JPEG and return the base64 text.
pub fn encode_to_base64(
    backend: &impl ImageBackend,
    image: &DecodedImage,
    quality: Quality,
) -> Result<String> {
    let blob = encode(backend, image, quality)?;
    Ok(STANDARD.encode(blob.as_bytes()))
}

/// Base64 an upload's bytes as-is, without recompressing.
pub fn file_to_base64(file: UploadedFile) -> Result<String> {
    let bytes = read_accepted(file)?;
    Ok(STANDARD.encode(bytes))
}

/// Wrap base64 text as an upload named `name.extension`.
///
/// The content type is `image/<extension>` (leading dots are ignored). The
/// extension is taken at face value; nothing checks it against the bytes.
/// Fails with [`ConvertError::UnsupportedMediaKind`] if the derived type is
/// not allow-listed or the payload is empty.
pub fn base64_to_file(base64: &str, name: &str, extension: &str) -> Result<UploadedFile> {
    let bytes = base64_to_bytes(base64)?;
    let content_type = content_type_for_extension(extension);
    let extension = bare_extension(extension);
    let file = UploadedFile::from_bytes(format!("{name}.{extension}"), content_type, bytes);

    if !is_accepted_image(&file) {
        warn!(
            file_name = file.file_name(),
            content_type = file.content_type(),
            len = file.len(),
            "rejected wrapped file"
        );
        return Err(ConvertError::UnsupportedMediaKind(format!(
            "{} ({} bytes)",
            file.content_type(),
            file.len()
        )));
    }
    Ok(file)
}

/// Gate an upload, then drain its stream.
fn read_accepted(file: UploadedFile) -> Result<Vec<u8>> {
    if !is_accepted_image(&file) {
        warn!(
            file_name = file.file_name(),
            content_type = file.content_type(),
            len = file.len(),
            "rejected upload"
        );
        return Err(ConvertError::UnsupportedMediaKind(format!(
            "{} ({} bytes)",
            file.content_type(),
            file.len()
        )));
    }
    Ok(file.into_bytes()?)
}

fn base64_to_bytes(text: &str) -> Result<Vec<u8>> {
    let decoded = if text.bytes().any(|b| b.is_ascii_whitespace()) {
        let compact: Vec<u8> = text
            .bytes()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        STANDARD.decode(compact)
    } else {
        STANDARD.decode(text)
    };
    decoded.map_err(|e| ConvertError::MalformedImageData(format!("Invalid base64: {e}")))
}
