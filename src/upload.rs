//! Upload-side types: the transport's file object and encoded byte blobs.
//!
//! Both carry a *declared* content type that nobody has checked against the
//! bytes. [`is_accepted_image`] gates on that declaration alone; a mislabeled
//! file passes here and fails later at decode time.

use std::fmt;
use std::io::{self, Cursor, Read};

/// Content types an upload may declare, compared ASCII case-insensitively.
pub const ACCEPTED_CONTENT_TYPES: &[&str] = &[
    "image/apng",
    "image/avif",
    "image/bmp",
    "image/gif",
    "image/jfif",
    "image/jpeg",
    "image/png",
    "image/svg+xml",
    "image/tiff",
    "image/webp",
];

/// Content type of everything this crate encodes.
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Anything that declares a length and a content type.
pub trait DeclaredMedia {
    fn declared_len(&self) -> u64;
    fn declared_content_type(&self) -> &str;
}

/// True if `content_type` is on the allow-list.
///
/// Only ASCII case is folded; padding or parameters (`; charset=...`) make
/// the type unrecognised.
pub fn is_accepted_content_type(content_type: &str) -> bool {
    ACCEPTED_CONTENT_TYPES
        .iter()
        .any(|accepted| accepted.eq_ignore_ascii_case(content_type))
}

/// Extension with its leading dots removed. No other normalisation applies.
pub fn bare_extension(extension: &str) -> &str {
    extension.trim_start_matches('.')
}

/// The `image/<extension>` content type a wrapped file declares.
pub fn content_type_for_extension(extension: &str) -> String {
    format!("image/{}", bare_extension(extension))
}

/// True if the media is non-empty and declares an allow-listed image type.
pub fn is_accepted_image<M: DeclaredMedia + ?Sized>(media: &M) -> bool {
    media.declared_len() > 0 && is_accepted_content_type(media.declared_content_type())
}

/// A named, content-typed byte stream handed over by the transport layer.
///
/// The stream is read at most once: [`into_bytes`](Self::into_bytes) consumes
/// the file.
pub struct UploadedFile {
    file_name: String,
    content_type: String,
    length: u64,
    reader: Box<dyn Read + Send>,
}

impl UploadedFile {
    /// Wrap a transport stream. `length` is the declared size; at most that
    /// many bytes are read.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        length: u64,
        reader: impl Read + Send + 'static,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            length,
            reader: Box::new(reader),
        }
    }

    /// Build a file whose stream is an in-memory buffer.
    pub fn from_bytes(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        let length = bytes.len() as u64;
        Self::new(file_name, content_type, length, Cursor::new(bytes))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Drain the stream, up to the declared length.
    pub fn into_bytes(self) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(self.length.min(64 * 1024 * 1024) as usize);
        self.reader.take(self.length).read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

impl DeclaredMedia for UploadedFile {
    fn declared_len(&self) -> u64 {
        self.length
    }

    fn declared_content_type(&self) -> &str {
        &self.content_type
    }
}

/// Immutable encoded image bytes plus their declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBlob {
    bytes: Vec<u8>,
    content_type: String,
}

impl EncodedBlob {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self::new(bytes, JPEG_CONTENT_TYPE)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Hand the blob to code that expects an upload.
    pub fn into_uploaded_file(self, file_name: impl Into<String>) -> UploadedFile {
        UploadedFile::from_bytes(file_name, self.content_type, self.bytes)
    }
}

impl DeclaredMedia for EncodedBlob {
    fn declared_len(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn declared_content_type(&self) -> &str {
        &self.content_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_every_allow_listed_type() {
        for ct in ACCEPTED_CONTENT_TYPES {
            let file = UploadedFile::from_bytes("a", *ct, vec![1]);
            assert!(is_accepted_image(&file), "{ct} should be accepted");
        }
    }

    #[test]
    fn content_type_check_is_case_insensitive() {
        assert!(is_accepted_content_type("IMAGE/PNG"));
        assert!(is_accepted_content_type("Image/Svg+Xml"));
    }

    #[test]
    fn padded_content_type_is_rejected() {
        assert!(!is_accepted_content_type(" image/png\n"));
        assert!(!is_accepted_content_type(" image/webp "));
        assert!(!is_accepted_content_type("image/png; charset=binary"));
    }

    #[test]
    fn extension_maps_to_content_type() {
        assert_eq!(bare_extension(".png"), "png");
        assert_eq!(bare_extension("..webp"), "webp");
        assert_eq!(bare_extension(" png"), " png");
        assert_eq!(content_type_for_extension(".gif"), "image/gif");
        assert!(!is_accepted_content_type(&content_type_for_extension(" png")));
    }

    #[test]
    fn rejects_types_outside_allow_list() {
        for ct in [
            "image/jpg",
            "image/heic",
            "application/pdf",
            "text/plain",
            "",
        ] {
            let file = UploadedFile::from_bytes("a", ct, vec![1, 2, 3]);
            assert!(!is_accepted_image(&file), "{ct:?} should be rejected");
        }
    }

    #[test]
    fn rejects_zero_length() {
        let file = UploadedFile::from_bytes("empty.png", "image/png", Vec::new());
        assert!(file.is_empty());
        assert!(!is_accepted_image(&file));
    }

    #[test]
    fn declared_type_is_not_sniffed() {
        // Text bytes labeled as PNG pass the declared-type gate
        let file = UploadedFile::from_bytes("fake.png", "image/png", b"hello".to_vec());
        assert!(is_accepted_image(&file));
    }

    #[test]
    fn into_bytes_reads_declared_length() {
        let file = UploadedFile::new("a.png", "image/png", 3, Cursor::new(vec![1, 2, 3, 4, 5]));
        assert_eq!(file.into_bytes().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn uploaded_file_accessors() {
        let file = UploadedFile::from_bytes("photo.jpg", "image/jpeg", vec![9; 10]);
        assert_eq!(file.file_name(), "photo.jpg");
        assert_eq!(file.content_type(), "image/jpeg");
        assert_eq!(file.len(), 10);
        assert!(format!("{file:?}").contains("photo.jpg"));
    }

    #[test]
    fn blob_gate_uses_declared_type() {
        assert!(is_accepted_image(&EncodedBlob::jpeg(vec![1])));
        assert!(!is_accepted_image(&EncodedBlob::jpeg(Vec::new())));
        assert!(!is_accepted_image(&EncodedBlob::new(vec![1], "image/x-icon")));
    }

    #[test]
    fn blob_converts_to_upload() {
        let file = EncodedBlob::jpeg(vec![1, 2]).into_uploaded_file("thumb.jpg");
        assert_eq!(file.content_type(), JPEG_CONTENT_TYPE);
        assert_eq!(file.len(), 2);
        assert_eq!(file.into_bytes().unwrap(), vec![1, 2]);
    }
}
