//! The public operation surface, bound to one backend and one config.
//!
//! [`Converter`] is what an HTTP handler holds on to: it carries the
//! deployment's quality, filter and file-naming defaults so call sites only
//! pass the image and the box. It keeps no per-call state, so one instance can
//! be shared across threads.

use crate::config::{ConverterConfig, effective_threads};
use crate::imaging::bridge::{self, Result};
use crate::imaging::operations;
use crate::imaging::{
    BoundingBoxSize, DecodedImage, ImageBackend, ImageSource, Quality, RustBackend,
};
use crate::upload::{DeclaredMedia, EncodedBlob, UploadedFile, is_accepted_image};
use rayon::ThreadPool;
use tracing::{debug, warn};

pub struct Converter<B: ImageBackend = RustBackend> {
    backend: B,
    config: ConverterConfig,
    /// Dedicated workers for `resize_all`, built once when `max_processes` is set.
    pool: Option<ThreadPool>,
}

impl Converter<RustBackend> {
    pub fn new(config: ConverterConfig) -> Self {
        Self::with_backend(RustBackend::new(), config)
    }
}

impl Default for Converter<RustBackend> {
    fn default() -> Self {
        Self::new(ConverterConfig::default())
    }
}

impl<B: ImageBackend> Converter<B> {
    pub fn with_backend(backend: B, config: ConverterConfig) -> Self {
        let pool = build_pool(&config);
        Self {
            backend,
            config,
            pool,
        }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn quality(&self) -> Quality {
        Quality::new(self.config.encode.quality)
    }

    /// Declared-type gate: non-empty and allow-listed.
    pub fn is_accepted_image<M: DeclaredMedia + ?Sized>(&self, media: &M) -> bool {
        is_accepted_image(media)
    }

    pub fn decode_from_file(&self, file: UploadedFile) -> Result<DecodedImage> {
        bridge::decode_from_file(&self.backend, file)
    }

    pub fn decode_from_base64(&self, base64: &str) -> Result<DecodedImage> {
        bridge::decode_from_base64(&self.backend, base64)
    }

    pub fn decode_from_bytes(&self, bytes: &[u8]) -> Result<DecodedImage> {
        bridge::decode_from_bytes(&self.backend, bytes)
    }

    pub fn encode(&self, image: &DecodedImage) -> Result<EncodedBlob> {
        bridge::encode(&self.backend, image, self.quality())
    }

    pub fn encode_to_base64(&self, image: &DecodedImage) -> Result<String> {
        bridge::encode_to_base64(&self.backend, image, self.quality())
    }

    pub fn file_to_base64(&self, file: UploadedFile) -> Result<String> {
        bridge::file_to_base64(file)
    }

    /// Wrap base64 text as a file using the configured default name and extension.
    pub fn base64_to_file(&self, base64: &str) -> Result<UploadedFile> {
        let files = &self.config.files;
        bridge::base64_to_file(base64, &files.default_name, &files.default_extension)
    }

    pub fn base64_to_file_with(
        &self,
        base64: &str,
        name: &str,
        extension: &str,
    ) -> Result<UploadedFile> {
        bridge::base64_to_file(base64, name, extension)
    }

    pub fn resize<'a>(
        &self,
        source: impl Into<ImageSource<'a>>,
        box_size: BoundingBoxSize,
    ) -> Result<DecodedImage> {
        operations::resize_source(
            &self.backend,
            source.into(),
            box_size,
            &self.config.resize_config(),
        )
    }

    pub fn resize_to_encoded<'a>(
        &self,
        source: impl Into<ImageSource<'a>>,
        box_size: BoundingBoxSize,
    ) -> Result<EncodedBlob> {
        operations::resize_to_encoded(
            &self.backend,
            source.into(),
            box_size,
            &self.config.resize_config(),
        )
    }

    pub fn resize_to_base64<'a>(
        &self,
        source: impl Into<ImageSource<'a>>,
        box_size: BoundingBoxSize,
    ) -> Result<String> {
        operations::resize_to_base64(
            &self.backend,
            source.into(),
            box_size,
            &self.config.resize_config(),
        )
    }

    /// Fit one image into each of `boxes` in parallel.
    ///
    /// Runs on the converter's own pool when `processing.max_processes` is
    /// set, otherwise on rayon's global pool.
    pub fn resize_all(
        &self,
        image: &DecodedImage,
        boxes: &[BoundingBoxSize],
    ) -> Result<Vec<(BoundingBoxSize, DecodedImage)>> {
        let resize_config = self.config.resize_config();
        match &self.pool {
            Some(pool) => pool
                .install(|| operations::resize_all(&self.backend, image, boxes, &resize_config)),
            None => operations::resize_all(&self.backend, image, boxes, &resize_config),
        }
    }

    /// Decode once, then produce every configured box.
    pub fn thumbnail_set<'a>(
        &self,
        source: impl Into<ImageSource<'a>>,
    ) -> Result<Vec<(BoundingBoxSize, DecodedImage)>> {
        let image = bridge::decode(&self.backend, source.into())?;
        self.resize_all(&image, &self.config.resize.boxes)
    }
}

/// Build the `resize_all` worker pool if the config caps the worker count.
///
/// If the OS refuses the threads the converter falls back to the global pool.
fn build_pool(config: &ConverterConfig) -> Option<ThreadPool> {
    config.processing.max_processes?;
    let threads = effective_threads(&config.processing);
    debug!(threads, "building resize worker pool");
    match rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("thumbfit-resize-{i}"))
        .build()
    {
        Ok(pool) => Some(pool),
        Err(e) => {
            warn!(threads, error = %e, "resize worker pool unavailable, using global pool");
            None
        }
    }
}
