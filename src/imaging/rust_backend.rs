//! Pure Rust codec backend on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, BMP, TIFF, WebP) | `image::load_from_memory` (format sniffed from bytes) |
//! | Decode (AVIF) | `avif-parse` (container) + `rav1d` (AV1 decode) + BT.601 YUV→RGB |
//! | Resample | `DynamicImage::resize_exact` with the configured [`ResizeFilter`] |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the configured quality |
//!
//! AVIF is recognised by its `ftyp` brand, since the `image` crate's `"avif"`
//! feature only brings the encoder. SVG is on the upload allow-list but has no
//! decoder; SVG bytes fail here with [`ConvertError::MalformedImageData`].

use super::backend::{ConvertError, DecodedImage, ImageBackend};
use super::params::{Quality, ResizeFilter, ResizeParams};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};

/// Codec backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn filter_type(filter: ResizeFilter) -> FilterType {
    match filter {
        ResizeFilter::Nearest => FilterType::Nearest,
        ResizeFilter::Triangle => FilterType::Triangle,
        ResizeFilter::CatmullRom => FilterType::CatmullRom,
        ResizeFilter::Gaussian => FilterType::Gaussian,
        ResizeFilter::Lanczos3 => FilterType::Lanczos3,
    }
}

/// Brands that mark an ISO-BMFF file as AVIF (still image or sequence).
const AVIF_BRANDS: [&[u8; 4]; 2] = [b"avif", b"avis"];

/// True when `bytes` open with an `ftyp` box naming an AVIF brand, either as
/// the major brand or among the compatible ones.
fn is_avif(bytes: &[u8]) -> bool {
    if bytes.len() < 16 || &bytes[4..8] != b"ftyp" {
        return false;
    }
    let box_len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let end = box_len.clamp(16, bytes.len());
    let major = &bytes[8..12];
    // Bytes 12..16 hold the minor version
    std::iter::once(major)
        .chain(bytes[16..end].chunks_exact(4))
        .any(|brand| AVIF_BRANDS.iter().any(|b| brand == &b[..]))
}

/// Decode AVIF bytes with avif-parse (container) and rav1d (AV1 decode).
fn decode_avif(bytes: &[u8]) -> Result<DynamicImage, ConvertError> {
    use rav1d::include::dav1d::data::Dav1dData;
    use rav1d::include::dav1d::dav1d::Dav1dSettings;
    use rav1d::include::dav1d::picture::Dav1dPicture;
    use std::ptr::NonNull;

    let avif = avif_parse::read_avif(&mut std::io::Cursor::new(bytes))
        .map_err(|e| ConvertError::MalformedImageData(format!("Failed to parse AVIF: {e:?}")))?;
    let av1_bytes: &[u8] = &avif.primary_item;

    let mut settings = std::mem::MaybeUninit::<Dav1dSettings>::uninit();
    unsafe {
        rav1d::src::lib::dav1d_default_settings(NonNull::from(&mut settings).cast::<Dav1dSettings>())
    };
    let mut settings = unsafe { settings.assume_init() };
    settings.n_threads = 1;
    settings.max_frame_delay = 1;

    let mut ctx = None;
    let rc =
        unsafe { rav1d::src::lib::dav1d_open(NonNull::new(&mut ctx), NonNull::new(&mut settings)) };
    if rc.0 != 0 {
        return Err(ConvertError::ProcessingFailed(format!(
            "rav1d open failed ({})",
            rc.0
        )));
    }

    let mut data = Dav1dData::default();
    let buf_ptr =
        unsafe { rav1d::src::lib::dav1d_data_create(NonNull::new(&mut data), av1_bytes.len()) };
    if buf_ptr.is_null() {
        unsafe { rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx)) };
        return Err(ConvertError::ProcessingFailed(
            "rav1d data_create failed".into(),
        ));
    }
    unsafe { std::ptr::copy_nonoverlapping(av1_bytes.as_ptr(), buf_ptr, av1_bytes.len()) };

    let rc = unsafe { rav1d::src::lib::dav1d_send_data(ctx, NonNull::new(&mut data)) };
    if rc.0 != 0 {
        unsafe {
            rav1d::src::lib::dav1d_data_unref(NonNull::new(&mut data));
            rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx));
        }
        return Err(ConvertError::MalformedImageData(format!(
            "rav1d send_data failed ({})",
            rc.0
        )));
    }

    let mut pic: Dav1dPicture = unsafe { std::mem::zeroed() };
    let rc = unsafe { rav1d::src::lib::dav1d_get_picture(ctx, NonNull::new(&mut pic)) };
    if rc.0 != 0 {
        unsafe { rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx)) };
        return Err(ConvertError::MalformedImageData(format!(
            "rav1d get_picture failed ({})",
            rc.0
        )));
    }

    let width = pic.p.w as u32;
    let height = pic.p.h as u32;
    let rgb = picture_to_rgb(&pic, width, height);

    // Release the picture and decoder on every path before looking at the result
    unsafe {
        rav1d::src::lib::dav1d_picture_unref(NonNull::new(&mut pic));
        rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx));
    }

    image::RgbImage::from_raw(width, height, rgb?)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| {
            ConvertError::ProcessingFailed("decoded AVIF planes do not fill the image".into())
        })
}

/// Interleave a decoded picture's YUV planes into RGB8.
fn picture_to_rgb(
    pic: &rav1d::include::dav1d::picture::Dav1dPicture,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, ConvertError> {
    use rav1d::include::dav1d::headers::{
        DAV1D_PIXEL_LAYOUT_I400, DAV1D_PIXEL_LAYOUT_I420, DAV1D_PIXEL_LAYOUT_I422,
        DAV1D_PIXEL_LAYOUT_I444,
    };

    let missing = |plane: &str| {
        ConvertError::MalformedImageData(format!("AVIF picture has no {plane} plane"))
    };
    let bpc = pic.p.bpc as u32;
    let layout = pic.p.layout;
    let y_ptr = pic.data[0].ok_or_else(|| missing("luma"))?.as_ptr() as *const u8;

    let planes = if layout == DAV1D_PIXEL_LAYOUT_I400 {
        YuvPlanes {
            y_ptr,
            u_ptr: y_ptr,
            v_ptr: y_ptr,
            y_stride: pic.stride[0],
            uv_stride: 0,
            width,
            height,
            bpc,
            ss_x: false,
            ss_y: false,
            monochrome: true,
        }
    } else {
        let (ss_x, ss_y) = match layout {
            DAV1D_PIXEL_LAYOUT_I420 => (true, true),
            DAV1D_PIXEL_LAYOUT_I422 => (true, false),
            DAV1D_PIXEL_LAYOUT_I444 => (false, false),
            _ => {
                return Err(ConvertError::MalformedImageData(format!(
                    "Unsupported AVIF pixel layout: {layout}"
                )));
            }
        };
        YuvPlanes {
            y_ptr,
            u_ptr: pic.data[1].ok_or_else(|| missing("Cb"))?.as_ptr() as *const u8,
            v_ptr: pic.data[2].ok_or_else(|| missing("Cr"))?.as_ptr() as *const u8,
            y_stride: pic.stride[0],
            uv_stride: pic.stride[1],
            width,
            height,
            bpc,
            ss_x,
            ss_y,
            monochrome: false,
        }
    };
    Ok(planes.to_rgb())
}

/// Borrowed YUV planes of a rav1d picture.
struct YuvPlanes {
    y_ptr: *const u8,
    u_ptr: *const u8,
    v_ptr: *const u8,
    y_stride: isize,
    uv_stride: isize,
    width: u32,
    height: u32,
    bpc: u32,
    /// Chroma subsampling per axis (I420 = true, true)
    ss_x: bool,
    ss_y: bool,
    monochrome: bool,
}

impl YuvPlanes {
    /// BT.601 YCbCr to interleaved RGB8, scaled down from `bpc` bits.
    fn to_rgb(&self) -> Vec<u8> {
        let max_val = ((1u32 << self.bpc) - 1) as f32;
        let center = (1u32 << (self.bpc - 1)) as f32;
        let scale = 255.0 / max_val;

        let mut rgb = Vec::with_capacity((self.width * self.height * 3) as usize);
        for row in 0..self.height {
            for col in 0..self.width {
                let y = read_sample(self.y_ptr, self.y_stride, col, row, self.bpc);
                let pixel = if self.monochrome {
                    let v = (y * scale).clamp(0.0, 255.0);
                    [v, v, v]
                } else {
                    let c_col = if self.ss_x { col / 2 } else { col };
                    let c_row = if self.ss_y { row / 2 } else { row };
                    let cb = read_sample(self.u_ptr, self.uv_stride, c_col, c_row, self.bpc) - center;
                    let cr = read_sample(self.v_ptr, self.uv_stride, c_col, c_row, self.bpc) - center;
                    [
                        ((y + 1.402 * cr) * scale).clamp(0.0, 255.0),
                        ((y - 0.344136 * cb - 0.714136 * cr) * scale).clamp(0.0, 255.0),
                        ((y + 1.772 * cb) * scale).clamp(0.0, 255.0),
                    ]
                };
                rgb.extend(pixel.map(|c| c as u8));
            }
        }
        rgb
    }
}

/// One sample from a plane; depths above 8 bits are stored as u16.
#[inline]
fn read_sample(ptr: *const u8, stride: isize, x: u32, y: u32, bpc: u32) -> f32 {
    if bpc <= 8 {
        (unsafe { *ptr.offset(y as isize * stride + x as isize) }) as f32
    } else {
        let byte_offset = y as isize * stride + x as isize * 2;
        (unsafe { (ptr.offset(byte_offset) as *const u16).read_unaligned() }) as f32
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, ConvertError> {
        if is_avif(bytes) {
            return decode_avif(bytes).map(DecodedImage::new);
        }
        image::load_from_memory(bytes)
            .map(DecodedImage::new)
            .map_err(|e| ConvertError::MalformedImageData(format!("Failed to decode: {e}")))
    }

    fn encode_jpeg(&self, image: &DecodedImage, quality: Quality) -> Result<Vec<u8>, ConvertError> {
        // JPEG has no alpha channel; flatten everything to RGB8 first
        let rgb = image.as_dynamic().to_rgb8();
        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, quality.value().max(1))
            .write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| ConvertError::ProcessingFailed(format!("JPEG encode failed: {e}")))?;
        Ok(buffer)
    }

    fn resample(
        &self,
        image: &DecodedImage,
        params: &ResizeParams,
    ) -> Result<DecodedImage, ConvertError> {
        if params.width == 0 || params.height == 0 {
            return Err(ConvertError::ProcessingFailed(format!(
                "Cannot resample to {}x{}",
                params.width, params.height
            )));
        }
        let resized =
            image
                .as_dynamic()
                .resize_exact(params.width, params.height, filter_type(params.filter));
        Ok(DecodedImage::new(resized))
    }
}
