//! End-to-end conversions through the public `Converter` API with the real
//! `image`-crate backend.
//!
//! Run with: cargo test --test conversions

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use thumbfit::config::parse_config;
use thumbfit::{BoundingBoxSize, ConvertError, Converter, DecodedImage, UploadedFile};

fn encode_as(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, format).unwrap();
    buffer.into_inner()
}

fn rgb(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 200])
    }))
}

fn png(width: u32, height: u32) -> Vec<u8> {
    encode_as(rgb(width, height), ImageFormat::Png)
}

fn dims(image: &DecodedImage) -> (u32, u32) {
    (image.width(), image.height())
}

#[test]
fn base64_round_trip_keeps_dimensions() {
    let converter: Converter = Converter::default();
    let original = STANDARD.encode(png(123, 45));

    let first = converter.decode_from_base64(&original).unwrap();
    let reencoded = converter.encode_to_base64(&first).unwrap();
    let second = converter.decode_from_base64(&reencoded).unwrap();

    assert_eq!(dims(&first), (123, 45));
    assert_eq!(dims(&second), dims(&first));
}

#[test]
fn encode_output_is_jpeg_whatever_the_input() {
    let converter: Converter = Converter::default();
    for format in [ImageFormat::Png, ImageFormat::Bmp, ImageFormat::Tiff] {
        let image = converter
            .decode_from_bytes(&encode_as(rgb(20, 10), format))
            .unwrap();
        let blob = converter.encode(&image).unwrap();
        assert_eq!(blob.content_type(), "image/jpeg");
        assert_eq!(
            image::guess_format(blob.as_bytes()).unwrap(),
            ImageFormat::Jpeg,
            "{format:?}"
        );
    }
}

#[test]
fn transparent_png_encodes_as_jpeg() {
    let converter: Converter = Converter::default();
    let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(30, 30, Rgba([255, 0, 0, 0])));
    let image = converter
        .decode_from_bytes(&encode_as(rgba, ImageFormat::Png))
        .unwrap();
    let text = converter.encode_to_base64(&image).unwrap();
    assert_eq!(dims(&converter.decode_from_base64(&text).unwrap()), (30, 30));
}

#[test]
fn upload_resized_to_each_box() {
    let converter: Converter = Converter::default();
    let bytes = png(1000, 750);

    for (box_size, expected) in [
        (BoundingBoxSize::X32, (32, 24)),
        (BoundingBoxSize::X128, (128, 96)),
        (BoundingBoxSize::X256, (256, 192)),
        (BoundingBoxSize::X800, (800, 600)),
    ] {
        let file = UploadedFile::from_bytes("photo.png", "image/png", bytes.clone());
        let resized = converter.resize(file, box_size).unwrap();
        assert_eq!(dims(&resized), expected, "{box_size}");
    }
}

#[test]
fn portrait_base64_resized_to_base64() {
    let converter: Converter = Converter::default();
    let source = STANDARD.encode(png(300, 400));

    let text = converter
        .resize_to_base64(source.as_str(), BoundingBoxSize::X256)
        .unwrap();
    let thumb = converter.decode_from_base64(&text).unwrap();
    assert_eq!(dims(&thumb), (192, 256));
}

#[test]
fn small_image_is_not_enlarged() {
    let converter: Converter = Converter::default();
    let image = converter.decode_from_bytes(&png(100, 100)).unwrap();
    let resized = converter.resize(&image, BoundingBoxSize::X256).unwrap();
    assert_eq!(dims(&resized), (100, 100));
}

#[test]
fn mislabeled_upload_passes_gate_then_fails_decode() {
    let converter: Converter = Converter::default();
    let file = UploadedFile::from_bytes("notes.png", "image/png", b"just some text".to_vec());
    assert!(converter.is_accepted_image(&file));
    assert!(matches!(
        converter.decode_from_file(file),
        Err(ConvertError::MalformedImageData(_))
    ));
}

#[test]
fn avif_upload_is_decoded_and_resized() {
    let converter: Converter = Converter::default();
    let mut bytes = Vec::new();
    let encoder = image::codecs::avif::AvifEncoder::new_with_speed_quality(&mut bytes, 10, 85);
    rgb(320, 240).write_with_encoder(encoder).unwrap();

    let file = UploadedFile::from_bytes("photo.avif", "image/avif", bytes);
    let blob = converter.resize_to_encoded(file, BoundingBoxSize::X128).unwrap();
    assert_eq!(blob.content_type(), "image/jpeg");
    assert_eq!(dims(&converter.decode_from_bytes(blob.as_bytes()).unwrap()), (128, 96));
}

#[test]
fn svg_is_accepted_but_not_decodable() {
    let converter: Converter = Converter::default();
    let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"/>"#.to_vec();
    let file = UploadedFile::from_bytes("icon.svg", "image/svg+xml", svg);
    assert!(converter.is_accepted_image(&file));
    assert!(matches!(
        converter.resize(file, BoundingBoxSize::X32),
        Err(ConvertError::MalformedImageData(_))
    ));
}

#[test]
fn upload_with_unlisted_type_is_rejected() {
    let converter: Converter = Converter::default();
    let file = UploadedFile::from_bytes("photo.png", "application/octet-stream", png(10, 10));
    assert!(matches!(
        converter.resize_to_base64(file, BoundingBoxSize::X64),
        Err(ConvertError::UnsupportedMediaKind(_))
    ));
}

#[test]
fn base64_to_file_and_back() {
    let converter: Converter = Converter::default();
    let bytes = png(64, 32);
    let text = STANDARD.encode(&bytes);

    let file = converter.base64_to_file_with(&text, "banner", ".png").unwrap();
    assert_eq!(file.file_name(), "banner.png");
    assert_eq!(file.len(), bytes.len() as u64);

    // The file path re-encodes nothing: bytes come back verbatim
    assert_eq!(converter.file_to_base64(file).unwrap(), text);

    let file = converter.base64_to_file(&text).unwrap();
    assert_eq!(dims(&converter.decode_from_file(file).unwrap()), (64, 32));
}

#[test]
fn unknown_box_value_is_invalid_size() {
    assert!(matches!(
        BoundingBoxSize::try_from(100),
        Err(ConvertError::InvalidSize(_))
    ));
    assert!(matches!(
        "x512".parse::<BoundingBoxSize>(),
        Err(ConvertError::InvalidSize(_))
    ));
}

#[test]
fn thumbnail_set_from_upload() {
    let converter = Converter::new(
        parse_config(
            r#"
[encode]
quality = 99

[resize]
filter = "triangle"
boxes = [64, 150]

[processing]
max_processes = 2
"#,
        )
        .unwrap(),
    );
    let file = UploadedFile::from_bytes("wide.png", "IMAGE/PNG", png(600, 200));

    let set = converter.thumbnail_set(file).unwrap();
    let got: Vec<(BoundingBoxSize, (u32, u32))> =
        set.iter().map(|(b, img)| (*b, dims(img))).collect();
    assert_eq!(
        got,
        vec![
            (BoundingBoxSize::X64, (64, 21)),
            (BoundingBoxSize::X150, (150, 50)),
        ]
    );
}

#[test]
fn shared_converter_across_threads() {
    let converter: Converter = Converter::default();
    let image = converter.decode_from_bytes(&png(640, 480)).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = BoundingBoxSize::ALL
            .into_iter()
            .map(|box_size| {
                let converter = &converter;
                let image = &image;
                scope.spawn(move || (box_size, dims(&converter.resize(image, box_size).unwrap())))
            })
            .collect();

        for handle in handles {
            let (box_size, (w, h)) = handle.join().unwrap();
            let side = box_size.side();
            if side >= 640 {
                assert_eq!((w, h), (640, 480));
            } else {
                assert_eq!(w, side);
                assert_eq!(h, side * 3 / 4);
            }
        }
    });
}
