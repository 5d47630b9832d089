use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rosterd::photo::{encode_jpeg, normalize_bytes, PhotoProcessor, DEFAULT_QUALITY};
use std::io::Cursor;

/// Random noise barely compresses, so quality changes move the size a lot.
fn noise(w: u32, h: u32) -> DynamicImage {
    let mut rng = StdRng::seed_from_u64(42);
    DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |_, _| {
        Rgb([rng.gen(), rng.gen(), rng.gen()])
    }))
}

fn png_bytes(img: &DynamicImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).expect("encode png");
    out.into_inner()
}

#[test]
fn small_photo_returned_at_start_quality() {
    let img = noise(32, 32);
    let p = PhotoProcessor::from_image(img.clone());
    let fitted = p.fit_to_size(300, DEFAULT_QUALITY).unwrap();

    assert!(!fitted.resized);
    assert_eq!(fitted.quality, DEFAULT_QUALITY);
    assert_eq!(fitted.bytes, encode_jpeg(&img, DEFAULT_QUALITY).unwrap());
    assert_eq!((fitted.width, fitted.height), (32, 32));
}

#[test]
fn quality_reduction_alone_meets_budget() {
    let img = noise(512, 512);
    let p = PhotoProcessor::from_image(img.clone());
    let at_start = encode_jpeg(&img, DEFAULT_QUALITY).unwrap().len() / 1024;
    let at_floor = encode_jpeg(&img, 15).unwrap().len() / 1024;
    assert!(at_floor < at_start, "noise should shrink with quality");

    let fitted = p.fit_to_size(at_floor, DEFAULT_QUALITY).unwrap();
    assert!(!fitted.resized);
    assert!(fitted.size_kb() <= at_floor);
    assert!(fitted.size_kb() <= at_start);
    assert!(fitted.quality < DEFAULT_QUALITY);
    assert_eq!((fitted.width, fitted.height), (512, 512));
}

#[test]
fn impossible_budget_resizes_once_and_stops() {
    let img = noise(512, 256);
    let p = PhotoProcessor::from_image(img);
    let fitted = p.fit_to_size(0, DEFAULT_QUALITY).unwrap();

    assert!(fitted.resized);
    assert_eq!(fitted.quality, DEFAULT_QUALITY);
    assert_eq!((fitted.width, fitted.height), (409, 204));
    assert!(fitted.size_kb() > 0);

    let decoded = PhotoProcessor::from_bytes(&fitted.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (409, 204));
}

#[test]
fn normalizes_png_input_to_jpeg() {
    let png = png_bytes(&noise(64, 48));
    let fitted = normalize_bytes(&png, 300).unwrap();
    assert_eq!(&fitted.bytes[..2], &[0xFF, 0xD8]);
    assert_eq!((fitted.width, fitted.height), (64, 48));
}

#[test]
fn loads_from_file_without_touching_it() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("face.png");
    let png = png_bytes(&noise(20, 10));
    std::fs::write(&path, &png).unwrap();

    let p = PhotoProcessor::from_path(&path).unwrap();
    assert_eq!((p.width(), p.height()), (20, 10));
    let _ = p.fit_to_size(1, DEFAULT_QUALITY).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), png);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = PhotoProcessor::from_path(&dir.path().join("nope.jpg")).unwrap_err();
    assert_eq!(err.code(), "io_error");
}
