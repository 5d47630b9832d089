//! Student photo loading and JPEG size-fitting.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageEncoder, ImageReader};
use tracing::info;

use crate::error::{Result, RosterError};

pub const DEFAULT_QUALITY: u8 = 85;
const QUALITY_STEP: u8 = 10;
const QUALITY_FLOOR: u8 = 20;
const RESIZE_FACTOR: f64 = 0.8;
/// Display bounds are capped at this multiple of the native size.
const MAX_DISPLAY_UPSCALE: u32 = 4;

#[derive(Debug, Clone)]
pub struct FittedPhoto {
    pub bytes: Vec<u8>,
    /// Quality of the returned encoding.
    pub quality: u8,
    pub width: u32,
    pub height: u32,
    pub resized: bool,
}

impl FittedPhoto {
    pub fn size_kb(&self) -> usize {
        self.bytes.len() / 1024
    }
}

/// PNG rendering of a photo together with its pixel size.
#[derive(Debug, Clone)]
pub struct DisplayImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct PhotoProcessor {
    image: DynamicImage,
}

impl PhotoProcessor {
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| RosterError::io(path, e))?;
        let processor = Self::from_bytes(&bytes)?;
        info!(
            path = %path.display(),
            width = processor.image.width(),
            height = processor.image.height(),
            "photo loaded"
        );
        Ok(processor)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(RosterError::EmptyImage);
        }
        let mut decoder = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| RosterError::Image(e.into()))?
            .into_decoder()?;
        let orientation = decoder.orientation()?;
        let mut image = DynamicImage::from_decoder(decoder)?;
        image.apply_orientation(orientation);
        Ok(Self { image })
    }

    pub fn from_image(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn encode(&self, quality: u8) -> Result<Vec<u8>> {
        encode_jpeg(&self.image, quality)
    }

    /// Brings the JPEG encoding under `target_kb` kilobytes.
    ///
    /// Quality drops by 10 from `quality` while the result is too large and
    /// quality is still above 20. If that is not enough the image is scaled
    /// to 80% once and re-encoded at `quality`; that result is returned even
    /// if it is still over budget.
    pub fn fit_to_size(&self, target_kb: usize, quality: u8) -> Result<FittedPhoto> {
        let mut current = quality.min(100);
        let mut bytes = self.encode(current)?;
        if bytes.len() / 1024 <= target_kb {
            info!(size_kb = bytes.len() / 1024, target_kb, "photo size ok");
            return Ok(self.fitted(bytes, current, false));
        }

        while bytes.len() / 1024 > target_kb && current > QUALITY_FLOOR {
            current = current.saturating_sub(QUALITY_STEP);
            bytes = self.encode(current)?;
            info!(quality = current, size_kb = bytes.len() / 1024, "trying lower quality");
        }

        if bytes.len() / 1024 <= target_kb {
            return Ok(self.fitted(bytes, current, false));
        }

        let width = scale_dim(self.image.width());
        let height = scale_dim(self.image.height());
        let resized = self.image.resize_exact(width, height, FilterType::Triangle);
        let bytes = encode_jpeg(&resized, quality)?;
        info!(width, height, size_kb = bytes.len() / 1024, target_kb, "photo resized");
        Ok(FittedPhoto {
            bytes,
            quality: quality.min(100),
            width,
            height,
            resized: true,
        })
    }

    /// Aspect-preserving scale for display. With one bound the other is
    /// derived from the native aspect ratio; with none the image is returned
    /// at native size. Bounds above four times the native size are clamped.
    pub fn scaled_to_fit(&self, max_width: Option<u32>, max_height: Option<u32>) -> DynamicImage {
        let (w, h) = (self.image.width().max(1), self.image.height().max(1));
        let bound = |v: Option<u32>, native: u32| {
            v.filter(|v| *v > 0)
                .map(|v| v.min(native.saturating_mul(MAX_DISPLAY_UPSCALE)))
        };
        let (bw, bh) = match (bound(max_width, w), bound(max_height, h)) {
            (None, None) => return self.image.clone(),
            (Some(bw), Some(bh)) => (bw, bh),
            (Some(bw), None) => (bw, proportional(h, bw, w)),
            (None, Some(bh)) => (proportional(w, bh, h), bh),
        };
        self.image.resize(bw, bh, FilterType::Lanczos3)
    }

    pub fn display_png(
        &self,
        max_width: Option<u32>,
        max_height: Option<u32>,
    ) -> Result<DisplayImage> {
        let scaled = self.scaled_to_fit(max_width, max_height).to_rgba8();
        let mut png = Vec::new();
        PngEncoder::new(&mut png).write_image(
            scaled.as_raw(),
            scaled.width(),
            scaled.height(),
            ExtendedColorType::Rgba8,
        )?;
        Ok(DisplayImage {
            png,
            width: scaled.width(),
            height: scaled.height(),
        })
    }

    fn fitted(&self, bytes: Vec<u8>, quality: u8, resized: bool) -> FittedPhoto {
        FittedPhoto {
            bytes,
            quality,
            width: self.image.width(),
            height: self.image.height(),
            resized,
        }
    }
}

/// Loads `data` and fits it under `target_kb` at the default quality.
pub fn normalize_bytes(data: &[u8], target_kb: usize) -> Result<FittedPhoto> {
    PhotoProcessor::from_bytes(data)?.fit_to_size(target_kb, DEFAULT_QUALITY)
}

pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    // JPEG has no alpha channel.
    let rgb = image.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100)).write_image(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(out)
}

/// `side * bound / other`, at least 1.
fn proportional(side: u32, bound: u32, other: u32) -> u32 {
    let v = u64::from(side) * u64::from(bound) / u64::from(other.max(1));
    u32::try_from(v).unwrap_or(u32::MAX).max(1)
}

fn scale_dim(v: u32) -> u32 {
    ((v as f64 * RESIZE_FACTOR) as u32).max(1)
}
