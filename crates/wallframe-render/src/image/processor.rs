// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: decode, cover/contain resizing, opacity, and encoding.
// Operates on in-memory images using the `image` crate.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::{debug, instrument};
use wallframe_core::error::{Result, WallframeError};

/// Output encoding for rendered mockups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg { quality: u8 },
    Png,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "jpg",
            Self::Png => "png",
        }
    }
}

/// Image pipeline operating on a single in-memory image.
///
/// Each method consumes `self` and returns a new `ImageProcessor`, enabling
/// method chaining:
///
/// ```ignore
/// let bytes = ImageProcessor::open("art.jpg")?
///     .cover(1200, 800)
///     .encode(OutputFormat::Jpeg { quality: 90 })?;
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path. A path that does not exist is
    /// `SourceImageMissing`; a file that fails to decode is `ImageError`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(WallframeError::SourceImageMissing(path.to_path_buf()));
        }
        let img = image::open(path).map_err(|err| {
            WallframeError::ImageError(format!("failed to open {}: {}", path.display(), err))
        })?;
        debug!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)
            .map_err(|err| WallframeError::ImageError(format!("failed to decode image: {}", err)))?;
        Ok(Self { image: img })
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn from_rgba(image: RgbaImage) -> Self {
        Self {
            image: DynamicImage::ImageRgba8(image),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.image.into_rgba8()
    }

    // -- Transformations ------------------------------------------------------

    /// Resize to exactly `width` x `height`, scaling to cover the box and
    /// cropping the overflow centrally. Never letterboxes.
    #[instrument(skip(self), fields(from_w = self.image.width(), from_h = self.image.height()))]
    pub fn cover(self, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        if self.image.width() == width && self.image.height() == height {
            return self;
        }
        let resized = self.image.resize_to_fill(width, height, FilterType::Lanczos3);
        debug!(new_w = resized.width(), new_h = resized.height(), "Cover resize complete");
        Self { image: resized }
    }

    /// Shrink to at most `max_width` wide, preserving aspect ratio. Images
    /// already narrow enough are returned unchanged (no upscaling).
    #[instrument(skip(self), fields(from_w = self.image.width(), from_h = self.image.height()))]
    pub fn fit_width(self, max_width: u32) -> Self {
        if self.image.width() <= max_width || max_width == 0 {
            return self;
        }
        let scale = max_width as f64 / self.image.width() as f64;
        let new_h = ((self.image.height() as f64 * scale).round() as u32).max(1);
        let resized = self
            .image
            .resize_exact(max_width, new_h, FilterType::Lanczos3);
        debug!(new_w = resized.width(), new_h = resized.height(), "Fit resize complete");
        Self { image: resized }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode in the requested format.
    pub fn encode(&self, format: OutputFormat) -> Result<Vec<u8>> {
        match format {
            OutputFormat::Jpeg { quality } => self.to_jpeg_bytes(quality),
            OutputFormat::Png => self.to_png_bytes(),
        }
    }

    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| WallframeError::ImageError(format!("PNG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// JPEG has no alpha channel; the image is flattened to RGB first.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder)
            .map_err(|err| WallframeError::ImageError(format!("JPEG encoding failed: {}", err)))?;
        Ok(buffer)
    }
}

/// Scale every pixel's alpha by `opacity` (clamped to `[0, 1]`).
///
/// `opacity = 1.0` returns an identical buffer.
pub fn apply_opacity(buffer: &RgbaImage, opacity: f32) -> RgbaImage {
    let opacity = opacity.clamp(0.0, 1.0);
    let mut out = buffer.clone();
    for pixel in out.pixels_mut() {
        pixel.0[3] = (pixel.0[3] as f32 * opacity).round() as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, 90, 255]))
    }

    #[test]
    fn cover_fills_exact_box() {
        let out = ImageProcessor::from_rgba(gradient(300, 100)).cover(120, 120);
        assert_eq!((out.width(), out.height()), (120, 120));
    }

    #[test]
    fn fit_width_never_upscales() {
        let small = ImageProcessor::from_rgba(gradient(400, 200)).fit_width(1600);
        assert_eq!((small.width(), small.height()), (400, 200));

        let large = ImageProcessor::from_rgba(gradient(3200, 1600)).fit_width(1600);
        assert_eq!((large.width(), large.height()), (1600, 800));
    }

    #[test]
    fn opacity_one_is_identity() {
        let img = gradient(16, 16);
        assert_eq!(apply_opacity(&img, 1.0), img);
    }

    #[test]
    fn opacity_scales_alpha_only() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 200]));
        let half = apply_opacity(&img, 0.5);
        assert_eq!(*half.get_pixel(0, 0), Rgba([10, 20, 30, 100]));
        let clear = apply_opacity(&img, -3.0);
        assert_eq!(clear.get_pixel(1, 1).0[3], 0);
    }

    #[test]
    fn encode_round_trips_dimensions() {
        let processor = ImageProcessor::from_rgba(gradient(40, 30));
        for format in [OutputFormat::Jpeg { quality: 85 }, OutputFormat::Png] {
            let bytes = processor.encode(format).expect("encode");
            let decoded = ImageProcessor::from_bytes(&bytes).expect("decode");
            assert_eq!((decoded.width(), decoded.height()), (40, 30));
        }
    }

    #[test]
    fn open_missing_file_is_source_missing() {
        let err = ImageProcessor::open("/no/such/room.jpg").err().expect("error");
        assert!(matches!(err, WallframeError::SourceImageMissing(_)));
    }
}
