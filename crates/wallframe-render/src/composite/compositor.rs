// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Artwork-into-room compositing.
//
// The artwork is cover-fitted to the zone, warped onto a slightly enlarged
// copy of the zone quad, laid over the room photo and cleaned of residual
// chroma spill. Platform mockups then resize the composite and add a logo.

use image::{DynamicImage, RgbaImage, imageops};
use tracing::{debug, info, instrument};
use wallframe_core::config::WallframeConfig;
use wallframe_core::error::{Result, WallframeError};
use wallframe_core::platform::{Fit, platform_spec};
use wallframe_core::types::{Corners, Photo, Point, PrintSize, Template};

use super::branding::apply_logo;
use super::spill::remove_spill;
use crate::homography::{Homography, OutputRegion, Sampling, warp};
use crate::image::{ImageProcessor, OutputFormat};

/// Default pixels painted past the zone boundary.
pub const DEFAULT_OVERSHOOT_PX: u32 = 8;

/// Renders mockups. Cheap to share across worker threads.
#[derive(Debug, Clone)]
pub struct Compositor {
    overshoot_px: u32,
    format: OutputFormat,
    logo: Option<RgbaImage>,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(DEFAULT_OVERSHOOT_PX, OutputFormat::Jpeg { quality: 90 })
    }
}

impl Compositor {
    pub fn new(overshoot_px: u32, format: OutputFormat) -> Self {
        Self {
            overshoot_px,
            format,
            logo: None,
        }
    }

    /// Build from configuration, loading the logo when one is configured.
    pub fn from_config(config: &WallframeConfig) -> Result<Self> {
        let mut compositor = Self::new(
            config.overshoot_px,
            OutputFormat::Jpeg {
                quality: config.jpeg_quality,
            },
        );
        if let Some(path) = &config.logo_path {
            compositor.logo = Some(ImageProcessor::open(path)?.into_rgba());
            info!(path = %path.display(), "branding logo loaded");
        }
        Ok(compositor)
    }

    pub fn with_logo(mut self, logo: RgbaImage) -> Self {
        self.logo = Some(logo);
        self
    }

    pub fn with_overshoot(mut self, overshoot_px: u32) -> Self {
        self.overshoot_px = overshoot_px;
        self
    }

    pub fn output_format(&self) -> OutputFormat {
        self.format
    }

    // -- Compositing ----------------------------------------------------------

    /// Composite `artwork` into zone `zone_index` of `room`, returning the
    /// unencoded result.
    ///
    /// `print_size` is carried for logging only; the zone corners decide
    /// the rendered size.
    #[instrument(skip(self, artwork, room, template), fields(template = %template.id))]
    pub fn composite_image(
        &self,
        artwork: &DynamicImage,
        room: &RgbaImage,
        template: &Template,
        print_size: PrintSize,
        zone_index: usize,
    ) -> Result<RgbaImage> {
        let zone = template.zone(zone_index)?;
        zone.validate()?;

        let (zone_w, zone_h) = zone.approx_size();
        let art_w = (zone_w.round() as u32).max(1);
        let art_h = (zone_h.round() as u32).max(1);
        let art = ImageProcessor::from_dynamic(artwork.clone())
            .cover(art_w, art_h)
            .into_rgba();

        let overshoot = self.overshoot_px as f64;
        let quad = expand_quad(&zone.corners, overshoot / zone_w, overshoot / zone_h);
        let src = Corners::from_rect(0.0, 0.0, art_w as f64, art_h as f64);
        let h = Homography::compute(&src.to_array(), &quad.to_array())?;

        let region = clamped_bounds(&quad, room.width(), room.height()).ok_or_else(|| {
            WallframeError::DegenerateGeometry(format!(
                "zone {zone_index} of template {} lies outside the room image",
                template.id
            ))
        })?;
        debug!(?region, %print_size, art_w, art_h, "warping artwork");

        let warped = warp(&art, &h, region, Sampling::Bilinear)?;
        let mut canvas = room.clone();
        imageops::overlay(&mut canvas, &warped, region.x as i64, region.y as i64);

        let cleaned = remove_spill(&mut canvas);
        debug!(cleaned, "spill pixels neutralised");
        Ok(canvas)
    }

    /// Load the photo and the template's room image, composite, and encode.
    #[instrument(skip(self, photo, template), fields(photo = %photo.id, template = %template.id))]
    pub fn generate_composite(
        &self,
        photo: &Photo,
        template: &Template,
        print_size: PrintSize,
        zone_index: usize,
    ) -> Result<Vec<u8>> {
        let artwork = ImageProcessor::open(&photo.path)?.into_dynamic();
        let room = load_room(template)?;
        let composite = self.composite_image(&artwork, &room, template, print_size, zone_index)?;
        ImageProcessor::from_rgba(composite).encode(self.format)
    }

    // -- Platform output ------------------------------------------------------

    /// Size a finished composite for `platform` and add the logo unless
    /// `skip_branding` is set or no logo is loaded.
    pub fn render_platform(
        &self,
        composite: RgbaImage,
        platform: &str,
        skip_branding: bool,
    ) -> Result<RgbaImage> {
        let spec = platform_spec(platform)?;
        let processor = ImageProcessor::from_rgba(composite);
        let sized = match spec.fit {
            Fit::Cover => processor.cover(spec.width, spec.height.unwrap_or(spec.width)),
            Fit::Inside => processor.fit_width(spec.width),
        };
        let mut canvas = sized.into_rgba();

        match (&self.logo, skip_branding) {
            (Some(logo), false) => apply_logo(&mut canvas, logo, &spec.branding),
            _ => debug!(platform = spec.name, "branding skipped"),
        }
        Ok(canvas)
    }

    /// `generate_composite` followed by platform sizing and branding.
    #[instrument(skip(self, photo, template), fields(photo = %photo.id, template = %template.id))]
    pub fn generate_platform_mockup(
        &self,
        photo: &Photo,
        template: &Template,
        print_size: PrintSize,
        zone_index: usize,
        platform: &str,
        skip_branding: bool,
    ) -> Result<Vec<u8>> {
        // Fail on an unknown platform before any image work.
        platform_spec(platform)?;
        let artwork = ImageProcessor::open(&photo.path)?.into_dynamic();
        let room = load_room(template)?;
        let composite = self.composite_image(&artwork, &room, template, print_size, zone_index)?;
        let output = self.render_platform(composite, platform, skip_branding)?;
        ImageProcessor::from_rgba(output).encode(self.format)
    }
}

/// Decode a template's room photo.
pub fn load_room(template: &Template) -> Result<RgbaImage> {
    Ok(ImageProcessor::open(&template.image_path)?.into_rgba())
}

/// Bilinear interpolation over the zone quad, evaluated outside the unit
/// square by `ox` / `oy` on every side.
fn expand_quad(corners: &Corners, ox: f64, oy: f64) -> Corners {
    let at = |u: f64, v: f64| {
        let Corners {
            top_left: a,
            top_right: b,
            bottom_right: c,
            bottom_left: d,
        } = *corners;
        Point::new(
            (1.0 - u) * (1.0 - v) * a.x + u * (1.0 - v) * b.x + u * v * c.x + (1.0 - u) * v * d.x,
            (1.0 - u) * (1.0 - v) * a.y + u * (1.0 - v) * b.y + u * v * c.y + (1.0 - u) * v * d.y,
        )
    };
    Corners {
        top_left: at(-ox, -oy),
        top_right: at(1.0 + ox, -oy),
        bottom_right: at(1.0 + ox, 1.0 + oy),
        bottom_left: at(-ox, 1.0 + oy),
    }
}

/// Integer bounding box of `quad` clipped to a `width x height` image, or
/// `None` when nothing remains.
fn clamped_bounds(quad: &Corners, width: u32, height: u32) -> Option<OutputRegion> {
    let pts = quad.to_array();
    let min_x = pts.iter().map(|p| p.x).fold(f64::INFINITY, f64::min).floor().max(0.0);
    let min_y = pts.iter().map(|p| p.y).fold(f64::INFINITY, f64::min).floor().max(0.0);
    let max_x = pts
        .iter()
        .map(|p| p.x)
        .fold(f64::NEG_INFINITY, f64::max)
        .ceil()
        .min(width as f64);
    let max_y = pts
        .iter()
        .map(|p| p.y)
        .fold(f64::NEG_INFINITY, f64::max)
        .ceil()
        .min(height as f64);
    if max_x <= min_x || max_y <= min_y {
        return None;
    }
    Some(OutputRegion {
        x: min_x as u32,
        y: min_y as u32,
        width: (max_x - min_x) as u32,
        height: (max_y - min_y) as u32,
    })
}
