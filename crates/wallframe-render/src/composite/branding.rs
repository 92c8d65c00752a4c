// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Logo overlay for platform mockups.

use image::RgbaImage;
use image::imageops::{self, FilterType};
use tracing::debug;
use wallframe_core::platform::{Branding, LogoPosition};

use crate::image::apply_opacity;

/// Overlay `logo` onto `canvas` in the configured corner. The logo is scaled
/// to `branding.scale` of the canvas width and its alpha multiplied by
/// `branding.opacity`.
pub fn apply_logo(canvas: &mut RgbaImage, logo: &RgbaImage, branding: &Branding) {
    if logo.width() == 0 || logo.height() == 0 {
        return;
    }
    let (cw, ch) = canvas.dimensions();
    let target_w = ((cw as f32 * branding.scale).round() as u32).clamp(1, cw.max(1));
    let target_h =
        ((logo.height() as f32 * target_w as f32 / logo.width() as f32).round() as u32).max(1);
    let scaled = imageops::resize(logo, target_w, target_h, FilterType::Lanczos3);
    let faded = apply_opacity(&scaled, branding.opacity);

    let pad = branding.padding as i64;
    let right = cw as i64 - target_w as i64 - pad;
    let bottom = ch as i64 - target_h as i64 - pad;
    let (x, y) = match branding.position {
        LogoPosition::TopLeft => (pad, pad),
        LogoPosition::TopRight => (right, pad),
        LogoPosition::BottomLeft => (pad, bottom),
        LogoPosition::BottomRight => (right, bottom),
    };
    debug!(x, y, target_w, target_h, position = ?branding.position, "placing logo");
    imageops::overlay(canvas, &faded, x, y);
}
