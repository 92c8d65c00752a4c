// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Chroma-key strategy: the bounding box of a pure-green screen painted into
// the room photo.

use image::{Rgb, RgbImage};
use tracing::debug;
use wallframe_core::Corners;

use super::{Candidate, DetectOptions, area_pct_in_range};

const GREEN_MIN: u8 = 100;
const GREEN_RATIO: f32 = 1.4;
const MIN_DENSITY: f64 = 0.7;
const MAX_CONFIDENCE: f64 = 0.95;

/// True for pixels carrying the chroma-key signature.
pub fn is_chroma_green(pixel: &Rgb<u8>) -> bool {
    let [r, g, b] = pixel.0;
    let g_f = g as f32;
    g >= GREEN_MIN && g_f > GREEN_RATIO * r as f32 && g_f > GREEN_RATIO * b as f32
}

pub(crate) fn detect(img: &RgbImage, options: &DetectOptions) -> Option<Candidate> {
    let (w, h) = img.dimensions();
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    let mut count = 0u64;

    for (x, y, pixel) in img.enumerate_pixels() {
        if is_chroma_green(pixel) {
            count += 1;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    if count == 0 {
        return None;
    }

    let box_w = (max_x - min_x + 1) as f64;
    let box_h = (max_y - min_y + 1) as f64;
    let density = count as f64 / (box_w * box_h);
    let area_pct = box_w * box_h / (w as f64 * h as f64) * 100.0;
    debug!(count, density, area_pct, "chroma mask measured");

    if density <= MIN_DENSITY || !area_pct_in_range(area_pct, options) {
        return None;
    }

    Some(Candidate {
        corners: Corners::from_rect(min_x as f64, min_y as f64, box_w, box_h),
        confidence: density.min(MAX_CONFIDENCE),
    })
}
