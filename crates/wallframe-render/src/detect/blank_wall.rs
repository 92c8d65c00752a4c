// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Blank-wall strategy: the largest run of low-variance blocks.

use image::RgbImage;
use tracing::debug;
use wallframe_core::Corners;

use super::grid::largest_rectangle;
use super::{Candidate, DetectOptions};

const MIN_BLOCK: u32 = 8;
const MAX_BLOCK: u32 = 32;
const BLOCKS_ACROSS: u32 = 40;
const UNIFORM_VARIANCE: f64 = 40.0;
const MIN_BRIGHTNESS: f64 = 70.0;
const MAX_CONFIDENCE: f64 = 0.7;

pub(crate) fn detect(img: &RgbImage, options: &DetectOptions) -> Option<Candidate> {
    let (w, h) = img.dimensions();
    let block = (w.max(h) / BLOCKS_ACROSS).clamp(MIN_BLOCK, MAX_BLOCK);
    let cols = w / block;
    let rows = h / block;
    if cols == 0 || rows == 0 {
        return None;
    }

    let grid: Vec<Vec<bool>> = (0..rows)
        .map(|r| {
            (0..cols)
                .map(|c| max_channel_variance(img, c * block, r * block, block) < UNIFORM_VARIANCE)
                .collect()
        })
        .collect();

    let rect = largest_rectangle(&grid)?;
    let x = (rect.col as u32 * block) as f64;
    let y = (rect.row as u32 * block) as f64;
    let rect_w = (rect.cols as u32 * block) as f64;
    let rect_h = (rect.rows as u32 * block) as f64;

    let brightness = mean_luma(img, x as u32, y as u32, rect_w as u32, rect_h as u32);
    let total_area = w as f64 * h as f64;
    let mut area_pct = rect_w * rect_h / total_area * 100.0;
    debug!(block, blocks = rect.area(), area_pct, brightness, "largest uniform region");

    if brightness < MIN_BRIGHTNESS || area_pct < options.min_area_pct {
        return None;
    }

    let mut corners = Corners::from_rect(x, y, rect_w, rect_h);
    if area_pct > options.max_area_pct {
        // Whole-wall hits are shrunk about their centre to a hanging-sized area.
        let target = options.max_area_pct * 0.5;
        let k = (target / area_pct).sqrt();
        let (cx, cy) = (x + rect_w / 2.0, y + rect_h / 2.0);
        let (new_w, new_h) = (rect_w * k, rect_h * k);
        corners = Corners::from_rect(cx - new_w / 2.0, cy - new_h / 2.0, new_w, new_h);
        area_pct = target;
    }

    let cy = (corners.top_left.y + corners.bottom_left.y) / 2.0 / h as f64;
    let centre_score = (1.0 - 2.0 * (cy - 0.5).abs()).max(0.0);
    let confidence = (0.5 * (area_pct / 30.0).min(1.0) + 0.5 * centre_score).min(MAX_CONFIDENCE);

    Some(Candidate {
        corners,
        confidence,
    })
}

fn max_channel_variance(img: &RgbImage, x0: u32, y0: u32, size: u32) -> f64 {
    let mut sum = [0f64; 3];
    let mut sum_sq = [0f64; 3];
    for y in y0..y0 + size {
        for x in x0..x0 + size {
            let px = img.get_pixel(x, y).0;
            for c in 0..3 {
                let v = px[c] as f64;
                sum[c] += v;
                sum_sq[c] += v * v;
            }
        }
    }
    let n = (size * size) as f64;
    (0..3)
        .map(|c| {
            let mean = sum[c] / n;
            (sum_sq[c] / n - mean * mean).max(0.0)
        })
        .fold(0.0, f64::max)
}

fn mean_luma(img: &RgbImage, x0: u32, y0: u32, w: u32, h: u32) -> f64 {
    let mut total = 0.0;
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            let [r, g, b] = img.get_pixel(x, y).0;
            total += 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
        }
    }
    total / (w as f64 * h as f64).max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// Deterministic noise so only the painted region is uniform.
    fn noisy_room(patch: Rgb<u8>) -> RgbImage {
        let mut state = 0x2545_f491_u32;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state
        };
        let mut img = RgbImage::new(400, 300);
        for (x, y, px) in img.enumerate_pixels_mut() {
            let v = next();
            *px = if (100..300).contains(&x) && (60..220).contains(&y) {
                patch
            } else {
                Rgb([v as u8, (v >> 8) as u8, (v >> 16) as u8])
            };
        }
        img
    }

    #[test]
    fn finds_painted_wall_region() {
        let img = noisy_room(Rgb([200, 195, 185]));
        let found = detect(&img, &DetectOptions::default()).expect("candidate");
        let expected = 200.0 * 160.0;
        let area = found.corners.area();
        assert!((area - expected).abs() / expected < 0.1, "area {area}");
        assert!(found.confidence <= MAX_CONFIDENCE);
        assert!(found.confidence > 0.4);
    }

    #[test]
    fn dark_region_is_rejected() {
        let img = noisy_room(Rgb([30, 28, 25]));
        assert!(detect(&img, &DetectOptions::default()).is_none());
    }

    #[test]
    fn whole_wall_is_shrunk_to_hanging_size() {
        let img = RgbImage::from_pixel(400, 300, Rgb([220, 215, 205]));
        let options = DetectOptions::default();
        let found = detect(&img, &options).expect("candidate");
        let pct = found.corners.area() / (400.0 * 300.0) * 100.0;
        assert!((pct - options.max_area_pct * 0.5).abs() < 0.5, "pct {pct}");
        let (cx, cy) = (
            (found.corners.top_left.x + found.corners.top_right.x) / 2.0,
            (found.corners.top_left.y + found.corners.bottom_left.y) / 2.0,
        );
        assert!((cx - 200.0).abs() < 1.0 && (cy - 150.0).abs() < 1.0);
    }
}
