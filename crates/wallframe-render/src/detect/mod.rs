// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Placement-zone detection for room photos.
//
// The room image is downsampled to a fixed analysis width, then the chroma,
// frame and blank-wall strategies are tried in that order. The first
// plausible result is scaled back to full resolution. Detection never fails:
// when nothing is found a centred fallback rectangle is returned with low
// confidence so callers can route it to manual review.

pub mod blank_wall;
pub mod chroma;
pub mod frame;
pub mod grid;
pub(crate) mod integral;

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use wallframe_core::{Corners, DetectionMethod, DetectionResult};

pub use grid::{GridRect, largest_rectangle};

const FALLBACK_MARGIN: f64 = 0.3;
const FALLBACK_CONFIDENCE: f64 = 0.2;

/// Which strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectMethod {
    /// Chroma, then frame, then blank wall.
    #[default]
    Auto,
    ChromaKey,
    Frame,
    BlankWall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectOptions {
    /// Smallest accepted zone, as a percentage of the image area.
    pub min_area_pct: f64,
    /// Largest accepted zone, as a percentage of the image area.
    pub max_area_pct: f64,
    pub method: DetectMethod,
    /// Images wider than this are downsampled before analysis.
    pub analysis_width: u32,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            min_area_pct: 3.0,
            max_area_pct: 60.0,
            method: DetectMethod::Auto,
            analysis_width: 800,
        }
    }
}

/// A strategy hit in analysis-image coordinates.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate {
    pub corners: Corners,
    pub confidence: f64,
}

pub(crate) fn area_pct_in_range(area_pct: f64, options: &DetectOptions) -> bool {
    area_pct >= options.min_area_pct && area_pct <= options.max_area_pct
}

type Strategy = fn(&RgbImage, &DetectOptions) -> Option<Candidate>;

const STRATEGIES: [(DetectionMethod, Strategy); 3] = [
    (DetectionMethod::ChromaKey, chroma::detect),
    (DetectionMethod::Frame, frame::detect),
    (DetectionMethod::BlankWall, blank_wall::detect),
];

/// Locate the most likely placement zone in a room photo.
#[instrument(skip(room), fields(width = room.width(), height = room.height(), method = ?options.method))]
pub fn detect_zone(room: &DynamicImage, options: &DetectOptions) -> DetectionResult {
    let (orig_w, orig_h) = (room.width(), room.height());
    if orig_w == 0 || orig_h == 0 {
        return fallback(orig_w, orig_h);
    }

    let rgb = room.to_rgb8();
    let analysis = if options.analysis_width > 0 && orig_w > options.analysis_width {
        let scale = options.analysis_width as f64 / orig_w as f64;
        let ah = ((orig_h as f64 * scale).round() as u32).max(1);
        image::imageops::resize(&rgb, options.analysis_width, ah, FilterType::Triangle)
    } else {
        rgb
    };
    let sx = orig_w as f64 / analysis.width() as f64;
    let sy = orig_h as f64 / analysis.height() as f64;

    for (method, strategy) in STRATEGIES {
        if !wanted(options.method, method) {
            continue;
        }
        match strategy(&analysis, options) {
            Some(candidate) => {
                info!(?method, confidence = candidate.confidence, "placement zone detected");
                return DetectionResult {
                    corners: candidate.corners.scaled(sx, sy),
                    method,
                    confidence: candidate.confidence,
                };
            }
            None => debug!(?method, "strategy found nothing"),
        }
    }

    info!("no strategy matched, using centred fallback");
    fallback(orig_w, orig_h)
}

fn wanted(requested: DetectMethod, method: DetectionMethod) -> bool {
    matches!(
        (requested, method),
        (DetectMethod::Auto, _)
            | (DetectMethod::ChromaKey, DetectionMethod::ChromaKey)
            | (DetectMethod::Frame, DetectionMethod::Frame)
            | (DetectMethod::BlankWall, DetectionMethod::BlankWall)
    )
}

fn fallback(w: u32, h: u32) -> DetectionResult {
    let (w, h) = (w as f64, h as f64);
    let inner = 1.0 - 2.0 * FALLBACK_MARGIN;
    DetectionResult {
        corners: Corners::from_rect(w * FALLBACK_MARGIN, h * FALLBACK_MARGIN, w * inner, h * inner),
        method: DetectionMethod::Fallback,
        confidence: FALLBACK_CONFIDENCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn auto_prefers_chroma_key() {
        let img = RgbImage::from_fn(400, 300, |x, y| {
            if (100..300).contains(&x) && (80..220).contains(&y) {
                Rgb([0, 255, 0])
            } else {
                Rgb([190, 180, 170])
            }
        });
        let result = detect_zone(&DynamicImage::ImageRgb8(img), &DetectOptions::default());
        assert_eq!(result.method, DetectionMethod::ChromaKey);
        assert!(!result.needs_review());
    }

    #[test]
    fn corners_scale_back_to_full_resolution() {
        let img = RgbImage::from_fn(1600, 1200, |x, y| {
            if (400..1200).contains(&x) && (320..880).contains(&y) {
                Rgb([0, 255, 0])
            } else {
                Rgb([190, 180, 170])
            }
        });
        let result = detect_zone(&DynamicImage::ImageRgb8(img), &DetectOptions::default());
        assert_eq!(result.method, DetectionMethod::ChromaKey);
        let expected = Corners::from_rect(400.0, 320.0, 800.0, 560.0);
        for (got, want) in result.corners.to_array().iter().zip(expected.to_array()) {
            assert!(got.distance(&want) <= 4.0, "{got:?} vs {want:?}");
        }
    }

    #[test]
    fn auto_finds_frame_without_green() {
        let img = RgbImage::from_fn(400, 300, |x, y| {
            let outer = (100..300).contains(&x) && (80..230).contains(&y);
            let inner = (108..292).contains(&x) && (88..222).contains(&y);
            if inner {
                Rgb([235, 235, 235])
            } else if outer {
                Rgb([40, 30, 25])
            } else {
                Rgb([180, 175, 170])
            }
        });
        let result = detect_zone(&DynamicImage::ImageRgb8(img), &DetectOptions::default());
        assert_eq!(result.method, DetectionMethod::Frame);
    }

    #[test]
    fn dark_featureless_room_falls_back() {
        let img = RgbImage::from_pixel(400, 300, Rgb([20, 18, 16]));
        let result = detect_zone(&DynamicImage::ImageRgb8(img), &DetectOptions::default());
        assert_eq!(result.method, DetectionMethod::Fallback);
        assert_eq!(result.confidence, FALLBACK_CONFIDENCE);
        assert!(result.needs_review());
        let expected = Corners::from_rect(120.0, 90.0, 160.0, 120.0);
        for (got, want) in result.corners.to_array().iter().zip(expected.to_array()) {
            assert!(got.distance(&want) < 1e-9);
        }
    }

    #[test]
    fn pinned_method_skips_other_strategies() {
        let img = RgbImage::from_fn(400, 300, |x, y| {
            if (100..300).contains(&x) && (80..220).contains(&y) {
                Rgb([0, 255, 0])
            } else {
                Rgb([20, 18, 16])
            }
        });
        let options = DetectOptions {
            method: DetectMethod::Frame,
            ..DetectOptions::default()
        };
        let result = detect_zone(&DynamicImage::ImageRgb8(img), &options);
        assert_ne!(result.method, DetectionMethod::ChromaKey);
    }
}
