// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Aspect-ratio bands and pairwise compatibility scoring.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Named aspect-ratio band (width / height).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AspectCategory {
    Square,
    FourThree,
    ThreeTwo,
    SixteenNine,
    TwoOne,
    WidePanorama,
    ThreeOne,
    UltraWide,
    Portrait,
}

impl AspectCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Square => "square",
            Self::FourThree => "4:3",
            Self::ThreeTwo => "3:2",
            Self::SixteenNine => "16:9",
            Self::TwoOne => "2:1",
            Self::WidePanorama => "wide panorama",
            Self::ThreeOne => "3:1",
            Self::UltraWide => "ultra-wide",
            Self::Portrait => "portrait",
        }
    }
}

impl fmt::Display for AspectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct Band {
    category: AspectCategory,
    min: f64,
    max: f64,
}

const fn band(category: AspectCategory, min: f64, max: f64) -> Band {
    Band { category, min, max }
}

/// Checked in order; the first band with `min <= ar < max` wins.
const BANDS: &[Band] = &[
    band(AspectCategory::Square, 0.95, 1.15),
    band(AspectCategory::FourThree, 1.15, 1.42),
    band(AspectCategory::ThreeTwo, 1.42, 1.65),
    band(AspectCategory::SixteenNine, 1.65, 1.9),
    band(AspectCategory::TwoOne, 1.9, 2.2),
    band(AspectCategory::WidePanorama, 2.2, 2.8),
    band(AspectCategory::ThreeOne, 2.8, 3.3),
    band(AspectCategory::UltraWide, 3.3, f64::INFINITY),
    band(AspectCategory::Portrait, 0.0, 0.95),
];

/// Classify an aspect ratio. Values outside every band fall to the nearest
/// extreme: `UltraWide` above, `Portrait` below (including non-finite or
/// non-positive input).
pub fn classify(aspect_ratio: f64) -> AspectCategory {
    BANDS
        .iter()
        .find(|b| aspect_ratio >= b.min && aspect_ratio < b.max)
        .map(|b| b.category)
        .unwrap_or(if aspect_ratio >= 1.0 {
            AspectCategory::UltraWide
        } else {
            AspectCategory::Portrait
        })
}

// -- Compatibility ------------------------------------------------------------

/// Difference at or below which two ratios are an exact fit.
pub const EXACT_THRESHOLD: f64 = 0.05;
/// Multiple of the tolerance still reported as a stretched near-miss.
pub const STRETCH_FACTOR: f64 = 1.5;
pub const DEFAULT_TOLERANCE: f64 = 0.15;

/// Quality tier of an aspect-ratio pairing, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitType {
    Exact,
    Good,
    Stretched,
    Incompatible,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compatibility {
    pub compatible: bool,
    pub score: f64,
    pub fit_type: FitType,
}

/// Relative difference `|a - b| / max(a, b)`.
pub fn relative_difference(a: f64, b: f64) -> f64 {
    let max = a.max(b);
    if max <= 0.0 { 1.0 } else { (a - b).abs() / max }
}

/// Score a photo against a zone by aspect ratio.
///
/// `Stretched` results are never compatible but are reported so callers can
/// surface them instead of dropping them silently.
pub fn is_compatible(photo_ar: f64, zone_ar: f64, tolerance: f64) -> Compatibility {
    let valid = |v: f64| v.is_finite() && v > 0.0;
    if !valid(photo_ar) || !valid(zone_ar) {
        return Compatibility {
            compatible: false,
            score: 0.0,
            fit_type: FitType::Incompatible,
        };
    }

    let diff = relative_difference(photo_ar, zone_ar);
    let fit_type = if diff <= EXACT_THRESHOLD {
        FitType::Exact
    } else if diff <= tolerance {
        FitType::Good
    } else if diff <= STRETCH_FACTOR * tolerance {
        FitType::Stretched
    } else {
        FitType::Incompatible
    };

    Compatibility {
        compatible: matches!(fit_type, FitType::Exact | FitType::Good),
        score: (1.0 - diff).max(0.0),
        fit_type,
    }
}
