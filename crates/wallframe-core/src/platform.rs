// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output platform table: sizing and logo placement per named platform.
//
// The table is fixed at compile time; platforms are not configurable at
// runtime.

use serde::Serialize;

use crate::error::{Result, WallframeError};

/// How a composite is sized for a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fit {
    /// Fill exactly `width x height`, cropping the excess.
    Cover,
    /// Shrink to at most `width` wide, preserving aspect; never upscale.
    Inside,
}

/// Which corner the logo sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogoPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Logo overlay parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Branding {
    pub position: LogoPosition,
    /// Multiplier applied to the logo's own alpha, in `[0, 1]`.
    pub opacity: f32,
    /// Logo width as a fraction of the output width.
    pub scale: f32,
    /// Distance from the output edges in pixels.
    pub padding: u32,
}

/// A named output target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlatformSpec {
    pub name: &'static str,
    pub width: u32,
    /// `None` for responsive targets sized by width alone.
    pub height: Option<u32>,
    pub fit: Fit,
    pub branding: Branding,
}

const fn branding(position: LogoPosition, opacity: f32, scale: f32, padding: u32) -> Branding {
    Branding {
        position,
        opacity,
        scale,
        padding,
    }
}

/// Every supported platform.
pub const PLATFORMS: &[PlatformSpec] = &[
    PlatformSpec {
        name: "etsy",
        width: 2700,
        height: Some(2025),
        fit: Fit::Cover,
        branding: branding(LogoPosition::BottomRight, 0.6, 0.12, 40),
    },
    PlatformSpec {
        name: "shopify",
        width: 2048,
        height: Some(2048),
        fit: Fit::Cover,
        branding: branding(LogoPosition::BottomRight, 0.5, 0.10, 32),
    },
    PlatformSpec {
        name: "instagram-square",
        width: 1080,
        height: Some(1080),
        fit: Fit::Cover,
        branding: branding(LogoPosition::BottomLeft, 0.7, 0.15, 24),
    },
    PlatformSpec {
        name: "instagram-portrait",
        width: 1080,
        height: Some(1350),
        fit: Fit::Cover,
        branding: branding(LogoPosition::BottomLeft, 0.7, 0.15, 24),
    },
    PlatformSpec {
        name: "instagram-story",
        width: 1080,
        height: Some(1920),
        fit: Fit::Cover,
        branding: branding(LogoPosition::TopLeft, 0.8, 0.18, 48),
    },
    PlatformSpec {
        name: "pinterest",
        width: 1000,
        height: Some(1500),
        fit: Fit::Cover,
        branding: branding(LogoPosition::TopRight, 0.65, 0.14, 20),
    },
    PlatformSpec {
        name: "facebook",
        width: 1200,
        height: Some(630),
        fit: Fit::Cover,
        branding: branding(LogoPosition::BottomRight, 0.6, 0.10, 20),
    },
    PlatformSpec {
        name: "web",
        width: 1600,
        height: None,
        fit: Fit::Inside,
        branding: branding(LogoPosition::BottomRight, 0.4, 0.08, 16),
    },
];

/// Look up a platform by name (case-insensitive).
pub fn platform_spec(name: &str) -> Result<&'static PlatformSpec> {
    PLATFORMS
        .iter()
        .find(|spec| spec.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| WallframeError::UnknownPlatform(name.to_string()))
}
