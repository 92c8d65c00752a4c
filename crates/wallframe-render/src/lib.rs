// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// wallframe-render: Pixel work for the Wallframe mockup generator.
//
// Provides the four-point homography solver and perspective warp, placement
// zone detection for room photos, and the compositor that paints artwork
// into a room and sizes the result for each output platform.

pub mod composite;
pub mod detect;
pub mod homography;
pub mod image;

// Re-export the primary types so callers can use `wallframe_render::Compositor` etc.
pub use crate::composite::Compositor;
pub use crate::detect::{DetectMethod, DetectOptions, detect_zone};
pub use crate::homography::{Homography, OutputRegion, Sampling, warp};
pub use crate::image::{ImageProcessor, OutputFormat, apply_opacity};
