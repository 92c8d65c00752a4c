// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Residual chroma-spill suppression.

use image::{Rgba, RgbaImage};

const GREEN_MIN: f32 = 80.0;
const GREEN_RATIO: f32 = 1.3;
const RED_BLUE_CEILING: f32 = 150.0;

/// True when `pixel` carries a chroma-green signature.
pub fn is_spill(pixel: &Rgba<u8>) -> bool {
    let [r, g, b, _] = pixel.0.map(|c| c as f32);
    g > GREEN_MIN
        && g > GREEN_RATIO * r
        && g > GREEN_RATIO * b
        && r < RED_BLUE_CEILING
        && b < RED_BLUE_CEILING
}

/// Pull green-signatured pixels toward a warm neutral of their own
/// luminance, in proportion to how saturated-green they are. Returns the
/// number of pixels touched. Alpha is preserved.
pub fn remove_spill(buffer: &mut RgbaImage) -> usize {
    let mut touched = 0;
    for pixel in buffer.pixels_mut() {
        if !is_spill(pixel) {
            continue;
        }
        let [r, g, b, a] = pixel.0;
        let (rf, gf, bf) = (r as f32, g as f32, b as f32);
        let strength = ((gf - rf.max(bf)) / gf).clamp(0.0, 1.0);
        let luma = 0.299 * rf + 0.587 * gf + 0.114 * bf;
        let target = [luma * 1.05, luma, luma * 0.95];
        let mix = |from: f32, to: f32| (from + (to - from) * strength).round().clamp(0.0, 255.0) as u8;
        *pixel = Rgba([mix(rf, target[0]), mix(gf, target[1]), mix(bf, target[2]), a]);
        touched += 1;
    }
    touched
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_and_warm_tones_untouched() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([128, 128, 128, 255]));
        img.put_pixel(1, 0, Rgba([220, 200, 170, 255]));
        let before = img.clone();
        assert_eq!(remove_spill(&mut img), 0);
        assert_eq!(img, before);
    }

    #[test]
    fn green_spill_is_desaturated() {
        let mut img = RgbaImage::from_pixel(1, 1, Rgba([20, 200, 30, 180]));
        assert_eq!(remove_spill(&mut img), 1);
        let [r, g, b, a] = img.get_pixel(0, 0).0;
        assert_eq!(a, 180);
        assert!((g as f32 / r as f32) < 10.0 / 2.0);
        assert!((g as f32 / b as f32) < 200.0 / 30.0 / 2.0);
        assert!(r > b, "result leans warm");
    }

    fn green_share(px: [u8; 4]) -> f32 {
        px[1] as f32 / (px[0] as f32 + px[1] as f32 + px[2] as f32)
    }

    #[test]
    fn every_spill_pixel_loses_green_share() {
        let samples = [
            [20, 200, 30, 255],
            [0, 255, 0, 255],
            // Just past the green floor and the 1.3 ratio.
            [61, 81, 61, 255],
            [62, 81, 60, 128],
            [10, 90, 69, 255],
            // Red and blue just under the ceiling.
            [149, 199, 149, 255],
            [100, 140, 40, 255],
        ];
        for px in samples {
            assert!(is_spill(&Rgba(px)), "{px:?} should count as spill");
            let mut img = RgbaImage::from_pixel(1, 1, Rgba(px));
            assert_eq!(remove_spill(&mut img), 1);
            let after = img.get_pixel(0, 0).0;
            assert_eq!(after[3], px[3]);
            assert!(
                green_share(after) < green_share(px),
                "{px:?} -> {after:?} kept its green share"
            );
        }
    }

    #[test]
    fn pixels_just_outside_the_predicate_are_kept() {
        for px in [[62, 80, 40, 255], [70, 91, 20, 255], [150, 250, 100, 255]] {
            assert!(!is_spill(&Rgba(px)), "{px:?}");
            let mut img = RgbaImage::from_pixel(1, 1, Rgba(px));
            assert_eq!(remove_spill(&mut img), 0);
            assert_eq!(img.get_pixel(0, 0).0, px);
        }
    }

    #[test]
    fn bright_foliage_above_ceiling_is_ignored() {
        let px = Rgba([160, 240, 120, 255]);
        assert!(!is_spill(&px));
    }
}
