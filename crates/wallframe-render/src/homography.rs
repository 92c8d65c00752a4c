// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Projective transforms from four point correspondences, and pixel
// resampling through them.
//
// The 3x3 matrix maps homogeneous source points to destination points:
//
//   x' = (h00*x + h01*y + h02) / (h20*x + h21*y + h22)
//   y' = (h10*x + h11*y + h12) / (h20*x + h21*y + h22)
//
// with h22 fixed to 1. All numerics are f64.

use image::{Rgba, RgbaImage};
use tracing::{debug, instrument};
use wallframe_core::Point;
use wallframe_core::error::{Result, WallframeError};

/// Smallest pivot accepted while solving the normalised system.
const PIVOT_EPS: f64 = 1e-8;

/// Smallest homogeneous denominator accepted when projecting a point.
const DENOM_EPS: f64 = 1e-12;

/// Smallest determinant, relative to the Hadamard bound, accepted when
/// inverting.
const DET_EPS: f64 = 1e-12;

/// A 3x3 projective transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    m: [[f64; 3]; 3],
}

impl Homography {
    pub const IDENTITY: Self = Self {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    /// Wrap a raw row-major matrix.
    pub fn from_matrix(m: [[f64; 3]; 3]) -> Self {
        Self { m }
    }

    /// Row-major matrix entries.
    pub fn matrix(&self) -> [[f64; 3]; 3] {
        self.m
    }

    /// Solve the transform mapping each `src[i]` onto `dst[i]`.
    ///
    /// Both point sets are first normalised (centroid at the origin, mean
    /// distance sqrt(2)) so the pivot threshold is independent of image
    /// resolution. Collinear or duplicate points fail with
    /// `DegenerateGeometry`.
    pub fn compute(src: &[Point; 4], dst: &[Point; 4]) -> Result<Self> {
        let (src_n, t_src) = normalise(src)?;
        let (dst_n, t_dst) = normalise(dst)?;
        check_general_position(&src_n, "source")?;
        check_general_position(&dst_n, "destination")?;

        // 8x9 augmented system: two rows per correspondence.
        let mut a = [[0.0f64; 9]; 8];
        for i in 0..4 {
            let (x, y) = (src_n[i].x, src_n[i].y);
            let (u, v) = (dst_n[i].x, dst_n[i].y);

            a[2 * i] = [x, y, 1.0, 0.0, 0.0, 0.0, -x * u, -y * u, u];
            a[2 * i + 1] = [0.0, 0.0, 0.0, x, y, 1.0, -x * v, -y * v, v];
        }

        let h = solve_8x8(&mut a)?;
        let normalised = Self::from_matrix([
            [h[0], h[1], h[2]],
            [h[3], h[4], h[5]],
            [h[6], h[7], 1.0],
        ]);

        // H = T_dst^-1 * Hn * T_src
        let t_dst_inv = t_dst.invert()?;
        let full = t_dst_inv.mul(&normalised).mul(&t_src);
        let result = full.rescaled();
        if result.relative_determinant() < DET_EPS {
            return Err(WallframeError::DegenerateGeometry(
                "solved transform is singular".into(),
            ));
        }

        debug!(matrix = ?result.m, "homography solved");
        Ok(result)
    }

    /// Map a point through the transform.
    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        self.project(x, y).ok_or_else(|| {
            WallframeError::DegenerateGeometry(format!(
                "point ({x:.3}, {y:.3}) maps to infinity"
            ))
        })
    }

    /// Closed-form inverse via the adjugate.
    pub fn invert(&self) -> Result<Self> {
        let m = &self.m;
        let det = self.determinant();
        if !det.is_finite() || self.relative_determinant() < DET_EPS {
            return Err(WallframeError::DegenerateGeometry(format!(
                "singular homography (det = {det:e})"
            )));
        }
        let inv_det = 1.0 / det;

        let inv = [
            [
                (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det,
                (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det,
                (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det,
            ],
            [
                (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det,
                (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det,
                (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det,
            ],
            [
                (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det,
                (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det,
                (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det,
            ],
        ];
        Ok(Self::from_matrix(inv).rescaled())
    }

    /// Matrix product `self * other` (apply `other` first).
    pub fn mul(&self, other: &Homography) -> Homography {
        let mut out = [[0.0f64; 3]; 3];
        for (r, row) in out.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.m[r][k] * other.m[k][c]).sum();
            }
        }
        Homography { m: out }
    }

    /// Project without error construction; `None` for points at infinity.
    #[inline]
    fn project(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let m = &self.m;
        let w = m[2][0] * x + m[2][1] * y + m[2][2];
        if !w.is_finite() || w.abs() < DENOM_EPS {
            return None;
        }
        let px = (m[0][0] * x + m[0][1] * y + m[0][2]) / w;
        let py = (m[1][0] * x + m[1][1] * y + m[1][2]) / w;
        (px.is_finite() && py.is_finite()).then_some((px, py))
    }

    fn determinant(&self) -> f64 {
        let m = &self.m;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// `|det|` divided by the product of the row norms (Hadamard bound), so
    /// `0` is singular and `1` is orthogonal regardless of translation size.
    fn relative_determinant(&self) -> f64 {
        let bound: f64 = self
            .m
            .iter()
            .map(|row| row.iter().map(|v| v * v).sum::<f64>().sqrt())
            .product();
        if bound == 0.0 || !bound.is_finite() {
            return 0.0;
        }
        self.determinant().abs() / bound
    }

    /// Largest absolute entry.
    fn scale(&self) -> f64 {
        self.m
            .iter()
            .flatten()
            .fold(0.0f64, |acc, v| acc.max(v.abs()))
    }

    /// Divide through so that h22 = 1 when possible.
    fn rescaled(self) -> Self {
        let h22 = self.m[2][2];
        let divisor = if h22.abs() > DENOM_EPS { h22 } else { self.scale() };
        if divisor == 0.0 {
            return self;
        }
        Self {
            m: self.m.map(|row| row.map(|v| v / divisor)),
        }
    }
}

/// Hartley normalisation: returns the normalised points and the similarity
/// transform that produced them.
fn normalise(points: &[Point; 4]) -> Result<([Point; 4], Homography)> {
    let cx = points.iter().map(|p| p.x).sum::<f64>() / 4.0;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / 4.0;
    let mean_dist = points
        .iter()
        .map(|p| (p.x - cx).hypot(p.y - cy))
        .sum::<f64>()
        / 4.0;
    if !mean_dist.is_finite() || mean_dist < 1e-12 {
        return Err(WallframeError::DegenerateGeometry(
            "all corners coincide".into(),
        ));
    }
    let s = std::f64::consts::SQRT_2 / mean_dist;
    let normalised = points.map(|p| Point::new((p.x - cx) * s, (p.y - cy) * s));
    let t = Homography::from_matrix([[s, 0.0, -s * cx], [0.0, s, -s * cy], [0.0, 0.0, 1.0]]);
    Ok((normalised, t))
}

/// Reject normalised point sets where any three points are (nearly)
/// collinear. Areas here are O(1) because of the normalisation.
fn check_general_position(points: &[Point; 4], which: &str) -> Result<()> {
    for skip in 0..4 {
        let tri: Vec<&Point> = points
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != skip)
            .map(|(_, p)| p)
            .collect();
        let cross = (tri[1].x - tri[0].x) * (tri[2].y - tri[0].y)
            - (tri[1].y - tri[0].y) * (tri[2].x - tri[0].x);
        if cross.abs() < PIVOT_EPS {
            return Err(WallframeError::DegenerateGeometry(format!(
                "{which} corners contain three collinear points"
            )));
        }
    }
    Ok(())
}

/// Gaussian elimination with partial pivoting on an 8x9 augmented matrix.
fn solve_8x8(a: &mut [[f64; 9]; 8]) -> Result<[f64; 8]> {
    for col in 0..8 {
        let (pivot_row, pivot_mag) = (col..8)
            .map(|row| (row, a[row][col].abs()))
            .fold((col, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });

        if pivot_mag < PIVOT_EPS {
            return Err(WallframeError::DegenerateGeometry(format!(
                "pivot {pivot_mag:e} in column {col}: corners are collinear or duplicated"
            )));
        }
        a.swap(col, pivot_row);

        let pivot = a[col][col];
        for row in (col + 1)..8 {
            let factor = a[row][col] / pivot;
            if factor == 0.0 {
                continue;
            }
            for c in col..9 {
                a[row][c] -= factor * a[col][c];
            }
        }
    }

    let mut h = [0.0f64; 8];
    for row in (0..8).rev() {
        let mut sum = a[row][8];
        for c in (row + 1)..8 {
            sum -= a[row][c] * h[c];
        }
        h[row] = sum / a[row][row];
    }
    Ok(h)
}

// -- Resampling ---------------------------------------------------------------

/// Pixel sampling policy for `warp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sampling {
    /// Fast; interactive previews only.
    Nearest,
    /// Required for anything that ships externally.
    Bilinear,
}

/// Destination window, in destination-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Render `region` of the destination plane by reverse-mapping each pixel
/// centre through `h`'s inverse into `src`.
///
/// `h` maps source coordinates to destination coordinates. Pixels whose
/// source position lies outside `src` are fully transparent.
#[instrument(skip(src, h), fields(src_w = src.width(), src_h = src.height()))]
pub fn warp(
    src: &RgbaImage,
    h: &Homography,
    region: OutputRegion,
    sampling: Sampling,
) -> Result<RgbaImage> {
    let inverse = h.invert()?;
    let mut out = RgbaImage::new(region.width, region.height);
    let (sw, sh) = (src.width() as f64, src.height() as f64);
    if src.width() == 0 || src.height() == 0 {
        return Ok(out);
    }

    for j in 0..region.height {
        let dy = region.y as f64 + j as f64 + 0.5;
        for i in 0..region.width {
            let dx = region.x as f64 + i as f64 + 0.5;
            let Some((sx, sy)) = inverse.project(dx, dy) else {
                continue;
            };
            if sx < 0.0 || sy < 0.0 || sx >= sw || sy >= sh {
                continue;
            }
            let pixel = match sampling {
                Sampling::Nearest => *src.get_pixel(sx as u32, sy as u32),
                Sampling::Bilinear => sample_bilinear(src, sx, sy),
            };
            out.put_pixel(i, j, pixel);
        }
    }

    debug!("warp complete");
    Ok(out)
}

/// Bilinear sample at continuous coordinates (pixel centres at `k + 0.5`),
/// clamping neighbours at the image border.
fn sample_bilinear(src: &RgbaImage, sx: f64, sy: f64) -> Rgba<u8> {
    let max_x = src.width() - 1;
    let max_y = src.height() - 1;

    let fx = (sx - 0.5).max(0.0);
    let fy = (sy - 0.5).max(0.0);
    let x0 = (fx.floor() as u32).min(max_x);
    let y0 = (fy.floor() as u32).min(max_y);
    let x1 = (x0 + 1).min(max_x);
    let y1 = (y0 + 1).min(max_y);
    let tx = (fx - x0 as f64).clamp(0.0, 1.0);
    let ty = (fy - y0 as f64).clamp(0.0, 1.0);

    let p00 = src.get_pixel(x0, y0).0;
    let p10 = src.get_pixel(x1, y0).0;
    let p01 = src.get_pixel(x0, y1).0;
    let p11 = src.get_pixel(x1, y1).0;

    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = p00[c] as f64 * (1.0 - tx) + p10[c] as f64 * tx;
        let bottom = p01[c] as f64 * (1.0 - tx) + p11[c] as f64 * tx;
        out[c] = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(w: f64, h: f64) -> [Point; 4] {
        [
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, h),
            Point::new(0.0, h),
        ]
    }

    fn perspective_quad() -> [Point; 4] {
        [
            Point::new(812.0, 403.5),
            Point::new(1604.0, 431.0),
            Point::new(1588.0, 1122.0),
            Point::new(799.0, 1187.0),
        ]
    }

    fn assert_close(actual: (f64, f64), expected: Point, tol: f64) {
        assert!(
            (actual.0 - expected.x).abs() < tol && (actual.1 - expected.y).abs() < tol,
            "expected ({}, {}), got {:?}",
            expected.x,
            expected.y,
            actual
        );
    }

    #[test]
    fn maps_source_corners_onto_destination() {
        let src = rect(1200.0, 800.0);
        let dst = perspective_quad();
        let h = Homography::compute(&src, &dst).expect("solve");
        for (s, d) in src.iter().zip(dst.iter()) {
            assert_close(h.transform_point(s.x, s.y).expect("map"), *d, 1e-6);
        }
        assert!((h.matrix()[2][2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn inverse_round_trips_corners() {
        let src = rect(640.0, 480.0);
        let dst = perspective_quad();
        let h = Homography::compute(&src, &dst).expect("solve");
        let inv = h.invert().expect("invert");

        for (s, d) in src.iter().zip(dst.iter()) {
            assert_close(inv.transform_point(d.x, d.y).expect("inverse map"), *s, 1e-6);
        }

        let round_trip = inv.mul(&h);
        for s in &src {
            assert_close(round_trip.transform_point(s.x, s.y).expect("map"), *s, 1e-6);
        }
    }

    #[test]
    fn identity_for_matching_corners() {
        let pts = perspective_quad();
        let h = Homography::compute(&pts, &pts).expect("solve");
        for (r, row) in h.matrix().iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert!((v - expected).abs() < 1e-9, "entry ({r},{c}) = {v}");
            }
        }
    }

    #[test]
    fn collinear_source_is_degenerate() {
        let src = [
            Point::new(0.0, 0.0),
            Point::new(50.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(0.0, 100.0),
        ];
        let err = Homography::compute(&src, &perspective_quad()).unwrap_err();
        assert!(matches!(err, WallframeError::DegenerateGeometry(_)));
    }

    #[test]
    fn duplicate_points_are_degenerate() {
        let mut src = rect(100.0, 100.0);
        src[2] = src[1];
        assert!(Homography::compute(&src, &perspective_quad()).is_err());

        let same = [Point::new(5.0, 5.0); 4];
        assert!(Homography::compute(&same, &perspective_quad()).is_err());
    }

    #[test]
    fn singular_matrix_cannot_invert() {
        let singular = Homography::from_matrix([[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 0.0, 1.0]]);
        assert!(matches!(
            singular.invert(),
            Err(WallframeError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn point_at_infinity_errors() {
        let h = Homography::from_matrix([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, -1.0]]);
        assert!(h.transform_point(1.0, 0.0).is_err());
        assert!(h.transform_point(2.0, 0.0).is_ok());
    }

    #[test]
    fn identity_warp_copies_pixels() {
        let mut src = RgbaImage::new(8, 6);
        for (x, y, p) in src.enumerate_pixels_mut() {
            *p = Rgba([(x * 30) as u8, (y * 40) as u8, 7, 255]);
        }
        let region = OutputRegion {
            x: 0,
            y: 0,
            width: 8,
            height: 6,
        };
        for sampling in [Sampling::Nearest, Sampling::Bilinear] {
            let out = warp(&src, &Homography::IDENTITY, region, sampling).expect("warp");
            assert_eq!(out, src);
        }
    }

    #[test]
    fn pixels_outside_source_are_transparent() {
        let src = RgbaImage::from_pixel(10, 10, Rgba([200, 10, 10, 255]));
        // Place the 10x10 source at (20, 20) in a 40x40 destination.
        let dst = [
            Point::new(20.0, 20.0),
            Point::new(30.0, 20.0),
            Point::new(30.0, 30.0),
            Point::new(20.0, 30.0),
        ];
        let h = Homography::compute(&rect(10.0, 10.0), &dst).expect("solve");
        let region = OutputRegion {
            x: 0,
            y: 0,
            width: 40,
            height: 40,
        };
        let out = warp(&src, &h, region, Sampling::Bilinear).expect("warp");
        assert_eq!(out.get_pixel(5, 5).0[3], 0);
        assert_eq!(out.get_pixel(35, 25).0[3], 0);
        assert_eq!(*out.get_pixel(25, 25), Rgba([200, 10, 10, 255]));
    }

    #[test]
    fn bilinear_blends_where_nearest_steps() {
        // Two-column source: black | white, stretched 4x horizontally.
        let mut src = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255]));
        src.put_pixel(1, 0, Rgba([255, 255, 255, 255]));
        let h = Homography::compute(&rect(2.0, 1.0), &rect(8.0, 1.0)).expect("solve");
        let region = OutputRegion {
            x: 0,
            y: 0,
            width: 8,
            height: 1,
        };

        let nearest = warp(&src, &h, region, Sampling::Nearest).expect("nearest");
        let bilinear = warp(&src, &h, region, Sampling::Bilinear).expect("bilinear");

        let nearest_values: Vec<u8> = (0..8).map(|x| nearest.get_pixel(x, 0).0[0]).collect();
        assert!(nearest_values.iter().all(|v| *v == 0 || *v == 255));

        let mid = bilinear.get_pixel(4, 0).0[0];
        assert!(mid > 0 && mid < 255, "expected a blended value, got {mid}");
        let ramp: Vec<u8> = (0..8).map(|x| bilinear.get_pixel(x, 0).0[0]).collect();
        assert!(ramp.windows(2).all(|w| w[0] <= w[1]), "not monotone: {ramp:?}");
    }
}
