// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Summed-area tables for O(1) rectangle mean/variance queries.

use image::GrayImage;

/// Integral image of pixel values and squared pixel values.
///
/// `sum[y * (width+1) + x]` holds the sum over `[0, x) x [0, y)`; both tables
/// have a zero-padded first row and column.
pub(crate) struct IntegralImage {
    width: u32,
    height: u32,
    sum: Vec<u64>,
    sum_sq: Vec<u64>,
}

impl IntegralImage {
    pub(crate) fn from_luma(gray: &GrayImage) -> Self {
        let (w, h) = gray.dimensions();
        let stride = (w + 1) as usize;
        let mut sum = vec![0u64; stride * (h + 1) as usize];
        let mut sum_sq = vec![0u64; stride * (h + 1) as usize];

        for y in 0..h {
            let mut row_sum = 0u64;
            let mut row_sq = 0u64;
            for x in 0..w {
                let v = gray.get_pixel(x, y).0[0] as u64;
                row_sum += v;
                row_sq += v * v;
                let idx = (y + 1) as usize * stride + (x + 1) as usize;
                let above = y as usize * stride + (x + 1) as usize;
                sum[idx] = row_sum + sum[above];
                sum_sq[idx] = row_sq + sum_sq[above];
            }
        }

        Self {
            width: w,
            height: h,
            sum,
            sum_sq,
        }
    }

    /// Mean and population variance over `[x0, x1) x [y0, y1)`, clamped to
    /// the image. An empty region reports `(0, 0)`.
    pub(crate) fn mean_variance(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> (f64, f64) {
        let x0 = x0.min(self.width) as usize;
        let x1 = x1.min(self.width) as usize;
        let y0 = y0.min(self.height) as usize;
        let y1 = y1.min(self.height) as usize;
        if x1 <= x0 || y1 <= y0 {
            return (0.0, 0.0);
        }

        let stride = (self.width + 1) as usize;
        let rect = |table: &[u64]| -> f64 {
            table[y1 * stride + x1] as f64 - table[y0 * stride + x1] as f64
                - table[y1 * stride + x0] as f64
                + table[y0 * stride + x0] as f64
        };

        let n = ((x1 - x0) * (y1 - y0)) as f64;
        let mean = rect(&self.sum) / n;
        let variance = (rect(&self.sum_sq) / n - mean * mean).max(0.0);
        (mean, variance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn uniform_region_has_zero_variance() {
        let gray = GrayImage::from_pixel(20, 10, Luma([77]));
        let integral = IntegralImage::from_luma(&gray);
        let (mean, var) = integral.mean_variance(2, 2, 18, 9);
        assert!((mean - 77.0).abs() < 1e-9);
        assert!(var.abs() < 1e-9);
    }

    #[test]
    fn matches_direct_computation() {
        let gray = GrayImage::from_fn(9, 7, |x, y| Luma([((x * 31 + y * 17) % 256) as u8]));
        let integral = IntegralImage::from_luma(&gray);

        let (x0, y0, x1, y1) = (1, 2, 8, 6);
        let values: Vec<f64> = (y0..y1)
            .flat_map(|y| (x0..x1).map(move |x| (x, y)))
            .map(|(x, y)| gray.get_pixel(x, y).0[0] as f64)
            .collect();
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        let (m, v) = integral.mean_variance(x0, y0, x1, y1);
        assert!((m - mean).abs() < 1e-9);
        assert!((v - var).abs() < 1e-6);
    }

    #[test]
    fn empty_and_out_of_range_regions() {
        let gray = GrayImage::from_pixel(4, 4, Luma([10]));
        let integral = IntegralImage::from_luma(&gray);
        assert_eq!(integral.mean_variance(3, 3, 3, 4), (0.0, 0.0));
        let (mean, _) = integral.mean_variance(2, 2, 100, 100);
        assert!((mean - 10.0).abs() < 1e-9);
    }
}
