// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Frame strategy: rectangles bounded by long Sobel edge runs.
//
// Long horizontal and vertical edge runs are merged into lines, then every
// top/bottom pair is combined with left/right verticals that fit inside
// their overlap. Candidates are scored on area, vertical centring, interior
// uniformity and how much of each side is backed by a real edge.

use image::{GrayImage, RgbImage};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use tracing::debug;
use wallframe_core::Corners;

use super::integral::IntegralImage;
use super::{Candidate, DetectOptions, area_pct_in_range};

const EDGE_THRESHOLD: u16 = 100;
const MAX_GAP: u32 = 2;
const MAX_LINES: usize = 24;
const MIN_COVERAGE: f64 = 0.6;
const SNAP_TOLERANCE: f64 = 4.0;
const MIN_ASPECT: f64 = 0.5;
const MAX_ASPECT: f64 = 2.5;
const INTERIOR_INSET: f64 = 0.15;
const UNIFORM_STD: f64 = 48.0;
const MIN_SCORE: f64 = 0.5;
const MAX_CONFIDENCE: f64 = 0.85;

/// A merged edge line. `pos` is the boundary coordinate across the line;
/// `start..=end` is its extent along it.
#[derive(Debug, Clone, Copy)]
struct EdgeLine {
    pos: f64,
    start: u32,
    end: u32,
}

impl EdgeLine {
    fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    /// Fraction of `[from, to)` covered by this line's extent.
    fn coverage(&self, from: f64, to: f64) -> f64 {
        if to <= from {
            return 0.0;
        }
        let lo = (self.start as f64).max(from);
        let hi = ((self.end + 1) as f64).min(to);
        ((hi - lo).max(0.0) / (to - from)).min(1.0)
    }
}

/// Line under construction: rows (or columns) `across_min..=across_max`.
struct Building {
    across_min: u32,
    across_max: u32,
    start: u32,
    end: u32,
}

pub(crate) fn detect(img: &RgbImage, options: &DetectOptions) -> Option<Candidate> {
    let gray: GrayImage = image::imageops::grayscale(img);
    let (w, h) = gray.dimensions();
    let min_len = 12u32.max((w.min(h) as f64 * 0.1) as u32);

    let gx = horizontal_sobel(&gray);
    let gy = vertical_sobel(&gray);

    let horizontals = extract_lines(h, w, min_len, |row, col| {
        gy.get_pixel(col, row).0[0].unsigned_abs() >= EDGE_THRESHOLD
    });
    let verticals = extract_lines(w, h, min_len, |col, row| {
        gx.get_pixel(col, row).0[0].unsigned_abs() >= EDGE_THRESHOLD
    });
    debug!(
        horizontals = horizontals.len(),
        verticals = verticals.len(),
        "frame edge lines"
    );
    if horizontals.len() < 2 || verticals.len() < 2 {
        return None;
    }

    let integral = IntegralImage::from_luma(&gray);
    let total_area = w as f64 * h as f64;
    let min_len_f = min_len as f64;
    let mut best: Option<(f64, Corners)> = None;

    for top in &horizontals {
        for bottom in &horizontals {
            if bottom.pos - top.pos < min_len_f {
                continue;
            }
            let overlap_lo = top.start.max(bottom.start) as f64;
            let overlap_hi = (top.end.min(bottom.end) + 1) as f64;
            if overlap_hi - overlap_lo < min_len_f {
                continue;
            }

            let sides: Vec<&EdgeLine> = verticals
                .iter()
                .filter(|v| {
                    v.pos >= overlap_lo - SNAP_TOLERANCE
                        && v.pos <= overlap_hi + SNAP_TOLERANCE
                        && v.coverage(top.pos, bottom.pos) >= MIN_COVERAGE
                })
                .collect();

            for left in &sides {
                for right in &sides {
                    if right.pos - left.pos < min_len_f {
                        continue;
                    }
                    let top_cov = top.coverage(left.pos, right.pos);
                    let bottom_cov = bottom.coverage(left.pos, right.pos);
                    if top_cov < MIN_COVERAGE || bottom_cov < MIN_COVERAGE {
                        continue;
                    }

                    let width = right.pos - left.pos;
                    let height = bottom.pos - top.pos;
                    let aspect = width / height;
                    let area_pct = width * height / total_area * 100.0;
                    if !(MIN_ASPECT..=MAX_ASPECT).contains(&aspect)
                        || !area_pct_in_range(area_pct, options)
                    {
                        continue;
                    }

                    let area_score = (area_pct / 25.0).min(1.0);
                    let cy = (top.pos + bottom.pos) / 2.0 / h as f64;
                    let centre_score = (1.0 - 2.0 * (cy - 0.5).abs()).max(0.0);
                    let uniformity = interior_uniformity(
                        &integral,
                        left.pos,
                        top.pos,
                        width,
                        height,
                    );
                    let support = (top_cov
                        + bottom_cov
                        + left.coverage(top.pos, bottom.pos)
                        + right.coverage(top.pos, bottom.pos))
                        / 4.0;

                    let score = 0.25 * area_score
                        + 0.2 * centre_score
                        + 0.35 * uniformity
                        + 0.2 * support;
                    if best.is_none_or(|(s, _)| score > s) {
                        best = Some((
                            score,
                            Corners::from_rect(left.pos, top.pos, width, height),
                        ));
                    }
                }
            }
        }
    }

    let (score, corners) = best?;
    debug!(score, "best frame candidate");
    if score < MIN_SCORE {
        return None;
    }
    Some(Candidate {
        corners,
        confidence: score.min(MAX_CONFIDENCE),
    })
}

/// `1 - std/UNIFORM_STD` over the inset interior, clamped to `[0, 1]`.
fn interior_uniformity(integral: &IntegralImage, x: f64, y: f64, w: f64, h: f64) -> f64 {
    let x0 = x + w * INTERIOR_INSET;
    let y0 = y + h * INTERIOR_INSET;
    let x1 = x + w * (1.0 - INTERIOR_INSET);
    let y1 = y + h * (1.0 - INTERIOR_INSET);
    let (_, variance) = integral.mean_variance(
        x0.max(0.0).round() as u32,
        y0.max(0.0).round() as u32,
        x1.max(0.0).round() as u32,
        y1.max(0.0).round() as u32,
    );
    1.0 - (variance.sqrt() / UNIFORM_STD).min(1.0)
}

/// Collect edge runs along each of `across` lines of length `along`, then
/// merge runs on adjacent lines into single edges. `hit(a, i)` tests the
/// pixel at line `a`, offset `i`.
fn extract_lines(
    across: u32,
    along: u32,
    min_len: u32,
    hit: impl Fn(u32, u32) -> bool,
) -> Vec<EdgeLine> {
    let mut building: Vec<Building> = Vec::new();

    for a in 0..across {
        let mut run: Option<(u32, u32)> = None;
        let mut runs = Vec::new();
        for i in 0..along {
            if hit(a, i) {
                run = Some(match run {
                    Some((start, _)) => (start, i),
                    None => (i, i),
                });
            } else if let Some((start, last)) = run {
                if i - last > MAX_GAP {
                    runs.push((start, last));
                    run = None;
                }
            }
        }
        if let Some(open) = run {
            runs.push(open);
        }

        for (start, end) in runs {
            if end - start + 1 < min_len {
                continue;
            }
            let existing = building.iter_mut().find(|b| {
                b.across_max + 1 >= a && start <= b.end && end >= b.start
            });
            match existing {
                Some(line) => {
                    line.across_max = a;
                    line.start = line.start.min(start);
                    line.end = line.end.max(end);
                }
                None => building.push(Building {
                    across_min: a,
                    across_max: a,
                    start,
                    end,
                }),
            }
        }
    }

    let mut lines: Vec<EdgeLine> = building
        .into_iter()
        .map(|b| EdgeLine {
            pos: (b.across_min + b.across_max + 1) as f64 / 2.0,
            start: b.start,
            end: b.end,
        })
        .collect();
    lines.sort_by(|a, b| b.len().cmp(&a.len()));
    lines.truncate(MAX_LINES);
    lines
}
