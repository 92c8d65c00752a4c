// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Largest all-true rectangle in a boolean grid.
//
// Each row is treated as the base of a histogram whose bar heights count
// consecutive `true` cells upward; the largest rectangle under each
// histogram is found with a monotonic stack. O(rows * cols).

/// A rectangle of grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRect {
    pub row: usize,
    pub col: usize,
    pub rows: usize,
    pub cols: usize,
}

impl GridRect {
    pub fn area(&self) -> usize {
        self.rows * self.cols
    }
}

/// Find the maximum-area rectangle of `true` cells. Ragged rows are treated
/// as padded with `false`. Ties keep the first rectangle found scanning
/// top-to-bottom, left-to-right.
pub fn largest_rectangle(grid: &[Vec<bool>]) -> Option<GridRect> {
    let cols = grid.iter().map(Vec::len).max().unwrap_or(0);
    if cols == 0 {
        return None;
    }

    let mut heights = vec![0usize; cols];
    let mut best: Option<GridRect> = None;
    let mut stack: Vec<usize> = Vec::with_capacity(cols + 1);

    for (row_idx, row) in grid.iter().enumerate() {
        for (col, height) in heights.iter_mut().enumerate() {
            *height = if row.get(col).copied().unwrap_or(false) {
                *height + 1
            } else {
                0
            };
        }

        stack.clear();
        // Sentinel pass at `col == cols` with height 0 flushes the stack.
        for col in 0..=cols {
            let h = if col < cols { heights[col] } else { 0 };
            while let Some(&top) = stack.last() {
                if heights[top] <= h {
                    break;
                }
                stack.pop();
                let bar = heights[top];
                let left = stack.last().map_or(0, |&i| i + 1);
                let width = col - left;
                let area = bar * width;
                if best.is_none_or(|b| area > b.area()) {
                    best = Some(GridRect {
                        row: row_idx + 1 - bar,
                        col: left,
                        rows: bar,
                        cols: width,
                    });
                }
            }
            stack.push(col);
        }
    }

    best.filter(|rect| rect.area() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(rows: &[&str]) -> Vec<Vec<bool>> {
        rows.iter()
            .map(|r| r.chars().map(|c| c == '#').collect())
            .collect()
    }

    #[test]
    fn empty_grid_has_no_rectangle() {
        assert_eq!(largest_rectangle(&[]), None);
        assert_eq!(largest_rectangle(&parse(&["....", "...."])), None);
    }

    #[test]
    fn full_grid_is_one_rectangle() {
        let grid = parse(&["###", "###"]);
        assert_eq!(
            largest_rectangle(&grid),
            Some(GridRect {
                row: 0,
                col: 0,
                rows: 2,
                cols: 3
            })
        );
    }

    #[test]
    fn finds_interior_block() {
        let grid = parse(&[
            "#.......",
            "..####..",
            "..####.#",
            "..####..",
            "##......",
        ]);
        assert_eq!(
            largest_rectangle(&grid),
            Some(GridRect {
                row: 1,
                col: 2,
                rows: 3,
                cols: 4
            })
        );
    }

    #[test]
    fn prefers_wide_shallow_over_tall_narrow_when_larger() {
        let grid = parse(&[
            "#.........",
            "#.........",
            "#.........",
            "#.........",
            "##########",
            "##########",
            "##########",
        ]);
        let rect = largest_rectangle(&grid).expect("rect");
        assert_eq!(rect.area(), 30);
        assert_eq!((rect.row, rect.col, rect.rows, rect.cols), (4, 0, 3, 10));
    }

    #[test]
    fn staircase_histogram() {
        // Column heights 1,2,3,4 at the bottom row: best is 2x3 = 6.
        let grid = parse(&["...#", "..##", ".###", "####"]);
        let rect = largest_rectangle(&grid).expect("rect");
        assert_eq!(rect.area(), 6);
    }

    #[test]
    fn ragged_rows_are_padded() {
        let grid = vec![vec![true, true, true], vec![true, true]];
        let rect = largest_rectangle(&grid).expect("rect");
        assert_eq!(rect.area(), 4);
        assert_eq!((rect.rows, rect.cols), (2, 2));
    }
}
