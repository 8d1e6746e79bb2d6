//! Regular height grid
//!
//! Heights are stored row-major (`row * cols + col`). Columns run along X and
//! rows along Y, both starting at `origin`. NaN marks a cell with no reading.

use serde::{Deserialize, Serialize};
use surfacekit_core::SurfaceError;

/// 2D grid of measured surface heights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightGrid {
    rows: usize,
    cols: usize,
    heights: Vec<f64>,
    /// Distance between columns
    pub spacing_x: f64,
    /// Distance between rows
    pub spacing_y: f64,
    /// World position of cell (0, 0)
    pub origin: (f64, f64),
}

impl HeightGrid {
    /// Create a grid from row-major heights with unit spacing
    pub fn new(rows: usize, cols: usize, heights: Vec<f64>) -> Result<Self, SurfaceError> {
        if rows == 0 || cols == 0 {
            return Err(SurfaceError::invalid_grid(format!(
                "grid must have at least one row and column, got {}x{}",
                rows, cols
            )));
        }
        if heights.len() != rows * cols {
            return Err(SurfaceError::invalid_grid(format!(
                "expected {} heights for a {}x{} grid, got {}",
                rows * cols,
                rows,
                cols,
                heights.len()
            )));
        }

        Ok(Self {
            rows,
            cols,
            heights,
            spacing_x: 1.0,
            spacing_y: 1.0,
            origin: (0.0, 0.0),
        })
    }

    /// Grid of `rows` x `cols` cells all at `height`
    pub fn filled(rows: usize, cols: usize, height: f64) -> Result<Self, SurfaceError> {
        Self::new(rows, cols, vec![height; rows * cols])
    }

    /// Build a grid with one row per entry of `rows`.
    ///
    /// The column count is the longest row; shorter rows are padded with NaN.
    /// `source` names the data in the error returned when there is nothing to
    /// build from.
    pub fn from_rows(rows: &[Vec<f64>], source: &str) -> Result<Self, SurfaceError> {
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        if rows.is_empty() || cols == 0 {
            return Err(SurfaceError::data_empty(source));
        }

        let mut heights = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            heights.extend_from_slice(row);
            heights.extend(std::iter::repeat(f64::NAN).take(cols - row.len()));
        }

        Self::new(rows.len(), cols, heights)
    }

    pub fn with_spacing(mut self, spacing_x: f64, spacing_y: f64) -> Self {
        self.spacing_x = spacing_x;
        self.spacing_y = spacing_y;
        self
    }

    pub fn with_origin(mut self, x: f64, y: f64) -> Self {
        self.origin = (x, y);
        self
    }

    /// Set spacing so the grid spans `x_length` by `y_length`.
    ///
    /// An axis with a single sample keeps its spacing.
    pub fn fit_to_dimensions(&mut self, x_length: f64, y_length: f64) {
        if self.cols > 1 {
            self.spacing_x = x_length / (self.cols - 1) as f64;
        }
        if self.rows > 1 {
            self.spacing_y = y_length / (self.rows - 1) as f64;
        }
    }

    /// Move the origin so the grid's XY extent is centred on (0, 0)
    pub fn center_xy(&mut self) {
        self.origin = (
            -((self.cols - 1) as f64) * self.spacing_x / 2.0,
            -((self.rows - 1) as f64) * self.spacing_y / 2.0,
        );
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    /// Raw value at a cell, NaN included
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.heights[row * self.cols + col])
    }

    pub fn set(&mut self, row: usize, col: usize, height: f64) {
        if row < self.rows && col < self.cols {
            self.heights[row * self.cols + col] = height;
        }
    }

    /// True if the cell exists and holds a reading
    pub fn is_valid(&self, row: usize, col: usize) -> bool {
        self.get(row, col).is_some_and(|h| !h.is_nan())
    }

    /// Number of cells holding a reading
    pub fn valid_count(&self) -> usize {
        self.heights.iter().filter(|h| !h.is_nan()).count()
    }

    /// World XY position of a cell
    pub fn cell_position(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.origin.0 + col as f64 * self.spacing_x,
            self.origin.1 + row as f64 * self.spacing_y,
        )
    }

    /// Cell nearest to (x, y), clamped to the grid
    pub fn nearest_cell(&self, x: f64, y: f64) -> (usize, usize) {
        let col = axis_index(x - self.origin.0, self.spacing_x, self.cols);
        let row = axis_index(y - self.origin.1, self.spacing_y, self.rows);
        (row, col)
    }

    /// Height nearest to (x, y).
    ///
    /// When the nearest cell has no reading, the closest cell that does is
    /// used. Returns `None` only if no cell holds a reading.
    pub fn nearest_height(&self, x: f64, y: f64) -> Option<f64> {
        let (row, col) = self.nearest_cell(x, y);
        let h = self.heights[row * self.cols + col];
        if !h.is_nan() {
            return Some(h);
        }

        let mut best: Option<(f64, f64)> = None;
        for r in 0..self.rows {
            for c in 0..self.cols {
                let h = self.heights[r * self.cols + c];
                if h.is_nan() {
                    continue;
                }
                let (cx, cy) = self.cell_position(r, c);
                let d = (cx - x).hypot(cy - y);
                if best.map_or(true, |(bd, _)| d < bd) {
                    best = Some((d, h));
                }
            }
        }
        best.map(|(_, h)| h)
    }

    /// Rows as separate vectors, NaN padding included
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.heights.chunks(self.cols).map(<[f64]>::to_vec).collect()
    }
}

fn axis_index(offset: f64, spacing: f64, count: usize) -> usize {
    if count <= 1 || spacing <= 0.0 || !offset.is_finite() {
        return 0;
    }
    let index = (offset / spacing).round();
    if index <= 0.0 {
        0
    } else {
        (index as usize).min(count - 1)
    }
}
