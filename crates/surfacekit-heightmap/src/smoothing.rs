//! Height-map smoothing
//!
//! Repeatedly averages neighbouring cells whose heights differ by more than a
//! threshold, which flattens single-reading probe spikes.

use serde::{Deserialize, Serialize};

use crate::grid::HeightGrid;

/// Smoothing parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothingParams {
    /// Largest accepted height difference between neighbours
    pub threshold: f64,
    /// Upper bound on passes over the grid
    pub max_iterations: usize,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            max_iterations: 10,
        }
    }
}

/// Outcome of a smoothing run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SmoothingReport {
    /// Passes performed
    pub passes: usize,
    /// Pairs averaged across all passes
    pub adjustments: usize,
    /// True if the last pass changed nothing
    pub converged: bool,
}

/// Smooth `grid` in place.
///
/// Each pass walks the cells in row-major order. At every cell the pair with
/// its right neighbour is checked first, then the pair with the cell below.
/// Pairs differing by more than the threshold are both set to their mean.
/// Pairs touching a cell without a reading are left alone.
pub fn smooth(grid: &mut HeightGrid, params: &SmoothingParams) -> SmoothingReport {
    let mut report = SmoothingReport::default();

    for _ in 0..params.max_iterations {
        let adjustments = smoothing_pass(grid, params.threshold);
        report.passes += 1;
        report.adjustments += adjustments;
        tracing::debug!("Smoothing pass {}: {} adjustments", report.passes, adjustments);

        if adjustments == 0 {
            report.converged = true;
            break;
        }
    }

    tracing::info!(
        "Smoothing finished after {} passes ({} adjustments, converged: {})",
        report.passes,
        report.adjustments,
        report.converged
    );
    report
}

fn smoothing_pass(grid: &mut HeightGrid, threshold: f64) -> usize {
    let mut adjustments = 0;
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            if col + 1 < grid.cols() && average_pair(grid, (row, col), (row, col + 1), threshold) {
                adjustments += 1;
            }
            if row + 1 < grid.rows() && average_pair(grid, (row, col), (row + 1, col), threshold) {
                adjustments += 1;
            }
        }
    }
    adjustments
}

fn average_pair(
    grid: &mut HeightGrid,
    a: (usize, usize),
    b: (usize, usize),
    threshold: f64,
) -> bool {
    let (Some(ha), Some(hb)) = (grid.get(a.0, a.1), grid.get(b.0, b.1)) else {
        return false;
    };
    if ha.is_nan() || hb.is_nan() || (ha - hb).abs() <= threshold {
        return false;
    }

    let mean = (ha + hb) / 2.0;
    grid.set(a.0, a.1, mean);
    grid.set(b.0, b.1, mean);
    true
}

/// True if no two neighbouring readings differ by more than `threshold`
pub fn is_smooth(grid: &HeightGrid, threshold: f64) -> bool {
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            let Some(h) = grid.get(row, col).filter(|h| !h.is_nan()) else {
                continue;
            };
            for (r, c) in [(row, col + 1), (row + 1, col)] {
                if let Some(n) = grid.get(r, c).filter(|n| !n.is_nan()) {
                    if (h - n).abs() > threshold {
                        return false;
                    }
                }
            }
        }
    }
    true
}
