//! Height-map section files
//!
//! A section file holds probe readings grouped into sections, each opened by
//! a header line:
//!
//! ```text
//! --- Section 1 ---
//! 0.12
//! 0.15
//!
//! --- Section 2 ---
//! 0.11
//! ```
//!
//! Each section becomes one grid row.

use std::fmt::Write as _;
use std::path::Path;

use surfacekit_core::{read_text, write_atomic, Result, SurfaceError};

use crate::grid::HeightGrid;

/// Prefix that opens a new section
pub const DEFAULT_SECTION_MARKER: &str = "---";

/// Header line for section `number` (1-based)
pub fn section_header(number: usize) -> String {
    format!("--- Section {} ---", number)
}

/// Probe readings grouped by section
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeightSections {
    sections: Vec<Vec<f64>>,
    source: String,
}

impl HeightSections {
    pub fn new(sections: Vec<Vec<f64>>) -> Self {
        Self {
            sections,
            source: "height-map sections".to_string(),
        }
    }

    /// Parse section text.
    ///
    /// Lines before the first header are ignored, as are lines that do not
    /// parse as a number.
    pub fn parse(text: &str, marker: &str) -> Self {
        let mut sections: Vec<Vec<f64>> = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.starts_with(marker) {
                sections.push(Vec::new());
                continue;
            }
            if line.is_empty() {
                continue;
            }
            let Some(current) = sections.last_mut() else {
                tracing::debug!("Skipping line {} before first section header", index + 1);
                continue;
            };
            match line.parse::<f64>() {
                Ok(value) => current.push(value),
                Err(_) => tracing::warn!("Skipping unreadable height on line {}: '{}'", index + 1, line),
            }
        }

        Self::new(sections)
    }

    /// Read and parse a section file
    pub fn read(path: impl AsRef<Path>, marker: &str) -> Result<Self> {
        let path = path.as_ref();
        let text = read_text(path)?;
        let mut sections = Self::parse(&text, marker);
        sections.source = path.display().to_string();
        tracing::info!(
            "Read {} sections ({} readings) from {}",
            sections.len(),
            sections.reading_count(),
            path.display()
        );
        Ok(sections)
    }

    /// Sections from grid rows, trailing padding dropped
    pub fn from_grid(grid: &HeightGrid) -> Self {
        let sections = grid
            .to_rows()
            .into_iter()
            .map(|mut row| {
                while row.last().is_some_and(|h| h.is_nan()) {
                    row.pop();
                }
                row
            })
            .collect();
        Self::new(sections)
    }

    pub fn sections(&self) -> &[Vec<f64>] {
        &self.sections
    }

    pub fn push_section(&mut self, readings: Vec<f64>) {
        self.sections.push(readings);
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Total readings across all sections
    pub fn reading_count(&self) -> usize {
        self.sections.iter().map(Vec::len).sum()
    }

    /// Build the height grid, one row per section
    pub fn to_grid(&self) -> std::result::Result<HeightGrid, SurfaceError> {
        HeightGrid::from_rows(&self.sections, &self.source)
    }

    /// Serialize with numbered section headers
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for (index, section) in self.sections.iter().enumerate() {
            if index > 0 {
                text.push('\n');
            }
            let _ = writeln!(text, "{}", section_header(index + 1));
            for value in section {
                let _ = writeln!(text, "{:.4}", value);
            }
        }
        text
    }

    /// Atomically write the section file
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        write_atomic(path, self.to_text().as_bytes())
    }
}
