//! Surface job
//!
//! Runs the whole conforming pipeline for one program: load the toolpath,
//! build the height field, conform, centre, format, deduplicate and write.
//!
//! Centring moves the conformed path, so heights are sampled where the
//! program was authored, not where it ends up.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use surfacekit_core::Point3D;
use surfacekit_gcode::{
    write_program, GcodeFileReader, GcodeGenerator, GcodeParser, Interpolator, OutputPrecision,
};
use surfacekit_heightmap::{
    smooth, HeightField, HeightSections, SmoothingParams, SmoothingReport, SurfaceMesh,
    DEFAULT_SECTION_MARKER,
};

use crate::centering::PathCentering;
use crate::error::{CamToolError, CamToolResult};
use crate::optimizer::GCodeOptimizer;
use crate::surface_conform::SurfaceConformer;

/// How a section file becomes a height field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSurface {
    pub path: PathBuf,
    /// Prefix of section header lines
    pub marker: String,
    /// Smooth the grid before use
    pub smoothing: Option<SmoothingParams>,
    /// Physical X and Y size the grid should span
    pub dimensions: Option<(f64, f64)>,
    /// Centre the grid's XY extent on the origin
    pub center: bool,
    /// Triangulate the grid and sample the mesh instead
    pub as_mesh: bool,
}

impl SectionSurface {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            marker: DEFAULT_SECTION_MARKER.to_string(),
            smoothing: Some(SmoothingParams::default()),
            dimensions: None,
            center: false,
            as_mesh: false,
        }
    }
}

/// Where the height field comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SurfaceSource {
    Sections(SectionSurface),
    Stl(PathBuf),
}

impl SurfaceSource {
    /// Build the height field, reporting any smoothing that was applied
    pub fn load(&self) -> CamToolResult<(HeightField, Option<SmoothingReport>)> {
        match self {
            SurfaceSource::Stl(path) => Ok((HeightField::from_stl(path)?, None)),
            SurfaceSource::Sections(source) => {
                let sections = HeightSections::read(&source.path, &source.marker)?;
                let mut grid = sections.to_grid()?;

                let report = source.smoothing.as_ref().map(|p| smooth(&mut grid, p));
                if let Some((x_length, y_length)) = source.dimensions {
                    grid.fit_to_dimensions(x_length, y_length);
                }
                if source.center {
                    grid.center_xy();
                }

                let field = if source.as_mesh {
                    HeightField::Mesh(SurfaceMesh::from_grid(&grid))
                } else {
                    HeightField::Grid(grid)
                };
                Ok((field, report))
            }
        }
    }
}

/// Summary of a finished job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub input_lines: usize,
    pub output_lines: usize,
    pub duplicates_removed: usize,
    /// `grid` or `mesh`
    pub surface: String,
    pub smoothing: Option<SmoothingReport>,
}

impl JobSummary {
    pub fn to_json(&self) -> CamToolResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// One conforming run from input program to output program
#[derive(Debug, Clone)]
pub struct SurfaceJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub surface: SurfaceSource,
    pub interpolator: Interpolator,
    pub start_position: Point3D,
    pub centering: Option<PathCentering>,
    pub precision: OutputPrecision,
    pub remove_duplicates: bool,
}

impl SurfaceJob {
    pub fn new(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        surface: SurfaceSource,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            surface,
            interpolator: Interpolator::default(),
            start_position: surfacekit_gcode::DEFAULT_START_POSITION,
            centering: None,
            precision: OutputPrecision::default(),
            remove_duplicates: true,
        }
    }

    pub fn run(&self) -> CamToolResult<JobSummary> {
        if self.interpolator.interpolation_steps == 0 || self.interpolator.arc_steps == 0 {
            return Err(CamToolError::InvalidParameters(
                "interpolation and arc steps must be at least 1".to_string(),
            ));
        }

        let parser = GcodeParser::with_start_position(self.start_position);
        let program = GcodeFileReader::new(&self.input)?.read_program(&parser)?;

        let (field, smoothing) = self.surface.load()?;
        tracing::info!("Using {} height field", field.kind());

        let conformed = SurfaceConformer::new(self.interpolator).conform(
            &program,
            &field,
            parser.start_position(),
        )?;
        let conformed = match &self.centering {
            Some(centering) => centering.apply(&conformed),
            None => conformed,
        };

        let lines = GcodeGenerator::new(self.precision).generate_lines(&conformed);
        let generated = lines.len();
        let lines = if self.remove_duplicates {
            GCodeOptimizer::remove_duplicate_lines(&lines)
        } else {
            lines
        };

        write_program(&self.output, &lines)?;
        tracing::info!("Wrote {} lines to {}", lines.len(), self.output.display());

        Ok(JobSummary {
            input_lines: program.len(),
            output_lines: lines.len(),
            duplicates_removed: generated - lines.len(),
            surface: field.kind().to_string(),
            smoothing,
        })
    }
}
