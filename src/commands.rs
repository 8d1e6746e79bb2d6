//! Command implementations behind the `surfacekit` binary
//!
//! Each function takes the loaded [`Config`] plus explicit paths, so the
//! binary only has to parse arguments and report results.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

use surfacekit_camtools::{LinePatternGenerator, SurfaceJob, SurfaceSource};
use surfacekit_core::{BoundingBox2D, Extent};
use surfacekit_gcode::{write_program, GcodeFileReader, GcodeParser};
use surfacekit_heightmap::{
    read_line_lossy, smooth, HeightSections, RecorderStats, SectionRecorder, SmoothingParams,
    SmoothingReport, SurfaceMesh,
};
use surfacekit_settings::Config;

/// Build a conforming job from settings.
///
/// `surface` is read as an STL mesh when it has an `.stl` extension and as a
/// section file otherwise.
pub fn conform_job(config: &Config, input: &Path, output: &Path, surface: &Path) -> SurfaceJob {
    let is_stl = surface
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("stl"));
    let source = if is_stl {
        SurfaceSource::Stl(surface.to_path_buf())
    } else {
        SurfaceSource::Sections(config.section_surface(surface))
    };

    let mut job = SurfaceJob::new(input, output, source);
    job.interpolator = config.interpolator();
    job.start_position = config.transform.start_position;
    job.centering = config.path_centering();
    job.precision = config.precision();
    job.remove_duplicates = config.output.remove_duplicates;
    job
}

/// Smooth a section file and write the result as a new section file.
///
/// Smoothing runs even when disabled in the settings, since it was asked
/// for explicitly.
pub fn smooth_sections(
    config: &Config,
    input: &Path,
    output: &Path,
) -> anyhow::Result<SmoothingReport> {
    let sections = HeightSections::read(input, &config.heightmap.section_marker)?;
    let mut grid = sections.to_grid()?;

    let params = SmoothingParams {
        threshold: config.smoothing.threshold,
        max_iterations: config.smoothing.max_iterations,
    };
    let report = smooth(&mut grid, &params);
    if !report.converged {
        tracing::warn!(
            "Smoothing stopped after {} passes without converging",
            report.passes
        );
    }

    HeightSections::from_grid(&grid)
        .write(output)
        .with_context(|| format!("writing smoothed sections to {}", output.display()))?;
    Ok(report)
}

/// Triangulate a section file and save it as binary STL
pub fn mesh_from_sections(
    config: &Config,
    input: &Path,
    output: &Path,
) -> anyhow::Result<SurfaceMesh> {
    let sections = HeightSections::read(input, &config.heightmap.section_marker)?;
    let mut grid = sections.to_grid()?;
    if let Some(params) = config.smoothing_params() {
        smooth(&mut grid, &params);
    }
    if let Some((x_length, y_length)) = config.dimensions() {
        grid.fit_to_dimensions(x_length, y_length);
    }

    let mut mesh = SurfaceMesh::from_grid(&grid);
    if mesh.is_empty() {
        anyhow::bail!(
            "{} has no complete grid cells to triangulate",
            input.display()
        );
    }
    if config.heightmap.center {
        mesh = mesh.centered_xy();
    }

    mesh.save_stl(output)?;
    Ok(mesh)
}

/// Write the configured line pattern program, returning its line count
pub fn generate_line_pattern(config: &Config, output: &Path) -> anyhow::Result<usize> {
    let lines = LinePatternGenerator::new(config.line_pattern.clone()).generate_lines()?;
    write_program(output, &lines)?;
    Ok(lines.len())
}

/// Default output path for generated files
pub fn default_output(config: &Config, file_name: &str) -> PathBuf {
    config.output.save_directory.join(file_name)
}

/// Record readings from `input` until it closes
pub fn record_lines<R: BufRead>(
    config: &Config,
    mut input: R,
    output: &Path,
) -> anyhow::Result<RecorderStats> {
    let handle = SectionRecorder::new(output, config.recorder_config()).start()?;
    let sender = handle
        .sender()
        .context("recorder channel closed before input was read")?;

    let mut buf = Vec::new();
    while let Some(line) =
        read_line_lossy(&mut input, &mut buf).context("reading recorder input")?
    {
        if sender.send(line).is_err() {
            break;
        }
    }
    drop(sender);

    Ok(handle.stop()?)
}

/// Toolpath extents as seen by a previewer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewSummary {
    pub commands: usize,
    pub motion_commands: usize,
    pub points: usize,
    pub x: Option<(f64, f64)>,
    pub y: Option<(f64, f64)>,
}

/// Trace a program's display polyline and report its extents
pub fn preview(config: &Config, input: &Path) -> anyhow::Result<PreviewSummary> {
    let parser = GcodeParser::with_start_position(config.transform.start_position);
    let program = GcodeFileReader::new(input)?.read_program(&parser)?;
    let polyline = config
        .interpolator()
        .visual_polyline(&program, parser.start_position());

    let bounds = BoundingBox2D::from_points(&polyline);
    let range = |e: Extent| (e.min, e.max);
    Ok(PreviewSummary {
        commands: program.len(),
        motion_commands: program.motion_count(),
        points: polyline.len(),
        x: bounds.map(|b| range(b.x)),
        y: bounds.map(|b| range(b.y)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use surfacekit_core::Anchor;
    use tempfile::TempDir;

    const SCAN: &str = "--- Section 1 ---\n0.0\n0.0\n\n--- Section 2 ---\n0.0\n3.0\n";

    fn scan(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("scan.txt");
        std::fs::write(&path, SCAN).unwrap();
        path
    }

    #[test]
    fn test_conform_job_uses_settings() {
        let mut config = Config::default();
        config.output.center_program = true;
        config.output.centering_anchor = Anchor::BottomLeft;
        config.transform.arc_steps = 7;

        let job = conform_job(
            &config,
            Path::new("in.nc"),
            Path::new("out.nc"),
            Path::new("scan.txt"),
        );
        assert_eq!(job.interpolator.arc_steps, 7);
        assert!(job.centering.is_some());
        assert!(matches!(job.surface, SurfaceSource::Sections(_)));

        let job = conform_job(
            &config,
            Path::new("in.nc"),
            Path::new("out.nc"),
            Path::new("part.STL"),
        );
        assert!(matches!(job.surface, SurfaceSource::Stl(_)));
    }

    #[test]
    fn test_smooth_sections_writes_file() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("smoothed.txt");
        let report = smooth_sections(&Config::default(), &scan(&dir), &output).unwrap();

        assert!(report.passes >= 1);
        let smoothed = HeightSections::read(&output, "---").unwrap();
        assert_eq!(smoothed.len(), 2);
        assert_eq!(smoothed.reading_count(), 4);
    }

    #[test]
    fn test_mesh_from_sections() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("surface.stl");
        let mesh = mesh_from_sections(&Config::default(), &scan(&dir), &output).unwrap();

        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(SurfaceMesh::load_stl(&output).unwrap().triangle_count(), 2);
    }

    #[test]
    fn test_generate_line_pattern() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("pattern.nc");
        let count = generate_line_pattern(&Config::default(), &output).unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text.lines().count(), count);
        assert!(text.starts_with("M6 T9\n"));
    }

    #[test]
    fn test_record_lines_until_input_closes() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("scan.txt");
        let input = Cursor::new("8150\n8250\nready\n");
        let stats = record_lines(&Config::default(), input, &output).unwrap();

        assert_eq!(stats.readings, 2);
        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text, "--- Section 1 ---\n0.00\n1.00\n");
    }

    #[test]
    fn test_record_lines_skips_garbled_line() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("scan.txt");
        let mut bytes = b"8150\n".to_vec();
        bytes.extend_from_slice(&[0x80, b'7', b'\n']);
        bytes.extend_from_slice(b"8250\n");

        let stats = record_lines(&Config::default(), Cursor::new(bytes), &output).unwrap();
        assert_eq!(stats.readings, 2);
        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text, "--- Section 1 ---\n0.00\n1.00\n");
    }

    #[test]
    fn test_preview_extents() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.nc");
        std::fs::write(&input, "G0 X0 Y0\nG1 X10 Y5\nM30\n").unwrap();

        let summary = preview(&Config::default(), &input).unwrap();
        assert_eq!(summary.commands, 3);
        assert_eq!(summary.motion_commands, 2);
        assert_eq!(summary.x, Some((0.0, 10.0)));
        assert_eq!(summary.y, Some((0.0, 5.0)));

        let json: serde_json::Value = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["motion_commands"], 2);
        assert_eq!(json["x"], serde_json::json!([0.0, 10.0]));
    }
}
