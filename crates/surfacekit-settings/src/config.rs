//! Configuration for SurfaceKit
//!
//! Provides the settings model, validation and file handling. Supports JSON
//! and TOML files, stored by default in the platform config directory.
//!
//! Configuration is organized into sections:
//! - Toolpath transform (interpolation density, start position)
//! - Height-map smoothing
//! - Program output (precision, centering, dedup)
//! - Height-map loading (section marker, physical size, mesh)
//! - Section recorder (serial port, sensor calibration)
//! - Line pattern generator

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use surfacekit_camtools::{LinePatternParameters, PathCentering, SectionSurface};
use surfacekit_core::{Anchor, Point3D};
use surfacekit_gcode::{Interpolator, OutputPrecision, DEFAULT_START_POSITION};
use surfacekit_heightmap::{RecorderConfig, SmoothingParams, DEFAULT_SECTION_MARKER};

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};

const APP_DIR: &str = "surfacekit";
const CONFIG_FILE: &str = "config.toml";
/// Most decimal places an output word may carry
const MAX_DECIMALS: usize = 10;

/// On-disk configuration format, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

/// Toolpath transform settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSettings {
    /// Segments per linear move
    pub interpolation_steps: usize,
    /// Segments per arc
    pub arc_steps: usize,
    /// Segments per arc in previews
    pub visual_arc_steps: usize,
    /// Machine position before the first command
    pub start_position: Point3D,
}

impl Default for TransformSettings {
    fn default() -> Self {
        let interpolator = Interpolator::default();
        Self {
            interpolation_steps: interpolator.interpolation_steps,
            arc_steps: interpolator.arc_steps,
            visual_arc_steps: interpolator.visual_arc_steps,
            start_position: DEFAULT_START_POSITION,
        }
    }
}

/// Height-map smoothing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingSettings {
    pub enabled: bool,
    /// Largest accepted difference between neighbouring readings
    pub threshold: f64,
    pub max_iterations: usize,
}

impl Default for SmoothingSettings {
    fn default() -> Self {
        let params = SmoothingParams::default();
        Self {
            enabled: true,
            threshold: params.threshold,
            max_iterations: params.max_iterations,
        }
    }
}

/// Program output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub axis_decimals: usize,
    pub feed_decimals: usize,
    pub spindle_decimals: usize,
    /// Move the program so `centering_anchor` lands on the origin
    pub center_program: bool,
    pub centering_anchor: Anchor,
    /// Collapse consecutive identical output lines
    pub remove_duplicates: bool,
    /// Where generated files go when no path is given
    pub save_directory: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        let precision = OutputPrecision::default();
        Self {
            axis_decimals: precision.axis_decimals,
            feed_decimals: precision.feed_decimals,
            spindle_decimals: precision.spindle_decimals,
            center_program: false,
            centering_anchor: Anchor::Center,
            remove_duplicates: true,
            save_directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

/// Height-map loading settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightMapSettings {
    /// Prefix that opens a new section in a section file
    pub section_marker: String,
    /// Physical X size the grid spans, if known
    pub x_length: Option<f64>,
    /// Physical Y size the grid spans, if known
    pub y_length: Option<f64>,
    /// Centre the grid on the XY origin
    pub center: bool,
    /// Sample a triangulated mesh instead of the raw grid
    pub use_mesh: bool,
}

impl Default for HeightMapSettings {
    fn default() -> Self {
        Self {
            section_marker: DEFAULT_SECTION_MARKER.to_string(),
            x_length: None,
            y_length: None,
            center: false,
            use_mesh: false,
        }
    }
}

/// Section recorder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderSettings {
    /// Serial port name, empty to read from stdin
    pub serial_port: String,
    pub baud_rate: u32,
    /// Serial read timeout in milliseconds
    pub timeout_ms: u64,
    pub zero_point: f64,
    pub scale: f64,
    pub section_gap_ms: u64,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        let recorder = RecorderConfig::default();
        Self {
            serial_port: String::new(),
            baud_rate: 9600,
            timeout_ms: 100,
            zero_point: recorder.zero_point,
            scale: recorder.scale,
            section_gap_ms: recorder.section_gap_ms,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub transform: TransformSettings,
    pub smoothing: SmoothingSettings,
    pub output: OutputSettings,
    pub heightmap: HeightMapSettings,
    pub recorder: RecorderSettings,
    pub line_pattern: LinePatternParameters,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform config location, e.g. `~/.config/surfacekit/config.toml`
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no platform config directory".to_string())
            })
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = ConfigFormat::from_path(path)?;
        let content =
            std::fs::read_to_string(path).map_err(|e| SettingsError::io(path, e))?;

        let config: Self = match format {
            ConfigFormat::Json => serde_json::from_str(&content)?,
            ConfigFormat::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML), creating parent directories
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match ConfigFormat::from_path(path)? {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| SettingsError::io(parent, e))?;
        }
        std::fs::write(path, content).map_err(|e| SettingsError::io(path, e))?;
        Ok(())
    }

    /// Load `path`, writing the defaults there first if it does not exist
    pub fn load_or_create(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            return Self::load_from_file(path);
        }

        let config = Self::default();
        config.save_to_file(path)?;
        tracing::info!("Created default config at {}", path.display());
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.transform.interpolation_steps == 0 {
            return Err(ConfigError::out_of_range("transform.interpolation_steps", 0));
        }
        if self.transform.arc_steps == 0 {
            return Err(ConfigError::out_of_range("transform.arc_steps", 0));
        }
        if self.transform.visual_arc_steps == 0 {
            return Err(ConfigError::out_of_range("transform.visual_arc_steps", 0));
        }

        if !(self.smoothing.threshold > 0.0 && self.smoothing.threshold.is_finite()) {
            return Err(ConfigError::out_of_range(
                "smoothing.threshold",
                self.smoothing.threshold,
            ));
        }

        for (key, decimals) in [
            ("output.axis_decimals", self.output.axis_decimals),
            ("output.feed_decimals", self.output.feed_decimals),
            ("output.spindle_decimals", self.output.spindle_decimals),
        ] {
            if decimals > MAX_DECIMALS {
                return Err(ConfigError::out_of_range(key, decimals));
            }
        }

        if self.heightmap.section_marker.trim().is_empty() {
            return Err(ConfigError::out_of_range("heightmap.section_marker", "\"\""));
        }
        for (key, length) in [
            ("heightmap.x_length", self.heightmap.x_length),
            ("heightmap.y_length", self.heightmap.y_length),
        ] {
            if let Some(length) = length.filter(|l| !(*l > 0.0 && l.is_finite())) {
                return Err(ConfigError::out_of_range(key, length));
            }
        }

        if self.recorder.baud_rate == 0 {
            return Err(ConfigError::out_of_range("recorder.baud_rate", 0));
        }
        if self.recorder.scale == 0.0 || !self.recorder.scale.is_finite() {
            return Err(ConfigError::out_of_range("recorder.scale", self.recorder.scale));
        }
        if self.recorder.section_gap_ms == 0 {
            return Err(ConfigError::out_of_range("recorder.section_gap_ms", 0));
        }

        self.line_pattern
            .validate()
            .map_err(|e| ConfigError::out_of_range("line_pattern", e))
    }

    pub fn interpolator(&self) -> Interpolator {
        Interpolator {
            interpolation_steps: self.transform.interpolation_steps,
            arc_steps: self.transform.arc_steps,
            visual_arc_steps: self.transform.visual_arc_steps,
        }
    }

    /// Smoothing parameters, `None` when smoothing is disabled
    pub fn smoothing_params(&self) -> Option<SmoothingParams> {
        self.smoothing.enabled.then_some(SmoothingParams {
            threshold: self.smoothing.threshold,
            max_iterations: self.smoothing.max_iterations,
        })
    }

    pub fn precision(&self) -> OutputPrecision {
        OutputPrecision {
            axis_decimals: self.output.axis_decimals,
            feed_decimals: self.output.feed_decimals,
            spindle_decimals: self.output.spindle_decimals,
        }
    }

    /// Program centering, `None` when disabled
    pub fn path_centering(&self) -> Option<PathCentering> {
        self.output
            .center_program
            .then(|| PathCentering::new(self.output.centering_anchor))
    }

    pub fn recorder_config(&self) -> RecorderConfig {
        RecorderConfig {
            zero_point: self.recorder.zero_point,
            scale: self.recorder.scale,
            section_gap_ms: self.recorder.section_gap_ms,
        }
    }

    /// Physical grid size, only when both axes are set
    pub fn dimensions(&self) -> Option<(f64, f64)> {
        self.heightmap.x_length.zip(self.heightmap.y_length)
    }

    /// Height-field source for a section file using these settings
    pub fn section_surface(&self, path: impl Into<PathBuf>) -> SectionSurface {
        SectionSurface {
            path: path.into(),
            marker: self.heightmap.section_marker.clone(),
            smoothing: self.smoothing_params(),
            dimensions: self.dimensions(),
            center: self.heightmap.center,
            as_mesh: self.heightmap.use_mesh,
        }
    }
}
