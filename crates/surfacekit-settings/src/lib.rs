//! SurfaceKit Settings Crate
//!
//! Handles application configuration, validation and persistence.

pub mod config;
pub mod error;

pub use config::{
    Config, ConfigFormat, HeightMapSettings, OutputSettings, RecorderSettings, SmoothingSettings,
    TransformSettings,
};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
