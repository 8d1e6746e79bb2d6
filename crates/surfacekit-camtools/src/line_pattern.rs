//! Line pattern generator
//!
//! Produces the raster program used to probe or mark a surface: parallel
//! lines along X, centred on the origin, each switched on and off with
//! `M63`/`M64` around the cutting move.

use serde::{Deserialize, Serialize};

use crate::error::{ParameterError, ParameterResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinePatternParameters {
    pub line_count: usize,
    /// Distance between lines along Y
    pub line_spacing: f64,
    /// Length of each line along X
    pub x_length: f64,
    pub feed_rate_cut: f64,
    pub feed_rate_rapid: f64,
    /// Dwell after plunging and at program start, in milliseconds
    pub dwell_ms: u64,
}

impl Default for LinePatternParameters {
    fn default() -> Self {
        Self {
            line_count: 10,
            line_spacing: 5.0,
            x_length: 100.0,
            feed_rate_cut: 1200.0,
            feed_rate_rapid: 3000.0,
            dwell_ms: 100,
        }
    }
}

impl LinePatternParameters {
    pub fn validate(&self) -> ParameterResult<()> {
        if self.line_count == 0 {
            return Err(ParameterError::OutOfRange {
                name: "line_count".to_string(),
                value: 0.0,
                min: 1.0,
                max: f64::from(u32::MAX),
            });
        }
        for (name, value) in [
            ("line_spacing", self.line_spacing),
            ("x_length", self.x_length),
            ("feed_rate_cut", self.feed_rate_cut),
            ("feed_rate_rapid", self.feed_rate_rapid),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ParameterError::not_positive(name, value));
            }
        }
        Ok(())
    }
}

pub struct LinePatternGenerator {
    params: LinePatternParameters,
}

impl LinePatternGenerator {
    pub fn new(params: LinePatternParameters) -> Self {
        Self { params }
    }

    /// Y position of every line, top line first
    pub fn line_positions(&self) -> Vec<f64> {
        let p = &self.params;
        let y_start = (p.line_count.saturating_sub(1)) as f64 * p.line_spacing / 2.0;
        (0..p.line_count)
            .map(|i| y_start - i as f64 * p.line_spacing)
            .collect()
    }

    pub fn generate_lines(&self) -> ParameterResult<Vec<String>> {
        self.params.validate()?;
        let p = &self.params;

        let mut gcode = vec![
            "M6 T9".to_string(),
            "G43 H9".to_string(),
            "G54".to_string(),
            "G0 X0.000 Y0.000".to_string(),
            format!("G4 P{}", p.dwell_ms),
        ];

        let x_start = -p.x_length / 2.0;
        let x_end = p.x_length / 2.0;

        for y in self.line_positions() {
            gcode.push(format!("G0 X{:.3} Y{:.3} Z1.000", x_start, y));
            gcode.push(format!("G1 Z0.000 F{:.1}", p.feed_rate_cut));
            gcode.push(format!("G4 P{}", p.dwell_ms));
            gcode.push("M63".to_string());
            gcode.push(format!("G1 X{:.3} F{:.1}", x_end, p.feed_rate_rapid));
            gcode.push("M64".to_string());
            gcode.push("G0 Z1.000".to_string());
        }

        gcode.push("G0 Z20.000".to_string());
        gcode.push("G0 X0.000 Y0.000".to_string());
        gcode.push("M30".to_string());

        tracing::info!(
            "Generated line pattern: {} lines, {} program lines",
            p.line_count,
            gcode.len()
        );
        Ok(gcode)
    }

    pub fn generate(&self) -> ParameterResult<String> {
        Ok(self.generate_lines()?.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pattern_layout() {
        let lines = LinePatternGenerator::new(LinePatternParameters::default())
            .generate_lines()
            .unwrap();
        assert_eq!(lines.len(), 5 + 10 * 7 + 3);
        assert_eq!(&lines[..5], ["M6 T9", "G43 H9", "G54", "G0 X0.000 Y0.000", "G4 P100"]);
        assert_eq!(lines[5], "G0 X-50.000 Y22.500 Z1.000");
        assert_eq!(lines[6], "G1 Z0.000 F1200.0");
        assert_eq!(lines[9], "G1 X50.000 F3000.0");
        assert_eq!(lines[5 + 9 * 7], "G0 X-50.000 Y-22.500 Z1.000");
        assert_eq!(lines.last().map(String::as_str), Some("M30"));
    }

    #[test]
    fn test_single_line_on_axis() {
        let gen = LinePatternGenerator::new(LinePatternParameters {
            line_count: 1,
            ..LinePatternParameters::default()
        });
        assert_eq!(gen.line_positions(), vec![0.0]);
    }

    #[test]
    fn test_invalid_parameters() {
        let gen = LinePatternGenerator::new(LinePatternParameters {
            line_count: 0,
            ..LinePatternParameters::default()
        });
        assert!(matches!(
            gen.generate(),
            Err(ParameterError::OutOfRange { .. })
        ));

        let gen = LinePatternGenerator::new(LinePatternParameters {
            x_length: -1.0,
            ..LinePatternParameters::default()
        });
        assert!(matches!(
            gen.generate(),
            Err(ParameterError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_generated_program_parses() {
        let text = LinePatternGenerator::new(LinePatternParameters::default())
            .generate()
            .unwrap();
        let seq = surfacekit_gcode::GcodeParser::new().parse(&text);
        assert_eq!(seq.motion_count(), 1 + 10 * 4 + 2);
    }
}
