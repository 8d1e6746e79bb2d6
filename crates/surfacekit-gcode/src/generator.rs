//! G-Code line generation
//!
//! Serializes commands in canonical word order `G X Y Z I J F S`. Absent
//! fields are omitted and a motion line's comment is appended unchanged.

use serde::{Deserialize, Serialize};

use crate::command::{CommandSequence, Coordinate, MotionCommand};

/// Decimal places used when formatting words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPrecision {
    /// X, Y, Z, I and J
    pub axis_decimals: usize,
    /// F
    pub feed_decimals: usize,
    /// S
    pub spindle_decimals: usize,
}

impl Default for OutputPrecision {
    fn default() -> Self {
        Self {
            axis_decimals: 4,
            feed_decimals: 1,
            spindle_decimals: 0,
        }
    }
}

/// Formats commands back into G-code text
#[derive(Debug, Clone, Copy, Default)]
pub struct GcodeGenerator {
    precision: OutputPrecision,
}

impl GcodeGenerator {
    pub fn new(precision: OutputPrecision) -> Self {
        Self { precision }
    }

    pub fn precision(&self) -> OutputPrecision {
        self.precision
    }

    /// Format one command as a single line
    pub fn format_command(&self, command: &MotionCommand) -> String {
        let (Some(word), Some(line)) = (command.g_word(), command.motion()) else {
            return match command {
                MotionCommand::Other(raw) => raw.clone(),
                _ => String::new(),
            };
        };

        let mut out = String::from(word);
        self.push_words(&mut out, &line.coordinate);
        if let Some(comment) = &line.comment {
            out.push(' ');
            out.push_str(comment);
        }
        out
    }

    fn push_words(&self, out: &mut String, c: &Coordinate) {
        let p = self.precision;
        let words = [
            ('X', c.x, p.axis_decimals),
            ('Y', c.y, p.axis_decimals),
            ('Z', c.z, p.axis_decimals),
            ('I', c.i, p.axis_decimals),
            ('J', c.j, p.axis_decimals),
            ('F', c.f, p.feed_decimals),
            ('S', c.s, p.spindle_decimals),
        ];

        for (letter, value, decimals) in words {
            if let Some(value) = value {
                out.push(' ');
                out.push(letter);
                out.push_str(&format_value(value, decimals));
            }
        }
    }

    /// Format every command, one line each
    pub fn generate_lines(&self, sequence: &CommandSequence) -> Vec<String> {
        sequence.iter().map(|c| self.format_command(c)).collect()
    }

    /// Format a whole program, newline terminated
    pub fn generate(&self, sequence: &CommandSequence) -> String {
        let mut text = self.generate_lines(sequence).join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        text
    }
}

/// Round `value` to `decimals` places, never printing a negative zero
pub fn format_value(value: f64, decimals: usize) -> String {
    let multiplier = 10f64.powi(decimals.min(i32::MAX as usize) as i32);
    let scaled = value * multiplier;
    if !scaled.is_finite() {
        return format!("{:.*}", decimals, value);
    }
    let mut rounded = scaled.round() / multiplier;
    if rounded == 0.0 {
        rounded = 0.0;
    }
    format!("{:.*}", decimals, rounded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::MotionLine;

    #[test]
    fn test_canonical_order_and_precision() {
        let gen = GcodeGenerator::default();
        let coord = Coordinate {
            x: Some(1.0),
            y: Some(2.123456),
            z: Some(-0.5),
            f: Some(100.0),
            s: Some(12000.0),
            i: Some(0.25),
            j: Some(-3.0),
        };
        let cmd = MotionCommand::ArcCw(MotionLine::new(coord));
        assert_eq!(
            gen.format_command(&cmd),
            "G2 X1.0000 Y2.1235 Z-0.5000 I0.2500 J-3.0000 F100.0 S12000"
        );
    }

    #[test]
    fn test_absent_fields_omitted() {
        let gen = GcodeGenerator::default();
        let cmd = MotionCommand::rapid(Coordinate::new().with_z(5.0));
        assert_eq!(gen.format_command(&cmd), "G0 Z5.0000");
    }

    #[test]
    fn test_negative_zero_suppressed() {
        assert_eq!(format_value(-0.00001, 4), "0.0000");
        assert_eq!(format_value(-0.0, 1), "0.0");
        assert_eq!(format_value(-0.00006, 4), "-0.0001");
    }

    #[test]
    fn test_comment_appended() {
        let gen = GcodeGenerator::default();
        let cmd = MotionCommand::Linear(
            MotionLine::new(Coordinate::new().with_x(1.0)).with_comment("; edge"),
        );
        assert_eq!(gen.format_command(&cmd), "G1 X1.0000 ; edge");
    }

    #[test]
    fn test_other_emitted_raw() {
        let gen = GcodeGenerator::default();
        let cmd = MotionCommand::Other("  M3 S1000 (spindle)".to_string());
        assert_eq!(gen.format_command(&cmd), "  M3 S1000 (spindle)");
    }

    #[test]
    fn test_custom_precision() {
        let gen = GcodeGenerator::new(OutputPrecision {
            axis_decimals: 2,
            feed_decimals: 0,
            spindle_decimals: 0,
        });
        let cmd = MotionCommand::linear(Coordinate::new().with_x(1.004).with_feed(99.6));
        assert_eq!(gen.format_command(&cmd), "G1 X1.00 F100");
    }

    #[test]
    fn test_generate_program() {
        let gen = GcodeGenerator::default();
        let seq: CommandSequence = vec![
            MotionCommand::Other("G21".to_string()),
            MotionCommand::linear(Coordinate::new().with_x(2.0)),
        ]
        .into();
        assert_eq!(gen.generate(&seq), "G21\nG1 X2.0000\n");
        assert_eq!(gen.generate(&CommandSequence::new()), "");
    }

    #[test]
    fn test_format_value_large_inputs_stay_numeric() {
        let text = format_value(1e308, 4);
        assert!(text.ends_with(".0000"));
        assert!(text.parse::<f64>().unwrap().is_finite());

        assert_eq!(format_value(1.5, 400), format!("{:.400}", 1.5));
    }
}
