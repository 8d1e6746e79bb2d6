//! G-Code parser and position tracking
//!
//! Parsing is tolerant: every line yields a [`MotionCommand`], malformed
//! numeric words are dropped with a warning and unrecognised lines are kept
//! verbatim as [`MotionCommand::Other`].

use regex::Regex;
use std::sync::OnceLock;
use surfacekit_core::Point3D;

use crate::command::{CommandSequence, Coordinate, MotionCommand, MotionLine};

/// Default machine position before the first motion command
pub const DEFAULT_START_POSITION: Point3D = Point3D::new(0.0, 0.0, 0.2);

/// Current tool position, folded over a command sequence.
///
/// Axes omitted on a motion line keep their previous value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachinePosition {
    point: Point3D,
}

impl MachinePosition {
    pub fn new(point: Point3D) -> Self {
        Self { point }
    }

    pub fn point(&self) -> Point3D {
        self.point
    }

    /// Position after executing `command`
    pub fn advance(self, command: &MotionCommand) -> Self {
        match command.coordinate() {
            Some(coordinate) => Self {
                point: coordinate.resolve(self.point),
            },
            None => self,
        }
    }
}

impl Default for MachinePosition {
    fn default() -> Self {
        Self::new(DEFAULT_START_POSITION)
    }
}

impl From<Point3D> for MachinePosition {
    fn from(point: Point3D) -> Self {
        Self::new(point)
    }
}

/// G-Code parser
#[derive(Debug, Clone, Copy)]
pub struct GcodeParser {
    start_position: Point3D,
}

impl GcodeParser {
    /// Create a parser seeded at [`DEFAULT_START_POSITION`]
    pub fn new() -> Self {
        Self {
            start_position: DEFAULT_START_POSITION,
        }
    }

    /// Create a parser seeded at `start`
    pub fn with_start_position(start: Point3D) -> Self {
        Self {
            start_position: start,
        }
    }

    /// Position before the first command of a parsed program
    pub fn start_position(&self) -> MachinePosition {
        MachinePosition::new(self.start_position)
    }

    /// Parse a whole program, one command per line
    pub fn parse(&self, text: &str) -> CommandSequence {
        let sequence: CommandSequence = text.lines().map(Self::parse_line).collect();
        tracing::debug!(
            "Parsed {} lines ({} motion commands)",
            sequence.len(),
            sequence.motion_count()
        );
        sequence
    }

    /// Parse a single line
    pub fn parse_line(line: &str) -> MotionCommand {
        let (code, comment) = split_comment(line);
        let mut tokens = code.split_whitespace();

        let Some(first) = tokens.next() else {
            return MotionCommand::Other(line.to_string());
        };

        let make: fn(MotionLine) -> MotionCommand = match motion_number(first) {
            Some(0) => MotionCommand::Rapid,
            Some(1) => MotionCommand::Linear,
            Some(2) => MotionCommand::ArcCw,
            Some(3) => MotionCommand::ArcCcw,
            _ => {
                if is_compact_motion(first) {
                    tracing::warn!(
                        "Motion word '{}' is not separated from its axes, passing line through unchanged",
                        first
                    );
                }
                return MotionCommand::Other(line.to_string());
            }
        };

        let mut coordinate = Coordinate::new();
        for token in tokens {
            parse_word(token, &mut coordinate);
        }

        make(MotionLine {
            coordinate,
            comment: comment.map(str::to_string),
        })
    }

    /// Resolved end position of every command, starting from the parser's
    /// start position
    pub fn trace(&self, sequence: &CommandSequence) -> Vec<Point3D> {
        sequence
            .iter()
            .scan(self.start_position(), |position, command| {
                *position = position.advance(command);
                Some(position.point())
            })
            .collect()
    }
}

impl Default for GcodeParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a line into its code part and its trailing comment
fn split_comment(line: &str) -> (&str, Option<&str>) {
    static COMMENT_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = COMMENT_REGEX.get_or_init(|| Regex::new(r"[;(].*").expect("invalid regex pattern"));

    match regex.find(line) {
        Some(m) => (&line[..m.start()], Some(m.as_str().trim_end())),
        None => (line, None),
    }
}

/// Number of a `G` word, if `token` is one
fn motion_number(token: &str) -> Option<u32> {
    let rest = token.strip_prefix(['G', 'g'])?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

/// True for a G0..G3 word run together with its axes, such as `G1X10`
fn is_compact_motion(token: &str) -> bool {
    static COMPACT_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = COMPACT_REGEX
        .get_or_init(|| Regex::new(r"^[Gg]0*[0-3][XYZIJxyzij]").expect("invalid regex pattern"));
    regex.is_match(token)
}

fn parse_word(token: &str, coordinate: &mut Coordinate) {
    let mut chars = token.chars();
    let Some(letter) = chars.next() else {
        return;
    };

    let slot = match letter.to_ascii_uppercase() {
        'X' => &mut coordinate.x,
        'Y' => &mut coordinate.y,
        'Z' => &mut coordinate.z,
        'F' => &mut coordinate.f,
        'S' => &mut coordinate.s,
        'I' => &mut coordinate.i,
        'J' => &mut coordinate.j,
        _ => {
            tracing::debug!("Ignoring word '{}'", token);
            return;
        }
    };

    let value = chars.as_str();
    *slot = match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            tracing::warn!("Malformed value in word '{}', leaving axis unset", token);
            None
        }
    };
}
