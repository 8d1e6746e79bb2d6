//! G-Code Optimizer
//!
//! Removes redundant lines from generated programs.

/// G-code optimization strategies
#[derive(Debug)]
pub struct GCodeOptimizer;

impl GCodeOptimizer {
    /// Collapse runs of identical lines, keeping the first of each run.
    ///
    /// Lines are compared with surrounding whitespace trimmed; the kept line
    /// is returned as it was.
    pub fn remove_duplicate_lines<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
        let mut result: Vec<String> = Vec::with_capacity(lines.len());
        let mut last: Option<&str> = None;

        for line in lines {
            let line = line.as_ref();
            let trimmed = line.trim();
            if last == Some(trimmed) {
                continue;
            }
            result.push(line.to_string());
            last = Some(trimmed);
        }

        let removed = lines.len() - result.len();
        if removed > 0 {
            tracing::debug!("Removed {} duplicate lines", removed);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_duplicate_lines() {
        let out = GCodeOptimizer::remove_duplicate_lines(&["G1 X0", "G1 X0", "G1 X1"]);
        assert_eq!(out, vec!["G1 X0", "G1 X1"]);
    }

    #[test]
    fn test_duplicates_compared_trimmed() {
        let out = GCodeOptimizer::remove_duplicate_lines(&["G1 X0 ", "  G1 X0", "G1 X0\t"]);
        assert_eq!(out, vec!["G1 X0 "]);
    }

    #[test]
    fn test_non_consecutive_kept() {
        let lines = ["G1 X0", "G1 X1", "G1 X0"];
        assert_eq!(GCodeOptimizer::remove_duplicate_lines(&lines), lines);
    }

    #[test]
    fn test_empty() {
        let lines: [&str; 0] = [];
        assert!(GCodeOptimizer::remove_duplicate_lines(&lines).is_empty());
    }
}
