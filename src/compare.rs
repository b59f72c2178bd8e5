#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use serde::{Deserialize, Serialize};
use similar::TextDiff;

/// Outcome of comparing captured stdout against the expected reference.
///
/// Comparison is total over any two texts, including empty ones; it never
/// fails. `Mismatch` is a graded outcome, not an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Comparison {
    /// The two texts are equal after normalization.
    Match,
    /// The texts diverge; both normalized texts are kept for display.
    Mismatch {
        /// Normalized expected text.
        expected:        String,
        /// Normalized actual text.
        actual:          String,
        /// 0-based index of the first line where the two diverge.
        first_diff_line: usize,
    },
}

/// Normalizes a program-output text for comparison: line endings become `\n`,
/// trailing whitespace is stripped from every line, and trailing blank lines
/// are dropped. These differences must never cause a false mismatch.
pub fn normalize(text: &str) -> String {
    let unified = text.replace("\r\n", "\n");
    let mut lines: Vec<&str> = unified.lines().map(str::trim_end).collect();

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}

/// Compares `actual` output against the `expected` reference after
/// normalizing both sides.
pub fn compare_output(expected: &str, actual: &str) -> Comparison {
    let expected = normalize(expected);
    let actual = normalize(actual);

    if expected == actual {
        return Comparison::Match;
    }

    let first_diff_line = expected
        .lines()
        .zip(actual.lines())
        .position(|(e, a)| e != a)
        .unwrap_or_else(|| expected.lines().count().min(actual.lines().count()));

    Comparison::Mismatch {
        expected,
        actual,
        first_diff_line,
    }
}

/// Renders a unified diff of the two normalized texts for diagnostic display.
pub fn render_diff(expected: &str, actual: &str) -> String {
    TextDiff::from_lines(expected, actual)
        .unified_diff()
        .header("expected", "actual")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::{Comparison, compare_output, normalize};

    #[test]
    fn trailing_whitespace_is_not_a_mismatch() {
        assert_eq!(compare_output("a\nb\n", "a  \r\nb"), Comparison::Match);
    }

    #[test]
    fn trailing_blank_lines_are_ignored() {
        assert_eq!(compare_output("a\nb", "a\nb\n\n\n"), Comparison::Match);
    }

    #[test]
    fn empty_inputs_match() {
        assert_eq!(compare_output("", "\n"), Comparison::Match);
    }

    #[test]
    fn reports_first_divergent_line() {
        match compare_output("one\ntwo\nthree", "one\ntwo\nthree!") {
            Comparison::Mismatch {
                first_diff_line, ..
            } => assert_eq!(first_diff_line, 2),
            Comparison::Match => panic!("expected mismatch"),
        }
    }

    #[test]
    fn shorter_actual_diverges_at_missing_line() {
        match compare_output("one\ntwo", "one") {
            Comparison::Mismatch {
                first_diff_line, ..
            } => assert_eq!(first_diff_line, 1),
            Comparison::Match => panic!("expected mismatch"),
        }
    }

    #[test]
    fn normalize_keeps_interior_blank_lines() {
        assert_eq!(normalize("a\n\nb\n"), "a\n\nb");
    }
}
