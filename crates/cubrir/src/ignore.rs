//! In-source ignore directives.
//!
//! Lines can be excluded from a report with literal markers in the source:
//! a single line with [`IGNORE_LINE`], or a region between [`IGNORE_START`]
//! and [`IGNORE_END`] (a region with no end marker runs to end of file).
//! Matching is purely textual; the markers are recognized anywhere in a
//! line, string literals included.

use std::collections::BTreeSet;

/// Marker excluding the containing line
pub const IGNORE_LINE: &str = "// coverage:ignore-line";
/// Marker opening an ignored region
pub const IGNORE_START: &str = "// coverage:ignore-start";
/// Marker closing an ignored region
pub const IGNORE_END: &str = "// coverage:ignore-end";

/// Scan source lines and return the set of 1-based line numbers excluded by
/// ignore directives.
#[must_use]
pub fn ignored_lines(lines: &[String]) -> BTreeSet<u32> {
    let mut ignored = BTreeSet::new();
    let mut skipping = false;

    for (index, line) in lines.iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let number = index as u32 + 1;
        if skipping {
            let _ = ignored.insert(number);
            if line.contains(IGNORE_END) {
                skipping = false;
            }
        } else if line.contains(IGNORE_START) {
            skipping = true;
        } else if line.contains(IGNORE_LINE) {
            let _ = ignored.insert(number);
        }
    }

    ignored
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn lines(source: &[&str]) -> Vec<String> {
        source.iter().map(|&l| l.to_string()).collect()
    }

    #[test]
    fn test_no_markers() {
        let source = lines(&["var a = 1;", "var b = 2;"]);
        assert!(ignored_lines(&source).is_empty());
    }

    #[test]
    fn test_ignore_line() {
        let source = lines(&[
            "var a = 1;",
            "var b = 2; // coverage:ignore-line",
            "var c = 3;",
        ]);
        assert_eq!(ignored_lines(&source), BTreeSet::from([2]));
    }

    #[test]
    fn test_ignore_region() {
        let source = lines(&[
            "var a = 1;",
            "// coverage:ignore-start",
            "var b = 2;",
            "var c = 3;",
            "// coverage:ignore-end",
            "var d = 4;",
        ]);
        assert_eq!(ignored_lines(&source), BTreeSet::from([3, 4, 5]));
    }

    #[test]
    fn test_unterminated_region_runs_to_eof() {
        let source = lines(&["var a = 1;", "// coverage:ignore-start", "var b;", "var c;"]);
        assert_eq!(ignored_lines(&source), BTreeSet::from([3, 4]));
    }

    #[test]
    fn test_ignore_line_inside_region_not_duplicated() {
        let source = lines(&[
            "// coverage:ignore-start",
            "var a = 1; // coverage:ignore-line",
            "// coverage:ignore-end",
        ]);
        assert_eq!(ignored_lines(&source), BTreeSet::from([2, 3]));
    }

    #[test]
    fn test_line_after_region_not_ignored() {
        let source = lines(&[
            "// coverage:ignore-start",
            "var a;",
            "// coverage:ignore-end",
            "var b;",
        ]);
        let ignored = ignored_lines(&source);
        assert!(!ignored.contains(&4));
    }

    #[test]
    fn test_marker_anywhere_in_line() {
        let source = lines(&["final s = 'text'; // coverage:ignore-line trailing words"]);
        assert_eq!(ignored_lines(&source), BTreeSet::from([1]));
    }

    #[test]
    fn test_back_to_back_regions() {
        let source = lines(&[
            "// coverage:ignore-start",
            "var a;",
            "// coverage:ignore-end",
            "keep;",
            "// coverage:ignore-start",
            "var b;",
            "// coverage:ignore-end",
        ]);
        assert_eq!(ignored_lines(&source), BTreeSet::from([2, 3, 6, 7]));
    }
}
