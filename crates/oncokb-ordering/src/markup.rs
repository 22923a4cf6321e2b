//! Numbers embedded in formatted table cells.
//!
//! Legacy cells carry values like `<span class="pmid">12</span>` or `3 (2)`.
//! Sorting works on the extracted number; a cell with no number becomes
//! `+inf`, so it sorts last ascending and first descending.

use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;

use crate::comparator::Direction;

fn markup_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("markup tag pattern is valid"))
}

fn numeric_prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\d*\.?\d*").expect("numeric prefix pattern is valid"))
}

/// Strip tags, keep only digits, `.` and a leading `-`, then read the longest
/// leading number. `1.2.3` reads as `1.2`.
pub fn extract_numeric_from_markup(text: &str) -> f64 {
    let stripped = markup_tag_regex().replace_all(text, "");
    let numeric: String = stripped
        .trim()
        .chars()
        .enumerate()
        .filter(|(idx, c)| c.is_ascii_digit() || *c == '.' || (*idx == 0 && *c == '-'))
        .map(|(_, c)| c)
        .collect();

    let prefix = numeric_prefix_regex()
        .find(&numeric)
        .map_or("", |m| m.as_str());
    if !prefix.bytes().any(|b| b.is_ascii_digit()) {
        return f64::INFINITY;
    }
    prefix.parse::<f64>().unwrap_or(f64::INFINITY)
}

pub fn compare_markup_numbers(a: &str, b: &str, direction: Direction) -> Ordering {
    let (a, b) = (extract_numeric_from_markup(a), extract_numeric_from_markup(b));
    match direction {
        Direction::Ascending => a.total_cmp(&b),
        Direction::Descending => b.total_cmp(&a),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_from_tags() {
        assert_eq!(extract_numeric_from_markup("<span class=\"h1\">42</span>"), 42.0);
        assert_eq!(extract_numeric_from_markup("<b>3.5</b> %"), 3.5);
    }

    #[test]
    fn test_leading_minus_only() {
        assert_eq!(extract_numeric_from_markup("-1.25"), -1.25);
        assert_eq!(extract_numeric_from_markup("1-2"), 12.0);
    }

    #[test]
    fn test_trailing_text_after_number() {
        assert_eq!(extract_numeric_from_markup("<b>1.5</b> (approx.)"), 1.5);
        assert_eq!(extract_numeric_from_markup("1.2.3"), 1.2);
        assert_eq!(extract_numeric_from_markup("7."), 7.0);
        assert_eq!(extract_numeric_from_markup(".5"), 0.5);
        assert_eq!(extract_numeric_from_markup("-.25 cm"), -0.25);
    }

    #[test]
    fn test_no_number_is_infinity() {
        assert_eq!(extract_numeric_from_markup("<i>n/a</i>"), f64::INFINITY);
        assert_eq!(extract_numeric_from_markup(""), f64::INFINITY);
        assert_eq!(extract_numeric_from_markup("-"), f64::INFINITY);
        assert_eq!(extract_numeric_from_markup("(n.a.)"), f64::INFINITY);
    }

    #[test]
    fn test_empty_cells_last_ascending_first_descending() {
        let mut cells = vec!["<span>10</span>", "n/a", "2"];
        cells.sort_by(|a, b| compare_markup_numbers(a, b, Direction::Ascending));
        assert_eq!(cells, vec!["2", "<span>10</span>", "n/a"]);

        cells.sort_by(|a, b| compare_markup_numbers(a, b, Direction::Descending));
        assert_eq!(cells, vec!["n/a", "<span>10</span>", "2"]);
    }
}
