//! Numeric recognition shared by the cleaning stages.
//!
//! All patterns are compiled once and shared read-only.

use std::sync::LazyLock;

use regex::Regex;

use crate::data::model::{Cell, Column};

/// Share of non-missing cells that must read as numbers before a column
/// is treated as numeric.
pub const NUMERIC_MAJORITY: f64 = 0.5;

/// A table is wide only when numeric columns outnumber the others by more
/// than this factor.
pub const WIDE_RATIO: usize = 2;

/// "ND", "n.d.", "N.D" ... (not detected)
static NOT_DETECTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^n\.?d\.?$").unwrap());

/// Leading magnitude with optional exponent: "1.5 mg/mL", "1.2e-3 A.U.", ".5x"
static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([-+]?\d*\.?\d+([eE][-+]?\d+)?)").unwrap());

/// Starts like a number even if a unit follows immediately: "10kg", "-.5 mM"
static UNIT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-+]?\.?\d").unwrap());

/// Outcome of looking for a leading numeric token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Leading {
    Found(f64),
    /// The pattern matched but the token would not parse.
    Unparsable,
    Absent,
}

pub fn is_not_detected(s: &str) -> bool {
    NOT_DETECTED.is_match(s)
}

/// Whole-string parse, surrounding whitespace allowed. NaN counts as no number.
pub fn parse_strict(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

pub fn leading_number(s: &str) -> Leading {
    match LEADING_NUMBER.captures(s).and_then(|c| c.get(1)) {
        Some(token) => match token.as_str().parse::<f64>() {
            Ok(v) => Leading::Found(v),
            Err(_) => Leading::Unparsable,
        },
        None => Leading::Absent,
    }
}

/// Strict parse first, then the leading token.
pub fn parse_lenient(s: &str) -> Option<f64> {
    let s = s.trim();
    parse_strict(s).or(match leading_number(s) {
        Leading::Found(v) => Some(v),
        Leading::Unparsable | Leading::Absent => None,
    })
}

pub fn has_unit_prefix(s: &str) -> bool {
    UNIT_PREFIX.is_match(s)
}

/// A cell that a strict numeric coercion would keep.
pub fn is_strict_numeric(cell: &Cell) -> bool {
    match cell {
        Cell::Number(_) => true,
        Cell::Text(s) => parse_strict(s).is_some(),
        Cell::Missing => false,
    }
}

/// Fraction of present cells satisfying `pred`, or `None` if every cell
/// is missing.
fn present_share(column: &Column, pred: impl Fn(&Cell) -> bool) -> Option<f64> {
    let (hits, total) = column
        .present()
        .fold((0usize, 0usize), |(h, t), c| (h + usize::from(pred(c)), t + 1));
    (total > 0).then(|| hits as f64 / total as f64)
}

/// Natively numeric, or more than `threshold` of present cells parse.
pub fn is_numeric_leaning(column: &Column, threshold: f64) -> bool {
    column.is_native_numeric()
        || present_share(column, is_strict_numeric).is_some_and(|share| share > threshold)
}

/// [`is_numeric_leaning`] that also accepts unit-suffixed values such as
/// "10kg" whose text starts with a number.
pub fn looks_numeric_with_units(column: &Column, threshold: f64) -> bool {
    is_numeric_leaning(column, threshold)
        || present_share(column, |c| has_unit_prefix(&c.to_string()))
            .is_some_and(|share| share > threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(cells: Vec<Cell>) -> Column {
        Column::new("c", cells)
    }

    #[test]
    fn not_detected_tokens() {
        for s in ["ND", "nd", "N.D.", "n.d.", "N.D", "nd."] {
            assert!(is_not_detected(s), "{s}");
        }
        for s in ["NDA", "n/d", "and", " nd"] {
            assert!(!is_not_detected(s), "{s}");
        }
    }

    #[test]
    fn leading_token() {
        assert_eq!(leading_number("1.5 mg/mL"), Leading::Found(1.5));
        assert_eq!(leading_number("1.2e-3 A.U."), Leading::Found(0.0012));
        assert_eq!(leading_number(".5x"), Leading::Found(0.5));
        assert_eq!(leading_number("-3kg"), Leading::Found(-3.0));
        assert_eq!(leading_number("Control"), Leading::Absent);
        assert_eq!(leading_number("~5"), Leading::Absent);
    }

    #[test]
    fn lenient_and_strict() {
        assert_eq!(parse_strict(" 42 "), Some(42.0));
        assert_eq!(parse_strict("nan"), None);
        assert_eq!(parse_strict("10kg"), None);
        assert_eq!(parse_lenient("10kg"), Some(10.0));
        assert_eq!(parse_lenient("kg"), None);
    }

    #[test]
    fn numeric_leaning_ignores_missing() {
        let mostly = col(vec![
            Cell::from("1"),
            Cell::from("2"),
            Cell::from("x"),
            Cell::Missing,
            Cell::Missing,
        ]);
        assert!(is_numeric_leaning(&mostly, NUMERIC_MAJORITY));

        let half = col(vec![Cell::Number(1.0), Cell::from("a")]);
        assert!(!is_numeric_leaning(&half, NUMERIC_MAJORITY));

        assert!(is_numeric_leaning(&col(vec![Cell::Missing]), NUMERIC_MAJORITY));
        assert!(is_numeric_leaning(&col(vec![]), NUMERIC_MAJORITY));
    }

    #[test]
    fn unit_prefix_counts_for_targets() {
        let units = col(vec![Cell::from("10kg"), Cell::from("12 kg"), Cell::from("n/a")]);
        assert!(!is_numeric_leaning(&units, NUMERIC_MAJORITY));
        assert!(looks_numeric_with_units(&units, NUMERIC_MAJORITY));

        let labels = col(vec![Cell::from("Control"), Cell::from("Treated")]);
        assert!(!looks_numeric_with_units(&labels, NUMERIC_MAJORITY));
    }
}
