//! Null-tolerant value classifiers used to type whole columns.

use avenger_scales::color::is_css_color;
use lazy_static::lazy_static;
use regex::Regex;
use strum::{Display, EnumString};

use crate::value::{parse_iso_date, parse_number, RawValue};

lazy_static! {
    static ref CSS_VAR_RE: Regex = Regex::new(r"^var\(--[\w-]+\)$").unwrap();
}

/// Symbol palette for filled marks
pub const SYMBOLS_FILL: [&str; 7] = [
    "circle", "cross", "diamond", "square", "star", "triangle", "wye",
];

/// Symbol palette for stroked marks
pub const SYMBOLS_STROKE: [&str; 7] = [
    "circle", "plus", "times", "triangle2", "asterisk", "square2", "diamond2",
];

const SYMBOLS_EXTRA: [&str; 5] = [
    "hexagon",
    "triangle-up",
    "triangle-down",
    "triangle-left",
    "triangle-right",
];

pub fn is_known_symbol(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    SYMBOLS_FILL
        .iter()
        .chain(SYMBOLS_STROKE.iter())
        .chain(SYMBOLS_EXTRA.iter())
        .any(|s| *s == name)
}

pub fn is_number_or_null(value: &RawValue) -> bool {
    match value {
        RawValue::Null => true,
        RawValue::Number(_) => true,
        RawValue::String(s) => parse_number(s).is_some(),
        _ => false,
    }
}

pub fn is_date_or_null(value: &RawValue) -> bool {
    match value {
        RawValue::Null | RawValue::Date(_) => true,
        RawValue::String(s) => parse_iso_date(s).is_some(),
        _ => false,
    }
}

pub fn is_string_or_null(value: &RawValue) -> bool {
    matches!(value, RawValue::Null | RawValue::String(_))
}

pub fn is_boolean_or_null(value: &RawValue) -> bool {
    matches!(value, RawValue::Null | RawValue::Bool(_))
}

/// `currentColor`, `none`, CSS variables and anything the CSS color parser accepts
pub fn is_color_or_null(value: &RawValue) -> bool {
    match value {
        RawValue::Null => true,
        RawValue::String(s) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("currentcolor")
                || s.eq_ignore_ascii_case("none")
                || CSS_VAR_RE.is_match(s)
                || is_css_color(s)
        }
        _ => false,
    }
}

pub fn is_symbol_or_null(value: &RawValue) -> bool {
    match value {
        RawValue::Null | RawValue::Symbol(_) => true,
        RawValue::String(s) => is_known_symbol(s),
        _ => false,
    }
}

/// Numbers in `[0, 1]`
pub fn is_opacity_or_null(value: &RawValue) -> bool {
    match value {
        RawValue::Null => true,
        RawValue::Number(n) => (0.0..=1.0).contains(n),
        _ => false,
    }
}

/// Classification of a whole column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ColumnType {
    /// No non-null values
    Empty,
    Number,
    Date,
    String,
    Boolean,
    Mixed,
}

/// Classify a column by the first predicate every value satisfies
pub fn classify_column(values: &[RawValue]) -> ColumnType {
    if values.iter().all(RawValue::is_null) {
        ColumnType::Empty
    } else if values.iter().all(is_number_or_null) {
        ColumnType::Number
    } else if values.iter().all(is_date_or_null) {
        ColumnType::Date
    } else if values.iter().all(is_boolean_or_null) {
        ColumnType::Boolean
    } else if values.iter().all(is_string_or_null) {
        ColumnType::String
    } else {
        ColumnType::Mixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    #[test]
    fn test_null_is_accepted_by_every_predicate() {
        let predicates: [fn(&RawValue) -> bool; 7] = [
            is_number_or_null,
            is_date_or_null,
            is_string_or_null,
            is_boolean_or_null,
            is_color_or_null,
            is_symbol_or_null,
            is_opacity_or_null,
        ];
        assert!(predicates.iter().all(|p| p(&RawValue::Null)));
    }

    #[rstest]
    #[case("red", true)]
    #[case("#ff0000", true)]
    #[case("rgb(1, 2, 3)", true)]
    #[case("currentColor", true)]
    #[case("var(--accent-color)", true)]
    #[case("none", true)]
    #[case("apple", false)]
    #[case("var(accent)", false)]
    fn test_color_strings(#[case] s: &str, #[case] expected: bool) {
        assert_eq!(is_color_or_null(&RawValue::from(s)), expected);
    }

    #[test]
    fn test_numeric_strings_are_numbers() {
        assert!(is_number_or_null(&RawValue::from("3.5")));
        assert!(!is_number_or_null(&RawValue::from("3.5kg")));
    }

    #[test]
    fn test_opacity_range() {
        assert!(is_opacity_or_null(&RawValue::from(0.5)));
        assert!(!is_opacity_or_null(&RawValue::from(1.5)));
    }

    #[test]
    fn test_classify_column() {
        let d = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(classify_column(&[]), ColumnType::Empty);
        assert_eq!(
            classify_column(&[RawValue::from(1.0), RawValue::Null]),
            ColumnType::Number
        );
        assert_eq!(
            classify_column(&[RawValue::from(d), RawValue::from("2020-02-01")]),
            ColumnType::Date
        );
        assert_eq!(
            classify_column(&[RawValue::from("a"), RawValue::from("b")]),
            ColumnType::String
        );
        assert_eq!(
            classify_column(&[RawValue::from(true), RawValue::from("b")]),
            ColumnType::Mixed
        );
        assert!(is_symbol_or_null(&RawValue::from("Circle")));
    }
}
