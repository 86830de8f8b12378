//! Affinity-aware normalization of edited values.
//!
//! Edits typically arrive as text typed into a grid cell. Before they are
//! bound to an `UPDATE`, text values are converted according to the target
//! column's declared type affinity. Non-text values are already typed and
//! pass through untouched.
//!
//! Rules, applied in order (affinity matching is a case-insensitive
//! substring test):
//!
//! 1. Trimmed text equal to `NULL` (any case) becomes [`CellValue::Null`].
//! 2. `int` affinity: integer parse, then float parse.
//! 3. `real` / `floa` / `doub` affinity: float parse.
//! 4. `bool` affinity: `1/true/on/yes` → `1`, `0/false/off/no` → `0`.
//! 5. Blank text for a declared, non-textual affinity (no `char`, `text`
//!    or `clob`) becomes `NULL`.
//! 6. Otherwise the original, untrimmed text is kept.
//!
//! Numeric parsing runs before boolean mapping, so an affinity such as
//! `BOOLINT` parses `"1"` as a number and `"yes"` as a boolean.

use crate::value::CellValue;

const TRUE_WORDS: [&str; 4] = ["1", "true", "on", "yes"];
const FALSE_WORDS: [&str; 4] = ["0", "false", "off", "no"];

/// Normalizes `value` against a column's declared `affinity`.
///
/// # Examples
///
/// ```
/// use table_browser_core::{CellValue, normalize};
///
/// assert_eq!(normalize(CellValue::from(" 42 "), "INTEGER"), CellValue::Integer(42));
/// assert_eq!(normalize(CellValue::from("yes"), "BOOLEAN"), CellValue::Integer(1));
/// assert_eq!(normalize(CellValue::from("null"), "TEXT"), CellValue::Null);
/// assert_eq!(normalize(CellValue::from(""), ""), CellValue::from(""));
/// ```
pub fn normalize(value: CellValue, affinity: &str) -> CellValue {
    match value {
        CellValue::Text(text) => normalize_text(text, affinity),
        other => other,
    }
}

fn normalize_text(text: String, affinity: &str) -> CellValue {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("null") {
        return CellValue::Null;
    }

    let affinity = affinity.trim().to_ascii_lowercase();

    if affinity.contains("int") {
        if let Ok(v) = trimmed.parse::<i64>() {
            return CellValue::Integer(v);
        }
        if let Some(v) = parse_finite(trimmed) {
            return CellValue::Real(v);
        }
    }

    if ["real", "floa", "doub"].iter().any(|k| affinity.contains(k)) {
        if let Some(v) = parse_finite(trimmed) {
            return CellValue::Real(v);
        }
    }

    if affinity.contains("bool") {
        let lowered = trimmed.to_ascii_lowercase();
        if TRUE_WORDS.contains(&lowered.as_str()) {
            return CellValue::Integer(1);
        }
        if FALSE_WORDS.contains(&lowered.as_str()) {
            return CellValue::Integer(0);
        }
    }

    if trimmed.is_empty() && !affinity.is_empty() && !is_textual(&affinity) {
        return CellValue::Null;
    }

    CellValue::Text(text)
}

fn is_textual(affinity: &str) -> bool {
    ["char", "text", "clob"].iter().any(|k| affinity.contains(k))
}

// `f64::from_str` accepts "inf" and "NaN"; neither is a storable number here.
fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::from(s)
    }

    #[test]
    fn test_null_literal_any_affinity() {
        for affinity in ["", "TEXT", "INTEGER", "REAL", "BOOLEAN", "BLOB"] {
            assert_eq!(normalize(text("NULL"), affinity), CellValue::Null);
            assert_eq!(normalize(text("  null "), affinity), CellValue::Null);
        }
    }

    #[test]
    fn test_integer_affinity() {
        assert_eq!(normalize(text(" 42 "), "INTEGER"), CellValue::Integer(42));
        assert_eq!(normalize(text("-7"), "int"), CellValue::Integer(-7));
        assert_eq!(normalize(text("3.5"), "BIGINT"), CellValue::Real(3.5));
        assert_eq!(normalize(text("abc"), "INTEGER"), text("abc"));
    }

    #[test]
    fn test_integer_affinity_blank_is_null() {
        assert_eq!(normalize(text(""), "INTEGER"), CellValue::Null);
        assert_eq!(normalize(text("   "), "INTEGER"), CellValue::Null);
    }

    #[test]
    fn test_real_affinity() {
        assert_eq!(normalize(text("2.25"), "REAL"), CellValue::Real(2.25));
        assert_eq!(normalize(text("10"), "DOUBLE PRECISION"), CellValue::Real(10.0));
        assert_eq!(normalize(text("1e3"), "FLOAT"), CellValue::Real(1000.0));
        assert_eq!(normalize(text("inf"), "REAL"), text("inf"));
    }

    #[test]
    fn test_bool_affinity() {
        assert_eq!(normalize(text("yes"), "BOOLEAN"), CellValue::Integer(1));
        assert_eq!(normalize(text("On"), "bool"), CellValue::Integer(1));
        assert_eq!(normalize(text("FALSE"), "BOOLEAN"), CellValue::Integer(0));
        assert_eq!(normalize(text("no"), "BOOLEAN"), CellValue::Integer(0));
        assert_eq!(normalize(text("maybe"), "BOOLEAN"), text("maybe"));
    }

    #[test]
    fn test_numeric_rules_take_precedence_over_bool() {
        // "yes" is not numeric, so it falls through to the boolean rule.
        assert_eq!(normalize(text("yes"), "BOOLINT"), CellValue::Integer(1));
        assert_eq!(normalize(text("5"), "BOOLINT"), CellValue::Integer(5));
    }

    #[test]
    fn test_blank_text_kept_for_textual_or_undeclared_affinity() {
        assert_eq!(normalize(text(""), ""), text(""));
        assert_eq!(normalize(text(""), "TEXT"), text(""));
        assert_eq!(normalize(text(""), "VARCHAR(20)"), text(""));
        assert_eq!(normalize(text(""), "CLOB"), text(""));
        assert_eq!(normalize(text(""), "BLOB"), CellValue::Null);
    }

    #[test]
    fn test_untrimmed_text_is_preserved() {
        assert_eq!(normalize(text("  padded  "), "TEXT"), text("  padded  "));
        assert_eq!(normalize(text(" 42 "), "TEXT"), text(" 42 "));
    }

    #[test]
    fn test_non_text_passes_through() {
        assert_eq!(normalize(CellValue::Integer(3), "TEXT"), CellValue::Integer(3));
        assert_eq!(normalize(CellValue::Real(1.5), "INTEGER"), CellValue::Real(1.5));
        assert_eq!(normalize(CellValue::Null, "INTEGER"), CellValue::Null);
    }
}
