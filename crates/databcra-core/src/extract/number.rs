//! Locale-aware numeric literal parsing.
//!
//! Bulletin figures arrive in either Spanish convention ("44.808",
//! "1.453,4") or plain decimal-point convention ("44.5"), and OCR noise
//! adds stray symbols around them. Disambiguation rules:
//!
//! - both comma and period present: period is thousands grouping, comma
//!   is the decimal separator;
//! - period only: a strict three-digit grouping shape ("44.607") means
//!   grouping, anything else is a decimal point as written;
//! - comma only: decimal separator.

use super::patterns::STRICT_GROUPING;
use crate::error::ExtractionError;

/// Parse a numeric literal in either decimal-comma or decimal-point
/// convention into a float.
///
/// Strips everything except digits, comma, period and hyphen first, so
/// currency symbols and OCR artifacts around the number are tolerated.
/// A residual non-numeric string is a hard error for the field.
pub fn parse_locale_number(raw: &str) -> Result<f64, ExtractionError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();

    let has_comma = cleaned.contains(',');
    let has_period = cleaned.contains('.');

    let normalized = if has_comma && has_period {
        cleaned.replace('.', "").replace(',', ".")
    } else if has_comma {
        cleaned.replace(',', ".")
    } else if has_period && STRICT_GROUPING.is_match(&cleaned) {
        cleaned.replace('.', "")
    } else {
        cleaned
    };

    normalized
        .parse::<f64>()
        .map_err(|_| ExtractionError::Parse {
            field: "number".to_string(),
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_grouped_period() {
        assert_eq!(parse_locale_number("44.607").unwrap(), 44_607.0);
        assert_eq!(parse_locale_number("1.234.567").unwrap(), 1_234_567.0);
    }

    #[test]
    fn test_period_and_comma() {
        assert_eq!(parse_locale_number("1.453,446").unwrap(), 1453.446);
        assert_eq!(parse_locale_number("12.345.678,9").unwrap(), 12_345_678.9);
    }

    #[test]
    fn test_comma_decimal() {
        assert_eq!(parse_locale_number("39,69").unwrap(), 39.69);
    }

    #[test]
    fn test_plain_decimal_point() {
        // Not a grouping shape, so the period stays a decimal point.
        assert_eq!(parse_locale_number("44.5").unwrap(), 44.5);
        assert_eq!(parse_locale_number("44.6071").unwrap(), 44.6071);
    }

    #[test]
    fn test_sign_and_noise() {
        assert_eq!(parse_locale_number("-148").unwrap(), -148.0);
        assert_eq!(parse_locale_number("+231").unwrap(), 231.0);
        assert_eq!(parse_locale_number("US$ 44.808").unwrap(), 44_808.0);
    }

    #[test]
    fn test_garbage_is_error() {
        assert!(parse_locale_number("---").is_err());
        assert!(parse_locale_number("N/A").is_err());
        assert!(parse_locale_number("").is_err());
    }
}
