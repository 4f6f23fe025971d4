//! Common regex patterns for bulletin text extraction.

use lazy_static::lazy_static;
use regex::Regex;

/// Spanish month names, including the common "setiembre" variant.
pub const MONTHS: &str = "enero|febrero|marzo|abril|mayo|junio|julio|agosto|septiembre|setiembre|octubre|noviembre|diciembre";

lazy_static! {
    // "LUNES 19" - weekday name followed by a day number.
    pub static ref WEEKDAY_DAY: Regex = Regex::new(
        r"(?i)\b(lunes|martes|mi[eé]rcoles|jueves|viernes|s[aá]bado|domingo)\s+(\d{1,2})\b"
    ).unwrap();

    // "DE ENERO DE 2026" - month/year clause, possibly far from the day.
    pub static ref MONTH_YEAR_CLAUSE: Regex = Regex::new(
        &format!(r"(?i)\bde\s+({MONTHS})\s+de\s+(\d{{4}})\b")
    ).unwrap();

    // "19 de enero de 2026" - full long-form date.
    pub static ref DATE_SPANISH_LONG: Regex = Regex::new(
        &format!(r"(?i)\b(\d{{1,2}})\s+de\s+({MONTHS})\s+de\s+(\d{{4}})\b")
    ).unwrap();

    // 16/01/2026, 16-01-2026, 16.01.2026
    pub static ref DATE_DMY: Regex = Regex::new(
        r"\b(\d{1,2})[./\-](\d{1,2})[./\-](\d{4})\b"
    ).unwrap();

    // 2026-01-16, 2026/01/16
    pub static ref DATE_YMD: Regex = Regex::new(
        r"\b(\d{4})[./\-](\d{1,2})[./\-](\d{1,2})\b"
    ).unwrap();

    // Any numeric substring, with optional sign and locale separators.
    pub static ref NUMBER_CANDIDATE: Regex = Regex::new(
        r"[-+]?\d(?:[\d.,]*\d)?"
    ).unwrap();

    // Strict three-digit grouping shape: "44.607", "1.234.567".
    pub static ref STRICT_GROUPING: Regex = Regex::new(
        r"^-?\d{1,3}(?:\.\d{3})+$"
    ).unwrap();

    // "Sin intervención" - the bulletin reports no market intervention.
    pub static ref NO_INTERVENTION: Regex = Regex::new(
        r"(?i)sin\s+intervenci[oó]n"
    ).unwrap();

    // Month name at the start of the text following a candidate,
    // optionally prefixed with "de" ("19 DE ENERO").
    pub static ref LEADING_MONTH: Regex = Regex::new(
        &format!(r"(?i)^\s*(?:de\s+)?({MONTHS})\b")
    ).unwrap();

    // Regulatory references ("Com. A 7935", "Comunicación B ...") whose
    // trailing numbers must never be read as figures.
    pub static ref TRAILING_REGULATORY_REF: Regex = Regex::new(
        r"(?i)\b(?:com\.?|comunicaci[oó]n|ley|decreto)\s*[a-z]?\s*$"
    ).unwrap();

    // Runs of horizontal whitespace (normalization).
    pub static ref HORIZONTAL_WS: Regex = Regex::new(
        r"[ \t]+"
    ).unwrap();
}

/// Map a Spanish month name to its number, or 0 if unknown.
pub fn spanish_month_to_number(month: &str) -> u32 {
    match month.to_lowercase().as_str() {
        "enero" => 1,
        "febrero" => 2,
        "marzo" => 3,
        "abril" => 4,
        "mayo" => 5,
        "junio" => 6,
        "julio" => 7,
        "agosto" => 8,
        "septiembre" | "setiembre" => 9,
        "octubre" => 10,
        "noviembre" => 11,
        "diciembre" => 12,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_day() {
        let caps = WEEKDAY_DAY.captures("LUNES 19 DE ENERO DE 2026").unwrap();
        assert_eq!(&caps[2], "19");
    }

    #[test]
    fn test_month_year_clause() {
        let caps = MONTH_YEAR_CLAUSE.captures("texto DE ENERO DE 2026 texto").unwrap();
        assert_eq!(spanish_month_to_number(&caps[1]), 1);
        assert_eq!(&caps[2], "2026");
    }

    #[test]
    fn test_strict_grouping_shape() {
        assert!(STRICT_GROUPING.is_match("44.607"));
        assert!(STRICT_GROUPING.is_match("1.234.567"));
        assert!(!STRICT_GROUPING.is_match("44.5"));
        assert!(!STRICT_GROUPING.is_match("44.6071"));
    }

    #[test]
    fn test_regulatory_ref_requires_word_boundary() {
        assert!(TRAILING_REGULATORY_REF.is_match("segun Com. A "));
        assert!(TRAILING_REGULATORY_REF.is_match("Ley "));
        assert!(!TRAILING_REGULATORY_REF.is_match("telecom "));
        assert!(!TRAILING_REGULATORY_REF.is_match("troley "));
    }

    #[test]
    fn test_no_intervention_variants() {
        assert!(NO_INTERVENTION.is_match("Sin intervención"));
        assert!(NO_INTERVENTION.is_match("SIN INTERVENCION"));
    }
}
