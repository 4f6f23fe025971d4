//! Bulletin date extraction.
//!
//! The bulletin renders its date three ways depending on layout and OCR
//! quality: a split header ("LUNES 19" ... "DE ENERO DE 2026"), a plain
//! long form ("19 de enero de 2026"), or a numeric form ("19/01/2026").

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::debug;

use super::patterns::{
    spanish_month_to_number, DATE_DMY, DATE_SPANISH_LONG, DATE_YMD, MONTH_YEAR_CLAUSE, WEEKDAY_DAY,
};

/// Date extractor over normalized bulletin text.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Find the first valid calendar date in the text.
    ///
    /// Patterns are tried in order of specificity; a match that does not
    /// form a valid calendar date (day 32, month 13) is skipped, not
    /// fatal. Returns `None` when no pattern yields a valid date.
    pub fn extract(&self, text: &str) -> Option<NaiveDate> {
        self.extract_split_header(text)
            .or_else(|| self.extract_spanish_long(text))
            .or_else(|| self.extract_numeric(text))
    }

    /// Find a date, falling back to today in the given fixed timezone.
    pub fn extract_or_today(&self, text: &str, tz: Tz) -> NaiveDate {
        self.extract(text).unwrap_or_else(|| {
            let today = today_in(tz);
            debug!("no date found in text, falling back to {}", today);
            today
        })
    }

    /// "LUNES 19" combined with a "DE ENERO DE 2026" clause anywhere.
    fn extract_split_header(&self, text: &str) -> Option<NaiveDate> {
        for day_caps in WEEKDAY_DAY.captures_iter(text) {
            let day: u32 = day_caps[2].parse().unwrap_or(0);
            for my_caps in MONTH_YEAR_CLAUSE.captures_iter(text) {
                let month = spanish_month_to_number(&my_caps[1]);
                let year: i32 = my_caps[2].parse().unwrap_or(0);
                if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                    return Some(date);
                }
            }
        }
        None
    }

    /// "19 de enero de 2026".
    fn extract_spanish_long(&self, text: &str) -> Option<NaiveDate> {
        for caps in DATE_SPANISH_LONG.captures_iter(text) {
            let day: u32 = caps[1].parse().unwrap_or(0);
            let month = spanish_month_to_number(&caps[2]);
            let year: i32 = caps[3].parse().unwrap_or(0);
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some(date);
            }
        }
        None
    }

    /// "19/01/2026" or "2026-01-19" with `/`, `-` or `.` separators.
    fn extract_numeric(&self, text: &str) -> Option<NaiveDate> {
        for caps in DATE_DMY.captures_iter(text) {
            let day: u32 = caps[1].parse().unwrap_or(0);
            let month: u32 = caps[2].parse().unwrap_or(0);
            let year: i32 = caps[3].parse().unwrap_or(0);
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some(date);
            }
        }
        for caps in DATE_YMD.captures_iter(text) {
            let year: i32 = caps[1].parse().unwrap_or(0);
            let month: u32 = caps[2].parse().unwrap_or(0);
            let day: u32 = caps[3].parse().unwrap_or(0);
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some(date);
            }
        }
        None
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Today's calendar date in the given fixed timezone.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ba_tz() -> Tz {
        "America/Argentina/Buenos_Aires".parse().unwrap()
    }

    #[test]
    fn test_split_header() {
        let extractor = DateExtractor::new();
        let text = "PRINCIPALES VARIABLES LUNES 19 DE ENERO DE 2026 Reservas";
        assert_eq!(
            extractor.extract(text),
            Some(NaiveDate::from_ymd_opt(2026, 1, 19).unwrap())
        );
    }

    #[test]
    fn test_split_header_far_apart() {
        let extractor = DateExtractor::new();
        let text = "LUNES 19\notro texto intermedio\nDE ENERO DE 2026";
        assert_eq!(
            extractor.extract(text),
            Some(NaiveDate::from_ymd_opt(2026, 1, 19).unwrap())
        );
    }

    #[test]
    fn test_spanish_long() {
        let extractor = DateExtractor::new();
        assert_eq!(
            extractor.extract("publicado el 19 de enero de 2026"),
            Some(NaiveDate::from_ymd_opt(2026, 1, 19).unwrap())
        );
    }

    #[test]
    fn test_numeric_dmy() {
        let extractor = DateExtractor::new();
        assert_eq!(
            extractor.extract("16/01/2026"),
            Some(NaiveDate::from_ymd_opt(2026, 1, 16).unwrap())
        );
        assert_eq!(
            extractor.extract("16.01.2026"),
            Some(NaiveDate::from_ymd_opt(2026, 1, 16).unwrap())
        );
    }

    #[test]
    fn test_numeric_ymd() {
        let extractor = DateExtractor::new();
        assert_eq!(
            extractor.extract("2026-01-16"),
            Some(NaiveDate::from_ymd_opt(2026, 1, 16).unwrap())
        );
    }

    #[test]
    fn test_invalid_calendar_date_skipped() {
        let extractor = DateExtractor::new();
        // Day 32 is skipped; the later valid date wins.
        assert_eq!(
            extractor.extract("32/01/2026 y 16/01/2026"),
            Some(NaiveDate::from_ymd_opt(2026, 1, 16).unwrap())
        );
    }

    #[test]
    fn test_fallback_today() {
        let extractor = DateExtractor::new();
        let tz = ba_tz();
        assert_eq!(
            extractor.extract_or_today("sin fecha alguna", tz),
            today_in(tz)
        );
    }
}
