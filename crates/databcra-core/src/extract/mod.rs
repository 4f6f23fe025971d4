//! Bulletin field extraction.
//!
//! Turns raw OCR text into a validated [`BulletinRecord`]: normalization,
//! date extraction, locale-aware number parsing, and magnitude-based
//! disambiguation of the two figures.

pub mod date;
pub mod fields;
pub mod number;
pub mod patterns;

pub use date::DateExtractor;
pub use fields::{FieldDisambiguator, NumericCandidate};
pub use number::parse_locale_number;

use chrono_tz::Tz;
use tracing::{debug, info};

use crate::error::ExtractionError;
use crate::models::bulletin::BulletinRecord;
use patterns::{HORIZONTAL_WS, NO_INTERVENTION};

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Normalize OCR text for pattern matching: unify minus-sign variants to
/// the ASCII hyphen and collapse runs of horizontal whitespace.
pub fn normalize(raw: &str) -> String {
    let unified = raw
        .replace('\u{2212}', "-")
        .replace('\u{2013}', "-")
        .replace('\u{2014}', "-");
    HORIZONTAL_WS.replace_all(&unified, " ").into_owned()
}

/// Parser turning raw bulletin OCR text into a structured record.
pub struct BulletinParser {
    timezone: Tz,
    disambiguator: FieldDisambiguator,
    date_extractor: DateExtractor,
}

impl BulletinParser {
    pub fn new(timezone: Tz, bands: crate::models::config::MagnitudeBands) -> Self {
        Self {
            timezone,
            disambiguator: FieldDisambiguator::new(bands),
            date_extractor: DateExtractor::new(),
        }
    }

    /// Extract the date and both figures from raw OCR text.
    ///
    /// The date always resolves (today in the fixed timezone when no
    /// pattern matches). A missing reserves figure is fatal; a missing
    /// net flow defaults to 0.0, as does an explicit "sin intervención".
    pub fn parse(&self, raw: &str) -> Result<BulletinRecord> {
        let text = normalize(raw);

        let date = self.date_extractor.extract_or_today(&text, self.timezone);
        debug!(%date, "resolved bulletin date");

        let candidates = self.disambiguator.scan(&text);
        debug!(count = candidates.len(), "numeric candidates found");

        let reserves = self
            .disambiguator
            .reserves(&candidates)
            .ok_or_else(|| ExtractionError::MissingField("reserves_millions_usd".to_string()))?;

        let net_flow = if NO_INTERVENTION.is_match(&text) {
            debug!("no-intervention phrase present, forcing net flow to 0.0");
            0.0
        } else {
            self.disambiguator
                .net_flow(&text, &candidates, reserves.end)
                .unwrap_or_else(|| {
                    debug!("no net-flow candidate, defaulting to 0.0");
                    0.0
                })
        };

        let record = BulletinRecord::new(date, reserves.value, net_flow);
        info!(
            date = %record.date,
            reserves = record.reserves_millions_usd,
            net_flow = record.net_flow_millions_usd,
            "bulletin extracted"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn parser() -> BulletinParser {
        let tz: Tz = "America/Argentina/Buenos_Aires".parse().unwrap();
        BulletinParser::new(tz, Default::default())
    }

    #[test]
    fn test_full_bulletin() {
        let text = "BANCO CENTRAL\nPRINCIPALES VARIABLES\nLUNES 19\nDE ENERO DE 2026\n\
                    BADLAR 39,69% TEA\n44.808\nReservas en millones de USD\n\
                    Compra de divisas en millones de USD 231";
        let record = parser().parse(text).unwrap();
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2026, 1, 19).unwrap());
        assert_eq!(record.reserves_millions_usd, 44_808.0);
        assert_eq!(record.net_flow_millions_usd, 231.0);
    }

    #[test]
    fn test_no_intervention_forces_zero() {
        let text = "16/01/2026 Reservas 44.808 Sin intervención 231";
        let record = parser().parse(text).unwrap();
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2026, 1, 16).unwrap());
        assert_eq!(record.net_flow_millions_usd, 0.0);
    }

    #[test]
    fn test_sale_is_negative() {
        let text = "16/01/2026 Reservas 44.808 Venta de divisas -148";
        let record = parser().parse(text).unwrap();
        assert_eq!(record.net_flow_millions_usd, -148.0);
    }

    #[test]
    fn test_missing_flow_defaults_to_zero() {
        let text = "16/01/2026 Reservas 44.808";
        let record = parser().parse(text).unwrap();
        assert_eq!(record.net_flow_millions_usd, 0.0);
    }

    #[test]
    fn test_missing_reserves_is_fatal() {
        let err = parser().parse("16/01/2026 sin cifras utiles").unwrap_err();
        assert!(matches!(err, ExtractionError::MissingField(_)));
    }

    #[test]
    fn test_normalize_minus_and_whitespace() {
        assert_eq!(normalize("a\u{2212}1   b\tc"), "a-1 b c");
    }

    #[test]
    fn test_unicode_minus_flow() {
        let text = "16/01/2026 Reservas 44.808 Venta \u{2212}148";
        let record = parser().parse(text).unwrap();
        assert_eq!(record.net_flow_millions_usd, -148.0);
    }
}
