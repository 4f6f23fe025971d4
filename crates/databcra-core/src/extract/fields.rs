//! Magnitude-based disambiguation of the two bulletin figures.
//!
//! The bulletin has no labels reliable enough to survive OCR, so the two
//! figures are told apart by magnitude: reserves sit in the tens of
//! thousands of millions of USD, the daily net flow in the hundreds.
//! There is no ground truth to validate against, so every discarded
//! candidate is logged for future band tuning.

use tracing::debug;

use super::number::parse_locale_number;
use super::patterns::{LEADING_MONTH, NUMBER_CANDIDATE, TRAILING_REGULATORY_REF};
use crate::models::config::MagnitudeBands;

/// A numeric substring found in the bulletin text.
#[derive(Debug, Clone)]
pub struct NumericCandidate {
    /// Parsed value.
    pub value: f64,
    /// Byte offset of the match start.
    pub start: usize,
    /// Byte offset of the match end.
    pub end: usize,
    /// Matched source text.
    pub raw: String,
}

/// Decides which number is reserves and which is net flow.
pub struct FieldDisambiguator {
    bands: MagnitudeBands,
}

impl FieldDisambiguator {
    pub fn new(bands: MagnitudeBands) -> Self {
        Self { bands }
    }

    /// Scan all numeric substrings with their text offsets.
    ///
    /// Footnote markers in parentheses and numbers trailing a regulatory
    /// reference are excluded here; they are never figures.
    pub fn scan(&self, text: &str) -> Vec<NumericCandidate> {
        let mut candidates = Vec::new();

        for m in NUMBER_CANDIDATE.find_iter(text) {
            if is_parenthesized(text, m.start(), m.end()) {
                debug!(candidate = m.as_str(), "discarding parenthesized footnote marker");
                continue;
            }
            if follows_regulatory_ref(text, m.start()) {
                debug!(candidate = m.as_str(), "discarding regulatory reference number");
                continue;
            }
            match parse_locale_number(m.as_str()) {
                Ok(value) => candidates.push(NumericCandidate {
                    value,
                    start: m.start(),
                    end: m.end(),
                    raw: m.as_str().to_string(),
                }),
                Err(_) => {
                    debug!(candidate = m.as_str(), "discarding unparseable candidate");
                }
            }
        }

        candidates
    }

    /// Reserves: first candidate whose magnitude falls in the reserves
    /// band.
    pub fn reserves<'a>(
        &self,
        candidates: &'a [NumericCandidate],
    ) -> Option<&'a NumericCandidate> {
        for c in candidates {
            if self.bands.in_reserves_band(c.value) {
                return Some(c);
            }
            debug!(
                candidate = c.raw.as_str(),
                value = c.value,
                "candidate outside reserves band"
            );
        }
        None
    }

    /// Net flow: first candidate positioned after `after` whose magnitude
    /// falls in the flow band, excluding percentages and day-of-month
    /// false positives ("19 DE ENERO").
    pub fn net_flow(
        &self,
        text: &str,
        candidates: &[NumericCandidate],
        after: usize,
    ) -> Option<f64> {
        for c in candidates {
            if c.start <= after {
                continue;
            }
            if !self.bands.in_flow_band(c.value) {
                debug!(candidate = c.raw.as_str(), value = c.value, "candidate outside flow band");
                continue;
            }
            if followed_by_percent(text, c.end) {
                debug!(candidate = c.raw.as_str(), "discarding percentage");
                continue;
            }
            if looks_like_day_of_month(c.value, text, c.end) {
                debug!(candidate = c.raw.as_str(), "discarding day-of-month false positive");
                continue;
            }
            return Some(c.value);
        }
        None
    }
}

/// A number enclosed in parentheses is a footnote marker, e.g. "(1)".
fn is_parenthesized(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].trim_end().ends_with('(');
    let after = text[end..].trim_start().starts_with(')');
    before && after
}

/// A number immediately preceded by a regulatory-reference keyword
/// ("Com. A 7935") is a citation, not a figure.
fn follows_regulatory_ref(text: &str, start: usize) -> bool {
    TRAILING_REGULATORY_REF.is_match(&text[..start])
}

fn followed_by_percent(text: &str, end: usize) -> bool {
    text[end..].trim_start().starts_with('%')
}

/// 1-31 immediately followed by a month name is a date fragment.
fn looks_like_day_of_month(value: f64, text: &str, end: usize) -> bool {
    value.fract() == 0.0
        && (1.0..=31.0).contains(&value)
        && LEADING_MONTH.is_match(&text[end..])
}
