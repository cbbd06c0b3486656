//! Date Normalizer: free-text month/day expressions → `YYYY-MM-DD`
//!
//! Diary pages never carry a year, so the normalizer's year (the current
//! calendar year by default) is used. No calendar validity check is made:
//! "Feb 30" becomes `<year>-02-30`.

use chrono::Datelike;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Month name or abbreviation, then a 1-2 digit day with optional ordinal
    static ref RE_MONTH_DAY: Regex = Regex::new(
        r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})(?:st|nd|rd|th)?\b"
    ).unwrap();

    static ref RE_ISO_DATE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
}

/// Converts "June 7th", "Jun 7", "june 07" and friends into canonical keys
#[derive(Debug, Clone, Copy)]
pub struct DateNormalizer {
    year: i32,
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl DateNormalizer {
    /// Normalizer for the current local year
    pub fn new() -> Self {
        Self::with_year(chrono::Local::now().year())
    }

    /// Normalizer for a fixed year
    pub fn with_year(year: i32) -> Self {
        Self { year }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Normalize a date expression
    ///
    /// Returns the input unchanged when no month/day pair is found; callers
    /// detect that with [`is_iso_date`].
    pub fn normalize(&self, input: &str) -> String {
        let Some(caps) = RE_MONTH_DAY.captures(input) else {
            return input.to_string();
        };

        let month = month_number(&caps[1]);
        // at most two digits, always parses
        let day: u32 = caps[2].parse().unwrap_or(0);
        format!("{}-{:02}-{:02}", self.year, month, day)
    }
}

/// Find the first month/day expression in a line of text
pub fn find_date_expression(text: &str) -> Option<&str> {
    RE_MONTH_DAY.find(text).map(|m| m.as_str())
}

/// Is this already a canonical `YYYY-MM-DD` key?
pub fn is_iso_date(key: &str) -> bool {
    RE_ISO_DATE.is_match(key)
}

/// Month number from the three-letter prefix the regex captured
fn month_number(prefix: &str) -> u32 {
    match prefix.to_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        _ => 12,
    }
}

// =============================================================================
// TESTS
// =============================================================================
