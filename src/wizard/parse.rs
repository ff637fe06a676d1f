//! Parsing of typed free-form answers.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What to do when a numeric answer does not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericPolicy {
    /// Store 0 and move on. Matches how the booking widgets have always
    /// treated unparseable budgets and guest counts.
    #[default]
    FallbackToZero,
    /// Reject the answer and re-prompt.
    Reject,
}

/// Accepted date layouts, tried in order. Day-first variants come before
/// anything ambiguous since that is how dates are written in India.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d %Y",
    "%b %d %Y",
];

/// Parse a calendar date in any of the supported layouts.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let cleaned = input.trim().replace(',', "");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
}

/// Parse a decimal amount or count.
///
/// Rupee signs, `Rs`, digit-group commas and surrounding whitespace are
/// ignored, so "₹1,50,000" parses as 150000.
pub fn parse_number(input: &str) -> Option<Decimal> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix("Rs.")
        .or_else(|| trimmed.strip_prefix("Rs"))
        .or_else(|| trimmed.strip_prefix("INR"))
        .unwrap_or(trimmed);
    let cleaned: String = trimmed
        .chars()
        .filter(|c| *c != ',' && *c != '₹' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<Decimal>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_common_date_layouts() {
        assert_eq!(parse_date("2025-03-15"), Some(ymd(2025, 3, 15)));
        assert_eq!(parse_date("15/03/2025"), Some(ymd(2025, 3, 15)));
        assert_eq!(parse_date("15-03-2025"), Some(ymd(2025, 3, 15)));
        assert_eq!(parse_date("15 March 2025"), Some(ymd(2025, 3, 15)));
        assert_eq!(parse_date("15 Mar 2025"), Some(ymd(2025, 3, 15)));
        assert_eq!(parse_date("March 15, 2025"), Some(ymd(2025, 3, 15)));
        assert_eq!(parse_date("  2025-03-15  "), Some(ymd(2025, 3, 15)));
    }

    #[test]
    fn rejects_bad_dates() {
        assert_eq!(parse_date("next saturday"), None);
        assert_eq!(parse_date("31/02/2025"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn parses_numbers_with_currency_noise() {
        assert_eq!(parse_number("15000"), Some(dec!(15000)));
        assert_eq!(parse_number("₹1,50,000"), Some(dec!(150000)));
        assert_eq!(parse_number("Rs. 2,500.50"), Some(dec!(2500.50)));
        assert_eq!(parse_number(" 250 "), Some(dec!(250)));
    }

    #[test]
    fn rejects_non_numbers() {
        assert_eq!(parse_number("about two hundred"), None);
        assert_eq!(parse_number("₹"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn default_policy_falls_back() {
        assert_eq!(NumericPolicy::default(), NumericPolicy::FallbackToZero);
    }
}
