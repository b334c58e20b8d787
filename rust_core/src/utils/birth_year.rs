//! Birth-year derivation from roster date-of-birth and graduation-year fields.
//!
//! Roster sources rarely carry a clean birth year: scrapes give free-form
//! dates of birth and prep-school lists give graduation years. These helpers
//! turn both into a plain year, or `None` when the value is not plausible.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::ops::RangeInclusive;
use std::sync::OnceLock;

/// Typical age at high-school graduation
pub const GRAD_YEAR_OFFSET: i32 = 18;

/// Birth years accepted from free-form dates
pub const PLAUSIBLE_BIRTH_YEARS: RangeInclusive<i32> = 1990..=2015;

/// Graduation years accepted for derivation
pub const PLAUSIBLE_GRAD_YEARS: RangeInclusive<i32> = 2020..=2035;

const DATE_FORMATS: &[&str] = &[
    "%d-%b-%Y", // 20-Dec-2007
    "%m/%d/%Y", // 12/20/2007
    "%Y-%m-%d", // 2007-12-20
    "%b %d, %Y", // Dec 20, 2007
    "%B %d, %Y", // December 20, 2007
];

/// Year fragments tried when no full date format applies
static YEAR_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

fn year_patterns() -> &'static [Regex] {
    YEAR_PATTERNS.get_or_init(|| {
        [
            r"(\d{4})$",
            r"^(\d{4})",
            r"/(\d{4})",
            r"-(\d{4})",
            r"/(\d{2})$",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

fn plausible(year: i32) -> Option<i32> {
    PLAUSIBLE_BIRTH_YEARS.contains(&year).then_some(year)
}

/// Extract a birth year from a date-of-birth string.
pub fn birth_year_from_dob(dob: &str) -> Option<i32> {
    let dob = dob.trim();
    if dob.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(dob, format) {
            if let Some(year) = plausible(date.year()) {
                return Some(year);
            }
        }
    }

    for pattern in year_patterns() {
        let Some(caps) = pattern.captures(dob) else {
            continue;
        };
        let Some(year) = caps.get(1).and_then(|m| m.as_str().parse::<i32>().ok()) else {
            continue;
        };
        // Two-digit years are always 2000s for current prospects
        let year = if year < 100 { year + 2000 } else { year };
        if let Some(year) = plausible(year) {
            return Some(year);
        }
    }

    None
}

/// Approximate birth year from a graduation year.
pub fn birth_year_from_grad_year(grad_year: i32) -> Option<i32> {
    PLAUSIBLE_GRAD_YEARS
        .contains(&grad_year)
        .then(|| grad_year - GRAD_YEAR_OFFSET)
}

/// Same as [`birth_year_from_grad_year`] for a raw roster cell.
pub fn birth_year_from_grad_str(grad: &str) -> Option<i32> {
    grad.trim()
        .parse::<i32>()
        .ok()
        .and_then(birth_year_from_grad_year)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dob_formats() {
        assert_eq!(birth_year_from_dob("20-Dec-2007"), Some(2007));
        assert_eq!(birth_year_from_dob("12/20/2007"), Some(2007));
        assert_eq!(birth_year_from_dob("2008-03-14"), Some(2008));
        assert_eq!(birth_year_from_dob("Mar 14, 2008"), Some(2008));
        assert_eq!(birth_year_from_dob("2009"), Some(2009));
    }

    #[test]
    fn test_dob_two_digit_year() {
        assert_eq!(birth_year_from_dob("12/20/07"), Some(2007));
    }

    #[test]
    fn test_dob_rejects_implausible() {
        assert_eq!(birth_year_from_dob(""), None);
        assert_eq!(birth_year_from_dob("1975-01-01"), None);
        assert_eq!(birth_year_from_dob("unknown"), None);
    }

    #[test]
    fn test_grad_year() {
        assert_eq!(birth_year_from_grad_year(2026), Some(2008));
        assert_eq!(birth_year_from_grad_year(2019), None);
        assert_eq!(birth_year_from_grad_year(2036), None);
        assert_eq!(birth_year_from_grad_str(" 2027 "), Some(2009));
        assert_eq!(birth_year_from_grad_str("PG"), None);
    }
}
