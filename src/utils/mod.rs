//! Utility functions and helpers.

pub mod http;

use std::sync::LazyLock;

use regex::Regex;

/// `DD.MM.YY`, optionally followed by a range separator and an end date.
static DATE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{2}\.\d{2}\.\d{2})\b(?:\s*[-–]\s*(\d{2}\.\d{2}\.\d{2})\b)?")
        .expect("date range pattern is valid")
});

/// Day count trailing a single date, e.g. `, 1 Tage`.
static DAY_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*,?\s*\d+\s*Tage?\b").expect("day count pattern is valid"));

static DATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}\.\d{2}\.\d{2}$").expect("date pattern is valid"));

/// Collapse whitespace runs (including non-breaking spaces) into single spaces.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a leading date token into `(begin, end)`.
///
/// `"05.02.26 - 10.02.26"` yields both dates; `"04.02.26, 1 Tage"` yields the
/// single date twice and drops the day count.
pub fn parse_date_range(text: &str) -> Option<(String, String)> {
    let caps = DATE_RANGE.captures(text)?;
    let begin = caps.get(1)?.as_str().to_string();
    let end = caps
        .get(2)
        .map_or_else(|| begin.clone(), |m| m.as_str().to_string());
    Some((begin, end))
}

/// Text following a date that opens `text`.
///
/// The date range and a trailing day count are removed; `None` when `text`
/// does not start with a date.
pub fn strip_leading_date(text: &str) -> Option<&str> {
    let whole = DATE_RANGE.find(text)?;
    if !text[..whole.start()].trim().is_empty() {
        return None;
    }
    let rest = &text[whole.end()..];
    let rest = DAY_COUNT.find(rest).map_or(rest, |m| &rest[m.end()..]);
    Some(rest.trim_start_matches([',', ' ']).trim())
}

/// Whether `s` is exactly one `DD.MM.YY` date.
pub fn is_date_token(s: &str) -> bool {
    DATE_TOKEN.is_match(s)
}

/// Link to a tour: the base URL (without fragment) plus `#id`.
pub fn tour_url(base_url: &str, id: &str) -> String {
    let base = base_url.split('#').next().unwrap_or(base_url);
    format!("{base}#{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\t b\u{a0}c  "), "a b c");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn test_parse_single_date_with_day_count() {
        assert_eq!(
            parse_date_range("04.02.26, 1 Tage"),
            Some(("04.02.26".to_string(), "04.02.26".to_string()))
        );
    }

    #[test]
    fn test_parse_date_range() {
        assert_eq!(
            parse_date_range("05.02.26 - 10.02.26"),
            Some(("05.02.26".to_string(), "10.02.26".to_string()))
        );
        assert_eq!(
            parse_date_range("05.02.26–10.02.26, 6 Tage"),
            Some(("05.02.26".to_string(), "10.02.26".to_string()))
        );
    }

    #[test]
    fn test_parse_date_rejects_four_digit_year() {
        assert_eq!(parse_date_range("04.02.2026"), None);
        assert_eq!(parse_date_range("Incomplete tour"), None);
    }

    #[test]
    fn test_strip_leading_date() {
        assert_eq!(strip_leading_date("04.02.26 Skitour Planung"), Some("Skitour Planung"));
        assert_eq!(strip_leading_date("04.02.26, 1 Tage Skitour"), Some("Skitour"));
        assert_eq!(strip_leading_date("05.02.26 - 10.02.26, 6 Tage"), Some(""));
        assert_eq!(strip_leading_date("07.04.26 - 09.04.26"), Some(""));
        assert_eq!(strip_leading_date("Skitour 04.02.26"), None);
        assert_eq!(strip_leading_date("Hüttentour"), None);
    }

    #[test]
    fn test_is_date_token() {
        assert!(is_date_token("04.02.26"));
        assert!(!is_date_token("4.2.26"));
        assert!(!is_date_token("04.02.26 "));
    }

    #[test]
    fn test_tour_url() {
        assert_eq!(
            tour_url("https://example.com/index.php?inhalt=x", "t7138"),
            "https://example.com/index.php?inhalt=x#t7138"
        );
        assert_eq!(
            tour_url("https://example.com/list#top", "t1"),
            "https://example.com/list#t1"
        );
    }
}
