use crate::types::PolicyStatus;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const UNASSIGNED_SPECIALIST: &str = "Unassigned";

// ---------------------------------------------------------------------------
// RenewalRecord
// ---------------------------------------------------------------------------

/// One row of the renewal feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenewalRecord {
    pub client: String,
    pub status: PolicyStatus,
    /// Expiry exactly as it appeared in the feed; see [`parse_expiry`].
    pub expiry_raw: String,
    pub specialist: String,
    pub premium: f64,
    #[serde(default)]
    pub coverage: String,
    #[serde(default)]
    pub product_line: String,
    #[serde(default)]
    pub carrier_group: String,
    #[serde(default)]
    pub placement_id: String,
}

impl RenewalRecord {
    pub fn new(
        client: impl Into<String>,
        status: PolicyStatus,
        expiry_raw: impl Into<String>,
        specialist: impl Into<String>,
    ) -> Self {
        let specialist = specialist.into();
        Self {
            client: client.into(),
            status,
            expiry_raw: expiry_raw.into(),
            specialist: normalize_specialist(&specialist),
            premium: 0.0,
            coverage: String::new(),
            product_line: String::new(),
            carrier_group: String::new(),
            placement_id: String::new(),
        }
    }

    pub fn expiry(&self) -> Option<NaiveDate> {
        parse_expiry(&self.expiry_raw)
    }

    /// Whole days from `today` until expiry; `None` without a parseable date.
    pub fn days_to_expiry(&self, today: NaiveDate) -> Option<i64> {
        self.expiry().map(|expiry| days_between(today, expiry))
    }
}

pub fn normalize_specialist(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        UNASSIGNED_SPECIALIST.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parse a premium amount, tolerating thousands separators. Unparseable
/// values count as zero.
pub fn parse_premium(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '₹' | '$'))
        .collect();
    cleaned.parse::<f64>().ok().filter(|p| p.is_finite()).unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Expiry dates
// ---------------------------------------------------------------------------

static DAY_FIRST_RE: OnceLock<Regex> = OnceLock::new();
static ISO_RE: OnceLock<Regex> = OnceLock::new();

fn day_first_re() -> &'static Regex {
    DAY_FIRST_RE.get_or_init(|| Regex::new(r"^(\d{1,2})([-/])(\d{1,2})([-/])(\d{4}|\d{2})$").unwrap())
}

fn iso_re() -> &'static Regex {
    ISO_RE.get_or_init(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").unwrap())
}

/// Parse a feed expiry date.
///
/// Accepts `DD-MM-YYYY`, `DD/MM/YYYY`, the two-digit-year variants of both
/// (read as 20YY) and ISO `YYYY-MM-DD`. Empty strings and `-` mean "no date".
pub fn parse_expiry(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() || s == "-" {
        return None;
    }

    if let Some(caps) = iso_re().captures(s) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let caps = day_first_re().captures(s)?;
    if caps[2] != caps[4] {
        return None;
    }
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[3].parse().ok()?;
    let year_raw = &caps[5];
    let mut year: i32 = year_raw.parse().ok()?;
    if year_raw.len() == 2 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_day_first_formats() {
        assert_eq!(parse_expiry("24-12-2025"), Some(date(2025, 12, 24)));
        assert_eq!(parse_expiry("24/12/2025"), Some(date(2025, 12, 24)));
        assert_eq!(parse_expiry("5/1/26"), Some(date(2026, 1, 5)));
        assert_eq!(parse_expiry(" 05-01-26 "), Some(date(2026, 1, 5)));
    }

    #[test]
    fn parses_iso() {
        assert_eq!(parse_expiry("2026-03-01"), Some(date(2026, 3, 1)));
    }

    #[test]
    fn rejects_missing_and_invalid() {
        assert_eq!(parse_expiry(""), None);
        assert_eq!(parse_expiry("-"), None);
        assert_eq!(parse_expiry("31/02/2026"), None);
        assert_eq!(parse_expiry("12.01.2026"), None);
        assert_eq!(parse_expiry("12-01/2026"), None);
        assert_eq!(parse_expiry("soon"), None);
    }

    #[test]
    fn days_to_expiry_is_calendar_difference() {
        let mut r = RenewalRecord::new("Acme", PolicyStatus::Quote, "25/12/2025", "Mary");
        assert_eq!(r.days_to_expiry(date(2025, 12, 17)), Some(8));
        assert_eq!(r.days_to_expiry(date(2025, 12, 25)), Some(0));
        assert_eq!(r.days_to_expiry(date(2025, 12, 26)), Some(-1));
        r.expiry_raw = "-".to_string();
        assert_eq!(r.days_to_expiry(date(2025, 12, 17)), None);
    }

    #[test]
    fn blank_specialist_is_unassigned() {
        let r = RenewalRecord::new("Acme", PolicyStatus::Quote, "", "  ");
        assert_eq!(r.specialist, UNASSIGNED_SPECIALIST);
    }

    #[test]
    fn premium_tolerates_separators() {
        assert_eq!(parse_premium("1,25,000"), 125000.0);
        assert_eq!(parse_premium("₹ 4500.50"), 4500.5);
        assert_eq!(parse_premium("n/a"), 0.0);
        assert_eq!(parse_premium(""), 0.0);
    }
}
