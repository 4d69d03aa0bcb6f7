use crate::error::RenewalError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// TimeOfDay
// ---------------------------------------------------------------------------

const MINUTES_PER_DAY: u16 = 24 * 60;

/// A minute-resolution time of day scoped to a single calendar date.
///
/// `24:00` is representable so that an interval may end exactly at midnight;
/// nothing can start there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);

    /// Const constructor for fixed times; panics (at compile time in const
    /// contexts) on an out-of-range value.
    pub const fn at(hour: u16, minute: u16) -> Self {
        assert!(minute < 60 && hour * 60 + minute <= MINUTES_PER_DAY);
        TimeOfDay(hour * 60 + minute)
    }

    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if minute >= 60 {
            return None;
        }
        let total = hour.checked_mul(60)?.checked_add(minute)?;
        (total <= MINUTES_PER_DAY).then_some(TimeOfDay(total))
    }

    pub fn from_minutes(minutes: u32) -> Option<Self> {
        u16::try_from(minutes)
            .ok()
            .filter(|m| *m <= MINUTES_PER_DAY)
            .map(TimeOfDay)
    }

    pub fn minutes(self) -> u32 {
        u32::from(self.0)
    }

    pub fn hour(self) -> u32 {
        self.minutes() / 60
    }

    pub fn minute(self) -> u32 {
        self.minutes() % 60
    }

    /// `None` when the result would run past the end of the day.
    pub fn plus_minutes(self, minutes: u32) -> Option<Self> {
        Self::from_minutes(self.minutes().checked_add(minutes)?)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl std::str::FromStr for TimeOfDay {
    type Err = RenewalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RenewalError::InvalidTime(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(invalid());
        }
        let hour: u16 = h.parse().map_err(|_| invalid())?;
        let minute: u16 = m.parse().map_err(|_| invalid())?;
        TimeOfDay::from_hm(hour, minute).ok_or_else(invalid)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// PolicyStatus
// ---------------------------------------------------------------------------

/// Placement status as it appears in the renewal feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PolicyStatus {
    Quote,
    Submitted,
    NoResponse,
    Bound,
    Received,
    Declination,
    /// Any status text the policy has no template for.
    Other(String),
}

impl PolicyStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "Quote" => PolicyStatus::Quote,
            "Submitted" => PolicyStatus::Submitted,
            "No Response" => PolicyStatus::NoResponse,
            "Bound" => PolicyStatus::Bound,
            "Received" => PolicyStatus::Received,
            "Declination" => PolicyStatus::Declination,
            other => PolicyStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PolicyStatus::Quote => "Quote",
            PolicyStatus::Submitted => "Submitted",
            PolicyStatus::NoResponse => "No Response",
            PolicyStatus::Bound => "Bound",
            PolicyStatus::Received => "Received",
            PolicyStatus::Declination => "Declination",
            PolicyStatus::Other(s) => s,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, PolicyStatus::Other(_))
    }
}

impl fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for PolicyStatus {
    fn from(s: String) -> Self {
        PolicyStatus::parse(&s)
    }
}

impl From<PolicyStatus> for String {
    fn from(status: PolicyStatus) -> Self {
        status.as_str().to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
