use crate::error::{RenewalError, Result};
use crate::paths;
use crate::types::TimeOfDay;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// TimeWindow
// ---------------------------------------------------------------------------

/// A half-open `[start, end)` window within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeWindow {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, start: TimeOfDay, end: TimeOfDay) -> bool {
        start >= self.start && end <= self.end
    }

    pub fn overlaps(&self, start: TimeOfDay, end: TimeOfDay) -> bool {
        start < self.end && end > self.start
    }

    pub fn length_minutes(&self) -> u32 {
        self.end.minutes().saturating_sub(self.start.minutes())
    }
}

// ---------------------------------------------------------------------------
// ScheduleConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_business_hours")]
    pub business_hours: TimeWindow,
    /// `null` disables the break entirely.
    #[serde(default = "default_lunch_break")]
    pub lunch_break: Option<TimeWindow>,
    #[serde(default = "default_slot_step")]
    pub slot_step_minutes: u32,
}

const fn hm(hour: u16, minute: u16) -> TimeOfDay {
    TimeOfDay::at(hour, minute)
}

fn default_business_hours() -> TimeWindow {
    TimeWindow::new(hm(9, 0), hm(17, 0))
}

fn default_lunch_break() -> Option<TimeWindow> {
    Some(TimeWindow::new(hm(12, 30), hm(13, 30)))
}

fn default_slot_step() -> u32 {
    15
}

impl ScheduleConfig {
    /// Longest uninterrupted run of business minutes once lunch is cut out.
    pub fn longest_free_stretch_minutes(&self) -> u32 {
        let hours = self.business_hours;
        match self.lunch_break {
            Some(lunch) if hours.overlaps(lunch.start, lunch.end) => {
                let morning = lunch.start.minutes().saturating_sub(hours.start.minutes());
                let afternoon = hours.end.minutes().saturating_sub(lunch.end.minutes());
                morning.max(afternoon)
            }
            _ => hours.length_minutes(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            business_hours: default_business_hours(),
            lunch_break: default_lunch_break(),
            slot_step_minutes: default_slot_step(),
        }
    }
}

// ---------------------------------------------------------------------------
// PolicyConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Records expiring within this many days get the urgent-expiry action.
    #[serde(default = "default_urgency_window")]
    pub urgency_window_days: i64,
}

fn default_urgency_window() -> i64 {
    14
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            urgency_window_days: default_urgency_window(),
        }
    }
}

// ---------------------------------------------------------------------------
// CalendarBackend
// ---------------------------------------------------------------------------

/// Where committed bookings are sent as calendar events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CalendarBackend {
    DryRun,
    /// Append one JSON event per line. Relative paths resolve against the root.
    File { path: PathBuf },
    Webhook {
        url: String,
        #[serde(default = "default_webhook_timeout")]
        timeout_seconds: u64,
    },
}

fn default_webhook_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderMethod {
    Popup,
    Email,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub method: ReminderMethod,
    pub minutes: u32,
}

// ---------------------------------------------------------------------------
// CalendarConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Fixed offset used to stamp event timestamps, e.g. `+05:30`.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
    #[serde(default = "default_reminders")]
    pub reminders: Vec<Reminder>,
    /// Pause between live event creations.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_ms: u64,
    #[serde(default = "default_backend")]
    pub backend: CalendarBackend,
}

fn default_timezone() -> String {
    "Asia/Kolkata".to_string()
}

fn default_utc_offset() -> String {
    "+05:30".to_string()
}

fn default_reminders() -> Vec<Reminder> {
    vec![
        Reminder {
            method: ReminderMethod::Popup,
            minutes: 30,
        },
        Reminder {
            method: ReminderMethod::Email,
            minutes: 60,
        },
    ]
}

fn default_rate_limit() -> u64 {
    500
}

fn default_backend() -> CalendarBackend {
    CalendarBackend::DryRun
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            utc_offset: default_utc_offset(),
            reminders: default_reminders(),
            rate_limit_ms: default_rate_limit(),
            backend: default_backend(),
        }
    }
}

impl CalendarConfig {
    pub fn offset(&self) -> Result<FixedOffset> {
        parse_utc_offset(&self.utc_offset)
    }
}

/// Parse `+HH:MM` / `-HH:MM` (or `Z`) into a fixed offset.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset> {
    let invalid = || RenewalError::InvalidOffset(raw.to_string());
    let s = raw.trim();
    if s == "Z" || s == "UTC" {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }
    let (sign, rest) = match s.chars().next() {
        Some('+') => (1, &s[1..]),
        Some('-') => (-1, &s[1..]),
        _ => return Err(invalid()),
    };
    let (h, m) = rest.split_once(':').ok_or_else(invalid)?;
    if h.len() != 2 || m.len() != 2 {
        return Err(invalid());
    }
    let hours: i32 = h.parse().map_err(|_| invalid())?;
    let minutes: i32 = m.parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            schedule: ScheduleConfig::default(),
            policy: PolicyConfig::default(),
            calendar: CalendarConfig::default(),
        }
    }
}

impl Config {
    /// Load `.renewals/config.yaml`; a missing file yields the defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        crate::io::atomic_write(&path, self.to_yaml()?.as_bytes())
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Fail on the first error-level warning.
    pub fn ensure_valid(&self) -> Result<()> {
        match self.validate().into_iter().find(|w| w.level == WarnLevel::Error) {
            Some(w) => Err(RenewalError::InvalidConfig(w.message)),
            None => Ok(()),
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let hours = &self.schedule.business_hours;

        // 1. Business hours must be a non-empty window
        if hours.start >= hours.end {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "business_hours start {} is not before end {}",
                    hours.start, hours.end
                ),
            });
        }

        // 2. Probing needs a positive step
        if self.schedule.slot_step_minutes == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "slot_step_minutes must be greater than zero".to_string(),
            });
        }

        // 3. Lunch break sanity
        if let Some(lunch) = &self.schedule.lunch_break {
            if lunch.start >= lunch.end {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!(
                        "lunch_break start {} is not before end {}",
                        lunch.start, lunch.end
                    ),
                });
            } else if !hours.overlaps(lunch.start, lunch.end) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "lunch_break {}-{} lies outside business hours and has no effect",
                        lunch.start, lunch.end
                    ),
                });
            }
        }

        // 4. Urgency window
        if self.policy.urgency_window_days <= 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "urgency_window_days={} disables the urgent-expiry action",
                    self.policy.urgency_window_days
                ),
            });
        }

        // 5. Templates that can never be placed
        let longest_free = self.schedule.longest_free_stretch_minutes();
        for rule in crate::policy::default_rules() {
            if rule.duration_minutes > longest_free {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "'{}' actions need {} minutes but the longest free stretch is {} minutes",
                        rule.id, rule.duration_minutes, longest_free
                    ),
                });
            }
        }

        // 6. Event stamping
        if self.calendar.offset().is_err() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "calendar.utc_offset '{}' is not a valid offset (expected +HH:MM)",
                    self.calendar.utc_offset
                ),
            });
        }

        if let CalendarBackend::Webhook { url, .. } = &self.calendar.backend {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("webhook url '{url}' must start with http:// or https://"),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.schedule.business_hours, default_business_hours());
        assert_eq!(parsed.schedule.lunch_break, default_lunch_break());
        assert_eq!(parsed.schedule.slot_step_minutes, 15);
        assert_eq!(parsed.policy.urgency_window_days, 14);
        assert_eq!(parsed.calendar.backend, CalendarBackend::DryRun);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "schedule:\n  business_hours:\n    start: \"08:00\"\n    end: \"18:00\"\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.schedule.business_hours.start.to_string(), "08:00");
        assert_eq!(cfg.schedule.lunch_break, default_lunch_break());
        assert_eq!(cfg.calendar.timezone, "Asia/Kolkata");
        assert_eq!(cfg.calendar.reminders.len(), 2);
    }

    #[test]
    fn lunch_break_can_be_disabled() {
        let yaml = "schedule:\n  lunch_break: null\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(cfg.schedule.lunch_break.is_none());
    }

    #[test]
    fn backend_yaml_tagged() {
        let yaml = "calendar:\n  backend:\n    type: webhook\n    url: https://example.test/events\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            cfg.calendar.backend,
            CalendarBackend::Webhook {
                url: "https://example.test/events".to_string(),
                timeout_seconds: 30,
            }
        );

        let yaml = "calendar:\n  backend:\n    type: file\n    path: out/events.jsonl\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            cfg.calendar.backend,
            CalendarBackend::File {
                path: PathBuf::from("out/events.jsonl")
            }
        );
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.version, 1);
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::default();
        cfg.policy.urgency_window_days = 21;
        cfg.save(dir.path()).unwrap();
        assert!(dir.path().join(".renewals/config.yaml").exists());
        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.policy.urgency_window_days, 21);
    }

    #[test]
    fn invalid_time_in_yaml_is_rejected() {
        let yaml = "schedule:\n  business_hours:\n    start: \"nine\"\n    end: \"17:00\"\n";
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }

    #[test]
    fn validate_default_no_warnings() {
        assert!(Config::default().validate().is_empty());
        assert!(Config::default().ensure_valid().is_ok());
    }

    #[test]
    fn validate_inverted_business_hours_is_error() {
        let mut cfg = Config::default();
        cfg.schedule.business_hours = TimeWindow::new(hm(17, 0), hm(9, 0));
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("business_hours")));
        assert!(matches!(
            cfg.ensure_valid(),
            Err(RenewalError::InvalidConfig(_))
        ));
    }

    #[test]
    fn validate_zero_step_is_error() {
        let mut cfg = Config::default();
        cfg.schedule.slot_step_minutes = 0;
        assert!(cfg
            .validate()
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("slot_step_minutes")));
    }

    #[test]
    fn validate_lunch_outside_hours_warns() {
        let mut cfg = Config::default();
        cfg.schedule.lunch_break = Some(TimeWindow::new(hm(18, 0), hm(19, 0)));
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, WarnLevel::Warning);
    }

    #[test]
    fn validate_short_day_flags_unplaceable_templates() {
        let mut cfg = Config::default();
        cfg.schedule.business_hours = TimeWindow::new(hm(12, 0), hm(14, 0));
        // lunch leaves 30 free minutes on each side
        assert_eq!(cfg.schedule.longest_free_stretch_minutes(), 30);
        let warnings = cfg.validate();
        let flagged: Vec<&ConfigWarning> = warnings
            .iter()
            .filter(|w| w.message.contains("longest free stretch"))
            .collect();
        // 45-minute documents and 40-minute declination follow-ups
        assert_eq!(flagged.len(), 2);
        assert!(flagged.iter().all(|w| w.level == WarnLevel::Warning));
    }

    #[test]
    fn validate_bad_offset_and_webhook() {
        let mut cfg = Config::default();
        cfg.calendar.utc_offset = "IST".to_string();
        cfg.calendar.backend = CalendarBackend::Webhook {
            url: "ftp://nope".to_string(),
            timeout_seconds: 5,
        };
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.message.contains("utc_offset")));
        assert!(warnings.iter().any(|w| w.message.contains("webhook url")));
    }

    #[test]
    fn utc_offsets_parse() {
        assert_eq!(parse_utc_offset("+05:30").unwrap().local_minus_utc(), 19800);
        assert_eq!(parse_utc_offset("-04:00").unwrap().local_minus_utc(), -14400);
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
        assert!(parse_utc_offset("+5:30").is_err());
        assert!(parse_utc_offset("05:30").is_err());
        assert!(parse_utc_offset("+05:75").is_err());
    }

    #[test]
    fn time_window_overlap_is_half_open() {
        let lunch = TimeWindow::new(hm(12, 30), hm(13, 30));
        assert!(!lunch.overlaps(hm(12, 0), hm(12, 30)));
        assert!(!lunch.overlaps(hm(13, 30), hm(14, 0)));
        assert!(lunch.overlaps(hm(12, 0), hm(13, 30)));
        assert!(lunch.overlaps(hm(12, 45), hm(13, 0)));
        assert!(lunch.overlaps(hm(12, 0), hm(14, 0)));
    }
}
