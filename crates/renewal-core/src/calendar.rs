//! Event sinks: where committed bookings become calendar events.
//!
//! The sync driver books first and calls the sink afterwards, so a sink
//! failure never un-books a slot.

use crate::config::{CalendarBackend, CalendarConfig, Reminder};
use crate::error::{RenewalError, Result};
use crate::io;
use crate::ledger::BookedInterval;
use crate::policy::Action;
use crate::types::TimeOfDay;
use chrono::{Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// CalendarEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub title: String,
    pub description: String,
    /// RFC 3339 in the configured fixed offset.
    pub start: String,
    pub end: String,
    pub timezone: String,
    pub color_tag: String,
    pub reminders: Vec<Reminder>,
}

/// Stamp a committed booking as an event.
pub fn build_event(
    action: &Action,
    booked: &BookedInterval,
    config: &CalendarConfig,
) -> Result<CalendarEvent> {
    let offset = config.offset()?;
    Ok(CalendarEvent {
        title: action.title.clone(),
        description: action.description.clone(),
        start: timestamp(offset, action.target_date, booked.start)?,
        end: timestamp(offset, action.target_date, booked.end)?,
        timezone: config.timezone.clone(),
        color_tag: action.color_tag.clone(),
        reminders: config.reminders.clone(),
    })
}

fn timestamp(offset: FixedOffset, date: NaiveDate, time: TimeOfDay) -> Result<String> {
    // 24:00 rolls over to midnight of the next day
    let local = date.and_time(NaiveTime::MIN) + Duration::minutes(i64::from(time.minutes()));
    offset
        .from_local_datetime(&local)
        .single()
        .map(|dt| dt.to_rfc3339())
        .ok_or_else(|| RenewalError::InvalidDate(local.to_string()))
}

// ---------------------------------------------------------------------------
// EventSink
// ---------------------------------------------------------------------------

/// External event-creation collaborator. Returns the created event's id.
pub trait EventSink {
    fn name(&self) -> &'static str;

    fn create_event(&mut self, event: &CalendarEvent) -> Result<String>;

    /// Live sinks are paced by `calendar.rate_limit_ms`.
    fn is_live(&self) -> bool {
        true
    }
}

/// Build the sink selected by `config.backend`. `dry_run` forces
/// [`DryRunSink`] regardless of the configured backend.
pub fn sink_from_config(
    root: &Path,
    config: &CalendarConfig,
    dry_run: bool,
) -> Result<Box<dyn EventSink>> {
    if dry_run {
        return Ok(Box::new(DryRunSink::default()));
    }
    let sink: Box<dyn EventSink> = match &config.backend {
        CalendarBackend::DryRun => Box::new(DryRunSink::default()),
        CalendarBackend::File { path } => {
            let path = if path.is_absolute() {
                path.clone()
            } else {
                root.join(path)
            };
            Box::new(FileSink::new(path))
        }
        CalendarBackend::Webhook {
            url,
            timeout_seconds,
        } => Box::new(WebhookSink::new(url, *timeout_seconds)?),
    };
    Ok(sink)
}

// ---------------------------------------------------------------------------
// DryRunSink
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct DryRunSink {
    created: usize,
}

impl EventSink for DryRunSink {
    fn name(&self) -> &'static str {
        "dry_run"
    }

    fn create_event(&mut self, _event: &CalendarEvent) -> Result<String> {
        self.created += 1;
        Ok(format!("dry-run-{}", self.created))
    }

    fn is_live(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// FileSink
// ---------------------------------------------------------------------------

/// Appends one JSON object per event to a JSON-lines file.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    written: usize,
}

impl FileSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path, written: 0 }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for FileSink {
    fn name(&self) -> &'static str {
        "file"
    }

    fn create_event(&mut self, event: &CalendarEvent) -> Result<String> {
        let line = serde_json::to_string(event)?;
        io::append_line(&self.path, &line)?;
        self.written += 1;
        Ok(format!("{}#{}", self.path.display(), self.written))
    }
}

// ---------------------------------------------------------------------------
// WebhookSink
// ---------------------------------------------------------------------------

/// POSTs each event as JSON. Any non-2xx response is an error.
pub struct WebhookSink {
    url: String,
    client: reqwest::blocking::Client,
    sent: usize,
}

#[derive(Deserialize)]
struct WebhookReply {
    id: Option<String>,
}

impl WebhookSink {
    pub fn new(url: &str, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self {
            url: url.to_string(),
            client,
            sent: 0,
        })
    }
}

impl EventSink for WebhookSink {
    fn name(&self) -> &'static str {
        "webhook"
    }

    fn create_event(&mut self, event: &CalendarEvent) -> Result<String> {
        let resp = self.client.post(&self.url).json(event).send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(RenewalError::Sink(format!(
                "{} returned {status}: {}",
                self.url,
                body.trim()
            )));
        }
        self.sent += 1;
        // An empty or non-JSON body is still a success.
        let reply = resp
            .text()
            .ok()
            .and_then(|body| serde_json::from_str::<WebhookReply>(&body).ok());
        Ok(reply
            .and_then(|r| r.id)
            .unwrap_or_else(|| format!("webhook-{}", self.sent)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CalendarConfig, PolicyConfig};
    use crate::ledger::Ledger;
    use crate::policy::Policy;
    use crate::record::RenewalRecord;
    use crate::types::PolicyStatus;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 17).unwrap()
    }

    fn action_and_booking(start: &str) -> (Action, BookedInterval) {
        let record = RenewalRecord::new("Acme", PolicyStatus::Quote, "30-01-2026", "Mary");
        let policy = Policy::standard(&PolicyConfig::default());
        let target = policy.compute_target_date(&record, today()).unwrap();
        let action = policy.derive_action(&record, target, today()).unwrap();
        let mut ledger = Ledger::new();
        let booked = ledger
            .book(
                &action.specialist,
                target,
                start.parse().unwrap(),
                action.duration_minutes,
                &action.title,
                &action.client,
            )
            .unwrap()
            .clone();
        (action, booked)
    }

    fn sample_event() -> CalendarEvent {
        let (action, booked) = action_and_booking("10:00");
        build_event(&action, &booked, &CalendarConfig::default()).unwrap()
    }

    #[test]
    fn build_event_stamps_fixed_offset() {
        let event = sample_event();
        assert_eq!(event.title, "Follow-up Call: Acme");
        assert_eq!(event.start, "2025-12-24T10:00:00+05:30");
        assert_eq!(event.end, "2025-12-24T10:30:00+05:30");
        assert_eq!(event.timezone, "Asia/Kolkata");
        assert_eq!(event.color_tag, "9");
        assert_eq!(event.reminders.len(), 2);
    }

    #[test]
    fn build_event_rejects_bad_offset() {
        let (action, booked) = action_and_booking("10:00");
        let config = CalendarConfig {
            utc_offset: "IST".to_string(),
            ..CalendarConfig::default()
        };
        assert!(matches!(
            build_event(&action, &booked, &config),
            Err(RenewalError::InvalidOffset(_))
        ));
    }

    #[test]
    fn dry_run_sink_counts() {
        let mut sink = DryRunSink::default();
        let event = sample_event();
        assert_eq!(sink.create_event(&event).unwrap(), "dry-run-1");
        assert_eq!(sink.create_event(&event).unwrap(), "dry-run-2");
        assert!(!sink.is_live());
    }

    #[test]
    fn file_sink_appends_json_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/events.jsonl");
        let mut sink = FileSink::new(path.clone());
        let event = sample_event();
        sink.create_event(&event).unwrap();
        sink.create_event(&event).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: CalendarEvent = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn sink_from_config_resolves_relative_file_path() {
        let dir = TempDir::new().unwrap();
        let config = CalendarConfig {
            backend: CalendarBackend::File {
                path: PathBuf::from("events.jsonl"),
            },
            ..CalendarConfig::default()
        };
        let mut sink = sink_from_config(dir.path(), &config, false).unwrap();
        assert_eq!(sink.name(), "file");
        sink.create_event(&sample_event()).unwrap();
        assert!(dir.path().join("events.jsonl").exists());

        let forced = sink_from_config(dir.path(), &config, true).unwrap();
        assert_eq!(forced.name(), "dry_run");
    }

    #[test]
    fn webhook_sink_posts_event() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/events")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "title": "Follow-up Call: Acme",
                "start": "2025-12-24T10:00:00+05:30",
            })))
            .with_status(201)
            .with_body(r#"{"id":"evt-42"}"#)
            .create();

        let mut sink = WebhookSink::new(&format!("{}/events", server.url()), 5).unwrap();
        let id = sink.create_event(&sample_event()).unwrap();
        assert_eq!(id, "evt-42");
        mock.assert();
    }

    #[test]
    fn webhook_sink_without_id_falls_back() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("POST", "/events").with_status(200).create();
        let mut sink = WebhookSink::new(&format!("{}/events", server.url()), 5).unwrap();
        assert_eq!(sink.create_event(&sample_event()).unwrap(), "webhook-1");
    }

    #[test]
    fn webhook_sink_non_2xx_is_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/events")
            .with_status(503)
            .with_body("calendar down")
            .create();
        let mut sink = WebhookSink::new(&format!("{}/events", server.url()), 5).unwrap();
        let err = sink.create_event(&sample_event()).unwrap_err();
        match err {
            RenewalError::Sink(msg) => {
                assert!(msg.contains("503"));
                assert!(msg.contains("calendar down"));
            }
            other => panic!("expected sink error, got {other:?}"),
        }
    }
}
