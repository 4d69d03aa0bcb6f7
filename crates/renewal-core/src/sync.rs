//! Sync driver: records in, bookings and calendar events out.
//!
//! Per record the driver runs parse expiry, target date, client-day gate,
//! action, slot search and booking, then hands the booking to the event sink.
//! Every record ends in exactly one [`RecordOutcome`]; nothing aborts the run
//! once it has started.

use crate::allocator::{Scheduler, SlotRequest};
use crate::calendar::{build_event, EventSink};
use crate::config::{CalendarConfig, Config};
use crate::error::Result;
use crate::ledger::Ledger;
use crate::policy::Policy;
use crate::record::RenewalRecord;
use crate::report::{OutcomeEntry, RecordOutcome, SkipReason, SyncReport};
use chrono::NaiveDate;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub today: NaiveDate,
    /// Only the first N feed records are considered.
    pub max_records: Option<usize>,
    /// Book without calling the sink.
    pub dry_run: bool,
}

impl SyncOptions {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            max_records: None,
            dry_run: false,
        }
    }
}

/// Group records by specialist, groups and members both in first-seen order.
pub fn group_by_specialist(records: &[RenewalRecord]) -> Vec<(&str, Vec<&RenewalRecord>)> {
    let mut groups: Vec<(&str, Vec<&RenewalRecord>)> = Vec::new();
    for record in records {
        match groups
            .iter_mut()
            .find(|(name, _)| *name == record.specialist)
        {
            Some((_, members)) => members.push(record),
            None => groups.push((record.specialist.as_str(), vec![record])),
        }
    }
    groups
}

// ---------------------------------------------------------------------------
// SyncDriver
// ---------------------------------------------------------------------------

pub struct SyncDriver<'a> {
    policy: Policy,
    scheduler: Scheduler,
    calendar: &'a CalendarConfig,
    sink: &'a mut dyn EventSink,
    options: SyncOptions,
}

impl<'a> SyncDriver<'a> {
    /// Fails only on an invalid config; per-record problems are reported,
    /// not raised.
    pub fn new(config: &'a Config, sink: &'a mut dyn EventSink, options: SyncOptions) -> Result<Self> {
        config.ensure_valid()?;
        Ok(Self {
            policy: Policy::standard(&config.policy),
            scheduler: Scheduler::new(config.schedule.clone()),
            calendar: &config.calendar,
            sink,
            options,
        })
    }

    pub fn ledger(&self) -> &Ledger {
        self.scheduler.ledger()
    }

    pub fn run(&mut self, records: &[RenewalRecord]) -> SyncReport {
        let limit = self.options.max_records.unwrap_or(records.len());
        let selected = &records[..limit.min(records.len())];
        let groups = group_by_specialist(selected);

        let mut report = SyncReport::new(self.options.today, self.options.dry_run, self.sink.name());
        report.specialists = groups.len();
        info!(
            run_id = %report.run_id,
            records = selected.len(),
            specialists = groups.len(),
            dry_run = self.options.dry_run,
            sink = self.sink.name(),
            "sync started"
        );

        for (specialist, members) in groups {
            info!(specialist, records = members.len(), "processing specialist");
            for record in members {
                let entry = self.process(record);
                report.record(entry);
            }
        }

        report.summarize(self.scheduler.ledger());
        info!(
            run_id = %report.run_id,
            processed = report.processed,
            events_created = report.events_created,
            skipped = report.skipped,
            errors = report.errors,
            "sync finished"
        );
        report
    }

    fn process(&mut self, record: &RenewalRecord) -> OutcomeEntry {
        let today = self.options.today;
        let entry = |target_date: Option<NaiveDate>, outcome: RecordOutcome| OutcomeEntry {
            client: record.client.clone(),
            specialist: record.specialist.clone(),
            target_date,
            outcome,
        };

        let Some(target) = self.policy.compute_target_date(record, today) else {
            debug!(client = %record.client, raw = %record.expiry_raw, "skipped: no valid expiry date");
            return entry(None, skipped(SkipReason::NoExpiry));
        };

        if self.scheduler.has_client_acted_on(&record.client, target) {
            debug!(client = %record.client, date = %target, "skipped: client already booked that day");
            return entry(Some(target), skipped(SkipReason::ClientAlreadyBooked));
        }

        let Some(action) = self.policy.derive_action(record, target, today) else {
            debug!(client = %record.client, status = %record.status, "skipped: no action");
            return entry(Some(target), skipped(SkipReason::NoAction));
        };

        let reserved = self.scheduler.reserve(SlotRequest {
            specialist: &record.specialist,
            client: &record.client,
            title: &action.title,
            date: target,
            duration_minutes: action.duration_minutes,
            preferred_start: Some(action.preferred_start),
        });
        let booked = match reserved {
            Ok(Some(booked)) => booked,
            Ok(None) => {
                warn!(
                    client = %record.client,
                    specialist = %record.specialist,
                    date = %target,
                    duration = action.duration_minutes,
                    "no available slot"
                );
                return entry(
                    Some(target),
                    RecordOutcome::NoSlot {
                        duration_minutes: action.duration_minutes,
                    },
                );
            }
            Err(e) => {
                warn!(client = %record.client, error = %e, "booking rejected");
                return entry(
                    Some(target),
                    RecordOutcome::NoSlot {
                        duration_minutes: action.duration_minutes,
                    },
                );
            }
        };
        info!(
            client = %record.client,
            specialist = %record.specialist,
            date = %target,
            start = %booked.start,
            end = %booked.end,
            "scheduled"
        );

        if self.options.dry_run {
            return entry(
                Some(target),
                RecordOutcome::Scheduled {
                    start: booked.start,
                    end: booked.end,
                    title: booked.title,
                },
            );
        }

        // The ledger borrow has ended; the sink may block on the network.
        let created = build_event(&action, &booked, self.calendar)
            .and_then(|event| self.sink.create_event(&event));
        let outcome = match created {
            Ok(event_id) => {
                debug!(client = %record.client, event_id = %event_id, "event created");
                RecordOutcome::Created {
                    start: booked.start,
                    end: booked.end,
                    title: booked.title,
                    event_id,
                }
            }
            Err(e) => {
                warn!(client = %record.client, error = %e, "event creation failed; booking kept");
                RecordOutcome::ExternalFailure {
                    start: booked.start,
                    end: booked.end,
                    title: booked.title,
                    error: e.to_string(),
                }
            }
        };

        if self.sink.is_live() && self.calendar.rate_limit_ms > 0 {
            std::thread::sleep(Duration::from_millis(self.calendar.rate_limit_ms));
        }
        entry(Some(target), outcome)
    }
}

fn skipped(reason: SkipReason) -> RecordOutcome {
    RecordOutcome::Skipped { reason }
}

/// Run one sync over `records` with a fresh ledger.
pub fn run_sync(
    config: &Config,
    records: &[RenewalRecord],
    sink: &mut dyn EventSink,
    options: SyncOptions,
) -> Result<SyncReport> {
    let mut driver = SyncDriver::new(config, sink, options)?;
    Ok(driver.run(records))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
