//! Slot allocation over a [`Ledger`].
//!
//! A slot search probes forward from the preferred start (or business open)
//! in fixed steps and takes the first start time whose interval fits the
//! business day, misses the lunch break, and overlaps nothing already booked
//! on that date, neither globally nor for the specialist. The first fit wins,
//! so for a fixed ledger and record order the result is deterministic.

use crate::config::ScheduleConfig;
use crate::error::Result;
use crate::ledger::{BookedInterval, Ledger};
use crate::types::TimeOfDay;
use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

pub fn is_slot_available(
    ledger: &Ledger,
    schedule: &ScheduleConfig,
    specialist: &str,
    date: NaiveDate,
    start: TimeOfDay,
    duration_minutes: u32,
) -> bool {
    if duration_minutes == 0 {
        return false;
    }
    let Some(end) = start.plus_minutes(duration_minutes) else {
        return false;
    };

    if !schedule.business_hours.contains(start, end) {
        return false;
    }

    if let Some(lunch) = &schedule.lunch_break {
        if lunch.overlaps(start, end) {
            return false;
        }
    }

    // Cross-specialist guard: one booking at a time across the whole pool.
    if ledger.global_on(date).iter().any(|b| b.overlaps(start, end)) {
        return false;
    }

    !ledger
        .specialist_on(specialist, date)
        .any(|b| b.overlaps(start, end))
}

/// Earliest feasible start for `duration_minutes` on `date`, or `None` once
/// probing reaches business close.
pub fn find_slot(
    ledger: &Ledger,
    schedule: &ScheduleConfig,
    specialist: &str,
    date: NaiveDate,
    duration_minutes: u32,
    preferred_start: Option<TimeOfDay>,
) -> Option<TimeOfDay> {
    let step = schedule.slot_step_minutes.max(1);
    let close = schedule.business_hours.end;
    let mut candidate = preferred_start.unwrap_or(schedule.business_hours.start);

    while candidate < close {
        if is_slot_available(ledger, schedule, specialist, date, candidate, duration_minutes) {
            return Some(candidate);
        }
        candidate = candidate.plus_minutes(step)?;
    }
    None
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Scheduling context for one run: the schedule rules plus an owned ledger.
///
/// `reserve` does search, commit and client marking under a single `&mut`
/// borrow, so no other booking can interleave between finding a slot and
/// taking it.
#[derive(Debug, Clone)]
pub struct Scheduler {
    schedule: ScheduleConfig,
    ledger: Ledger,
}

/// What a caller wants placed on the calendar.
#[derive(Debug, Clone, Copy)]
pub struct SlotRequest<'a> {
    pub specialist: &'a str,
    pub client: &'a str,
    pub title: &'a str,
    pub date: NaiveDate,
    pub duration_minutes: u32,
    pub preferred_start: Option<TimeOfDay>,
}

impl Scheduler {
    pub fn new(schedule: ScheduleConfig) -> Self {
        Self {
            schedule,
            ledger: Ledger::new(),
        }
    }

    pub fn schedule(&self) -> &ScheduleConfig {
        &self.schedule
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn find_slot(
        &self,
        specialist: &str,
        date: NaiveDate,
        duration_minutes: u32,
        preferred_start: Option<TimeOfDay>,
    ) -> Option<TimeOfDay> {
        find_slot(
            &self.ledger,
            &self.schedule,
            specialist,
            date,
            duration_minutes,
            preferred_start,
        )
    }

    pub fn book(
        &mut self,
        specialist: &str,
        date: NaiveDate,
        start: TimeOfDay,
        duration_minutes: u32,
        title: &str,
        client: &str,
    ) -> Result<&BookedInterval> {
        self.ledger
            .book(specialist, date, start, duration_minutes, title, client)
    }

    pub fn has_client_acted_on(&self, client: &str, date: NaiveDate) -> bool {
        self.ledger.has_client_acted_on(client, date)
    }

    pub fn mark_client_acted_on(&mut self, client: &str, date: NaiveDate) {
        self.ledger.mark_client_acted_on(client, date);
    }

    /// Find the earliest slot and commit it. Returns the booked interval, or
    /// `None` when the day has no room.
    pub fn reserve(&mut self, req: SlotRequest<'_>) -> Result<Option<BookedInterval>> {
        let Some(start) = self.find_slot(
            req.specialist,
            req.date,
            req.duration_minutes,
            req.preferred_start,
        ) else {
            return Ok(None);
        };
        let booked = self
            .ledger
            .book(
                req.specialist,
                req.date,
                start,
                req.duration_minutes,
                req.title,
                req.client,
            )?
            .clone();
        self.ledger.mark_client_acted_on(req.client, req.date);
        Ok(Some(booked))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
