//! Booking ledger for one sync run.
//!
//! All bookings live in a single index keyed by date, each list sorted by
//! start time and tagged with the owning specialist. A specialist's schedule
//! is a filtered view of that index, so the global list is by construction the
//! union of every specialist's bookings. The ledger is created empty and
//! discarded when the run ends.

use crate::error::{RenewalError, Result};
use crate::types::TimeOfDay;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

// ---------------------------------------------------------------------------
// BookedInterval
// ---------------------------------------------------------------------------

/// A committed `[start, end)` booking on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedInterval {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub title: String,
    pub specialist: String,
    pub client: String,
}

impl BookedInterval {
    pub fn overlaps(&self, start: TimeOfDay, end: TimeOfDay) -> bool {
        start < self.end && end > self.start
    }

    pub fn duration_minutes(&self) -> u32 {
        self.end.minutes() - self.start.minutes()
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    bookings: BTreeMap<NaiveDate, Vec<BookedInterval>>,
    client_days: HashMap<String, BTreeSet<NaiveDate>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit a booking. The caller is responsible for having checked the
    /// slot; the ledger only keeps each date's list ordered by start.
    pub fn book(
        &mut self,
        specialist: &str,
        date: NaiveDate,
        start: TimeOfDay,
        duration_minutes: u32,
        title: &str,
        client: &str,
    ) -> Result<&BookedInterval> {
        let end = start
            .plus_minutes(duration_minutes)
            .ok_or_else(|| RenewalError::IntervalOutOfDay {
                start: start.to_string(),
                duration_minutes,
            })?;
        let interval = BookedInterval {
            start,
            end,
            title: title.to_string(),
            specialist: specialist.to_string(),
            client: client.to_string(),
        };

        let list = self.bookings.entry(date).or_default();
        let pos = list.partition_point(|b| b.start <= interval.start);
        list.insert(pos, interval);
        Ok(&list[pos])
    }

    /// Every booking on `date`, across all specialists, sorted by start.
    pub fn global_on(&self, date: NaiveDate) -> &[BookedInterval] {
        self.bookings.get(&date).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// `specialist`'s own bookings on `date`, sorted by start.
    pub fn specialist_on<'a>(
        &'a self,
        specialist: &'a str,
        date: NaiveDate,
    ) -> impl Iterator<Item = &'a BookedInterval> + 'a {
        self.global_on(date)
            .iter()
            .filter(move |b| b.specialist == specialist)
    }

    /// Dates with at least one booking, ascending.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.bookings
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(date, _)| *date)
    }

    /// Booking count per date, ascending by date.
    pub fn density(&self) -> BTreeMap<NaiveDate, usize> {
        self.bookings
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(date, list)| (*date, list.len()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.bookings.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -----------------------------------------------------------------------
    // Client-day gate
    // -----------------------------------------------------------------------

    pub fn mark_client_acted_on(&mut self, client: &str, date: NaiveDate) {
        self.client_days
            .entry(client.to_string())
            .or_default()
            .insert(date);
    }

    pub fn has_client_acted_on(&self, client: &str, date: NaiveDate) -> bool {
        self.client_days
            .get(client)
            .is_some_and(|days| days.contains(&date))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
