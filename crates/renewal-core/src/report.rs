use crate::ledger::Ledger;
use crate::types::TimeOfDay;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Per-record outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoExpiry,
    ClientAlreadyBooked,
    NoAction,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::NoExpiry => "no valid expiry date",
            SkipReason::ClientAlreadyBooked => "client already has an action that day",
            SkipReason::NoAction => "no action for this status",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
    Skipped {
        reason: SkipReason,
    },
    NoSlot {
        duration_minutes: u32,
    },
    /// Booked in a dry run; no sink was called.
    Scheduled {
        start: TimeOfDay,
        end: TimeOfDay,
        title: String,
    },
    /// Booked and handed to the sink successfully.
    Created {
        start: TimeOfDay,
        end: TimeOfDay,
        title: String,
        event_id: String,
    },
    /// Booked, but the sink failed. The booking stands.
    ExternalFailure {
        start: TimeOfDay,
        end: TimeOfDay,
        title: String,
        error: String,
    },
}

impl RecordOutcome {
    pub fn is_booked(&self) -> bool {
        matches!(
            self,
            RecordOutcome::Scheduled { .. }
                | RecordOutcome::Created { .. }
                | RecordOutcome::ExternalFailure { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeEntry {
    pub client: String,
    pub specialist: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub outcome: RecordOutcome,
}

// ---------------------------------------------------------------------------
// Density summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub total: usize,
    /// `HH:MM (specialist)` in start order.
    pub slots: Vec<String>,
}

pub fn day_summaries(ledger: &Ledger) -> Vec<DaySummary> {
    ledger
        .density()
        .into_iter()
        .map(|(date, total)| DaySummary {
            date,
            total,
            slots: ledger
                .global_on(date)
                .iter()
                .map(|b| format!("{} ({})", b.start, b.specialist))
                .collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// SyncReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub today: NaiveDate,
    pub dry_run: bool,
    pub sink: String,
    /// Records that got a booking, whether or not the sink succeeded.
    pub processed: usize,
    pub events_created: usize,
    pub skipped: usize,
    pub no_slot: usize,
    pub external_failures: usize,
    /// `no_slot + external_failures`.
    pub errors: usize,
    pub total: usize,
    pub specialists: usize,
    pub outcomes: Vec<OutcomeEntry>,
    pub days: Vec<DaySummary>,
}

impl SyncReport {
    pub fn new(today: NaiveDate, dry_run: bool, sink: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            today,
            dry_run,
            sink: sink.to_string(),
            processed: 0,
            events_created: 0,
            skipped: 0,
            no_slot: 0,
            external_failures: 0,
            errors: 0,
            total: 0,
            specialists: 0,
            outcomes: Vec::new(),
            days: Vec::new(),
        }
    }

    pub fn record(&mut self, entry: OutcomeEntry) {
        self.total += 1;
        match &entry.outcome {
            RecordOutcome::Skipped { .. } => self.skipped += 1,
            RecordOutcome::NoSlot { .. } => {
                self.no_slot += 1;
                self.errors += 1;
            }
            RecordOutcome::Scheduled { .. } => self.processed += 1,
            RecordOutcome::Created { .. } => {
                self.processed += 1;
                self.events_created += 1;
            }
            RecordOutcome::ExternalFailure { .. } => {
                self.processed += 1;
                self.external_failures += 1;
                self.errors += 1;
            }
        }
        self.outcomes.push(entry);
    }

    pub fn summarize(&mut self, ledger: &Ledger) {
        self.days = day_summaries(ledger);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
