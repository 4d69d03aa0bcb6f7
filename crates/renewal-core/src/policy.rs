//! Action policy: one recommended follow-up per renewal record.
//!
//! Rules are checked in order and the first match wins. The urgent-expiry
//! rule sits first, so a record inside the urgency window gets the urgent
//! template no matter what its status is.

use crate::config::PolicyConfig;
use crate::record::RenewalRecord;
use crate::types::{PolicyStatus, TimeOfDay};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lead for statuses without a template of their own.
pub const DEFAULT_LEAD_DAYS: i64 = 5;

// ---------------------------------------------------------------------------
// EvalContext
// ---------------------------------------------------------------------------

pub struct EvalContext<'a> {
    pub record: &'a RenewalRecord,
    pub today: NaiveDate,
    pub days_to_expiry: i64,
    pub urgency_window_days: i64,
}

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    FollowUpCall,
    CarrierCheck,
    FirstFollowUp,
    SendDocuments,
    ExploreAlternatives,
    UrgentExpiry,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::FollowUpCall => "follow_up_call",
            ActionKind::CarrierCheck => "carrier_check",
            ActionKind::FirstFollowUp => "first_follow_up",
            ActionKind::SendDocuments => "send_documents",
            ActionKind::ExploreAlternatives => "explore_alternatives",
            ActionKind::UrgentExpiry => "urgent_expiry",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Action (output)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    pub title: String,
    pub description: String,
    pub duration_minutes: u32,
    pub preferred_start: TimeOfDay,
    pub target_date: NaiveDate,
    pub client: String,
    pub specialist: String,
    pub color_tag: String,
    pub urgent: bool,
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// A fn-pointer rule paired with the template it produces.
pub struct Rule {
    pub id: &'static str,
    pub condition: fn(&EvalContext) -> bool,
    pub kind: ActionKind,
    pub title: fn(&EvalContext) -> String,
    pub purpose: fn(&EvalContext) -> String,
    pub checklist: &'static [&'static str],
    pub duration_minutes: u32,
    pub preferred_start: TimeOfDay,
    pub color_tag: &'static str,
}

fn in_urgency_window(ctx: &EvalContext) -> bool {
    ctx.days_to_expiry > 0 && ctx.days_to_expiry <= ctx.urgency_window_days
}

fn status_is(ctx: &EvalContext, status: PolicyStatus) -> bool {
    ctx.record.status == status
}

pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            id: "urgent_expiry",
            condition: in_urgency_window,
            kind: ActionKind::UrgentExpiry,
            title: |ctx| {
                format!(
                    "URGENT EXPIRY: {} ({} days left)",
                    ctx.record.client, ctx.days_to_expiry
                )
            },
            purpose: |ctx| format!("Policy expires in {} days", ctx.days_to_expiry),
            checklist: &[
                "CRITICAL: Verify renewal status immediately",
                "Confirm coverage continuity",
                "Escalate if not finalized",
                "Avoid coverage gap at all costs",
            ],
            duration_minutes: 30,
            preferred_start: TimeOfDay::at(9, 30),
            color_tag: "11",
        },
        Rule {
            id: "quote_follow_up",
            condition: |ctx| status_is(ctx, PolicyStatus::Quote),
            kind: ActionKind::FollowUpCall,
            title: |ctx| format!("Follow-up Call: {}", ctx.record.client),
            purpose: |_| "Follow up on quote provided".to_string(),
            checklist: &[
                "Discuss quote details and coverage",
                "Address any questions or concerns",
                "Confirm client understanding of terms",
                "Set timeline for decision",
            ],
            duration_minutes: 30,
            preferred_start: TimeOfDay::at(10, 0),
            color_tag: "9",
        },
        Rule {
            id: "submitted_carrier_check",
            condition: |ctx| status_is(ctx, PolicyStatus::Submitted),
            kind: ActionKind::CarrierCheck,
            title: |ctx| format!("Check Carrier Response: {}", ctx.record.client),
            purpose: |_| "Follow up with carrier on submission".to_string(),
            checklist: &[
                "Check if carrier has reviewed submission",
                "Request status update",
                "Note any additional requirements",
                "Update internal tracking",
            ],
            duration_minutes: 15,
            preferred_start: TimeOfDay::at(11, 0),
            color_tag: "5",
        },
        Rule {
            id: "no_response_first_follow_up",
            condition: |ctx| status_is(ctx, PolicyStatus::NoResponse),
            kind: ActionKind::FirstFollowUp,
            title: |ctx| format!("First Follow-up: {}", ctx.record.client),
            purpose: |_| "Immediate outreach required".to_string(),
            checklist: &[
                "Call client directly",
                "Email if no answer",
                "Try alternative contacts",
                "Document attempt",
            ],
            duration_minutes: 20,
            preferred_start: TimeOfDay::at(9, 30),
            color_tag: "11",
        },
        Rule {
            id: "bound_send_documents",
            condition: |ctx| {
                matches!(
                    ctx.record.status,
                    PolicyStatus::Bound | PolicyStatus::Received
                )
            },
            kind: ActionKind::SendDocuments,
            title: |ctx| format!("Send Policy Documents: {}", ctx.record.client),
            purpose: |_| "Deliver final policy documents".to_string(),
            checklist: &[
                "Compile all policy documents",
                "Prepare summary of coverage",
                "Email complete package to client",
                "Confirm receipt",
            ],
            duration_minutes: 45,
            preferred_start: TimeOfDay::at(14, 0),
            color_tag: "10",
        },
        Rule {
            id: "declination_alternatives",
            condition: |ctx| status_is(ctx, PolicyStatus::Declination),
            kind: ActionKind::ExploreAlternatives,
            title: |ctx| format!("Explore Alternatives: {}", ctx.record.client),
            purpose: |_| "Explore alternative carriers".to_string(),
            checklist: &[
                "Review declination reason",
                "Identify alternative carriers",
                "Prepare new submission strategy",
                "Contact client with options",
            ],
            duration_minutes: 40,
            preferred_start: TimeOfDay::at(15, 0),
            color_tag: "8",
        },
    ]
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

pub struct Policy {
    rules: Vec<Rule>,
    urgency_window_days: i64,
}

impl Policy {
    pub fn new(rules: Vec<Rule>, config: &PolicyConfig) -> Self {
        Self {
            rules,
            urgency_window_days: config.urgency_window_days,
        }
    }

    pub fn standard(config: &PolicyConfig) -> Self {
        Self::new(default_rules(), config)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn urgency_window_days(&self) -> i64 {
        self.urgency_window_days
    }

    /// The date the record's action should land on, or `None` without a
    /// parseable expiry.
    pub fn compute_target_date(
        &self,
        record: &RenewalRecord,
        today: NaiveDate,
    ) -> Option<NaiveDate> {
        let days = record.days_to_expiry(today)?;
        let lead = lead_days(&record.status, days, self.urgency_window_days);
        today.checked_add_days(Days::new(lead.unsigned_abs()))
    }

    /// Derive the single action for `record` landing on `target_date`.
    ///
    /// `None` when the record has no expiry, has already expired, or matches
    /// no rule.
    pub fn derive_action(
        &self,
        record: &RenewalRecord,
        target_date: NaiveDate,
        today: NaiveDate,
    ) -> Option<Action> {
        let days_to_expiry = record.days_to_expiry(today)?;
        if days_to_expiry <= 0 {
            return None;
        }
        let ctx = EvalContext {
            record,
            today,
            days_to_expiry,
            urgency_window_days: self.urgency_window_days,
        };

        let rule = self.rules.iter().find(|rule| (rule.condition)(&ctx))?;
        Some(Action {
            kind: rule.kind,
            title: (rule.title)(&ctx),
            description: build_description(&ctx, &(rule.purpose)(&ctx), rule.checklist),
            duration_minutes: rule.duration_minutes,
            preferred_start: rule.preferred_start,
            target_date,
            client: record.client.clone(),
            specialist: record.specialist.clone(),
            color_tag: rule.color_tag.to_string(),
            urgent: rule.kind == ActionKind::UrgentExpiry,
        })
    }
}

/// Days from today to the action date.
pub fn lead_days(status: &PolicyStatus, days_to_expiry: i64, urgency_window_days: i64) -> i64 {
    if *status == PolicyStatus::NoResponse || days_to_expiry <= urgency_window_days {
        return 1;
    }
    match status {
        PolicyStatus::Bound | PolicyStatus::Received => 1,
        PolicyStatus::Quote => 7,
        PolicyStatus::Submitted => 3,
        _ => DEFAULT_LEAD_DAYS,
    }
}

// ---------------------------------------------------------------------------
// Description
// ---------------------------------------------------------------------------

fn build_description(ctx: &EvalContext, purpose: &str, checklist: &[&str]) -> String {
    let r = ctx.record;
    let mut lines = vec![
        format!("PURPOSE: {purpose}"),
        String::new(),
        "CLIENT INFORMATION:".to_string(),
        format!("Client: {}", r.client),
        format!("Coverage: {}", r.coverage),
        format!("Product Line: {}", r.product_line),
        format!("Carrier: {}", r.carrier_group),
        format!("Status: {}", r.status),
        format!("Premium: ₹{}", format_inr(r.premium)),
        format!("Assigned to: {}", r.specialist),
        format!("Placement ID: {}", r.placement_id),
        String::new(),
        "TIMELINE:".to_string(),
        format!("Expiry Date: {}", r.expiry_raw),
        format!("Days to Expiry: {}", ctx.days_to_expiry),
        String::new(),
        "ACTION ITEMS:".to_string(),
    ];
    lines.extend(
        checklist
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}. {item}", i + 1)),
    );
    lines.join("\n")
}

/// Indian digit grouping (`12,34,567.5`), at most three fraction digits.
pub fn format_inr(amount: f64) -> String {
    if !amount.is_finite() {
        return "0".to_string();
    }
    let thousandths = (amount.abs() * 1000.0).round() as u64;
    let whole = (thousandths / 1000).to_string();
    let frac = thousandths % 1000;

    let mut grouped = String::new();
    if whole.len() > 3 {
        let (head, tail) = whole.split_at(whole.len() - 3);
        let first = head.len() % 2;
        if first == 1 {
            grouped.push_str(&head[..1]);
        }
        for (i, pair) in head.as_bytes()[first..].chunks(2).enumerate() {
            if i > 0 || first == 1 {
                grouped.push(',');
            }
            grouped.push_str(std::str::from_utf8(pair).unwrap_or_default());
        }
        grouped.push(',');
        grouped.push_str(tail);
    } else {
        grouped.push_str(&whole);
    }

    if frac > 0 {
        let digits = format!("{frac:03}");
        grouped.push('.');
        grouped.push_str(digits.trim_end_matches('0'));
    }
    if amount < 0.0 && thousandths > 0 {
        grouped.insert(0, '-');
    }
    grouped
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
