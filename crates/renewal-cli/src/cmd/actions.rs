use crate::cmd::{load_config, load_feed_for, resolve_today};
use crate::output::{print_json, print_table};
use chrono::NaiveDate;
use renewal_core::policy::{Action, Policy};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct PlannedAction {
    client: String,
    specialist: String,
    status: String,
    days_to_expiry: Option<i64>,
    target_date: Option<NaiveDate>,
    action: Option<Action>,
}

pub fn run(
    root: &Path,
    feed: Option<&Path>,
    today: Option<NaiveDate>,
    json: bool,
) -> anyhow::Result<()> {
    let config = load_config(root)?;
    let today = resolve_today(today, &config)?;
    let (_, feed) = load_feed_for(root, feed)?;
    let policy = Policy::standard(&config.policy);

    let planned: Vec<PlannedAction> = feed
        .records
        .iter()
        .map(|record| {
            let target_date = policy.compute_target_date(record, today);
            PlannedAction {
                client: record.client.clone(),
                specialist: record.specialist.clone(),
                status: record.status.to_string(),
                days_to_expiry: record.days_to_expiry(today),
                target_date,
                action: target_date.and_then(|d| policy.derive_action(record, d, today)),
            }
        })
        .collect();

    if json {
        return print_json(&planned);
    }

    if planned.is_empty() {
        println!("No records in feed.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = planned
        .iter()
        .map(|p| {
            let days = p
                .days_to_expiry
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string());
            match &p.action {
                Some(a) => vec![
                    p.client.clone(),
                    p.specialist.clone(),
                    p.status.clone(),
                    days,
                    a.target_date.to_string(),
                    a.preferred_start.to_string(),
                    format!("{}m", a.duration_minutes),
                    a.title.clone(),
                ],
                None => vec![
                    p.client.clone(),
                    p.specialist.clone(),
                    p.status.clone(),
                    days,
                    "-".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    "(no action)".to_string(),
                ],
            }
        })
        .collect();
    print_table(
        &["CLIENT", "SPECIALIST", "STATUS", "DAYS", "DATE", "PREFERRED", "LENGTH", "ACTION"],
        &rows,
    );

    let with_action = planned.iter().filter(|p| p.action.is_some()).count();
    let urgent = planned
        .iter()
        .filter(|p| p.action.as_ref().is_some_and(|a| a.urgent))
        .count();
    println!();
    println!(
        "{} record(s), {} with an action ({} urgent) as of {}",
        planned.len(),
        with_action,
        urgent,
        today
    );
    Ok(())
}
