use crate::cmd::{load_config, load_feed_for, resolve_today};
use crate::output::{print_json, print_table};
use anyhow::Context;
use chrono::NaiveDate;
use renewal_core::{
    calendar::sink_from_config,
    report::{RecordOutcome, SyncReport},
    sync::{run_sync, SyncOptions},
};
use std::path::{Path, PathBuf};

pub struct RunArgs {
    pub feed: Option<PathBuf>,
    pub max: Option<usize>,
    pub today: Option<NaiveDate>,
    /// `preview` books without touching the calendar backend.
    pub dry_run: bool,
}

pub fn run(root: &Path, args: RunArgs, json: bool) -> anyhow::Result<()> {
    let config = load_config(root)?;
    let today = resolve_today(args.today, &config)?;
    let (feed_path, feed) = load_feed_for(root, args.feed.as_deref())?;

    let mut sink = sink_from_config(root, &config.calendar, args.dry_run)
        .context("failed to set up calendar backend")?;
    let options = SyncOptions {
        today,
        max_records: args.max,
        dry_run: args.dry_run,
    };
    let report = run_sync(&config, &feed.records, sink.as_mut(), options)
        .context("scheduling run failed")?;

    if json {
        return print_json(&report);
    }

    let mode = if args.dry_run { "preview" } else { "sync" };
    println!(
        "{mode}: {} ({} records, {} dropped) as of {today}",
        feed_path.display(),
        feed.records.len(),
        feed.dropped.len()
    );
    println!();
    print_bookings(&report);
    print_summary(&report);
    Ok(())
}

fn print_bookings(report: &SyncReport) {
    let rows: Vec<Vec<String>> = report
        .outcomes
        .iter()
        .filter_map(|e| {
            let date = e.target_date.map(|d| d.to_string()).unwrap_or_default();
            let (start, end, title, result) = match &e.outcome {
                RecordOutcome::Scheduled { start, end, title } => {
                    (start, end, title, "planned".to_string())
                }
                RecordOutcome::Created {
                    start,
                    end,
                    title,
                    event_id,
                } => (start, end, title, format!("created {event_id}")),
                RecordOutcome::ExternalFailure {
                    start, end, title, ..
                } => (start, end, title, "calendar failed".to_string()),
                _ => return None,
            };
            Some(vec![
                date,
                format!("{start}-{end}"),
                e.specialist.clone(),
                title.clone(),
                result,
            ])
        })
        .collect();

    if rows.is_empty() {
        println!("Nothing scheduled.");
    } else {
        print_table(&["DATE", "TIME", "SPECIALIST", "ACTION", "RESULT"], &rows);
    }

    for e in &report.outcomes {
        match &e.outcome {
            RecordOutcome::NoSlot { duration_minutes } => println!(
                "  no slot: {} ({} min on {})",
                e.client,
                duration_minutes,
                e.target_date.map(|d| d.to_string()).unwrap_or_default()
            ),
            RecordOutcome::ExternalFailure { error, .. } => {
                println!("  calendar error for {}: {error}", e.client)
            }
            _ => {}
        }
    }
}

fn print_summary(report: &SyncReport) {
    if !report.days.is_empty() {
        println!();
        println!("Schedule by day:");
        for day in &report.days {
            println!("  {}: {} event(s)  {}", day.date, day.total, day.slots.join(", "));
        }
    }

    println!();
    println!("Run:             {}", report.run_id);
    println!("Specialists:     {}", report.specialists);
    println!("Scheduled:       {}", report.processed);
    println!("Events created:  {}", report.events_created);
    println!("Skipped:         {}", report.skipped);
    println!(
        "Errors:          {} ({} no slot, {} calendar)",
        report.errors, report.no_slot, report.external_failures
    );
    println!("Total records:   {}", report.total);
}
