use crate::output::print_json;
use anyhow::Context;
use renewal_core::{
    feed::{self, load_feed, DroppedRow},
    paths,
};
use serde::Serialize;
use std::path::Path;

const REQUIRED_COLUMNS: [&str; 4] = [
    feed::COL_CLIENT,
    feed::COL_STATUS,
    feed::COL_EXPIRY,
    feed::COL_SPECIALIST,
];

#[derive(Serialize)]
struct FeedStatus {
    path: String,
    exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    delimiter: Option<String>,
    columns: usize,
    missing_columns: Vec<String>,
    records: usize,
    dropped: Vec<DroppedRow>,
}

pub fn run(root: &Path, feed_arg: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let path = paths::resolve_feed_path(root, feed_arg);
    let mut status = FeedStatus {
        path: path.display().to_string(),
        exists: path.exists(),
        delimiter: None,
        columns: 0,
        missing_columns: Vec::new(),
        records: 0,
        dropped: Vec::new(),
    };

    if status.exists {
        let loaded = load_feed(&path).with_context(|| format!("failed to read feed {}", path.display()))?;
        status.delimiter = Some(loaded.delimiter.to_string());
        status.columns = loaded.headers.len();
        status.missing_columns = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| !loaded.headers.iter().any(|h| h == c))
            .map(|c| c.to_string())
            .collect();
        status.records = loaded.records.len();
        status.dropped = loaded.dropped;
    }

    if json {
        return print_json(&status);
    }

    println!("Feed:      {}", status.path);
    if !status.exists {
        println!("Status:    not found");
        println!("Export the renewal report to {}", paths::DEFAULT_FEED_FILE);
        return Ok(());
    }
    println!(
        "Delimiter: {}",
        status.delimiter.as_deref().unwrap_or("unknown")
    );
    println!("Columns:   {}", status.columns);
    println!("Records:   {}", status.records);
    if !status.missing_columns.is_empty() {
        println!("Missing:   {}", status.missing_columns.join(", "));
    }
    if !status.dropped.is_empty() {
        println!("Dropped:   {} malformed row(s)", status.dropped.len());
        for d in &status.dropped {
            println!("  line {}: {}", d.line, d.reason);
        }
    }
    Ok(())
}
