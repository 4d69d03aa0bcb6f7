pub mod actions;
pub mod config;
pub mod init;
pub mod schedule;
pub mod status;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use renewal_core::{
    config::Config,
    feed::{load_feed, Feed},
    paths,
};
use std::path::{Path, PathBuf};

pub(crate) fn load_config(root: &Path) -> anyhow::Result<Config> {
    Config::load(root).context("failed to load config")
}

pub(crate) fn load_feed_for(root: &Path, feed: Option<&Path>) -> anyhow::Result<(PathBuf, Feed)> {
    let path = paths::resolve_feed_path(root, feed);
    let loaded = load_feed(&path).with_context(|| format!("failed to read feed {}", path.display()))?;
    Ok((path, loaded))
}

/// `--today` if given, otherwise the current date at the calendar's offset.
pub(crate) fn resolve_today(today: Option<NaiveDate>, config: &Config) -> anyhow::Result<NaiveDate> {
    if let Some(d) = today {
        return Ok(d);
    }
    let offset = config
        .calendar
        .offset()
        .context("calendar.utc_offset is invalid")?;
    Ok(Utc::now().with_timezone(&offset).date_naive())
}
