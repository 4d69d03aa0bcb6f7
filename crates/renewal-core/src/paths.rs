use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const RENEWALS_DIR: &str = ".renewals";
pub const DATA_DIR: &str = "data";

pub const CONFIG_FILE: &str = ".renewals/config.yaml";
pub const DEFAULT_FEED_FILE: &str = "data/renewals.csv";

// ---------------------------------------------------------------------------
// Path builders
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn default_feed_path(root: &Path) -> PathBuf {
    root.join(DEFAULT_FEED_FILE)
}

/// Resolve the feed to read: an explicit path (relative paths are taken
/// against `root`) or the default `data/renewals.csv`.
pub fn resolve_feed_path(root: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => root.join(p),
        None => default_feed_path(root),
    }
}
