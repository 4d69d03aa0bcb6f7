use anyhow::Context;
use renewal_core::{config::Config, io, paths};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing renewals in: {}", root.display());

    // 1. Directories
    for dir in [paths::RENEWALS_DIR, paths::DATA_DIR] {
        let p = root.join(dir);
        io::ensure_dir(&p).with_context(|| format!("failed to create {}", p.display()))?;
    }

    // 2. config.yaml, never overwritten
    let config_path = paths::config_path(root);
    if config_path.exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
    } else {
        Config::default()
            .save(root)
            .context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
    }

    let feed = paths::default_feed_path(root);
    if !feed.exists() {
        println!();
        println!("Next: export the renewal report to {}", paths::DEFAULT_FEED_FILE);
    }
    Ok(())
}
