mod cmd;
mod output;
mod root;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "renewals",
    about = "Turn a policy renewal feed into non-overlapping follow-ups on specialist calendars",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .renewals/ or .git/)
    #[arg(long, global = true, env = "RENEWALS_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default config and create the data directory
    Init,

    /// Check that the renewal feed is present and readable
    Status {
        /// Feed file (default: data/renewals.csv under the root)
        #[arg(long)]
        feed: Option<PathBuf>,
    },

    /// Show the action each record would get, without scheduling
    Actions {
        #[arg(long)]
        feed: Option<PathBuf>,

        /// Evaluate as of this date (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Schedule everything without creating calendar events
    Preview {
        #[arg(long)]
        feed: Option<PathBuf>,

        /// Only consider the first N records
        #[arg(long)]
        max: Option<usize>,

        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Schedule and create events through the configured calendar backend
    Sync {
        #[arg(long)]
        feed: Option<PathBuf>,

        #[arg(long)]
        max: Option<usize>,

        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Inspect and validate .renewals/config.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Sync { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Status { feed } => cmd::status::run(&root, feed.as_deref(), cli.json),
        Commands::Actions { feed, today } => {
            cmd::actions::run(&root, feed.as_deref(), today, cli.json)
        }
        Commands::Preview { feed, max, today } => cmd::schedule::run(
            &root,
            cmd::schedule::RunArgs {
                feed,
                max,
                today,
                dry_run: true,
            },
            cli.json,
        ),
        Commands::Sync { feed, max, today } => cmd::schedule::run(
            &root,
            cmd::schedule::RunArgs {
                feed,
                max,
                today,
                dry_run: false,
            },
            cli.json,
        ),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
