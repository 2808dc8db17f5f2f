#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::OutputMode;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "shelf: retail-audit scoring engine",
    long_about = None
)]
struct Cli {
    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Data directory holding the store, config, and lock files.
    #[arg(long, global = true, env = "SHELF_DATA_DIR", default_value = ".shelf")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    const fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Initialize a shelfscore data directory",
        after_help = "EXAMPLES:\n    # Initialize under ./.shelf\n    shelf init\n\n    # Reinitialize an existing directory\n    shelf init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        about = "Ingest an audit batch and recompute its scope",
        after_help = "EXAMPLES:\n    # Replace the label batch for one store-day\n    shelf ingest --store st-042 --date 2026-03-14 --kind label --file batch.json\n\n    # Emit machine-readable output\n    shelf ingest --store st-042 --date 2026-03-14 --kind label --file batch.json --json"
    )]
    Ingest(cmd::ingest::IngestArgs),

    #[command(
        about = "Show one entity-day snapshot",
        after_help = "EXAMPLES:\n    # Store snapshot\n    shelf snapshot st-042 --date 2026-03-14\n\n    # User snapshot as JSON\n    shelf snapshot u-7 --date 2026-03-14 --json"
    )]
    Snapshot(cmd::snapshot::SnapshotArgs),

    #[command(
        about = "Show a day's leaderboard",
        after_help = "EXAMPLES:\n    # Store leaderboard\n    shelf ranking --date 2026-03-14\n\n    # User leaderboard\n    shelf ranking --date 2026-03-14 --class user"
    )]
    Ranking(cmd::ranking::RankingArgs),

    #[command(
        about = "Show achievement progress for a user",
        after_help = "EXAMPLES:\n    # All rules\n    shelf achievements u-7\n\n    # Unlocked only\n    shelf achievements u-7 --unlocked"
    )]
    Achievements(cmd::achievements::AchievementsArgs),

    #[command(
        about = "Show XP totals and level for a user",
        after_help = "EXAMPLES:\n    shelf xp u-7"
    )]
    Xp(cmd::xp::XpArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SHELF_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "shelf=debug,info"
        } else {
            "shelf=info,warn"
        })
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mode = cli.output_mode();
    let data_dir = cli.data_dir.clone();

    match cli.command {
        Commands::Init(args) => cmd::init::run_init(&args, &data_dir, mode),
        Commands::Ingest(args) => cmd::ingest::run_ingest(&args, &data_dir, mode),
        Commands::Snapshot(args) => cmd::snapshot::run_snapshot(&args, &data_dir, mode),
        Commands::Ranking(args) => cmd::ranking::run_ranking(&args, &data_dir, mode),
        Commands::Achievements(args) => cmd::achievements::run_achievements(&args, &data_dir, mode),
        Commands::Xp(args) => cmd::xp::run_xp(&args, &data_dir, mode),
    }
}
